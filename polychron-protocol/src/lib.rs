//! Polychron wire protocol
//!
//! This crate defines the two serial links of the sculpture: the shared
//! clock bus (master → eight slave boards, fire-and-forget) and the
//! point-to-point control link (host → master). Both carry the same
//! binary frame format:
//!
//! ```text
//! ┌───────┬──────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ ADDR │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B   │ 1B     │ 1B   │ 0–250B      │ 1B       │
//! └───────┴──────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Every board on the clock bus sees every frame and keeps only those
//! addressed to it (or to [`BROADCAST_ADDR`]). There are no
//! acknowledgements on the bus; a corrupted frame is simply lost and the
//! next dispatch supersedes it. The control link reuses the framing with
//! its own message set and does reply to the host.

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod frame;
pub mod half_digit;
pub mod messages;

pub use clock::{ClockTargetState, Hand, MovementMode, PayloadError};
pub use frame::{Frame, FrameError, FrameParser, BROADCAST_ADDR, FRAME_START, MAX_PAYLOAD_SIZE};
pub use half_digit::{HalfDigit, BOARD_COUNT, CLOCKS_PER_BOARD};
pub use messages::{BoardCommand, HostCommand, MasterReply, StatusReport, MAX_NAME_LEN};
