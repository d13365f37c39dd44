//! Board-agnostic core logic for the Polychron sculpture firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (clock bus, pacing)
//! - Angle arithmetic in the clock-face domain
//! - Per-hand motion profiles and clock units (board side)
//! - Target latching with change-counter dedup (board side)
//! - Grid composition and dispatch (master side)
//! - Choreography playback, cascade scheduling and persistence
//! - Animation sequences for the per-minute display modes
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "json")]
extern crate alloc;

pub mod angle;
pub mod animation;
#[cfg(feature = "json")]
pub mod api;
pub mod board;
pub mod choreo;
pub mod config;
pub mod grid;
pub mod motion;
pub mod rand;
pub mod timewheel;
pub mod traits;
