//! Clock bus transmitter and conductor pacing
//!
//! The eight boards hang off a single shared UART TX line. Traffic is
//! one way; the boards never talk back. Writes go out blocking from
//! the conductor's context so a frame is fully on the wire before the
//! next dispatch or pace starts.

use defmt::*;
use embassy_rp::uart::{Blocking, UartTx};
use embassy_time::{block_for, Duration};

use polychron_core::traits::{ClockBus, Pacer};
use polychron_protocol::frame::MAX_FRAME_SIZE;
use polychron_protocol::{BoardCommand, HalfDigit, BROADCAST_ADDR};

/// Outbound clock bus over a blocking UART transmitter.
pub struct UartClockBus {
    tx: UartTx<'static, Blocking>,
    dropped: u32,
}

impl UartClockBus {
    pub fn new(tx: UartTx<'static, Blocking>) -> Self {
        Self { tx, dropped: 0 }
    }

    fn send(&mut self, command: &BoardCommand, addr: u8) {
        let frame = match command.to_frame(addr) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Bus frame rejected: {:?}", e);
                return;
            }
        };

        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = match frame.encode(&mut buf) {
            Ok(len) => len,
            Err(e) => {
                warn!("Bus frame encode failed: {:?}", e);
                return;
            }
        };

        if self.tx.blocking_write(&buf[..len]).is_err() || self.tx.blocking_flush().is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!("Bus write failed ({} dropped so far)", self.dropped);
        }
    }
}

impl ClockBus for UartClockBus {
    fn send_half_digit(&mut self, board: u8, message: &HalfDigit) {
        trace!("Bus: half-digit to board {}", board);
        self.send(&BoardCommand::SetClocks(*message), board);
    }

    fn send_drivers(&mut self, on: bool) {
        debug!("Bus: drivers on={}", on);
        self.send(&BoardCommand::SetDrivers { on }, BROADCAST_ADDR);
    }
}

/// Pacer backed by the embassy time driver.
///
/// Cascade and animation waits hold the conductor in place; inbound
/// control traffic queues at the link layer meanwhile.
pub struct TimePacer;

impl Pacer for TimePacer {
    fn pace(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}
