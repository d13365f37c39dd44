//! Clock bus trait
//!
//! Abstracts the shared serial bus between the master and the eight
//! clock boards. The bus is fire and forget: no acknowledgment, no
//! retry, no timeout. A lost message leaves the target board at a
//! stale state until the next superseding command; the change counters
//! in [`HalfDigit`] make that safe.

use polychron_protocol::HalfDigit;

/// Trait for the outbound clock bus on the master.
///
/// Implementations frame and transmit the message; they must not block
/// waiting for a reply, because none ever comes.
pub trait ClockBus {
    /// Send one board's half-digit message.
    fn send_half_digit(&mut self, board: u8, message: &HalfDigit);

    /// Broadcast the stepper driver enable state to every board.
    ///
    /// Boards defer an actual disable until their motors stop.
    fn send_drivers(&mut self, on: bool);
}

/// Bus double that records every dispatch in order.
///
/// Intended for host tests that assert on dispatch contents and order.
#[derive(Debug, Default)]
pub struct RecordingBus {
    /// Half-digit sends as (board, message) pairs.
    pub sent: heapless::Vec<(u8, HalfDigit), 512>,
    /// Driver broadcasts in order.
    pub drivers: heapless::Vec<bool, 16>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent to one board, in order.
    pub fn for_board(&self, board: u8) -> impl Iterator<Item = &HalfDigit> {
        self.sent
            .iter()
            .filter(move |(b, _)| *b == board)
            .map(|(_, message)| message)
    }
}

impl ClockBus for RecordingBus {
    fn send_half_digit(&mut self, board: u8, message: &HalfDigit) {
        let _ = self.sent.push((board, *message));
    }

    fn send_drivers(&mut self, on: bool) {
        let _ = self.drivers.push(on);
    }
}
