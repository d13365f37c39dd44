//! The half-digit payload: one board's worth of clock targets.
//!
//! Each of the eight boards drives three clocks, one column of a
//! seven-segment-style digit half. A dispatch to a board carries all
//! three clock targets plus one change counter per clock:
//!
//! ```text
//! offset  size  field
//! 0       16    clocks[0]  (ClockTargetState)
//! 16      16    clocks[1]
//! 32      16    clocks[2]
//! 48      4     counters[0] (u32)
//! 52      4     counters[1]
//! 56      4     counters[2]
//! ```
//!
//! The counters implement at-most-once application on a lossy bus: a
//! board applies a slot only when its counter differs from the last one
//! it applied. Resending the same message is therefore harmless, and a
//! lost message is superseded by the next dispatch.

use crate::clock::{ClockTargetState, PayloadError};

/// Number of slave boards on the bus
pub const BOARD_COUNT: usize = 8;

/// Number of clocks driven by one board
pub const CLOCKS_PER_BOARD: usize = 3;

/// Clock targets and change counters for one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HalfDigit {
    pub clocks: [ClockTargetState; CLOCKS_PER_BOARD],
    pub counters: [u32; CLOCKS_PER_BOARD],
}

impl Default for HalfDigit {
    fn default() -> Self {
        Self {
            clocks: [ClockTargetState::default(); CLOCKS_PER_BOARD],
            counters: [0; CLOCKS_PER_BOARD],
        }
    }
}

impl HalfDigit {
    /// Encoded size in bytes
    pub const WIRE_LEN: usize = CLOCKS_PER_BOARD * ClockTargetState::WIRE_LEN
        + CLOCKS_PER_BOARD * core::mem::size_of::<u32>();

    /// Encode into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PayloadError> {
        if buffer.len() < Self::WIRE_LEN {
            return Err(PayloadError::BufferTooSmall);
        }

        let mut offset = 0;
        for clock in &self.clocks {
            offset += clock.encode(&mut buffer[offset..])?;
        }
        for counter in &self.counters {
            buffer[offset..offset + 4].copy_from_slice(&counter.to_le_bytes());
            offset += 4;
        }

        Ok(offset)
    }

    /// Decode from a byte buffer
    ///
    /// Bytes beyond the fixed wire length are ignored; short buffers are
    /// rejected so receivers can drop undersized messages.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() < Self::WIRE_LEN {
            return Err(PayloadError::Truncated);
        }

        let state_len = ClockTargetState::WIRE_LEN;
        let clocks = [
            ClockTargetState::decode(&bytes[0..])?,
            ClockTargetState::decode(&bytes[state_len..])?,
            ClockTargetState::decode(&bytes[2 * state_len..])?,
        ];

        let counter_base = CLOCKS_PER_BOARD * state_len;
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        let counters = [
            u32_at(counter_base),
            u32_at(counter_base + 4),
            u32_at(counter_base + 8),
        ];

        Ok(Self { clocks, counters })
    }
}
