//! Per-clock target state as carried on the clock bus.
//!
//! A clock is a pair of independently driven hands (hour and minute).
//! The master describes where each hand should go with a [`MovementMode`]
//! plus an absolute angle, or with a signed trim for the adjust mode.

/// Errors from decoding or encoding bus payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Payload shorter than the fixed wire length
    Truncated,
    /// Unknown movement mode byte
    InvalidMode,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// How a hand travels to its target angle
///
/// All modes except `AdjustHand` are absolute position commands; the
/// receiver picks a signed step delta from the current position. The
/// `*2`/`*3` variants add full extra revolutions for show moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MovementMode {
    /// Shortest arc to the target (ties resolve clockwise)
    MinDistance,
    /// Clockwise arc to the target
    Clockwise,
    /// Counter-clockwise arc to the target
    CounterClockwise,
    /// Clockwise arc plus one full revolution
    Clockwise2,
    /// Counter-clockwise arc plus one full revolution
    CounterClockwise2,
    /// Longest arc to the target
    MaxDistance,
    /// Longest arc plus one full revolution
    MaxDistance2,
    /// Longest arc plus two full revolutions
    MaxDistance3,
    /// Relative trim of the hand by a signed degree amount
    AdjustHand,
}

// Wire format values
const MODE_MIN_DISTANCE: u8 = 0;
const MODE_CLOCKWISE: u8 = 1;
const MODE_COUNTER_CLOCKWISE: u8 = 2;
const MODE_CLOCKWISE_2: u8 = 3;
const MODE_COUNTER_CLOCKWISE_2: u8 = 4;
const MODE_MAX_DISTANCE: u8 = 5;
const MODE_MAX_DISTANCE_2: u8 = 6;
const MODE_MAX_DISTANCE_3: u8 = 7;
const MODE_ADJUST_HAND: u8 = 8;

impl MovementMode {
    /// Parse a mode from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MODE_MIN_DISTANCE => Some(MovementMode::MinDistance),
            MODE_CLOCKWISE => Some(MovementMode::Clockwise),
            MODE_COUNTER_CLOCKWISE => Some(MovementMode::CounterClockwise),
            MODE_CLOCKWISE_2 => Some(MovementMode::Clockwise2),
            MODE_COUNTER_CLOCKWISE_2 => Some(MovementMode::CounterClockwise2),
            MODE_MAX_DISTANCE => Some(MovementMode::MaxDistance),
            MODE_MAX_DISTANCE_2 => Some(MovementMode::MaxDistance2),
            MODE_MAX_DISTANCE_3 => Some(MovementMode::MaxDistance3),
            MODE_ADJUST_HAND => Some(MovementMode::AdjustHand),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            MovementMode::MinDistance => MODE_MIN_DISTANCE,
            MovementMode::Clockwise => MODE_CLOCKWISE,
            MovementMode::CounterClockwise => MODE_COUNTER_CLOCKWISE,
            MovementMode::Clockwise2 => MODE_CLOCKWISE_2,
            MovementMode::CounterClockwise2 => MODE_COUNTER_CLOCKWISE_2,
            MovementMode::MaxDistance => MODE_MAX_DISTANCE,
            MovementMode::MaxDistance2 => MODE_MAX_DISTANCE_2,
            MovementMode::MaxDistance3 => MODE_MAX_DISTANCE_3,
            MovementMode::AdjustHand => MODE_ADJUST_HAND,
        }
    }

    /// Returns true if this mode targets an absolute angle
    pub fn is_absolute(&self) -> bool {
        !matches!(self, MovementMode::AdjustHand)
    }

    /// Returns true if this mode is a relative trim
    pub fn is_adjust(&self) -> bool {
        matches!(self, MovementMode::AdjustHand)
    }
}

/// One of the two hands of a clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hand {
    Hour,
    Minute,
}

impl Hand {
    /// Parse a hand from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Hand::Hour),
            1 => Some(Hand::Minute),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            Hand::Hour => 0,
            Hand::Minute => 1,
        }
    }
}

/// Target state for one clock (both hands)
///
/// Wire format (16 bytes, little-endian):
/// - angle_h, angle_m (i16): target angles in degrees, [0, 360)
/// - speed_h, speed_m (i16): max speed in steps/s
/// - accel_h, accel_m (i16): acceleration in steps/s²
/// - mode_h, mode_m (u8): movement mode per hand
/// - adjust_h, adjust_m (i8): signed trim in degrees, adjust mode only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTargetState {
    pub angle_h: i16,
    pub angle_m: i16,
    pub speed_h: i16,
    pub speed_m: i16,
    pub accel_h: i16,
    pub accel_m: i16,
    pub mode_h: MovementMode,
    pub mode_m: MovementMode,
    pub adjust_h: i8,
    pub adjust_m: i8,
}

impl Default for ClockTargetState {
    /// Zeroed state: angles at 12 o'clock, mode `MinDistance`, no trim.
    fn default() -> Self {
        Self {
            angle_h: 0,
            angle_m: 0,
            speed_h: 0,
            speed_m: 0,
            accel_h: 0,
            accel_m: 0,
            mode_h: MovementMode::MinDistance,
            mode_m: MovementMode::MinDistance,
            adjust_h: 0,
            adjust_m: 0,
        }
    }
}

impl ClockTargetState {
    /// Encoded size in bytes
    pub const WIRE_LEN: usize = 16;

    /// Encode into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PayloadError> {
        if buffer.len() < Self::WIRE_LEN {
            return Err(PayloadError::BufferTooSmall);
        }

        buffer[0..2].copy_from_slice(&self.angle_h.to_le_bytes());
        buffer[2..4].copy_from_slice(&self.angle_m.to_le_bytes());
        buffer[4..6].copy_from_slice(&self.speed_h.to_le_bytes());
        buffer[6..8].copy_from_slice(&self.speed_m.to_le_bytes());
        buffer[8..10].copy_from_slice(&self.accel_h.to_le_bytes());
        buffer[10..12].copy_from_slice(&self.accel_m.to_le_bytes());
        buffer[12] = self.mode_h.to_byte();
        buffer[13] = self.mode_m.to_byte();
        buffer[14] = self.adjust_h as u8;
        buffer[15] = self.adjust_m as u8;

        Ok(Self::WIRE_LEN)
    }

    /// Decode from a byte buffer
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() < Self::WIRE_LEN {
            return Err(PayloadError::Truncated);
        }

        let i16_at = |offset: usize| i16::from_le_bytes([bytes[offset], bytes[offset + 1]]);

        Ok(Self {
            angle_h: i16_at(0),
            angle_m: i16_at(2),
            speed_h: i16_at(4),
            speed_m: i16_at(6),
            accel_h: i16_at(8),
            accel_m: i16_at(10),
            mode_h: MovementMode::from_byte(bytes[12]).ok_or(PayloadError::InvalidMode)?,
            mode_m: MovementMode::from_byte(bytes[13]).ok_or(PayloadError::InvalidMode)?,
            adjust_h: bytes[14] as i8,
            adjust_m: bytes[15] as i8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MODES: [MovementMode; 9] = [
        MovementMode::MinDistance,
        MovementMode::Clockwise,
        MovementMode::CounterClockwise,
        MovementMode::Clockwise2,
        MovementMode::CounterClockwise2,
        MovementMode::MaxDistance,
        MovementMode::MaxDistance2,
        MovementMode::MaxDistance3,
        MovementMode::AdjustHand,
    ];

    fn sample_state() -> ClockTargetState {
        ClockTargetState {
            angle_h: 270,
            angle_m: 90,
            speed_h: 400,
            speed_m: 400,
            accel_h: 150,
            accel_m: 150,
            mode_h: MovementMode::MinDistance,
            mode_m: MovementMode::Clockwise,
            adjust_h: 0,
            adjust_m: 0,
        }
    }

    #[test]
    fn test_mode_roundtrip() {
        for mode in ALL_MODES {
            let byte = mode.to_byte();
            let parsed = MovementMode::from_byte(byte).unwrap();
            assert_eq!(mode, parsed);
        }
    }

    #[test]
    fn test_mode_wire_values() {
        // The byte values are a bus contract shared with the boards
        assert_eq!(MovementMode::MinDistance.to_byte(), 0);
        assert_eq!(MovementMode::Clockwise.to_byte(), 1);
        assert_eq!(MovementMode::CounterClockwise.to_byte(), 2);
        assert_eq!(MovementMode::Clockwise2.to_byte(), 3);
        assert_eq!(MovementMode::MaxDistance3.to_byte(), 7);
        assert_eq!(MovementMode::AdjustHand.to_byte(), 8);
    }

    #[test]
    fn test_unknown_mode() {
        assert!(MovementMode::from_byte(9).is_none());
        assert!(MovementMode::from_byte(0xFF).is_none());
    }

    #[test]
    fn test_is_absolute() {
        for mode in ALL_MODES {
            assert_eq!(mode.is_absolute(), mode != MovementMode::AdjustHand);
        }
    }

    #[test]
    fn test_hand_roundtrip() {
        for hand in [Hand::Hour, Hand::Minute] {
            assert_eq!(Hand::from_byte(hand.to_byte()), Some(hand));
        }
        assert!(Hand::from_byte(2).is_none());
    }

    #[test]
    fn test_state_encode_layout() {
        let state = sample_state();
        let mut buffer = [0u8; ClockTargetState::WIRE_LEN];
        let len = state.encode(&mut buffer).unwrap();

        assert_eq!(len, 16);
        assert_eq!(&buffer[0..2], &270i16.to_le_bytes()); // angle_h
        assert_eq!(&buffer[2..4], &90i16.to_le_bytes()); // angle_m
        assert_eq!(&buffer[4..6], &400i16.to_le_bytes()); // speed_h
        assert_eq!(buffer[12], 0); // mode_h = MinDistance
        assert_eq!(buffer[13], 1); // mode_m = Clockwise
    }

    #[test]
    fn test_state_roundtrip() {
        let state = ClockTargetState {
            adjust_h: -45,
            adjust_m: 12,
            mode_h: MovementMode::AdjustHand,
            mode_m: MovementMode::AdjustHand,
            ..sample_state()
        };

        let mut buffer = [0u8; ClockTargetState::WIRE_LEN];
        state.encode(&mut buffer).unwrap();
        let decoded = ClockTargetState::decode(&buffer).unwrap();

        assert_eq!(state, decoded);
    }

    #[test]
    fn test_state_decode_truncated() {
        let bytes = [0u8; ClockTargetState::WIRE_LEN - 1];
        assert_eq!(
            ClockTargetState::decode(&bytes),
            Err(PayloadError::Truncated)
        );
    }

    #[test]
    fn test_state_decode_invalid_mode() {
        let mut buffer = [0u8; ClockTargetState::WIRE_LEN];
        sample_state().encode(&mut buffer).unwrap();
        buffer[12] = 42;
        assert_eq!(
            ClockTargetState::decode(&buffer),
            Err(PayloadError::InvalidMode)
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buffer = [0u8; ClockTargetState::WIRE_LEN - 1];
        assert_eq!(
            sample_state().encode(&mut buffer),
            Err(PayloadError::BufferTooSmall)
        );
    }
}
