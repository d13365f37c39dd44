//! Angle arithmetic in the clock-face domain
//!
//! Hand positions are integer degrees in `[0, 360)` with 0° at
//! 12 o'clock, 90° at 3, 180° at 6 and 270° at 9. All arithmetic
//! normalizes back into this domain.

/// Normalize any signed degree value into `[0, 360)`.
pub fn normalize(degrees: i16) -> i16 {
    normalize_i32(degrees as i32)
}

fn normalize_i32(degrees: i32) -> i16 {
    ((degrees % 360 + 360) % 360) as i16
}

/// An absolute hand position on the clock face.
///
/// Always holds a value in `[0, 360)`; construction normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Angle(i16);

impl Angle {
    /// 12 o'clock position
    pub const ZERO: Self = Self(0);

    /// Create an angle, normalizing into `[0, 360)`.
    pub fn new(degrees: i16) -> Self {
        Self(normalize(degrees))
    }

    /// Position in degrees, in `[0, 360)`.
    pub fn degrees(self) -> i16 {
        self.0
    }

    /// Offset by a signed amount, wrapping around the face.
    pub fn offset(self, degrees: i16) -> Self {
        Self(normalize_i32(self.0 as i32 + degrees as i32))
    }

    /// Degrees of clockwise travel to reach `target`, in `[0, 360)`.
    pub fn clockwise_delta(self, target: Angle) -> i16 {
        normalize_i32(target.0 as i32 - self.0 as i32)
    }

    /// Degrees of counter-clockwise travel to reach `target`, in `(-360, 0]`.
    pub fn counterclockwise_delta(self, target: Angle) -> i16 {
        let cw = self.clockwise_delta(target);
        if cw == 0 {
            0
        } else {
            cw - 360
        }
    }

    /// Signed shortest arc to `target`, in `(-180, 180]`.
    ///
    /// Positive is clockwise. A dead-even 180° split resolves clockwise.
    pub fn shortest_arc(self, target: Angle) -> i16 {
        let cw = self.clockwise_delta(target);
        if cw > 180 {
            cw - 360
        } else {
            cw
        }
    }
}
