//! Cascade delay scheduling
//!
//! A cascading keyframe staggers per-board dispatch so a pose sweeps
//! across the grid instead of snapping everywhere at once. The delay
//! function is pure: given a cascade mode, a base delay and a grid
//! coordinate it returns how long that board's dispatch waits after
//! the keyframe starts. Playback sorts itself out by polling this
//! function; no scheduling state lives here.

use polychron_protocol::BOARD_COUNT;

/// Dispatch stagger pattern for one keyframe.
///
/// Modes map a (board, row) coordinate to a delay multiple. `None`
/// dispatches all boards back-to-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CascadeMode {
    #[default]
    None,
    /// Left to right, one column per step.
    Column,
    /// Top to bottom, one row per step.
    Row,
    /// Top-left to bottom-right along anti-diagonals.
    Diagonal,
    /// Rings outward from the grid center, like a stone in water.
    Ripple,
    /// Rings inward from the edges to the center.
    RippleIn,
    /// Boustrophedon scan: even rows left to right, odd rows reversed.
    Snake,
    /// Fixed spiral ordering from the center outward.
    Spiral,
}

impl CascadeMode {
    /// Name used in choreography documents.
    pub fn as_str(self) -> &'static str {
        match self {
            CascadeMode::None => "none",
            CascadeMode::Column => "column",
            CascadeMode::Row => "row",
            CascadeMode::Diagonal => "diagonal",
            CascadeMode::Ripple => "ripple",
            CascadeMode::RippleIn => "ripple_in",
            CascadeMode::Snake => "snake",
            CascadeMode::Spiral => "spiral",
        }
    }

    /// Parse a document name. Unknown names fall back to `None`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "column" => CascadeMode::Column,
            "row" => CascadeMode::Row,
            "diagonal" => CascadeMode::Diagonal,
            "ripple" => CascadeMode::Ripple,
            "ripple_in" => CascadeMode::RippleIn,
            "snake" => CascadeMode::Snake,
            "spiral" => CascadeMode::Spiral,
            _ => CascadeMode::None,
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CascadeMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CascadeMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModeVisitor;

        impl serde::de::Visitor<'_> for ModeVisitor {
            type Value = CascadeMode;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("a cascade mode name")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<CascadeMode, E> {
                Ok(CascadeMode::from_name(value))
            }
        }

        deserializer.deserialize_str(ModeVisitor)
    }
}

/// Spiral dispatch order for the 8x3 grid, center positions first.
const SPIRAL_ORDER: [[u32; 3]; BOARD_COUNT] = [
    [6, 5, 7],
    [4, 3, 8],
    [2, 1, 9],
    [1, 0, 10],
    [1, 0, 10],
    [2, 1, 9],
    [4, 3, 8],
    [6, 5, 7],
];

/// Ring count around the grid center for the ripple modes.
const MAX_RING: u32 = 4;

/// Dispatch delay in milliseconds for one grid coordinate.
///
/// `board` is the column (0..8 left to right), `row` the clock row
/// (0..3 top to bottom). Out-of-range coordinates clamp to the grid
/// edge so a caller bug cannot index past the spiral table.
pub fn cascade_delay(mode: CascadeMode, delay_ms: u16, board: u8, row: u8) -> u32 {
    let board = u32::from(board).min(BOARD_COUNT as u32 - 1);
    let row = u32::from(row).min(2);
    let d = u32::from(delay_ms);

    match mode {
        CascadeMode::None => 0,
        CascadeMode::Column => board * d,
        CascadeMode::Row => row * d,
        CascadeMode::Diagonal => (board + row) * d,
        CascadeMode::Ripple => ripple_ring(board, row) * d,
        CascadeMode::RippleIn => (MAX_RING - ripple_ring(board, row)) * d,
        CascadeMode::Snake => {
            // Even rows scan left to right, odd rows right to left
            let pos = if row % 2 == 0 {
                row * 8 + board
            } else {
                row * 8 + (7 - board)
            };
            pos * d
        }
        CascadeMode::Spiral => SPIRAL_ORDER[board as usize][row as usize] * d,
    }
}

/// Ring index of a coordinate around the grid center at (3.5, 1.0).
///
/// The center sits between boards 3 and 4 on the middle row, so
/// distances are half-integers. Working in doubled units keeps the
/// rounding of `round(sqrt(dx^2 + dy^2))` exact without floats.
fn ripple_ring(board: u32, row: u32) -> u32 {
    let dx2 = (2 * board as i32 - 7).unsigned_abs();
    let dy2 = 2 * row.abs_diff(1);
    let q = dx2 * dx2 + dy2 * dy2;
    (isqrt(q) + 1) / 2
}

fn isqrt(n: u32) -> u32 {
    let mut root = 0;
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_zero_everywhere() {
        for board in 0..8 {
            for row in 0..3 {
                assert_eq!(cascade_delay(CascadeMode::None, 100, board, row), 0);
            }
        }
    }

    #[test]
    fn test_column_strictly_increases_per_board() {
        for board in 0..7u8 {
            let here = cascade_delay(CascadeMode::Column, 100, board, 0);
            let next = cascade_delay(CascadeMode::Column, 100, board + 1, 0);
            assert!(here < next, "board {} not below board {}", board, board + 1);
        }
        assert_eq!(cascade_delay(CascadeMode::Column, 100, 7, 0), 700);
    }

    #[test]
    fn test_row_ignores_board() {
        assert_eq!(cascade_delay(CascadeMode::Row, 50, 0, 2), 100);
        assert_eq!(cascade_delay(CascadeMode::Row, 50, 7, 2), 100);
        assert_eq!(cascade_delay(CascadeMode::Row, 50, 3, 0), 0);
    }

    #[test]
    fn test_diagonal_sums_coordinates() {
        assert_eq!(cascade_delay(CascadeMode::Diagonal, 100, 0, 0), 0);
        assert_eq!(cascade_delay(CascadeMode::Diagonal, 100, 7, 2), 900);
        assert_eq!(
            cascade_delay(CascadeMode::Diagonal, 100, 2, 1),
            cascade_delay(CascadeMode::Diagonal, 100, 3, 0),
        );
    }

    #[test]
    fn test_ripple_center_minimum_corner_maximum() {
        // Boards 3 and 4 sit on the innermost ring
        let center = cascade_delay(CascadeMode::Ripple, 100, 3, 1);
        let corner = cascade_delay(CascadeMode::Ripple, 100, 0, 0);
        for board in 0..8 {
            for row in 0..3 {
                let delay = cascade_delay(CascadeMode::Ripple, 100, board, row);
                assert!(delay >= center);
                assert!(delay <= corner);
            }
        }
        assert_eq!(center, 100);
        assert_eq!(corner, 400);
    }

    #[test]
    fn test_ripple_rings_match_geometry() {
        // round(sqrt((board - 3.5)^2 + (row - 1)^2)) per board, any row
        let expected = [4, 3, 2, 1, 1, 2, 3, 4];
        for (board, ring) in expected.iter().enumerate() {
            for row in 0..3 {
                assert_eq!(
                    cascade_delay(CascadeMode::Ripple, 1, board as u8, row),
                    *ring,
                    "board {board} row {row}"
                );
            }
        }
    }

    #[test]
    fn test_ripple_in_inverts_ripple() {
        for board in 0..8 {
            for row in 0..3 {
                let out = cascade_delay(CascadeMode::Ripple, 100, board, row);
                let inward = cascade_delay(CascadeMode::RippleIn, 100, board, row);
                assert_eq!(out + inward, MAX_RING * 100);
            }
        }
    }

    #[test]
    fn test_snake_reverses_odd_rows() {
        // Row 0 runs 0..=7 left to right
        assert_eq!(cascade_delay(CascadeMode::Snake, 10, 0, 0), 0);
        assert_eq!(cascade_delay(CascadeMode::Snake, 10, 7, 0), 70);
        // Row 1 continues from the right edge
        assert_eq!(cascade_delay(CascadeMode::Snake, 10, 7, 1), 80);
        assert_eq!(cascade_delay(CascadeMode::Snake, 10, 0, 1), 150);
        // Row 2 turns back left to right
        assert_eq!(cascade_delay(CascadeMode::Snake, 10, 0, 2), 160);
        assert_eq!(cascade_delay(CascadeMode::Snake, 10, 7, 2), 230);
    }

    #[test]
    fn test_spiral_center_first() {
        assert_eq!(cascade_delay(CascadeMode::Spiral, 100, 3, 1), 0);
        assert_eq!(cascade_delay(CascadeMode::Spiral, 100, 4, 1), 0);
        // Symmetric about the vertical center line
        for board in 0..4u8 {
            for row in 0..3 {
                assert_eq!(
                    cascade_delay(CascadeMode::Spiral, 100, board, row),
                    cascade_delay(CascadeMode::Spiral, 100, 7 - board, row),
                );
            }
        }
    }

    #[test]
    fn test_mode_names_roundtrip() {
        let modes = [
            CascadeMode::None,
            CascadeMode::Column,
            CascadeMode::Row,
            CascadeMode::Diagonal,
            CascadeMode::Ripple,
            CascadeMode::RippleIn,
            CascadeMode::Snake,
            CascadeMode::Spiral,
        ];
        for mode in modes {
            assert_eq!(CascadeMode::from_name(mode.as_str()), mode);
        }
        assert_eq!(CascadeMode::from_name("sideways"), CascadeMode::None);
    }

    #[test]
    fn test_out_of_range_coordinates_clamp() {
        assert_eq!(
            cascade_delay(CascadeMode::Spiral, 100, 200, 200),
            cascade_delay(CascadeMode::Spiral, 100, 7, 2),
        );
    }
}
