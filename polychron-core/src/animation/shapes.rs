//! Pose tables for the display animations
//!
//! Angles follow the dial: 0 is 12 o'clock, 90 is 3 o'clock, 180
//! hangs straight down, 270 points at 9 o'clock. A numeral is drawn
//! by two columns of three clocks; the sculpture is eight columns
//! wide. Hands parked together on the 225 diagonal read as blank.

use polychron_protocol::BOARD_COUNT;

/// Hour and minute hand angle for one clock.
pub type HandPair = (i16, i16);

/// One column of three clocks, top row first.
pub type ColumnShape = [HandPair; 3];

/// One numeral: left column, then right column.
pub type DigitShape = [ColumnShape; 2];

/// A pose for the whole sculpture, leftmost column first.
pub type GridShape = [ColumnShape; BOARD_COUNT];

/// Same pose on every clock of the grid.
pub const fn uniform(hands: HandPair) -> GridShape {
    [[hands; 3]; BOARD_COUNT]
}

/// Same pose on every clock of one numeral.
pub const fn uniform_digit(hands: HandPair) -> DigitShape {
    [[hands; 3]; 2]
}

/// Same column on all eight boards.
pub const fn column_grid(column: ColumnShape) -> GridShape {
    [column; BOARD_COUNT]
}

/// Grid assembled from four numerals, leftmost first.
///
/// Column `i` of the sculpture shows column `i % 2` of numeral
/// `i / 2`.
pub const fn grid_from_digits(digits: [DigitShape; 4]) -> GridShape {
    let mut grid = [[(0, 0); 3]; BOARD_COUNT];
    let mut column = 0;
    while column < BOARD_COUNT {
        grid[column] = digits[column / 2][column % 2];
        column += 1;
    }
    grid
}

/// The ten numerals. Unused segments park on the 225 diagonal.
pub const DIGITS: [DigitShape; 10] = [
    [
        [(180, 90), (180, 0), (90, 0)],
        [(180, 270), (180, 0), (270, 0)],
    ],
    [
        [(225, 225), (225, 225), (225, 225)],
        [(180, 180), (180, 0), (0, 0)],
    ],
    [
        [(90, 90), (180, 90), (0, 90)],
        [(270, 180), (0, 270), (270, 270)],
    ],
    [
        [(90, 90), (90, 90), (90, 90)],
        [(270, 180), (270, 0), (270, 0)],
    ],
    [
        [(180, 180), (0, 90), (225, 225)],
        [(180, 180), (180, 0), (0, 0)],
    ],
    [
        [(180, 90), (0, 90), (90, 90)],
        [(270, 270), (180, 270), (0, 270)],
    ],
    [
        [(180, 90), (180, 0), (0, 90)],
        [(270, 270), (180, 270), (0, 270)],
    ],
    [
        [(90, 90), (225, 225), (225, 225)],
        [(180, 270), (180, 0), (0, 0)],
    ],
    [
        [(180, 90), (0, 90), (0, 90)],
        [(180, 270), (0, 270), (0, 270)],
    ],
    [
        [(180, 90), (90, 0), (90, 90)],
        [(180, 270), (180, 0), (0, 270)],
    ],
];

/// Rest pose: every hand hangs down, the face reads blank.
pub const REST: GridShape = uniform((180, 180));

/// Full vertical bars on every column.
pub const BARS: GridShape = uniform((180, 0));

/// Full diagonal lines, the idle party face.
pub const DIAGONALS: GridShape = uniform((225, 45));

/// Unison spin poses: every hand up, every hand down.
pub const SPIN_UP: GridShape = uniform((0, 0));
pub const SPIN_DOWN: GridShape = uniform((180, 180));

/// One diamond per numeral pair of columns.
const DIAMOND: DigitShape = [
    [(45, 225), (45, 135), (315, 135)],
    [(315, 135), (315, 225), (45, 225)],
];

pub const SQUARES: GridShape = grid_from_digits([DIAMOND, DIAMOND, DIAMOND, DIAMOND]);

const POINT_LEFT: DigitShape = uniform_digit((270, 270));
const POINT_RIGHT: DigitShape = uniform_digit((90, 90));

/// Mirrored halves: both sides point outward, then inward.
pub const SYMMETRY_OUT: GridShape =
    grid_from_digits([POINT_LEFT, POINT_LEFT, POINT_RIGHT, POINT_RIGHT]);
pub const SYMMETRY_IN: GridShape =
    grid_from_digits([POINT_RIGHT, POINT_RIGHT, POINT_LEFT, POINT_LEFT]);

/// Diagonal wave traveling across the face, three frames.
pub const WIND_1: GridShape = grid_from_digits([
    uniform_digit((45, 225)),
    uniform_digit((90, 270)),
    uniform_digit((135, 315)),
    uniform_digit((90, 270)),
]);
pub const WIND_2: GridShape = grid_from_digits([
    uniform_digit((90, 270)),
    uniform_digit((135, 315)),
    uniform_digit((90, 270)),
    uniform_digit((45, 225)),
]);
pub const WIND_3: GridShape = grid_from_digits([
    uniform_digit((135, 315)),
    uniform_digit((90, 270)),
    uniform_digit((45, 225)),
    uniform_digit((90, 270)),
]);

/// Burst rays fanned around the sculpture center.
const FIREWORK_INNER_LEFT: DigitShape = [
    [(315, 135), (270, 90), (225, 45)],
    [(315, 135), (270, 90), (225, 45)],
];
const FIREWORK_INNER_RIGHT: DigitShape = [
    [(45, 225), (90, 270), (135, 315)],
    [(45, 225), (90, 270), (135, 315)],
];
const FIREWORK_OUTER_LEFT: DigitShape = uniform_digit((270, 90));
const FIREWORK_OUTER_RIGHT: DigitShape = uniform_digit((90, 270));

pub const FIREWORK: GridShape = grid_from_digits([
    FIREWORK_OUTER_LEFT,
    FIREWORK_INNER_LEFT,
    FIREWORK_INNER_RIGHT,
    FIREWORK_OUTER_RIGHT,
]);

/// Needles radiating away from the center, and drawn back in.
pub const RIPPLE_OUT: GridShape = [
    [(270, 270), (270, 270), (270, 270)],
    [(270, 270), (270, 270), (270, 270)],
    [(315, 315), (270, 270), (225, 225)],
    [(315, 315), (270, 270), (225, 225)],
    [(45, 45), (90, 90), (135, 135)],
    [(45, 45), (90, 90), (135, 135)],
    [(90, 90), (90, 90), (90, 90)],
    [(90, 90), (90, 90), (90, 90)],
];
pub const RIPPLE_IN: GridShape = [
    [(90, 90), (90, 90), (90, 90)],
    [(90, 90), (90, 90), (90, 90)],
    [(135, 135), (90, 90), (45, 45)],
    [(135, 135), (90, 90), (45, 45)],
    [(315, 315), (270, 270), (225, 225)],
    [(315, 315), (270, 270), (225, 225)],
    [(270, 270), (270, 270), (270, 270)],
    [(270, 270), (270, 270), (270, 270)],
];

/// Vertical stretch, fold to the middle, calm horizontal rest.
pub const BREATHE_EXPAND: GridShape = column_grid([(0, 0), (0, 180), (180, 180)]);
pub const BREATHE_CONTRACT: GridShape = column_grid([(180, 180), (225, 225), (0, 0)]);
pub const BREATHE_NEUTRAL: GridShape = uniform((90, 270));

/// Drops falling row by row, then a splash off the bottom row.
pub const RAIN_1: GridShape = column_grid([(180, 180), (225, 225), (225, 225)]);
pub const RAIN_2: GridShape = column_grid([(225, 225), (180, 180), (225, 225)]);
pub const RAIN_3: GridShape = column_grid([(225, 225), (225, 225), (180, 180)]);
pub const RAIN_SPLASH: GridShape = column_grid([(225, 225), (225, 225), (315, 45)]);

/// Diagonal needles in the four oblique directions.
pub const OBLIQUES_BR: GridShape = uniform((135, 135));
pub const OBLIQUES_BL: GridShape = uniform((225, 225));
pub const OBLIQUES_TR: GridShape = uniform((45, 45));
pub const OBLIQUES_TL: GridShape = uniform((315, 315));

/// Pulse trace: flat baseline, a small rise, a tall spike.
const TRACE_FLAT: ColumnShape = [(225, 225), (90, 270), (225, 225)];

pub const HEART_DIASTOLE: GridShape = column_grid(TRACE_FLAT);
pub const HEART_SYSTOLE: GridShape = [
    TRACE_FLAT,
    TRACE_FLAT,
    TRACE_FLAT,
    [(225, 225), (45, 225), (225, 225)],
    [(225, 225), (135, 315), (225, 225)],
    TRACE_FLAT,
    TRACE_FLAT,
    TRACE_FLAT,
];
pub const HEART_PEAK: GridShape = [
    TRACE_FLAT,
    TRACE_FLAT,
    TRACE_FLAT,
    [(180, 180), (0, 180), (225, 225)],
    [(180, 180), (0, 180), (225, 225)],
    TRACE_FLAT,
    TRACE_FLAT,
    TRACE_FLAT,
];

/// Shape pool for the dance mode chain.
pub const DANCE_SHAPES: [GridShape; 25] = [
    SPIN_UP,
    SPIN_DOWN,
    SQUARES,
    BARS,
    DIAGONALS,
    WIND_1,
    WIND_2,
    WIND_3,
    FIREWORK,
    OBLIQUES_BR,
    OBLIQUES_BL,
    OBLIQUES_TR,
    OBLIQUES_TL,
    RIPPLE_OUT,
    RIPPLE_IN,
    BREATHE_EXPAND,
    BREATHE_CONTRACT,
    BREATHE_NEUTRAL,
    RAIN_1,
    RAIN_2,
    RAIN_3,
    RAIN_SPLASH,
    HEART_SYSTOLE,
    HEART_DIASTOLE,
    HEART_PEAK,
];

/// The four numerals of a 24 hour reading, most significant first.
pub fn time_digits(hour: u8, minute: u8) -> [usize; 4] {
    let hour = usize::from(hour % 24);
    let minute = usize::from(minute % 60);
    [hour / 10, hour % 10, minute / 10, minute % 10]
}

/// Grid pose showing `hour:minute`.
pub fn time_grid(hour: u8, minute: u8) -> GridShape {
    let [a, b, c, d] = time_digits(hour, minute);
    grid_from_digits([DIGITS[a], DIGITS[b], DIGITS[c], DIGITS[d]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_corners() {
        // Zero opens with a top-left corner and closes bottom-right
        assert_eq!(DIGITS[0][0][0], (180, 90));
        assert_eq!(DIGITS[0][1][2], (270, 0));
        // One hides its whole left column on the diagonal
        assert_eq!(DIGITS[1][0], [(225, 225); 3]);
        // Eight is the only numeral with two stacked loops
        assert_eq!(DIGITS[8][0], [(180, 90), (0, 90), (0, 90)]);
    }

    #[test]
    fn test_time_digits_splits_reading() {
        assert_eq!(time_digits(9, 5), [0, 9, 0, 5]);
        assert_eq!(time_digits(23, 59), [2, 3, 5, 9]);
        assert_eq!(time_digits(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_time_digits_wraps_out_of_range() {
        assert_eq!(time_digits(24, 60), [0, 0, 0, 0]);
        assert_eq!(time_digits(25, 61), [0, 1, 0, 1]);
    }

    #[test]
    fn test_time_grid_column_mapping() {
        let grid = time_grid(12, 34);
        assert_eq!(grid[0], DIGITS[1][0]);
        assert_eq!(grid[1], DIGITS[1][1]);
        assert_eq!(grid[2], DIGITS[2][0]);
        assert_eq!(grid[5], DIGITS[3][1]);
        assert_eq!(grid[7], DIGITS[4][1]);
    }

    #[test]
    fn test_grid_builders() {
        assert_eq!(uniform((180, 0)), [[(180, 0); 3]; BOARD_COUNT]);
        assert_eq!(column_grid([(1, 2), (3, 4), (5, 6)])[7], [(1, 2), (3, 4), (5, 6)]);
        let grid = grid_from_digits([DIGITS[7], DIGITS[7], DIGITS[7], DIGITS[7]]);
        assert_eq!(grid[4], DIGITS[7][0]);
        assert_eq!(grid[5], DIGITS[7][1]);
    }

    #[test]
    fn test_dance_pool_is_pairwise_distinct() {
        for (i, a) in DANCE_SHAPES.iter().enumerate() {
            for b in DANCE_SHAPES.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_firework_mirrors_about_center() {
        for row in 0..3 {
            let (lh, lm) = FIREWORK[2][row];
            let (rh, rm) = FIREWORK[5][row];
            assert_eq!((360 - lh) % 360, rh);
            assert_eq!((360 - lm) % 360, rm);
        }
    }
}
