//! Display animations: pose tables and the per-minute dispatcher.

pub mod dispatcher;
pub mod shapes;

pub use dispatcher::Dispatcher;

/// Display animation selector.
///
/// The byte values are a contract with the control clients and the
/// stored configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DisplayMode {
    /// Shortest arc to the new time
    #[default]
    Lazy = 0,
    /// Clockwise with a full extra revolution
    Fun = 1,
    /// Vertical bars, then a column sweep
    Waves = 2,
    /// Unison full revolutions
    Spinning = 3,
    /// Diamond interlude
    Squares = 4,
    /// Mirrored halves
    Symmetrical = 5,
    /// Traveling diagonal wave
    Wind = 6,
    /// Row by row reveal, top down
    Cascade = 7,
    /// Burst from the center columns
    Firework = 8,
    /// Diagonal needles rotating
    Obliques = 9,
    /// Needles radiating from the center
    Ripple = 10,
    /// Vertical expansion and contraction
    Breathe = 11,
    /// Falling drops and a splash
    Rain = 12,
    /// Pulse trace rhythm
    Heartbeat = 13,
    /// Random shape chain
    Dance = 14,
    /// Park the hands and power down
    Off = 15,
}

impl DisplayMode {
    /// Parse a mode from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(DisplayMode::Lazy),
            1 => Some(DisplayMode::Fun),
            2 => Some(DisplayMode::Waves),
            3 => Some(DisplayMode::Spinning),
            4 => Some(DisplayMode::Squares),
            5 => Some(DisplayMode::Symmetrical),
            6 => Some(DisplayMode::Wind),
            7 => Some(DisplayMode::Cascade),
            8 => Some(DisplayMode::Firework),
            9 => Some(DisplayMode::Obliques),
            10 => Some(DisplayMode::Ripple),
            11 => Some(DisplayMode::Breathe),
            12 => Some(DisplayMode::Rain),
            13 => Some(DisplayMode::Heartbeat),
            14 => Some(DisplayMode::Dance),
            15 => Some(DisplayMode::Off),
            _ => None,
        }
    }

    /// Convert to the wire byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}
