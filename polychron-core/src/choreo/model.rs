//! Choreography data model
//!
//! A choreography is a named, ordered sequence of keyframes plus a
//! loop flag. Each keyframe poses the whole 8x3 grid and carries the
//! motion parameters and cascade settings for the transition into it.
//!
//! The document form is JSON with the field names below; capacities
//! are fixed and oversized documents are truncated at the caps rather
//! than rejected. Missing fields take the documented defaults, so a
//! hand-written document can be as sparse as `{"name": "x"}`.

use heapless::{String, Vec};
use polychron_protocol::{ClockTargetState, MovementMode, BOARD_COUNT, CLOCKS_PER_BOARD};

use crate::choreo::cascade::CascadeMode;

/// Maximum keyframes per choreography.
pub const MAX_KEYFRAMES: usize = 32;

/// Maximum stored choreographies.
pub const MAX_CHOREOGRAPHIES: usize = 16;

/// Maximum choreography name length in bytes.
pub const MAX_NAME_LEN: usize = polychron_protocol::MAX_NAME_LEN;

/// Maximum keyframe comment length in bytes.
pub const MAX_COMMENT_LEN: usize = 128;

/// Default hand speed in steps per second.
pub const DEFAULT_SPEED: u16 = 400;

/// Default hand acceleration in steps per second squared.
pub const DEFAULT_ACCEL: u16 = 150;

/// Default cascade step delay in milliseconds.
pub const DEFAULT_CASCADE_DELAY_MS: u16 = 100;

/// Default hand angle in degrees (both hands straight down).
pub const DEFAULT_ANGLE: i16 = 180;

/// Choreography name as stored and listed.
pub type ChoreoName = String<MAX_NAME_LEN>;

/// Travel direction a keyframe requests for one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandDir {
    #[default]
    Cw,
    Ccw,
}

impl HandDir {
    /// Movement mode dispatched for this direction.
    pub fn movement_mode(self) -> MovementMode {
        match self {
            HandDir::Cw => MovementMode::Clockwise,
            HandDir::Ccw => MovementMode::CounterClockwise,
        }
    }

    /// Name used in choreography documents.
    pub fn as_str(self) -> &'static str {
        match self {
            HandDir::Cw => "CW",
            HandDir::Ccw => "CCW",
        }
    }

    /// Parse a document name. Anything but exact `CCW` reads clockwise.
    pub fn from_name(name: &str) -> Self {
        if name == "CCW" {
            HandDir::Ccw
        } else {
            HandDir::Cw
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HandDir {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HandDir {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DirVisitor;

        impl serde::de::Visitor<'_> for DirVisitor {
            type Value = HandDir;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("a hand direction (CW or CCW)")
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<HandDir, E> {
                Ok(HandDir::from_name(value))
            }
        }

        deserializer.deserialize_str(DirVisitor)
    }
}

/// Target pose of one clock within a keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ClockPose {
    pub angle_h: i16,
    pub angle_m: i16,
    pub dir_h: HandDir,
    pub dir_m: HandDir,
}

impl Default for ClockPose {
    fn default() -> Self {
        Self {
            angle_h: DEFAULT_ANGLE,
            angle_m: DEFAULT_ANGLE,
            dir_h: HandDir::Cw,
            dir_m: HandDir::Cw,
        }
    }
}

impl ClockPose {
    /// Wire target for this pose with the keyframe's motion parameters.
    pub fn to_target(self, speed: u16, accel: u16) -> ClockTargetState {
        ClockTargetState {
            angle_h: self.angle_h,
            angle_m: self.angle_m,
            speed_h: wire_i16(speed),
            speed_m: wire_i16(speed),
            accel_h: wire_i16(accel),
            accel_m: wire_i16(accel),
            mode_h: self.dir_h.movement_mode(),
            mode_m: self.dir_m.movement_mode(),
            adjust_h: 0,
            adjust_m: 0,
        }
    }
}

/// Board-major grid of poses, `[board][row]`.
pub type PoseGrid = [[ClockPose; CLOCKS_PER_BOARD]; BOARD_COUNT];

/// One timed target pose for the whole grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Keyframe {
    #[cfg_attr(feature = "serde", serde(deserialize_with = "truncated_string"))]
    pub comment: String<MAX_COMMENT_LEN>,
    pub speed: u16,
    pub accel: u16,
    #[cfg_attr(feature = "serde", serde(rename = "delayMs"))]
    pub delay_ms: u16,
    #[cfg_attr(feature = "serde", serde(rename = "cascadeMode"))]
    pub cascade_mode: CascadeMode,
    #[cfg_attr(feature = "serde", serde(rename = "cascadeDelayMs"))]
    pub cascade_delay_ms: u16,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "partial_grid"))]
    pub clocks: PoseGrid,
}

impl Default for Keyframe {
    fn default() -> Self {
        Self {
            comment: String::new(),
            speed: DEFAULT_SPEED,
            accel: DEFAULT_ACCEL,
            delay_ms: 0,
            cascade_mode: CascadeMode::None,
            cascade_delay_ms: DEFAULT_CASCADE_DELAY_MS,
            clocks: [[ClockPose::default(); CLOCKS_PER_BOARD]; BOARD_COUNT],
        }
    }
}

/// A named keyframe sequence. Exactly one is current at a time;
/// loading another replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Choreography {
    #[cfg_attr(feature = "serde", serde(deserialize_with = "truncated_string"))]
    pub name: ChoreoName,
    #[cfg_attr(feature = "serde", serde(rename = "loop"))]
    pub looping: bool,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "truncated_keyframes"))]
    pub keyframes: Vec<Keyframe, MAX_KEYFRAMES>,
}

impl Choreography {
    /// Empty choreography with the given name, truncated to fit.
    pub fn named(name: &str) -> Self {
        Self {
            name: fitted(name),
            looping: false,
            keyframes: Vec::new(),
        }
    }
}

/// Copy as much of `text` as fits the capacity, on char boundaries.
pub(crate) fn fitted<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

fn wire_i16(value: u16) -> i16 {
    value.min(i16::MAX as u16) as i16
}

#[cfg(feature = "serde")]
fn truncated_string<'de, D, const N: usize>(deserializer: D) -> Result<String<N>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct TruncVisitor<const N: usize>;

    impl<const N: usize> serde::de::Visitor<'_> for TruncVisitor<N> {
        type Value = String<N>;

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            f.write_str("a string")
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<String<N>, E> {
            Ok(fitted(value))
        }
    }

    deserializer.deserialize_str(TruncVisitor)
}

#[cfg(feature = "serde")]
fn truncated_keyframes<'de, D>(deserializer: D) -> Result<Vec<Keyframe, MAX_KEYFRAMES>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct FramesVisitor;

    impl<'de> serde::de::Visitor<'de> for FramesVisitor {
        type Value = Vec<Keyframe, MAX_KEYFRAMES>;

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            f.write_str("a keyframe array")
        }

        fn visit_seq<A: serde::de::SeqAccess<'de>>(
            self,
            mut seq: A,
        ) -> Result<Self::Value, A::Error> {
            let mut frames = Vec::new();
            // Elements past capacity are parsed and dropped
            while let Some(frame) = seq.next_element::<Keyframe>()? {
                let _ = frames.push(frame);
            }
            Ok(frames)
        }
    }

    deserializer.deserialize_seq(FramesVisitor)
}

#[cfg(feature = "serde")]
fn partial_grid<'de, D>(deserializer: D) -> Result<PoseGrid, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct GridVisitor;
    struct RowVisitor;

    struct Row([ClockPose; CLOCKS_PER_BOARD]);

    impl<'de> serde::de::Visitor<'de> for RowVisitor {
        type Value = Row;

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            f.write_str("a board's clock pose array")
        }

        fn visit_seq<A: serde::de::SeqAccess<'de>>(
            self,
            mut seq: A,
        ) -> Result<Self::Value, A::Error> {
            let mut row = [ClockPose::default(); CLOCKS_PER_BOARD];
            let mut index = 0;
            while let Some(pose) = seq.next_element::<ClockPose>()? {
                if index < CLOCKS_PER_BOARD {
                    row[index] = pose;
                }
                index += 1;
            }
            Ok(Row(row))
        }
    }

    impl<'de> serde::de::Deserialize<'de> for Row {
        fn deserialize<D2: serde::Deserializer<'de>>(deserializer: D2) -> Result<Self, D2::Error> {
            deserializer.deserialize_seq(RowVisitor)
        }
    }

    impl<'de> serde::de::Visitor<'de> for GridVisitor {
        type Value = PoseGrid;

        fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            f.write_str("an 8-board clock grid")
        }

        fn visit_seq<A: serde::de::SeqAccess<'de>>(
            self,
            mut seq: A,
        ) -> Result<Self::Value, A::Error> {
            let mut grid = [[ClockPose::default(); CLOCKS_PER_BOARD]; BOARD_COUNT];
            let mut index = 0;
            while let Some(Row(row)) = seq.next_element::<Row>()? {
                if index < BOARD_COUNT {
                    grid[index] = row;
                }
                index += 1;
            }
            Ok(grid)
        }
    }

    deserializer.deserialize_seq(GridVisitor)
}
