//! Motion profiles for the clock hands
//!
//! Each hand is driven open loop: the accumulated step count is the
//! position estimate. A missed physical step is permanent drift until
//! the next calibration trim.

pub mod clock;
pub mod profile;

pub use clock::ClockUnit;
pub use profile::{Direction, StepperProfile};

/// Full mechanical revolution of one hand, in motor steps.
pub const STEPS_PER_REV: i32 = 5760;

/// Motor steps per degree of hand travel.
pub const STEPS_PER_DEGREE: i32 = STEPS_PER_REV / 360;

/// Parking angle the hands are assumed to hold at power-up.
pub const INIT_HANDS_ANGLE: i16 = 270;
