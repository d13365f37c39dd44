//! One clock: an hour hand and a minute hand on coaxial shafts
//!
//! Applies a received target state to the two hand profiles. Every
//! movement mode resolves to a signed step delta against the hand's
//! believed angle; the direction policy decides which way around the
//! face the delta goes.

use polychron_protocol::{ClockTargetState, MovementMode};

use super::profile::{Direction, StepperProfile};
use super::{INIT_HANDS_ANGLE, STEPS_PER_DEGREE, STEPS_PER_REV};
use crate::angle::Angle;

/// A pair of hand profiles with shared apply logic.
#[derive(Debug, Clone)]
pub struct ClockUnit {
    hour: StepperProfile,
    minute: StepperProfile,
}

impl ClockUnit {
    /// Create a clock believed to be parked at the power-up angle.
    pub fn new() -> Self {
        let mut hour = StepperProfile::new(400, 150);
        let mut minute = StepperProfile::new(400, 150);
        hour.set_position(INIT_HANDS_ANGLE as i32 * STEPS_PER_DEGREE);
        minute.set_position(INIT_HANDS_ANGLE as i32 * STEPS_PER_DEGREE);
        Self { hour, minute }
    }

    /// Apply a target state to both hands.
    ///
    /// Caller contract: the clock is idle. The receiver gates on the
    /// change counter and running state before calling this.
    pub fn apply(&mut self, state: &ClockTargetState) {
        apply_hand(
            &mut self.hour,
            state.mode_h,
            state.angle_h,
            state.adjust_h,
            state.speed_h,
            state.accel_h,
        );
        apply_hand(
            &mut self.minute,
            state.mode_m,
            state.angle_m,
            state.adjust_m,
            state.speed_m,
            state.accel_m,
        );
    }

    /// Advance the hour hand. Returns a step edge when one is due.
    pub fn run_hour(&mut self, now_us: u64) -> Option<Direction> {
        self.hour.run(now_us)
    }

    /// Advance the minute hand. Returns a step edge when one is due.
    pub fn run_minute(&mut self, now_us: u64) -> Option<Direction> {
        self.minute.run(now_us)
    }

    /// True while either hand has distance left to travel.
    pub fn is_running(&self) -> bool {
        self.hour.distance_to_go() != 0 || self.minute.distance_to_go() != 0
    }

    /// Believed hour hand angle.
    pub fn hour_angle(&self) -> Angle {
        step_angle(&self.hour)
    }

    /// Believed minute hand angle.
    pub fn minute_angle(&self) -> Angle {
        step_angle(&self.minute)
    }
}

impl Default for ClockUnit {
    fn default() -> Self {
        Self::new()
    }
}

fn step_angle(profile: &StepperProfile) -> Angle {
    let steps = profile.position().rem_euclid(STEPS_PER_REV);
    Angle::new((steps / STEPS_PER_DEGREE) as i16)
}

fn apply_hand(
    profile: &mut StepperProfile,
    mode: MovementMode,
    angle: i16,
    adjust: i8,
    speed: i16,
    accel: i16,
) {
    // Fold the step counter back into one revolution while at rest so
    // repeated directional moves cannot walk it toward overflow
    let folded = profile.position().rem_euclid(STEPS_PER_REV);
    profile.set_position(folded);

    profile.set_max_speed(speed.max(1) as u32);
    profile.set_acceleration(accel.max(1) as u32);

    if mode.is_adjust() {
        // Calibration trim: a small relative move, positive is clockwise
        profile.move_relative(adjust as i32 * STEPS_PER_DEGREE);
        return;
    }

    let current = step_angle(profile);
    let target = Angle::new(angle).offset(adjust as i16);
    let delta_degrees = match mode {
        MovementMode::MinDistance => current.shortest_arc(target) as i32,
        MovementMode::Clockwise => current.clockwise_delta(target) as i32,
        MovementMode::CounterClockwise => current.counterclockwise_delta(target) as i32,
        MovementMode::Clockwise2 => current.clockwise_delta(target) as i32 + 360,
        MovementMode::CounterClockwise2 => current.counterclockwise_delta(target) as i32 - 360,
        MovementMode::MaxDistance => longest_arc(current, target),
        MovementMode::MaxDistance2 => extend_revolution(longest_arc(current, target), 1),
        MovementMode::MaxDistance3 => extend_revolution(longest_arc(current, target), 2),
        // Handled above; the absolute path never sees a trim
        MovementMode::AdjustHand => return,
    };
    profile.move_relative(delta_degrees * STEPS_PER_DEGREE);
}

/// The long way around: opposite sense of the shortest arc, or a full
/// clockwise revolution when already on target.
fn longest_arc(current: Angle, target: Angle) -> i32 {
    let short = current.shortest_arc(target) as i32;
    if short == 0 {
        360
    } else if short > 0 {
        short - 360
    } else {
        short + 360
    }
}

fn extend_revolution(delta: i32, revolutions: i32) -> i32 {
    if delta >= 0 {
        delta + 360 * revolutions
    } else {
        delta - 360 * revolutions
    }
}
