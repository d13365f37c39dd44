//! Per-motor trapezoidal motion profile
//!
//! Converts a signed step target into a pulse train with bounded
//! acceleration and bounded velocity, using the integer ramp
//! approximation from David Austin's "Generate stepper-motor speed
//! profiles in real time" (Embedded Systems Programming, 2005):
//!
//! - first interval `c0 = 0.676 * sqrt(2 / accel)` seconds
//! - successive intervals `c(n) = c(n-1) - 2*c(n-1) / (4*n + 1)`
//! - cruise interval floor `cmin = 1_000_000 / max_speed` microseconds
//!
//! All arithmetic is integer; the only state shared with the caller is
//! the step edge returned from [`StepperProfile::run`].

/// Rotation sense of a single step pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Trapezoidal profile for one stepper motor.
///
/// Position is the accumulated step count; there is no feedback.
/// Speeds are in steps/second, accelerations in steps/second².
#[derive(Debug, Clone)]
pub struct StepperProfile {
    position: i32,
    target: i32,
    max_speed_sps: u32,
    accel_sps2: u32,
    /// Ramp index: positive while accelerating, negative while braking.
    ramp_step: i32,
    c0_us: u32,
    cn_us: u32,
    cmin_us: u32,
    /// Microseconds between steps; 0 means no step is scheduled.
    step_interval_us: u32,
    speed_sps: u32,
    direction: Direction,
    last_step_at_us: u64,
}

impl StepperProfile {
    /// Create a profile at position 0 with the given limits.
    ///
    /// Speed and acceleration are clamped to at least 1.
    pub fn new(max_speed_sps: u32, accel_sps2: u32) -> Self {
        let speed = max_speed_sps.max(1);
        let accel = accel_sps2.max(1);
        Self {
            position: 0,
            target: 0,
            max_speed_sps: speed,
            accel_sps2: accel,
            ramp_step: 0,
            c0_us: first_interval_us(accel),
            cn_us: 0,
            cmin_us: (1_000_000 / speed).max(1),
            step_interval_us: 0,
            speed_sps: 0,
            direction: Direction::Clockwise,
            last_step_at_us: 0,
        }
    }

    /// Change the velocity ceiling. Takes effect mid-move.
    pub fn set_max_speed(&mut self, max_speed_sps: u32) {
        let speed = max_speed_sps.max(1);
        if self.max_speed_sps == speed {
            return;
        }
        self.max_speed_sps = speed;
        self.cmin_us = (1_000_000 / speed).max(1);
        if self.ramp_step > 0 {
            // Re-derive the ramp index from the current speed so the
            // in-flight move adopts the new ceiling
            self.ramp_step = (self.speed_sps as u64 * self.speed_sps as u64
                / (2 * self.accel_sps2 as u64)) as i32;
            self.compute_new_speed();
        }
    }

    /// Change the acceleration limit. Takes effect mid-move.
    pub fn set_acceleration(&mut self, accel_sps2: u32) {
        let accel = accel_sps2.max(1);
        if self.accel_sps2 == accel {
            return;
        }
        // Rescale the ramp index onto the new curve
        self.ramp_step = (self.ramp_step as i64 * self.accel_sps2 as i64 / accel as i64) as i32;
        self.c0_us = first_interval_us(accel);
        self.accel_sps2 = accel;
        self.compute_new_speed();
    }

    /// Set an absolute step target.
    pub fn move_to(&mut self, target: i32) {
        if self.target != target {
            self.target = target;
            self.compute_new_speed();
        }
    }

    /// Set a target relative to the current position.
    pub fn move_relative(&mut self, delta: i32) {
        self.move_to(self.position + delta);
    }

    /// Overwrite the position belief. Cancels any scheduled motion.
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
        self.target = position;
        self.ramp_step = 0;
        self.step_interval_us = 0;
        self.speed_sps = 0;
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    /// Signed steps remaining to the target.
    pub fn distance_to_go(&self) -> i32 {
        self.target - self.position
    }

    /// True while a move is scheduled or steps remain.
    pub fn is_moving(&self) -> bool {
        self.step_interval_us != 0 || self.distance_to_go() != 0
    }

    /// Current speed magnitude in steps/second.
    pub fn speed_sps(&self) -> u32 {
        self.speed_sps
    }

    /// Microseconds until the next step; 0 when no step is scheduled.
    pub fn step_interval_us(&self) -> u32 {
        self.step_interval_us
    }

    /// Advance the profile. Returns the edge to emit when a step is due.
    ///
    /// `now_us` must be monotonic. Call as often as possible; the
    /// profile paces itself from the step interval.
    pub fn run(&mut self, now_us: u64) -> Option<Direction> {
        if self.step_interval_us == 0 {
            return None;
        }
        if now_us.wrapping_sub(self.last_step_at_us) < self.step_interval_us as u64 {
            return None;
        }
        match self.direction {
            Direction::Clockwise => self.position += 1,
            Direction::CounterClockwise => self.position -= 1,
        }
        self.last_step_at_us = now_us;
        let edge = self.direction;
        self.compute_new_speed();
        Some(edge)
    }

    /// Recompute the step interval after a step or a retarget.
    fn compute_new_speed(&mut self) {
        let distance = self.distance_to_go();
        let steps_to_stop = (self.speed_sps as u64 * self.speed_sps as u64
            / (2 * self.accel_sps2 as u64)) as i32;

        if distance == 0 && steps_to_stop <= 1 {
            // At the target and slow enough to hold
            self.step_interval_us = 0;
            self.speed_sps = 0;
            self.ramp_step = 0;
            return;
        }

        if distance > 0 {
            // Target is ahead in the clockwise sense
            if self.ramp_step > 0 {
                if steps_to_stop >= distance || self.direction == Direction::CounterClockwise {
                    self.ramp_step = -steps_to_stop;
                }
            } else if self.ramp_step < 0
                && steps_to_stop < distance
                && self.direction == Direction::Clockwise
            {
                self.ramp_step = -self.ramp_step;
            }
        } else if distance < 0 {
            if self.ramp_step > 0 {
                if steps_to_stop >= -distance || self.direction == Direction::Clockwise {
                    self.ramp_step = -steps_to_stop;
                }
            } else if self.ramp_step < 0
                && steps_to_stop < -distance
                && self.direction == Direction::CounterClockwise
            {
                self.ramp_step = -self.ramp_step;
            }
        }

        if self.ramp_step == 0 {
            // First step from rest
            self.cn_us = self.c0_us;
            self.direction = if distance > 0 {
                Direction::Clockwise
            } else {
                Direction::CounterClockwise
            };
        } else {
            let cn = self.cn_us as i64;
            let next = cn - (2 * cn) / (4 * self.ramp_step as i64 + 1);
            self.cn_us = next.max(self.cmin_us as i64) as u32;
        }
        self.ramp_step += 1;
        self.step_interval_us = self.cn_us;
        self.speed_sps = 1_000_000 / self.cn_us;
    }
}

/// First ramp interval in microseconds: `0.676 * sqrt(2 / accel)` seconds.
fn first_interval_us(accel_sps2: u32) -> u32 {
    let scaled = 2_000_000_000_000u64 / accel_sps2 as u64;
    (676 * isqrt_u64(scaled) / 1000) as u32
}

fn isqrt_u64(value: u64) -> u64 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}
