//! Wall clock tracking for the master
//!
//! The master has no RTC; a control client sets the time and this
//! tracker advances it from the millisecond tick. Weekdays run Monday
//! = 0 through Sunday = 6. Until the first set the wheel reports
//! midnight Monday and raises no edges.

/// Seconds in a week.
const WEEK_SECONDS: u64 = 7 * 24 * 3600;

/// Boundaries crossed by one [`TimeWheel::update`] call.
///
/// Flags, not counts: a long blocking animation that spans several
/// boundaries still yields a single trigger opportunity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickEdges {
    /// The hour value changed
    pub hour_changed: bool,
    /// A half minute boundary (:00 or :30) passed
    pub half_minute: bool,
}

/// Monotonic wall clock derived from a millisecond timestamp.
#[derive(Debug)]
pub struct TimeWheel {
    anchor_ms: u64,
    second_of_week: u32,
    valid: bool,
}

impl Default for TimeWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeWheel {
    pub fn new() -> Self {
        Self {
            anchor_ms: 0,
            second_of_week: 0,
            valid: false,
        }
    }

    /// True once a control client has set the time.
    pub fn is_set(&self) -> bool {
        self.valid
    }

    /// Set the wall clock. Seconds restart at zero; out-of-range
    /// fields wrap into their domain. Raises no edges by itself.
    pub fn set(&mut self, weekday: u8, hour: u8, minute: u8, now_ms: u64) {
        let weekday = u32::from(weekday % 7);
        let hour = u32::from(hour % 24);
        let minute = u32::from(minute % 60);
        self.second_of_week = ((weekday * 24 + hour) * 60 + minute) * 60;
        self.anchor_ms = now_ms;
        self.valid = true;
    }

    /// Consume whole elapsed seconds and report crossed boundaries.
    pub fn update(&mut self, now_ms: u64) -> TickEdges {
        if !self.valid {
            return TickEdges::default();
        }
        let seconds = now_ms.saturating_sub(self.anchor_ms) / 1000;
        if seconds == 0 {
            return TickEdges::default();
        }
        self.anchor_ms += seconds * 1000;

        let before = u64::from(self.second_of_week);
        let after = before + seconds;
        self.second_of_week = (after % WEEK_SECONDS) as u32;

        TickEdges {
            hour_changed: after / 3600 != before / 3600,
            half_minute: after / 30 != before / 30,
        }
    }

    /// Weekday, Monday = 0.
    pub fn weekday(&self) -> u8 {
        (self.second_of_week / 86400) as u8
    }

    pub fn hour(&self) -> u8 {
        (self.second_of_week % 86400 / 3600) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.second_of_week % 3600 / 60) as u8
    }

    pub fn second(&self) -> u8 {
        (self.second_of_week % 60) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_wheel_stays_at_monday_midnight() {
        let mut wheel = TimeWheel::new();
        assert!(!wheel.is_set());
        assert_eq!(wheel.update(120_000), TickEdges::default());
        assert_eq!(
            (wheel.weekday(), wheel.hour(), wheel.minute()),
            (0, 0, 0)
        );
    }

    #[test]
    fn test_set_and_read_back() {
        let mut wheel = TimeWheel::new();
        wheel.set(3, 14, 25, 1_000);
        assert!(wheel.is_set());
        assert_eq!(wheel.weekday(), 3);
        assert_eq!(wheel.hour(), 14);
        assert_eq!(wheel.minute(), 25);
        assert_eq!(wheel.second(), 0);
    }

    #[test]
    fn test_update_advances_seconds_and_minutes() {
        let mut wheel = TimeWheel::new();
        wheel.set(0, 10, 59, 0);

        wheel.update(59_000);
        assert_eq!((wheel.minute(), wheel.second()), (59, 59));

        let edges = wheel.update(61_500);
        assert_eq!((wheel.hour(), wheel.minute(), wheel.second()), (11, 0, 1));
        assert!(edges.hour_changed);
        assert!(edges.half_minute);

        // The leftover 500 ms carries into the next update
        let edges = wheel.update(62_500);
        assert_eq!(wheel.second(), 2);
        assert!(!edges.hour_changed);
    }

    #[test]
    fn test_half_minute_edges() {
        let mut wheel = TimeWheel::new();
        wheel.set(0, 9, 0, 0);

        assert!(!wheel.update(29_000).half_minute);
        assert!(wheel.update(30_000).half_minute);
        assert!(!wheel.update(59_000).half_minute);
        assert!(wheel.update(60_000).half_minute);
    }

    #[test]
    fn test_hour_edge_only_on_hour_change() {
        let mut wheel = TimeWheel::new();
        wheel.set(0, 7, 58, 0);

        assert!(!wheel.update(60_000).hour_changed); // 7:59
        assert!(wheel.update(120_000).hour_changed); // 8:00
        assert!(!wheel.update(180_000).hour_changed); // 8:01
    }

    #[test]
    fn test_long_stall_yields_single_edge_flags() {
        let mut wheel = TimeWheel::new();
        wheel.set(0, 0, 0, 0);

        // Two hours pass in one update
        let edges = wheel.update(2 * 3600 * 1000);
        assert!(edges.hour_changed);
        assert!(edges.half_minute);
        assert_eq!(wheel.hour(), 2);
    }

    #[test]
    fn test_week_wraps_sunday_to_monday() {
        let mut wheel = TimeWheel::new();
        wheel.set(6, 23, 59, 0);

        wheel.update(60_000);
        assert_eq!((wheel.weekday(), wheel.hour(), wheel.minute()), (0, 0, 0));
    }

    #[test]
    fn test_set_raises_no_edges() {
        let mut wheel = TimeWheel::new();
        wheel.set(0, 10, 0, 0);
        wheel.update(1_000);
        wheel.set(0, 12, 0, 2_000);
        assert_eq!(wheel.update(2_500), TickEdges::default());
        assert_eq!(wheel.hour(), 12);
    }
}
