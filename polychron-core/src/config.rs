//! System configuration shared by the master's layers
//!
//! Everything a power cycle must not lose: the display mode, the
//! auto-play settings, the per-weekday sleep schedule and the designer
//! defaults. The firmware snapshots this struct to flash; the core
//! only defines the shape and the accessors.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::animation::DisplayMode;
use crate::choreo::{ChoreoName, MAX_CHOREOGRAPHIES};

/// When the choreography auto-trigger picks a document by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AutoMode {
    /// Never trigger
    #[default]
    Off = 0,
    /// Play only on explicit command
    Manual = 1,
    /// First enabled document, in store order
    Auto = 2,
    /// Uniformly random enabled document
    Random = 3,
}

impl AutoMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(AutoMode::Off),
            1 => Some(AutoMode::Manual),
            2 => Some(AutoMode::Auto),
            3 => Some(AutoMode::Random),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// How often the auto-trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum TriggerFrequency {
    /// On every hour change
    #[default]
    Hourly = 0,
    /// Twice a minute, on the half minute
    HalfMinute = 1,
}

impl TriggerFrequency {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(TriggerFrequency::Hourly),
            1 => Some(TriggerFrequency::HalfMinute),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// One bit per hour, per weekday, Monday first.
///
/// A set bit means the sculpture sleeps through that hour: hands
/// parked, drivers off. Bits 24..31 of each word stay clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SleepSchedule {
    hours: [u32; 7],
}

impl SleepSchedule {
    pub const fn new() -> Self {
        Self { hours: [0; 7] }
    }

    /// True when the given weekday and hour fall in a sleep window.
    /// Out-of-range coordinates are never asleep.
    pub fn is_asleep(&self, weekday: u8, hour: u8) -> bool {
        if weekday >= 7 || hour >= 24 {
            return false;
        }
        self.hours[usize::from(weekday)] & (1 << hour) != 0
    }

    /// Set or clear one hour. Out-of-range coordinates are ignored.
    pub fn set(&mut self, weekday: u8, hour: u8, asleep: bool) {
        if weekday >= 7 || hour >= 24 {
            return;
        }
        let bit = 1 << hour;
        if asleep {
            self.hours[usize::from(weekday)] |= bit;
        } else {
            self.hours[usize::from(weekday)] &= !bit;
        }
    }

    /// Replace a whole weekday's bitmap. Hours 24..31 are masked off.
    pub fn set_day(&mut self, weekday: u8, hours: u32) {
        if weekday < 7 {
            self.hours[usize::from(weekday)] = hours & 0x00FF_FFFF;
        }
    }

    pub fn day(&self, weekday: u8) -> u32 {
        if weekday < 7 {
            self.hours[usize::from(weekday)]
        } else {
            0
        }
    }
}

/// The master's persisted settings.
///
/// Choreographies are enabled by default; only the names the user
/// switched off are stored. A name that no longer exists in the store
/// simply never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemConfig {
    pub display_mode: DisplayMode,
    pub auto_mode: AutoMode,
    pub frequency: TriggerFrequency,
    pub sleep: SleepSchedule,
    disabled: Vec<ChoreoName, MAX_CHOREOGRAPHIES>,
    pub designer_speed: u16,
    pub designer_accel: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::default(),
            auto_mode: AutoMode::default(),
            frequency: TriggerFrequency::default(),
            sleep: SleepSchedule::new(),
            disabled: Vec::new(),
            designer_speed: 1000,
            designer_accel: 500,
        }
    }
}

impl SystemConfig {
    /// True unless the name was explicitly disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|entry| entry.as_str() == name)
    }

    /// Flip one name. Disabling past the set's capacity is dropped;
    /// a full set already covers every storable document.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        if enabled {
            self.disabled.retain(|entry| entry.as_str() != name);
        } else if self.is_enabled(name) {
            let mut owned = ChoreoName::new();
            if owned.push_str(name).is_ok() {
                let _ = self.disabled.push(owned);
            }
        }
    }

    /// Names the user switched off, in disable order.
    pub fn disabled_names(&self) -> impl Iterator<Item = &str> {
        self.disabled.iter().map(|name| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SystemConfig::default();
        assert_eq!(config.display_mode, DisplayMode::Lazy);
        assert_eq!(config.auto_mode, AutoMode::Off);
        assert_eq!(config.frequency, TriggerFrequency::Hourly);
        assert_eq!(config.designer_speed, 1000);
        assert_eq!(config.designer_accel, 500);
        assert!(config.is_enabled("anything"));
        assert!(!config.sleep.is_asleep(0, 0));
    }

    #[test]
    fn test_enable_toggle_roundtrip() {
        let mut config = SystemConfig::default();
        config.set_enabled("neon", false);
        assert!(!config.is_enabled("neon"));
        assert!(config.is_enabled("other"));

        // Disabling twice keeps a single entry
        config.set_enabled("neon", false);
        assert_eq!(config.disabled_names().count(), 1);

        config.set_enabled("neon", true);
        assert!(config.is_enabled("neon"));
        assert_eq!(config.disabled_names().count(), 0);
    }

    #[test]
    fn test_disable_set_capacity_is_bounded() {
        let mut config = SystemConfig::default();
        for i in 0..MAX_CHOREOGRAPHIES + 4 {
            let mut name = ChoreoName::new();
            name.push_str("name-").unwrap();
            name.push((b'a' + i as u8) as char).unwrap();
            config.set_enabled(name.as_str(), false);
        }
        assert_eq!(config.disabled_names().count(), MAX_CHOREOGRAPHIES);
    }

    #[test]
    fn test_sleep_schedule_bits() {
        let mut sleep = SleepSchedule::new();
        sleep.set(2, 23, true);
        assert!(sleep.is_asleep(2, 23));
        assert!(!sleep.is_asleep(2, 22));
        assert!(!sleep.is_asleep(3, 23));

        sleep.set(2, 23, false);
        assert!(!sleep.is_asleep(2, 23));
    }

    #[test]
    fn test_sleep_schedule_ignores_out_of_range() {
        let mut sleep = SleepSchedule::new();
        sleep.set(7, 0, true);
        sleep.set(0, 24, true);
        assert_eq!(sleep, SleepSchedule::new());
        assert!(!sleep.is_asleep(7, 0));
        assert!(!sleep.is_asleep(0, 24));
    }

    #[test]
    fn test_set_day_masks_high_bits() {
        let mut sleep = SleepSchedule::new();
        sleep.set_day(6, 0xFFFF_FFFF);
        assert_eq!(sleep.day(6), 0x00FF_FFFF);
        assert!(sleep.is_asleep(6, 0));
        assert!(sleep.is_asleep(6, 23));
    }
}
