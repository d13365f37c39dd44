//! One slave board: three clocks, six motors, a bus address
//!
//! The board separates message reception from motion. Reception
//! latches the newest target per clock slot; the motion context polls
//! the latches and applies a slot only when its change counter differs
//! from the last applied one and the clock is idle. Intermediate
//! targets overwritten in the latch are skipped by design: only the
//! newest value, identified by the monotonically increasing counter,
//! is ever applied.
//!
//! On hardware the latches live behind per-slot critical sections so
//! the reception context never blocks on motion. Motion itself runs
//! lock free over data this struct owns.

use polychron_protocol::{ClockTargetState, Hand, HalfDigit, CLOCKS_PER_BOARD};

use crate::motion::{ClockUnit, Direction};

/// Newest received target for one clock slot.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetSlot {
    pub state: ClockTargetState,
    pub counter: u32,
}

/// One addressable slave board.
#[derive(Debug)]
pub struct Board {
    address: u8,
    clocks: [ClockUnit; CLOCKS_PER_BOARD],
    pending: [TargetSlot; CLOCKS_PER_BOARD],
    applied: [u32; CLOCKS_PER_BOARD],
    drivers_on: bool,
    disable_when_idle: bool,
}

impl Board {
    /// Create a board with all clocks parked and drivers live.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            clocks: [ClockUnit::new(), ClockUnit::new(), ClockUnit::new()],
            pending: [TargetSlot::default(); CLOCKS_PER_BOARD],
            applied: [0; CLOCKS_PER_BOARD],
            // Boards power up live; the master only sends driver
            // commands around parks
            drivers_on: true,
            disable_when_idle: false,
        }
    }

    /// Bus address derived from the four strap pins.
    ///
    /// Straps are pull-ups: an open pin reads high and contributes 0,
    /// a jumpered pin reads low and sets its bit.
    pub fn address_from_straps(straps: [bool; 4]) -> u8 {
        let mut address = 0;
        for (bit, &level) in straps.iter().enumerate() {
            if !level {
                address |= 1 << bit;
            }
        }
        address
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Latch an entire received message, newest value per slot.
    ///
    /// Reception context only. Never touches the motors.
    pub fn receive(&mut self, message: &HalfDigit) {
        for slot in 0..CLOCKS_PER_BOARD {
            self.latch_slot(
                slot,
                TargetSlot {
                    state: message.clocks[slot],
                    counter: message.counters[slot],
                },
            );
        }
    }

    /// Latch one slot's newest target.
    pub fn latch_slot(&mut self, slot: usize, target: TargetSlot) {
        if slot < CLOCKS_PER_BOARD {
            self.pending[slot] = target;
        }
    }

    /// Apply latched targets where the counter changed and the clock
    /// is idle. Motion context only. Returns how many slots applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        for slot in 0..CLOCKS_PER_BOARD {
            let target = self.pending[slot];
            if self.try_apply_slot(slot, &target.state, target.counter) {
                applied += 1;
            }
        }
        if self.disable_when_idle && !self.is_running() {
            self.drivers_on = false;
            self.disable_when_idle = false;
        }
        applied
    }

    /// Apply one target if its counter is new and the clock is idle.
    pub fn try_apply_slot(&mut self, slot: usize, state: &ClockTargetState, counter: u32) -> bool {
        if slot >= CLOCKS_PER_BOARD {
            return false;
        }
        if counter == self.applied[slot] {
            return false;
        }
        if self.clocks[slot].is_running() {
            return false;
        }
        self.clocks[slot].apply(state);
        self.applied[slot] = counter;
        true
    }

    /// Advance all six motors, emitting step edges.
    pub fn run<F: FnMut(usize, Hand, Direction)>(&mut self, now_us: u64, mut emit: F) {
        for (slot, clock) in self.clocks.iter_mut().enumerate() {
            if let Some(edge) = clock.run_hour(now_us) {
                emit(slot, Hand::Hour, edge);
            }
            if let Some(edge) = clock.run_minute(now_us) {
                emit(slot, Hand::Minute, edge);
            }
        }
    }

    /// Switch driver power. A disable while motors run is deferred
    /// until the board goes idle.
    pub fn set_drivers(&mut self, on: bool) {
        if on {
            self.drivers_on = true;
            self.disable_when_idle = false;
        } else if self.is_running() {
            self.disable_when_idle = true;
        } else {
            self.drivers_on = false;
            self.disable_when_idle = false;
        }
    }

    /// Current driver power state for the enable pin.
    pub fn drivers_on(&self) -> bool {
        self.drivers_on
    }

    /// True while any of the three clocks has distance left.
    pub fn is_running(&self) -> bool {
        self.clocks.iter().any(|clock| clock.is_running())
    }

    pub fn clock(&self, slot: usize) -> Option<&ClockUnit> {
        self.clocks.get(slot)
    }
}
