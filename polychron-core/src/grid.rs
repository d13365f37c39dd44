//! Master-side grid state and dispatch
//!
//! The master keeps one [`TargetSlot`] per clock as its belief of what
//! each board was last told. Staging a slot consumes a fresh change
//! counter from a single master-wide sequence; sending a board builds
//! its half-digit from the staged slots. Slots not staged since the
//! last send go out with their old counter, which the board's dedup
//! gate skips, so a partial stage moves only the touched clocks.

use polychron_protocol::{ClockTargetState, HalfDigit, BOARD_COUNT, CLOCKS_PER_BOARD};

use crate::board::TargetSlot;
use crate::motion::INIT_HANDS_ANGLE;
use crate::traits::ClockBus;

/// Dispatch state for the full 8x3 grid.
#[derive(Debug)]
pub struct ClockGrid {
    next_counter: u32,
    slots: [[TargetSlot; CLOCKS_PER_BOARD]; BOARD_COUNT],
}

impl ClockGrid {
    /// Create a grid believing every hand is at the power-up angle.
    pub fn new() -> Self {
        let state = ClockTargetState {
            angle_h: INIT_HANDS_ANGLE,
            angle_m: INIT_HANDS_ANGLE,
            ..ClockTargetState::default()
        };
        Self {
            next_counter: 0,
            slots: [[TargetSlot { state, counter: 0 }; CLOCKS_PER_BOARD]; BOARD_COUNT],
        }
    }

    /// Stage one clock target, consuming a fresh change counter.
    pub fn stage(&mut self, board: usize, clock: usize, state: ClockTargetState) {
        if board >= BOARD_COUNT || clock >= CLOCKS_PER_BOARD {
            return;
        }
        self.next_counter = self.next_counter.wrapping_add(1);
        self.slots[board][clock] = TargetSlot {
            state,
            counter: self.next_counter,
        };
    }

    /// Stage all three clocks of one board.
    pub fn stage_board(&mut self, board: usize, states: &[ClockTargetState; CLOCKS_PER_BOARD]) {
        for (clock, state) in states.iter().enumerate() {
            self.stage(board, clock, *state);
        }
    }

    /// Send one board's half-digit as currently staged.
    pub fn send_board<B: ClockBus>(&self, board: usize, bus: &mut B) {
        if board >= BOARD_COUNT {
            return;
        }
        bus.send_half_digit(board as u8, &self.half_digit(board));
    }

    /// Send every board back-to-back.
    pub fn send_all<B: ClockBus>(&self, bus: &mut B) {
        for board in 0..BOARD_COUNT {
            self.send_board(board, bus);
        }
    }

    /// The message a send would carry for this board.
    pub fn half_digit(&self, board: usize) -> HalfDigit {
        let mut message = HalfDigit::default();
        for clock in 0..CLOCKS_PER_BOARD {
            message.clocks[clock] = self.slots[board][clock].state;
            message.counters[clock] = self.slots[board][clock].counter;
        }
        message
    }

    /// Last staged state for one clock (the master's belief).
    pub fn slot_state(&self, board: usize, clock: usize) -> ClockTargetState {
        self.slots[board][clock].state
    }

    /// Last counter consumed for one clock.
    pub fn slot_counter(&self, board: usize, clock: usize) -> u32 {
        self.slots[board][clock].counter
    }
}

impl Default for ClockGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::bus::RecordingBus;
    use polychron_protocol::MovementMode;

    fn pose(angle: i16) -> ClockTargetState {
        ClockTargetState {
            angle_h: angle,
            angle_m: angle,
            speed_h: 400,
            speed_m: 400,
            accel_h: 150,
            accel_m: 150,
            mode_h: MovementMode::MinDistance,
            mode_m: MovementMode::MinDistance,
            adjust_h: 0,
            adjust_m: 0,
        }
    }

    #[test]
    fn test_initial_belief_is_parked() {
        let grid = ClockGrid::new();
        assert_eq!(grid.slot_state(0, 0).angle_h, 270);
        assert_eq!(grid.slot_state(7, 2).angle_m, 270);
        assert_eq!(grid.slot_counter(4, 1), 0);
    }

    #[test]
    fn test_stage_consumes_fresh_counters() {
        let mut grid = ClockGrid::new();
        grid.stage(0, 0, pose(90));
        grid.stage(0, 1, pose(90));
        grid.stage(3, 2, pose(180));
        assert_eq!(grid.slot_counter(0, 0), 1);
        assert_eq!(grid.slot_counter(0, 1), 2);
        assert_eq!(grid.slot_counter(3, 2), 3);
        assert_eq!(grid.slot_state(3, 2).angle_h, 180);
    }

    #[test]
    fn test_send_board_carries_staged_slots() {
        let mut grid = ClockGrid::new();
        let mut bus = RecordingBus::new();
        grid.stage_board(2, &[pose(0), pose(90), pose(180)]);
        grid.send_board(2, &mut bus);

        assert_eq!(bus.sent.len(), 1);
        let (board, message) = &bus.sent[0];
        assert_eq!(*board, 2);
        assert_eq!(message.clocks[1].angle_h, 90);
        assert_eq!(message.counters, [1, 2, 3]);
    }

    #[test]
    fn test_partial_stage_keeps_stale_counters() {
        let mut grid = ClockGrid::new();
        let mut bus = RecordingBus::new();
        grid.stage_board(0, &[pose(0), pose(0), pose(0)]);
        grid.send_board(0, &mut bus);

        // Touch only the middle clock; the others must re-send with
        // their previous counters so the board skips them
        grid.stage(0, 1, pose(270));
        grid.send_board(0, &mut bus);

        let second = &bus.sent[1].1;
        assert_eq!(second.counters[0], 1);
        assert_eq!(second.counters[1], 4);
        assert_eq!(second.counters[2], 3);
        assert_eq!(second.clocks[0].angle_h, 0);
        assert_eq!(second.clocks[1].angle_h, 270);
    }

    #[test]
    fn test_send_all_hits_every_board() {
        let grid = ClockGrid::new();
        let mut bus = RecordingBus::new();
        grid.send_all(&mut bus);
        assert_eq!(bus.sent.len(), 8);
        for (expected, (board, _)) in bus.sent.iter().enumerate() {
            assert_eq!(*board as usize, expected);
        }
    }

    #[test]
    fn test_out_of_range_stage_ignored() {
        let mut grid = ClockGrid::new();
        grid.stage(8, 0, pose(0));
        grid.stage(0, 3, pose(0));
        assert_eq!(grid.slot_counter(0, 0), 0);
        let mut bus = RecordingBus::new();
        grid.send_board(9, &mut bus);
        assert!(bus.sent.is_empty());
    }
}
