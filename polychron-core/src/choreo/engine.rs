//! Choreography playback
//!
//! The player owns the current choreography and its playback state.
//! Keyframe advance is timed, not measured: the bus has no completion
//! signal, so each keyframe gets a conservative duration estimate and
//! the player moves on once it has elapsed. Dispatch goes through the
//! shared [`ClockGrid`] so every slot write consumes a fresh change
//! counter.
//!
//! A cascading keyframe blocks the caller between per-board sends.
//! That hold-up is intentional: the stagger is the visual effect, and
//! the single master context must not reorder it. The [`Pacer`] seam
//! lets the embedding keep its collaborators serviced during the wait.

use polychron_protocol::{ClockTargetState, BOARD_COUNT, CLOCKS_PER_BOARD};

use crate::choreo::cascade::{cascade_delay, CascadeMode};
use crate::choreo::model::{Choreography, Keyframe};
use crate::grid::ClockGrid;
use crate::traits::{ClockBus, Pacer};

/// Reference step distance for the transition estimate. Deliberately
/// conservative so slow hands settle before the next keyframe.
const ESTIMATE_REFERENCE_STEPS: u32 = 11520;

/// Fixed settle buffer added to every transition estimate, in ms.
const ESTIMATE_BUFFER_MS: u32 = 500;

/// Poll slice while waiting out cascade delays, in ms.
const CASCADE_POLL_MS: u32 = 10;

/// Playback state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Keyframe sequencer for the currently loaded choreography.
#[derive(Debug, Default)]
pub struct Player {
    current: Option<Choreography>,
    state: PlaybackState,
    index: usize,
    anchor_ms: u64,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current choreography and reset playback.
    pub fn load(&mut self, choreo: Choreography) {
        self.current = Some(choreo);
        self.state = PlaybackState::Stopped;
        self.index = 0;
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// The loaded choreography, if any.
    pub fn current(&self) -> Option<&Choreography> {
        self.current.as_ref()
    }

    /// Name of the loaded choreography, empty when none.
    pub fn name(&self) -> &str {
        self.current
            .as_ref()
            .map(|choreo| choreo.name.as_str())
            .unwrap_or("")
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn keyframe_index(&self) -> usize {
        self.index
    }

    pub fn keyframe_count(&self) -> usize {
        self.current
            .as_ref()
            .map(|choreo| choreo.keyframes.len())
            .unwrap_or(0)
    }

    /// Start playback from the first keyframe, or resume from pause.
    ///
    /// Resuming keeps the keyframe index and re-anchors its timer; the
    /// partially elapsed time before the pause is forgotten.
    pub fn play(
        &mut self,
        now_ms: u64,
        grid: &mut ClockGrid,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) {
        if self.keyframe_count() == 0 {
            return;
        }
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
            self.anchor_ms = now_ms;
        } else {
            self.index = 0;
            self.state = PlaybackState::Playing;
            self.anchor_ms = now_ms;
            self.apply_keyframe(0, grid, bus, pacer);
        }
    }

    /// Pause playback. Only meaningful while playing.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop playback and rewind to the first keyframe.
    ///
    /// Motion already dispatched to the boards runs to completion;
    /// stopping only halts further keyframe advance.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.index = 0;
    }

    /// Step to the next keyframe, wrapping, and apply it.
    ///
    /// Does not touch the playback state or the keyframe timer.
    pub fn next(
        &mut self,
        grid: &mut ClockGrid,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) {
        let count = self.keyframe_count();
        if count == 0 {
            return;
        }
        self.index = (self.index + 1) % count;
        self.apply_keyframe(self.index, grid, bus, pacer);
    }

    /// Step to the previous keyframe, wrapping, and apply it.
    pub fn prev(
        &mut self,
        grid: &mut ClockGrid,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) {
        let count = self.keyframe_count();
        if count == 0 {
            return;
        }
        self.index = if self.index == 0 {
            count - 1
        } else {
            self.index - 1
        };
        self.apply_keyframe(self.index, grid, bus, pacer);
    }

    /// Advance playback if the current keyframe's duration elapsed.
    ///
    /// Call this from the coordination loop. Dispatch of an advanced
    /// keyframe happens inside, including any blocking cascade.
    pub fn update(
        &mut self,
        now_ms: u64,
        grid: &mut ClockGrid,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let (duration, count, looping) = {
            let Some(choreo) = &self.current else { return };
            let Some(kf) = choreo.keyframes.get(self.index) else {
                return;
            };
            (
                Self::keyframe_duration_ms(kf),
                choreo.keyframes.len(),
                choreo.looping,
            )
        };

        if now_ms.saturating_sub(self.anchor_ms) < u64::from(duration) {
            return;
        }

        self.index += 1;
        if self.index >= count {
            if looping {
                self.index = 0;
            } else {
                self.state = PlaybackState::Stopped;
                self.index = count - 1;
                return;
            }
        }
        self.anchor_ms = now_ms;
        self.apply_keyframe(self.index, grid, bus, pacer);
    }

    /// Dispatch one keyframe to all boards without changing playback.
    ///
    /// Out-of-range indices are ignored. With a cascade mode set this
    /// blocks through the pacer until the last board has been sent.
    pub fn apply_keyframe(
        &mut self,
        index: usize,
        grid: &mut ClockGrid,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) {
        let Some(choreo) = &self.current else { return };
        let Some(kf) = choreo.keyframes.get(index) else {
            return;
        };
        dispatch_keyframe(kf, grid, bus, pacer);
    }

    /// Total time budget for one keyframe in milliseconds.
    ///
    /// Transition estimate plus the cascade tail plus the explicit
    /// post-delay. The estimate floors the speed at 1 so a degenerate
    /// document cannot divide by zero.
    pub fn keyframe_duration_ms(kf: &Keyframe) -> u32 {
        let speed = u32::from(kf.speed).max(1);
        let transition = (ESTIMATE_REFERENCE_STEPS / speed) * 1000 + ESTIMATE_BUFFER_MS;
        let cascade_tail = if kf.cascade_mode == CascadeMode::None {
            0
        } else {
            (BOARD_COUNT as u32 - 1) * u32::from(kf.cascade_delay_ms)
        };
        transition + cascade_tail + u32::from(kf.delay_ms)
    }
}

/// Stage and send every board of one keyframe.
///
/// Cascade `None` goes out back-to-back. Any other mode polls the
/// delay function in fixed slices and sends each board once its delay
/// has elapsed, reproducing the grid sweep exactly.
fn dispatch_keyframe(
    kf: &Keyframe,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    if kf.cascade_mode == CascadeMode::None {
        for board in 0..BOARD_COUNT {
            stage_and_send(kf, board, grid, bus);
        }
        return;
    }

    let mut sent = [false; BOARD_COUNT];
    let mut elapsed: u32 = 0;
    loop {
        let mut all_sent = true;
        for (board, done) in sent.iter_mut().enumerate() {
            if *done {
                continue;
            }
            // Row 0 stands in for the whole column; per-board stagger
            // is what the grid sweep needs
            let wait = cascade_delay(kf.cascade_mode, kf.cascade_delay_ms, board as u8, 0);
            if elapsed >= wait {
                stage_and_send(kf, board, grid, bus);
                *done = true;
            } else {
                all_sent = false;
            }
        }
        if all_sent {
            break;
        }
        pacer.pace(CASCADE_POLL_MS);
        elapsed += CASCADE_POLL_MS;
    }
}

fn stage_and_send(kf: &Keyframe, board: usize, grid: &mut ClockGrid, bus: &mut impl ClockBus) {
    let mut states = [ClockTargetState::default(); CLOCKS_PER_BOARD];
    for (row, state) in states.iter_mut().enumerate() {
        *state = kf.clocks[board][row].to_target(kf.speed, kf.accel);
    }
    grid.stage_board(board, &states);
    grid.send_board(board, bus);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::bus::RecordingBus;
    use crate::traits::pacer::RecordingPacer;

    fn plain_keyframe(speed: u16) -> Keyframe {
        Keyframe {
            speed,
            ..Keyframe::default()
        }
    }

    fn two_frames(looping: bool) -> Choreography {
        let mut choreo = Choreography::named("pair");
        choreo.looping = looping;
        let _ = choreo.keyframes.push(plain_keyframe(400));
        let _ = choreo.keyframes.push(plain_keyframe(400));
        choreo
    }

    struct Rig {
        grid: ClockGrid,
        bus: RecordingBus,
        pacer: RecordingPacer,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                grid: ClockGrid::new(),
                bus: RecordingBus::new(),
                pacer: RecordingPacer::new(),
            }
        }
    }

    #[test]
    fn test_play_applies_first_keyframe() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);

        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.keyframe_index(), 0);
        assert_eq!(rig.bus.sent.len(), 8);
    }

    #[test]
    fn test_play_without_choreography_is_noop() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);

        assert_eq!(player.state(), PlaybackState::Stopped);
        assert!(rig.bus.sent.is_empty());
    }

    #[test]
    fn test_pause_from_stopped_is_noop() {
        let mut player = Player::new();
        player.load(two_frames(false));
        player.pause();
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_resume_keeps_index_and_reanchors() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);

        let duration = u64::from(Player::keyframe_duration_ms(&plain_keyframe(400)));
        player.update(duration, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 1);

        player.pause();
        assert_eq!(player.state(), PlaybackState::Paused);
        let sends_at_pause = rig.bus.sent.len();

        // Resume keeps the index and does not re-dispatch
        player.play(duration + 100, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.keyframe_index(), 1);
        assert_eq!(rig.bus.sent.len(), sends_at_pause);

        // The keyframe timer restarted at the resume instant
        player.update(duration + 101, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.keyframe_index(), 1);
    }

    #[test]
    fn test_play_while_playing_restarts() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        let duration = u64::from(Player::keyframe_duration_ms(&plain_keyframe(400)));
        player.update(duration, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 1);

        player.play(duration + 5, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 0);
        assert_eq!(rig.bus.sent.len(), 24);
    }

    #[test]
    fn test_stop_rewinds_without_dispatch() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        let sends = rig.bus.sent.len();

        player.stop();
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(player.keyframe_index(), 0);
        assert_eq!(rig.bus.sent.len(), sends);
    }

    #[test]
    fn test_two_keyframe_walk_to_stopped() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));

        let duration = u64::from(Player::keyframe_duration_ms(&plain_keyframe(400)));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(rig.bus.sent.len(), 8);

        player.update(duration - 1, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 0);
        assert_eq!(rig.bus.sent.len(), 8);

        player.update(duration, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 1);
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(rig.bus.sent.len(), 16);

        player.update(duration * 2, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert_eq!(player.keyframe_index(), 1);
        assert_eq!(rig.bus.sent.len(), 16);
    }

    #[test]
    fn test_looping_wraps_to_first_keyframe() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(true));

        let duration = u64::from(Player::keyframe_duration_ms(&plain_keyframe(400)));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        player.update(duration, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        player.update(duration * 2, &mut rig.grid, &mut rig.bus, &mut rig.pacer);

        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.keyframe_index(), 0);
        assert_eq!(rig.bus.sent.len(), 24);
    }

    #[test]
    fn test_next_prev_wrap_and_apply() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));

        player.next(&mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 1);
        assert_eq!(rig.bus.sent.len(), 8);

        player.next(&mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 0);

        player.prev(&mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert_eq!(player.keyframe_index(), 1);
        assert_eq!(rig.bus.sent.len(), 24);
        // Stepping never touches the playback state
        assert_eq!(player.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_apply_out_of_range_ignored() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.apply_keyframe(5, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert!(rig.bus.sent.is_empty());
    }

    #[test]
    fn test_dispatch_consumes_fresh_counters() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);

        // 8 boards x 3 slots, one counter each
        assert_eq!(rig.grid.slot_counter(0, 0), 1);
        assert_eq!(rig.grid.slot_counter(7, 2), 24);
        let message = rig.bus.for_board(7).next().unwrap();
        assert_eq!(message.counters, [22, 23, 24]);
    }

    #[test]
    fn test_cascade_column_orders_boards_and_paces() {
        let mut player = Player::new();
        let mut rig = Rig::new();

        let mut choreo = Choreography::named("sweep");
        let mut kf = plain_keyframe(400);
        kf.cascade_mode = CascadeMode::Column;
        kf.cascade_delay_ms = 100;
        let _ = choreo.keyframes.push(kf);
        player.load(choreo);

        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);

        assert_eq!(rig.bus.sent.len(), 8);
        for (expected, (board, _)) in rig.bus.sent.iter().enumerate() {
            assert_eq!(*board as usize, expected);
        }
        // 700 ms tail walked in 10 ms slices
        assert_eq!(rig.pacer.total_ms(), 700);
        assert_eq!(rig.pacer.waits.len(), 70);
        assert!(rig.pacer.waits.iter().all(|ms| *ms == 10));
    }

    #[test]
    fn test_cascade_none_never_paces() {
        let mut player = Player::new();
        let mut rig = Rig::new();
        player.load(two_frames(false));
        player.play(0, &mut rig.grid, &mut rig.bus, &mut rig.pacer);
        assert!(rig.pacer.waits.is_empty());
    }

    #[test]
    fn test_duration_math() {
        let mut kf = plain_keyframe(400);
        assert_eq!(Player::keyframe_duration_ms(&kf), 28_500);

        kf.delay_ms = 250;
        assert_eq!(Player::keyframe_duration_ms(&kf), 28_750);

        kf.cascade_mode = CascadeMode::Column;
        kf.cascade_delay_ms = 100;
        assert_eq!(Player::keyframe_duration_ms(&kf), 29_450);

        // The tail counts for every cascade mode, not just column
        kf.cascade_mode = CascadeMode::Ripple;
        assert_eq!(Player::keyframe_duration_ms(&kf), 29_450);

        // Degenerate speed floors at 1 instead of dividing by zero
        kf = plain_keyframe(0);
        assert_eq!(Player::keyframe_duration_ms(&kf), 11_520_500);
    }
}
