//! Minute driven dispatch of the display animations
//!
//! Every animation is a short sequence of grid poses that settles on
//! the current time. Waits between poses go through the [`Pacer`] so
//! the surrounding loop keeps servicing its other work while the
//! sculpture moves. Sends are fire and forget; the boards catch up
//! through their change counters.

use polychron_protocol::{ClockTargetState, MovementMode};

use crate::animation::shapes::{self, ColumnShape, GridShape, HandPair};
use crate::animation::DisplayMode;
use crate::grid::ClockGrid;
use crate::rand::XorShift32;
use crate::traits::{ClockBus, Pacer};

/// Settle time after powering the drivers back up.
const DRIVER_WAKE_MS: u32 = 500;

/// Sweep parameters shared by every clock of one phase.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    speed: i16,
    accel: i16,
    mode: MovementMode,
}

impl Sweep {
    const fn new(speed: i16, accel: i16, mode: MovementMode) -> Self {
        Self { speed, accel, mode }
    }

    fn target(self, hands: HandPair) -> ClockTargetState {
        ClockTargetState {
            angle_h: hands.0,
            angle_m: hands.1,
            speed_h: self.speed,
            speed_m: self.speed,
            accel_h: self.accel,
            accel_m: self.accel,
            mode_h: self.mode,
            mode_m: self.mode,
            adjust_h: 0,
            adjust_m: 0,
        }
    }
}

/// Drives the face from wall clock readings.
///
/// Tracks the last shown reading so a dispatch happens exactly once
/// per minute change, and the park state so drivers are powered up
/// with a settle delay before the first command after a park.
#[derive(Debug)]
pub struct Dispatcher {
    parked: bool,
    shown: Option<(u8, u8)>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            parked: false,
            shown: None,
        }
    }

    /// True after a park, until the next dispatch wakes the drivers.
    pub fn is_parked(&self) -> bool {
        self.parked
    }

    /// Drive the face for the current reading. Call once per tick.
    ///
    /// Mode `Off` or an active sleep window parks the hands. Otherwise
    /// a changed hour or minute plays the active mode's phases, ending
    /// on the time. Returns true when a dispatch ran.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        mode: DisplayMode,
        hour: u8,
        minute: u8,
        asleep: bool,
        rng: &mut XorShift32,
        grid: &mut ClockGrid,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) -> bool {
        if mode == DisplayMode::Off || asleep {
            self.park(grid, bus);
            return false;
        }
        if self.shown == Some((hour, minute)) {
            return false;
        }
        self.wake(bus, pacer);
        self.shown = Some((hour, minute));

        match mode {
            DisplayMode::Lazy => lazy(hour, minute, grid, bus),
            DisplayMode::Fun => fun(hour, minute, grid, bus),
            DisplayMode::Waves => waves(hour, minute, grid, bus, pacer),
            DisplayMode::Spinning => spinning(hour, minute, grid, bus, pacer),
            DisplayMode::Squares => squares(hour, minute, grid, bus, pacer),
            DisplayMode::Symmetrical => symmetrical(hour, minute, grid, bus, pacer),
            DisplayMode::Wind => wind(hour, minute, grid, bus, pacer),
            DisplayMode::Cascade => cascade(hour, minute, grid, bus, pacer),
            DisplayMode::Firework => firework(hour, minute, grid, bus, pacer),
            DisplayMode::Obliques => obliques(hour, minute, grid, bus, pacer),
            DisplayMode::Ripple => ripple(hour, minute, grid, bus, pacer),
            DisplayMode::Breathe => breathe(hour, minute, grid, bus, pacer),
            DisplayMode::Rain => rain(hour, minute, grid, bus, pacer),
            DisplayMode::Heartbeat => heartbeat(hour, minute, grid, bus, pacer),
            DisplayMode::Dance => dance(hour, minute, rng, grid, bus, pacer),
            DisplayMode::Off => {}
        }
        true
    }

    /// Power the drivers back up if a park turned them off.
    ///
    /// Waits out the driver settle time before returning so the first
    /// command after the wake is not stepped on a half-awake driver.
    pub fn wake(&mut self, bus: &mut impl ClockBus, pacer: &mut impl Pacer) {
        if self.parked {
            bus.send_drivers(true);
            pacer.pace(DRIVER_WAKE_MS);
            self.parked = false;
        }
    }

    /// Forget the last shown reading so the next tick redraws.
    ///
    /// Called on a display mode switch: the new mode should play its
    /// sequence right away instead of waiting for the minute to roll.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    /// Park every hand in the rest pose and power the drivers down.
    ///
    /// The boards hold the disable until their motors go idle. Only
    /// the first call after a dispatch sends anything.
    pub fn park(&mut self, grid: &mut ClockGrid, bus: &mut impl ClockBus) {
        if self.parked {
            return;
        }
        self.parked = true;
        self.shown = None;
        show_shape(
            grid,
            bus,
            &shapes::REST,
            Sweep::new(200, 100, MovementMode::MinDistance),
        );
        bus.send_drivers(false);
    }
}

fn stage_column(grid: &mut ClockGrid, board: usize, column: &ColumnShape, sweep: Sweep) {
    let targets = [
        sweep.target(column[0]),
        sweep.target(column[1]),
        sweep.target(column[2]),
    ];
    grid.stage_board(board, &targets);
}

fn show_shape(grid: &mut ClockGrid, bus: &mut impl ClockBus, shape: &GridShape, sweep: Sweep) {
    for (board, column) in shape.iter().enumerate() {
        stage_column(grid, board, column, sweep);
    }
    grid.send_all(bus);
}

fn show_time(grid: &mut ClockGrid, bus: &mut impl ClockBus, hour: u8, minute: u8, sweep: Sweep) {
    show_shape(grid, bus, &shapes::time_grid(hour, minute), sweep);
}

fn lazy(hour: u8, minute: u8, grid: &mut ClockGrid, bus: &mut impl ClockBus) {
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(200, 100, MovementMode::MinDistance),
    );
}

fn fun(hour: u8, minute: u8, grid: &mut ClockGrid, bus: &mut impl ClockBus) {
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(400, 150, MovementMode::Clockwise2),
    );
}

/// Vertical bars, then the time revealed one column at a time.
fn waves(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    show_shape(
        grid,
        bus,
        &shapes::BARS,
        Sweep::new(800, 150, MovementMode::MinDistance),
    );
    pacer.pace(9000);

    let sweep = Sweep::new(400, 100, MovementMode::Clockwise2);
    let time = shapes::time_grid(hour, minute);
    for (board, column) in time.iter().enumerate() {
        stage_column(grid, board, column, sweep);
        grid.send_board(board, bus);
        pacer.pace(400);
    }
}

fn spinning(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(1500, 800, MovementMode::Clockwise);
    show_shape(grid, bus, &shapes::SPIN_UP, sweep);
    pacer.pace(3000);
    show_shape(grid, bus, &shapes::SPIN_DOWN, sweep);
    pacer.pace(3000);
    show_shape(grid, bus, &shapes::SPIN_UP, sweep);
    pacer.pace(3000);
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
}

fn squares(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    show_shape(
        grid,
        bus,
        &shapes::SQUARES,
        Sweep::new(1200, 600, MovementMode::MinDistance),
    );
    pacer.pace(4000);
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
}

fn symmetrical(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(1000, 500, MovementMode::MinDistance);
    show_shape(grid, bus, &shapes::SYMMETRY_OUT, sweep);
    pacer.pace(3000);
    show_shape(grid, bus, &shapes::SYMMETRY_IN, sweep);
    pacer.pace(3000);
    show_time(grid, bus, hour, minute, sweep);
}

fn wind(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(800, 400, MovementMode::MinDistance);
    show_shape(grid, bus, &shapes::WIND_1, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::WIND_2, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::WIND_3, sweep);
    pacer.pace(2500);
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
}

/// Reveal the time row by row from the top.
///
/// Unrevealed rows ride along in each send with their stale change
/// counters, so the boards leave those hands untouched. The final
/// full-grid send refreshes every counter and recovers any frame the
/// bus may have dropped during the reveal.
fn cascade(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let time = shapes::time_grid(hour, minute);
    let sweep = Sweep::new(1200, 600, MovementMode::Clockwise);

    for (board, column) in time.iter().enumerate() {
        grid.stage(board, 0, sweep.target(column[0]));
        grid.send_board(board, bus);
    }
    pacer.pace(1500);

    for (board, column) in time.iter().enumerate() {
        grid.stage(board, 0, sweep.target(column[0]));
        grid.stage(board, 1, sweep.target(column[1]));
        grid.send_board(board, bus);
    }
    pacer.pace(1500);

    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1200, 600, MovementMode::MinDistance),
    );
}

/// Collapse to the rest pose, then burst ring by ring from the center.
fn firework(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    show_shape(
        grid,
        bus,
        &shapes::REST,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
    pacer.pace(2000);

    let sweep = Sweep::new(2000, 1000, MovementMode::Clockwise);
    let rings: [([usize; 2], u32); 4] =
        [([3, 4], 400), ([2, 5], 400), ([1, 6], 400), ([0, 7], 2000)];
    for (pair, wait) in rings {
        for board in pair {
            stage_column(grid, board, &shapes::FIREWORK[board], sweep);
            grid.send_board(board, bus);
        }
        pacer.pace(wait);
    }

    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
}

fn obliques(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(1000, 500, MovementMode::Clockwise);
    show_shape(grid, bus, &shapes::OBLIQUES_BR, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::OBLIQUES_BL, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::OBLIQUES_TR, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::OBLIQUES_TL, sweep);
    pacer.pace(2500);
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
}

fn ripple(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(1200, 600, MovementMode::MinDistance);
    show_shape(grid, bus, &shapes::RIPPLE_OUT, sweep);
    pacer.pace(3000);
    show_shape(grid, bus, &shapes::RIPPLE_IN, sweep);
    pacer.pace(3000);
    show_shape(grid, bus, &shapes::RIPPLE_OUT, sweep);
    pacer.pace(3000);
    show_time(grid, bus, hour, minute, sweep);
}

fn breathe(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(800, 400, MovementMode::MinDistance);
    show_shape(grid, bus, &shapes::BREATHE_EXPAND, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::BREATHE_CONTRACT, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::BREATHE_NEUTRAL, sweep);
    pacer.pace(2000);
    show_shape(grid, bus, &shapes::BREATHE_EXPAND, sweep);
    pacer.pace(2500);
    show_shape(grid, bus, &shapes::BREATHE_CONTRACT, sweep);
    pacer.pace(2500);
    show_time(grid, bus, hour, minute, sweep);
}

fn rain(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(1500, 800, MovementMode::Clockwise);
    show_shape(grid, bus, &shapes::RAIN_1, sweep);
    pacer.pace(1500);
    show_shape(grid, bus, &shapes::RAIN_2, sweep);
    pacer.pace(1500);
    show_shape(grid, bus, &shapes::RAIN_3, sweep);
    pacer.pace(1500);
    show_shape(grid, bus, &shapes::RAIN_SPLASH, sweep);
    pacer.pace(2000);
    show_shape(grid, bus, &shapes::RAIN_1, sweep);
    pacer.pace(1500);
    show_shape(grid, bus, &shapes::RAIN_2, sweep);
    pacer.pace(1500);
    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1500, 800, MovementMode::MinDistance),
    );
}

/// Two full beats and a final contraction, pulse trace style.
fn heartbeat(
    hour: u8,
    minute: u8,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let sweep = Sweep::new(1800, 900, MovementMode::MinDistance);
    for _ in 0..2 {
        show_shape(grid, bus, &shapes::HEART_SYSTOLE, sweep);
        pacer.pace(300);
        show_shape(grid, bus, &shapes::HEART_DIASTOLE, sweep);
        pacer.pace(600);
        show_shape(grid, bus, &shapes::HEART_PEAK, sweep);
        pacer.pace(200);
        show_shape(grid, bus, &shapes::HEART_DIASTOLE, sweep);
        pacer.pace(800);
    }
    show_shape(grid, bus, &shapes::HEART_SYSTOLE, sweep);
    pacer.pace(300);
    show_shape(grid, bus, &shapes::HEART_DIASTOLE, sweep);
    pacer.pace(1000);
    show_time(grid, bus, hour, minute, sweep);
}

/// Chain two to four random shapes, no immediate repeats.
fn dance(
    hour: u8,
    minute: u8,
    rng: &mut XorShift32,
    grid: &mut ClockGrid,
    bus: &mut impl ClockBus,
    pacer: &mut impl Pacer,
) {
    let count = rng.next_range(2, 5);
    let sweep = Sweep::new(1200, 600, MovementMode::MinDistance);

    let pool = shapes::DANCE_SHAPES.len() as u32;
    let mut last = pool;
    for _ in 0..count {
        let mut pick = rng.next_below(pool);
        while pick == last {
            pick = rng.next_below(pool);
        }
        last = pick;
        show_shape(grid, bus, &shapes::DANCE_SHAPES[pick as usize], sweep);
        pacer.pace(rng.next_range(2000, 4000));
    }

    show_time(
        grid,
        bus,
        hour,
        minute,
        Sweep::new(1000, 500, MovementMode::MinDistance),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{RecordingBus, RecordingPacer};
    use polychron_protocol::{HalfDigit, BOARD_COUNT};

    struct Rig {
        rng: XorShift32,
        grid: ClockGrid,
        bus: RecordingBus,
        pacer: RecordingPacer,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                rng: XorShift32::new(99),
                grid: ClockGrid::new(),
                bus: RecordingBus::new(),
                pacer: RecordingPacer::new(),
            }
        }

        fn tick(
            &mut self,
            dispatcher: &mut Dispatcher,
            mode: DisplayMode,
            hour: u8,
            minute: u8,
            asleep: bool,
        ) -> bool {
            dispatcher.tick(
                mode,
                hour,
                minute,
                asleep,
                &mut self.rng,
                &mut self.grid,
                &mut self.bus,
                &mut self.pacer,
            )
        }
    }

    fn batch(rig: &Rig, index: usize) -> [HalfDigit; BOARD_COUNT] {
        core::array::from_fn(|board| rig.bus.sent[index * BOARD_COUNT + board].1)
    }

    fn batch_angles(rig: &Rig, index: usize) -> [[(i16, i16); 3]; BOARD_COUNT] {
        batch(rig, index).map(|message| message.clocks.map(|clock| (clock.angle_h, clock.angle_m)))
    }

    #[test]
    fn test_lazy_sends_whole_grid_once() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        assert!(rig.tick(&mut dispatcher, DisplayMode::Lazy, 12, 34, false));
        assert_eq!(rig.bus.sent.len(), BOARD_COUNT);
        assert!(rig.pacer.waits.is_empty());

        // Leftmost column draws the hidden side of numeral one
        let (board, message) = rig.bus.sent[0];
        assert_eq!(board, 0);
        assert_eq!(message.clocks[0].angle_h, 225);
        assert_eq!(message.clocks[0].speed_h, 200);
        assert_eq!(message.clocks[0].accel_h, 100);
        assert_eq!(message.clocks[0].mode_h, MovementMode::MinDistance);
    }

    #[test]
    fn test_same_reading_dispatches_once() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        assert!(rig.tick(&mut dispatcher, DisplayMode::Lazy, 8, 15, false));
        assert!(!rig.tick(&mut dispatcher, DisplayMode::Lazy, 8, 15, false));
        assert_eq!(rig.bus.sent.len(), BOARD_COUNT);

        assert!(rig.tick(&mut dispatcher, DisplayMode::Lazy, 8, 16, false));
        assert_eq!(rig.bus.sent.len(), 2 * BOARD_COUNT);
    }

    #[test]
    fn test_off_parks_and_powers_down_once() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        assert!(!rig.tick(&mut dispatcher, DisplayMode::Off, 10, 0, false));
        assert!(dispatcher.is_parked());
        assert_eq!(rig.bus.drivers.as_slice(), &[false]);
        assert_eq!(rig.bus.sent.len(), BOARD_COUNT);
        for (_, message) in rig.bus.sent.iter() {
            for clock in message.clocks {
                assert_eq!((clock.angle_h, clock.angle_m), (180, 180));
                assert_eq!(clock.speed_h, 200);
            }
        }

        // A second tick in Off changes nothing
        assert!(!rig.tick(&mut dispatcher, DisplayMode::Off, 10, 1, false));
        assert_eq!(rig.bus.sent.len(), BOARD_COUNT);
        assert_eq!(rig.bus.drivers.len(), 1);
    }

    #[test]
    fn test_sleep_window_parks_any_mode() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        assert!(!rig.tick(&mut dispatcher, DisplayMode::Fun, 2, 30, true));
        assert!(dispatcher.is_parked());
        assert_eq!(rig.bus.drivers.as_slice(), &[false]);
    }

    #[test]
    fn test_wake_powers_drivers_and_settles() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Off, 22, 0, false);
        assert!(rig.tick(&mut dispatcher, DisplayMode::Lazy, 7, 0, false));

        assert!(!dispatcher.is_parked());
        assert_eq!(rig.bus.drivers.as_slice(), &[false, true]);
        assert_eq!(rig.pacer.waits[0], 500);
        assert_eq!(rig.bus.sent.len(), 2 * BOARD_COUNT);
    }

    #[test]
    fn test_park_resets_shown_reading() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Lazy, 8, 15, false);
        rig.tick(&mut dispatcher, DisplayMode::Off, 8, 15, false);
        // Same reading again still dispatches after the park
        assert!(rig.tick(&mut dispatcher, DisplayMode::Lazy, 8, 15, false));
    }

    #[test]
    fn test_waves_reveals_one_column_at_a_time() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Waves, 12, 34, false);

        let mut expected = heapless::Vec::<u32, 16>::new();
        expected.push(9000).unwrap();
        for _ in 0..BOARD_COUNT {
            expected.push(400).unwrap();
        }
        assert_eq!(rig.pacer.waits.as_slice(), expected.as_slice());

        // Bars first, then the reveal walks the boards left to right
        assert_eq!(rig.bus.sent.len(), 2 * BOARD_COUNT);
        for (board, (sent_to, message)) in rig.bus.sent.iter().skip(BOARD_COUNT).enumerate() {
            assert_eq!(usize::from(*sent_to), board);
            assert_eq!(message.clocks[0].mode_h, MovementMode::Clockwise2);
            assert_eq!(message.clocks[0].speed_h, 400);
        }
    }

    #[test]
    fn test_cascade_holds_unrevealed_rows_stale() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Cascade, 0, 0, false);
        assert_eq!(rig.bus.sent.len(), 3 * BOARD_COUNT);
        assert_eq!(rig.pacer.waits.as_slice(), &[1500, 1500]);

        let top = batch(&rig, 0);
        let middle = batch(&rig, 1);
        let full = batch(&rig, 2);
        for board in 0..BOARD_COUNT {
            // Top row reveal: rows 1 and 2 keep their boot counters
            assert!(top[board].counters[0] > 0);
            assert_eq!(top[board].counters[1], 0);
            assert_eq!(top[board].counters[2], 0);

            // Middle reveal refreshes rows 0 and 1, row 2 still stale
            assert!(middle[board].counters[0] > top[board].counters[0]);
            assert!(middle[board].counters[1] > 0);
            assert_eq!(middle[board].counters[2], 0);

            // Final time send refreshes everything
            assert!(full[board].counters[2] > 0);
            assert_eq!(full[board].clocks[2].mode_h, MovementMode::MinDistance);
        }
    }

    #[test]
    fn test_firework_bursts_from_center() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Firework, 6, 30, false);

        assert_eq!(rig.pacer.waits.as_slice(), &[2000, 400, 400, 400, 2000]);
        assert_eq!(rig.bus.sent.len(), BOARD_COUNT + 8 + BOARD_COUNT);

        let order: heapless::Vec<u8, 8> = rig
            .bus
            .sent
            .iter()
            .skip(BOARD_COUNT)
            .take(8)
            .map(|(board, _)| *board)
            .collect();
        assert_eq!(order.as_slice(), &[3, 4, 2, 5, 1, 6, 0, 7]);

        let (_, center) = rig.bus.sent[BOARD_COUNT];
        assert_eq!(center.clocks[0].speed_h, 2000);
        assert_eq!(center.clocks[0].mode_h, MovementMode::Clockwise);
    }

    #[test]
    fn test_spinning_phases_and_final_time() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Spinning, 3, 45, false);

        assert_eq!(rig.pacer.waits.as_slice(), &[3000, 3000, 3000]);
        assert_eq!(rig.bus.sent.len(), 4 * BOARD_COUNT);

        let up = batch(&rig, 0);
        assert_eq!(up[0].clocks[0].angle_h, 0);
        assert_eq!(up[0].clocks[0].speed_h, 1500);
        assert_eq!(up[0].clocks[0].mode_h, MovementMode::Clockwise);

        let time = batch(&rig, 3);
        assert_eq!(time[0].clocks[0].speed_h, 1000);
        assert_eq!(time[0].clocks[0].mode_h, MovementMode::MinDistance);
    }

    #[test]
    fn test_heartbeat_rhythm() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Heartbeat, 14, 8, false);

        assert_eq!(
            rig.pacer.waits.as_slice(),
            &[300, 600, 200, 800, 300, 600, 200, 800, 300, 1000]
        );
        assert_eq!(rig.bus.sent.len(), 11 * BOARD_COUNT);
    }

    #[test]
    fn test_dance_chains_distinct_shapes() {
        let mut rig = Rig::new();
        let mut dispatcher = Dispatcher::new();

        rig.tick(&mut dispatcher, DisplayMode::Dance, 18, 20, false);

        let count = rig.pacer.waits.len();
        assert!((2..=4).contains(&count));
        assert_eq!(rig.bus.sent.len(), (count + 1) * BOARD_COUNT);
        for wait in rig.pacer.waits.iter() {
            assert!((2000..4000).contains(wait));
        }

        // No two consecutive shapes repeat
        for i in 1..count {
            assert_ne!(batch_angles(&rig, i - 1), batch_angles(&rig, i));
        }
    }
}
