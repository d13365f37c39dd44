//! Master control surface
//!
//! One handler behind the control link. Requests arrive as
//! [`ControlRequest`] values already decoded from the wire; parameter
//! validation happens here, at the boundary, so the grid and player
//! never see a bad index. Replies go back as [`ControlResponse`]
//! frames, one per request except `List`, which streams a name per
//! stored choreography before its terminator.
//!
//! The [`Controller`] owns every master-side moving part: the store,
//! the player, the grid, the display dispatcher and the wall clock.
//! The embedding calls [`Controller::tick`] from its single conductor
//! context and [`Controller::handle`] for each drained request;
//! long animation sequences block inside through the [`Pacer`] seam.

use heapless::Vec;
use polychron_protocol::{Hand, MovementMode, StatusReport, BOARD_COUNT, CLOCKS_PER_BOARD};

use crate::angle;
use crate::animation::{Dispatcher, DisplayMode};
use crate::choreo::{
    ChoreoName, ChoreoStore, PlaybackState, Player, StoreError, MAX_CHOREOGRAPHIES,
};
use crate::config::{AutoMode, SystemConfig, TriggerFrequency};
use crate::grid::ClockGrid;
use crate::rand::XorShift32;
use crate::timewheel::TimeWheel;
use crate::traits::{ClockBus, Pacer};

pub use polychron_protocol::{HostCommand as ControlRequest, MasterReply as ControlResponse};

/// Designer test speed clamp, steps per second.
pub const TEST_SPEED_MIN: u16 = 200;
pub const TEST_SPEED_MAX: u16 = 5000;

/// Designer test acceleration clamp, steps per second squared.
pub const TEST_ACCEL_MIN: u16 = 100;
pub const TEST_ACCEL_MAX: u16 = 2000;

/// Upper bound for an uploaded choreography document, in bytes.
///
/// Sized for a full document with every field spelled out. Anything
/// larger is not a choreography.
pub const MAX_DOC_LEN: usize = 48 * 1024;

/// Replies produced by one request.
pub const MAX_REPLIES: usize = MAX_CHOREOGRAPHIES + 1;

pub type Replies = Vec<ControlResponse, MAX_REPLIES>;

/// Boundary validation failures, reported as Nack codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApiError {
    /// Board index outside the grid
    BadBoard,
    /// Clock index outside the board
    BadClock,
    /// Unknown display or auto mode byte
    BadMode,
    /// Unknown trigger cadence byte
    BadFrequency,
    /// Weekday, hour or minute outside its domain
    BadTime,
    /// Uploaded document exceeds [`MAX_DOC_LEN`]
    DocTooLarge,
    /// Document data without a preceding begin
    NoUpload,
    /// Store operation failed
    Store(StoreError),
}

impl ApiError {
    /// Wire code carried by a Nack reply.
    pub fn code(&self) -> u8 {
        match self {
            ApiError::BadBoard => 1,
            ApiError::BadClock => 2,
            ApiError::BadMode => 3,
            ApiError::BadFrequency => 4,
            ApiError::BadTime => 5,
            ApiError::DocTooLarge => 6,
            ApiError::NoUpload => 7,
            ApiError::Store(StoreError::NotFound) => 10,
            ApiError::Store(StoreError::Corrupt) => 11,
            ApiError::Store(StoreError::Full) => 12,
            ApiError::Store(StoreError::Io) => 13,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

/// An in-flight chunked document transfer.
struct Upload {
    name: ChoreoName,
    body: alloc::vec::Vec<u8>,
}

/// Master-side brain: store, player, grid, dispatcher, wall clock.
///
/// All methods run in the conductor's single cooperative context.
/// `drivers_on` is the master's belief; boards may still be winding
/// down a deferred disable when it reads false.
pub struct Controller<S: ChoreoStore> {
    store: S,
    player: Player,
    grid: ClockGrid,
    dispatcher: Dispatcher,
    config: SystemConfig,
    clock: TimeWheel,
    rng: XorShift32,
    upload: Option<Upload>,
    drivers_on: bool,
    dirty: bool,
}

impl<S: ChoreoStore> Controller<S> {
    pub fn new(store: S, seed: u32) -> Self {
        Self {
            store,
            player: Player::new(),
            grid: ClockGrid::new(),
            dispatcher: Dispatcher::new(),
            config: SystemConfig::default(),
            clock: TimeWheel::new(),
            rng: XorShift32::new(seed),
            upload: None,
            drivers_on: true,
            dirty: false,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Replace the configuration, as loaded from persistent storage.
    pub fn restore_config(&mut self, config: SystemConfig) {
        self.config = config;
    }

    /// True once after each configuration change, for persistence.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::take(&mut self.dirty)
    }

    pub fn time(&self) -> &TimeWheel {
        &self.clock
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Clamp and store the designer surface's test motion limits.
    pub fn set_designer(&mut self, speed: u16, accel: u16) {
        self.config.designer_speed = speed.clamp(TEST_SPEED_MIN, TEST_SPEED_MAX);
        self.config.designer_accel = accel.clamp(TEST_ACCEL_MIN, TEST_ACCEL_MAX);
        self.dirty = true;
    }

    /// Advance the master by one conductor turn.
    ///
    /// Order matters: the auto-trigger inspects the boundary edges
    /// first, then the display dispatcher runs unless a choreography
    /// owns the grid, then playback advances. Until a client sets the
    /// time the face stays wherever it is.
    pub fn tick(&mut self, now_ms: u64, bus: &mut impl ClockBus, pacer: &mut impl Pacer) {
        let edges = self.clock.update(now_ms);

        if self.clock.is_set() {
            let weekday = self.clock.weekday();
            let hour = self.clock.hour();
            let minute = self.clock.minute();
            let asleep = self.config.sleep.is_asleep(weekday, hour);

            let due = match self.config.frequency {
                TriggerFrequency::Hourly => edges.hour_changed,
                TriggerFrequency::HalfMinute => edges.half_minute,
            };
            if due && !asleep {
                self.auto_play(now_ms, bus, pacer);
            }

            if self.player.state() != PlaybackState::Playing {
                let was_parked = self.dispatcher.is_parked();
                self.dispatcher.tick(
                    self.config.display_mode,
                    hour,
                    minute,
                    asleep,
                    &mut self.rng,
                    &mut self.grid,
                    bus,
                    pacer,
                );
                if self.dispatcher.is_parked() != was_parked {
                    self.drivers_on = !self.dispatcher.is_parked();
                }
            }
        }

        self.player.update(now_ms, &mut self.grid, bus, pacer);
    }

    /// Execute one request and collect its replies.
    ///
    /// Every request answers: a failed one with a single Nack carrying
    /// the [`ApiError`] code, a successful one with its payload replies
    /// or a bare Ack.
    pub fn handle(
        &mut self,
        request: ControlRequest,
        now_ms: u64,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) -> Replies {
        let mut replies = Replies::new();
        match self.execute(request, now_ms, bus, pacer, &mut replies) {
            Ok(()) => {
                if replies.is_empty() {
                    let _ = replies.push(ControlResponse::Ack);
                }
            }
            Err(err) => {
                replies.clear();
                let _ = replies.push(ControlResponse::Nack { code: err.code() });
            }
        }
        replies
    }

    fn execute(
        &mut self,
        request: ControlRequest,
        now_ms: u64,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
        replies: &mut Replies,
    ) -> Result<(), ApiError> {
        match request {
            ControlRequest::Ping => {
                let _ = replies.push(ControlResponse::Pong);
                Ok(())
            }
            ControlRequest::GetStatus => {
                let _ = replies.push(ControlResponse::Status(self.report()));
                Ok(())
            }
            ControlRequest::Play => {
                self.wake(bus, pacer);
                self.player.play(now_ms, &mut self.grid, bus, pacer);
                Ok(())
            }
            ControlRequest::Pause => {
                self.player.pause();
                Ok(())
            }
            ControlRequest::Stop => {
                self.player.stop();
                Ok(())
            }
            ControlRequest::Next => {
                self.wake(bus, pacer);
                self.player.next(&mut self.grid, bus, pacer);
                Ok(())
            }
            ControlRequest::Prev => {
                self.wake(bus, pacer);
                self.player.prev(&mut self.grid, bus, pacer);
                Ok(())
            }
            ControlRequest::Apply { index } => {
                self.wake(bus, pacer);
                self.player
                    .apply_keyframe(usize::from(index), &mut self.grid, bus, pacer);
                Ok(())
            }
            ControlRequest::Load { name } => {
                let choreo = self.store.load(name.as_str())?;
                self.player.load(choreo);
                Ok(())
            }
            ControlRequest::Delete { name } => {
                self.store.delete(name.as_str())?;
                // Drop any disable entry so a future document under
                // this name comes back enabled
                self.config.set_enabled(name.as_str(), true);
                self.dirty = true;
                Ok(())
            }
            ControlRequest::List => {
                let names = self.store.list();
                let count = names.len() as u8;
                for name in names {
                    let enabled = self.config.is_enabled(name.as_str());
                    let _ = replies.push(ControlResponse::Name { name, enabled });
                }
                let _ = replies.push(ControlResponse::ListEnd { count });
                Ok(())
            }
            ControlRequest::SetAutoMode { mode } => {
                self.config.auto_mode = AutoMode::from_byte(mode).ok_or(ApiError::BadMode)?;
                self.dirty = true;
                Ok(())
            }
            ControlRequest::SetFrequency { frequency } => {
                self.config.frequency =
                    TriggerFrequency::from_byte(frequency).ok_or(ApiError::BadFrequency)?;
                self.dirty = true;
                Ok(())
            }
            ControlRequest::SetEnabled { name, enabled } => {
                self.config.set_enabled(name.as_str(), enabled);
                self.dirty = true;
                Ok(())
            }
            ControlRequest::DocBegin { name } => {
                self.upload = Some(Upload {
                    name,
                    body: alloc::vec::Vec::new(),
                });
                Ok(())
            }
            ControlRequest::DocData { chunk } => self.doc_data(&chunk),
            ControlRequest::DocEnd => self.doc_end(),
            ControlRequest::SetDisplayMode { mode } => {
                self.config.display_mode =
                    DisplayMode::from_byte(mode).ok_or(ApiError::BadMode)?;
                // A mode switch redraws right away instead of waiting
                // for the minute to roll
                self.dispatcher.invalidate();
                self.dirty = true;
                Ok(())
            }
            ControlRequest::SetTime {
                weekday,
                hour,
                minute,
            } => {
                if weekday > 6 || hour > 23 || minute > 59 {
                    return Err(ApiError::BadTime);
                }
                self.clock.set(weekday, hour, minute, now_ms);
                Ok(())
            }
            ControlRequest::SetSleep { weekday, hours } => {
                if weekday > 6 {
                    return Err(ApiError::BadTime);
                }
                self.config.sleep.set_day(weekday, hours);
                self.dirty = true;
                Ok(())
            }
            ControlRequest::Adjust {
                board,
                clock,
                hour,
                minute,
            } => self.adjust(board, clock, hour, minute, bus, pacer),
            ControlRequest::Position {
                board,
                clock,
                hand,
                angle,
                mode,
            } => self.position(board, clock, hand, angle, mode, bus, pacer),
            ControlRequest::SetDesigner { speed, accel } => {
                self.set_designer(speed, accel);
                Ok(())
            }
            ControlRequest::SetDrivers { on } => {
                bus.send_drivers(on);
                self.drivers_on = on;
                Ok(())
            }
            ControlRequest::GridStop => {
                self.player.stop();
                self.dispatcher.park(&mut self.grid, bus);
                self.drivers_on = false;
                Ok(())
            }
        }
    }

    /// Trim one clock's hands by a few degrees each.
    ///
    /// Rides the usual slot dispatch: only the addressed slot gets a
    /// fresh counter, the board leaves its neighbours alone.
    fn adjust(
        &mut self,
        board: u8,
        clock: u8,
        hour: i8,
        minute: i8,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) -> Result<(), ApiError> {
        let (board, clock) = slot(board, clock)?;
        self.wake(bus, pacer);

        let mut state = self.grid.slot_state(board, clock);
        state.speed_h = self.config.designer_speed as i16;
        state.speed_m = self.config.designer_speed as i16;
        state.accel_h = self.config.designer_accel as i16;
        state.accel_m = self.config.designer_accel as i16;
        state.mode_h = MovementMode::AdjustHand;
        state.mode_m = MovementMode::AdjustHand;
        state.adjust_h = hour;
        state.adjust_m = minute;

        self.grid.stage(board, clock, state);
        self.grid.send_board(board, bus);
        Ok(())
    }

    /// Drive one hand to an absolute angle, designer test surface.
    ///
    /// The other hand is re-asserted at its last commanded angle with
    /// `MinDistance`, which the board resolves to no movement.
    fn position(
        &mut self,
        board: u8,
        clock: u8,
        hand: Hand,
        angle: i16,
        mode: MovementMode,
        bus: &mut impl ClockBus,
        pacer: &mut impl Pacer,
    ) -> Result<(), ApiError> {
        let (board, clock) = slot(board, clock)?;
        if !mode.is_absolute() {
            return Err(ApiError::BadMode);
        }
        self.wake(bus, pacer);

        let mut state = self.grid.slot_state(board, clock);
        state.speed_h = self.config.designer_speed as i16;
        state.speed_m = self.config.designer_speed as i16;
        state.accel_h = self.config.designer_accel as i16;
        state.accel_m = self.config.designer_accel as i16;
        state.mode_h = MovementMode::MinDistance;
        state.mode_m = MovementMode::MinDistance;
        state.adjust_h = 0;
        state.adjust_m = 0;
        match hand {
            Hand::Hour => {
                state.angle_h = angle::normalize(angle);
                state.mode_h = mode;
            }
            Hand::Minute => {
                state.angle_m = angle::normalize(angle);
                state.mode_m = mode;
            }
        }

        self.grid.stage(board, clock, state);
        self.grid.send_board(board, bus);
        Ok(())
    }

    fn doc_data(&mut self, chunk: &[u8]) -> Result<(), ApiError> {
        let Some(upload) = self.upload.as_mut() else {
            return Err(ApiError::NoUpload);
        };
        if upload.body.len() + chunk.len() > MAX_DOC_LEN {
            // An oversized transfer cannot become valid; drop it
            self.upload = None;
            return Err(ApiError::DocTooLarge);
        }
        upload.body.extend_from_slice(chunk);
        Ok(())
    }

    fn doc_end(&mut self) -> Result<(), ApiError> {
        let Some(Upload { name, body }) = self.upload.take() else {
            return Err(ApiError::NoUpload);
        };
        let text =
            core::str::from_utf8(&body).map_err(|_| ApiError::Store(StoreError::Corrupt))?;
        let mut choreo = crate::choreo::json::from_json(text).map_err(ApiError::Store)?;
        // The document's own name keys the store; the transfer name
        // backs an anonymous document
        if choreo.name.is_empty() {
            if name.is_empty() {
                let _ = choreo.name.push_str("unnamed");
            } else {
                choreo.name = name;
            }
        }
        // Save re-serializes; the raw body is spent once parsed
        drop(body);
        self.store.save(&choreo)?;
        Ok(())
    }

    /// Power the drivers back up before commanding motion from a park.
    fn wake(&mut self, bus: &mut impl ClockBus, pacer: &mut impl Pacer) {
        if self.dispatcher.is_parked() {
            self.dispatcher.wake(bus, pacer);
            self.drivers_on = true;
        }
    }

    /// Start the configured automatic choreography, if any applies.
    ///
    /// Never interrupts a running playback. A pick that fails to load
    /// is skipped silently; the next boundary tries again.
    fn auto_play(&mut self, now_ms: u64, bus: &mut impl ClockBus, pacer: &mut impl Pacer) {
        if self.player.state() == PlaybackState::Playing {
            return;
        }
        let names = self.store.list();
        let pick = match self.config.auto_mode {
            AutoMode::Off | AutoMode::Manual => return,
            AutoMode::Auto => names
                .iter()
                .find(|name| self.config.is_enabled(name.as_str()))
                .cloned(),
            AutoMode::Random => {
                let mut enabled: Vec<u8, MAX_CHOREOGRAPHIES> = Vec::new();
                for (index, name) in names.iter().enumerate() {
                    if self.config.is_enabled(name.as_str()) {
                        let _ = enabled.push(index as u8);
                    }
                }
                if enabled.is_empty() {
                    None
                } else {
                    let roll = self.rng.next_below(enabled.len() as u32) as usize;
                    Some(names[usize::from(enabled[roll])].clone())
                }
            }
        };
        let Some(name) = pick else { return };
        let Ok(choreo) = self.store.load(name.as_str()) else {
            return;
        };
        self.wake(bus, pacer);
        self.player.load(choreo);
        self.player.play(now_ms, &mut self.grid, bus, pacer);
    }

    fn report(&self) -> StatusReport {
        // The loaded name fits by construction, both sides cap at
        // MAX_NAME_LEN
        let mut name = ChoreoName::new();
        let _ = name.push_str(self.player.name());
        StatusReport {
            display_mode: self.config.display_mode.to_byte(),
            auto_mode: self.config.auto_mode.to_byte(),
            frequency: self.config.frequency.to_byte(),
            playback: playback_byte(self.player.state()),
            keyframe_index: self.player.keyframe_index() as u8,
            keyframe_count: self.player.keyframe_count() as u8,
            loaded: self.player.is_loaded(),
            drivers_on: self.drivers_on,
            designer_speed: self.config.designer_speed,
            designer_accel: self.config.designer_accel,
            name,
        }
    }
}

fn slot(board: u8, clock: u8) -> Result<(usize, usize), ApiError> {
    let board = usize::from(board);
    let clock = usize::from(clock);
    if board >= BOARD_COUNT {
        return Err(ApiError::BadBoard);
    }
    if clock >= CLOCKS_PER_BOARD {
        return Err(ApiError::BadClock);
    }
    Ok((board, clock))
}

fn playback_byte(state: PlaybackState) -> u8 {
    match state {
        PlaybackState::Stopped => 0,
        PlaybackState::Playing => 1,
        PlaybackState::Paused => 2,
    }
}
