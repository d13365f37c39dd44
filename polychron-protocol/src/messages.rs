//! Message types for the clock bus and the control link
//!
//! Message types are divided into three categories:
//! - Master → Boards: clock target dispatches, driver power
//! - Host → Master: playback, store, config and test commands
//! - Master → Host: acknowledgements, status, list entries

use crate::clock::{Hand, MovementMode};
use crate::frame::{Frame, FrameError, BROADCAST_ADDR, MAX_PAYLOAD_SIZE};
use crate::half_digit::HalfDigit;
use heapless::{String, Vec};

/// Maximum choreography name length in bytes (store key and wire cap)
pub const MAX_NAME_LEN: usize = 32;

// Message type IDs: Master → Boards (clock bus)
pub const MSG_SET_CLOCKS: u8 = 0x10;
pub const MSG_SET_DRIVERS: u8 = 0x11;

// Message type IDs: Host → Master (control link)
pub const MSG_PING: u8 = 0x01;
pub const MSG_GET_STATUS: u8 = 0x02;
pub const MSG_PLAY: u8 = 0x20;
pub const MSG_PAUSE: u8 = 0x21;
pub const MSG_STOP: u8 = 0x22;
pub const MSG_NEXT: u8 = 0x23;
pub const MSG_PREV: u8 = 0x24;
pub const MSG_APPLY: u8 = 0x25;
pub const MSG_LOAD: u8 = 0x26;
pub const MSG_DELETE: u8 = 0x27;
pub const MSG_LIST: u8 = 0x28;
pub const MSG_SET_AUTO_MODE: u8 = 0x29;
pub const MSG_SET_FREQUENCY: u8 = 0x2A;
pub const MSG_SET_ENABLED: u8 = 0x2B;
pub const MSG_DOC_BEGIN: u8 = 0x2C;
pub const MSG_DOC_DATA: u8 = 0x2D;
pub const MSG_DOC_END: u8 = 0x2E;
pub const MSG_SET_DISPLAY_MODE: u8 = 0x30;
pub const MSG_SET_TIME: u8 = 0x31;
pub const MSG_SET_SLEEP: u8 = 0x32;
pub const MSG_ADJUST: u8 = 0x33;
pub const MSG_POSITION: u8 = 0x34;
pub const MSG_SET_DESIGNER: u8 = 0x35;
pub const MSG_DRIVERS: u8 = 0x36;
pub const MSG_GRID_STOP: u8 = 0x37;

// Message type IDs: Master → Host (control link replies)
pub const MSG_ACK: u8 = 0x40;
pub const MSG_NACK: u8 = 0x41;
pub const MSG_PONG: u8 = 0x42;
pub const MSG_STATUS: u8 = 0x43;
pub const MSG_NAME: u8 = 0x44;
pub const MSG_LIST_END: u8 = 0x45;

/// Messages from the master to the slave boards
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardCommand {
    /// Update the three clock targets of one board
    SetClocks(HalfDigit),
    /// Switch stepper driver power (disable is deferred until the board
    /// is idle)
    SetDrivers { on: bool },
}

impl BoardCommand {
    /// Parse a command from a bus frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_SET_CLOCKS => {
                let half =
                    HalfDigit::decode(&frame.payload).map_err(|_| FrameError::InvalidFrame)?;
                Ok(BoardCommand::SetClocks(half))
            }
            MSG_SET_DRIVERS => {
                if frame.payload.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(BoardCommand::SetDrivers {
                    on: frame.payload[0] != 0,
                })
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this command into a frame addressed to one board
    pub fn to_frame(&self, addr: u8) -> Result<Frame, FrameError> {
        match self {
            BoardCommand::SetClocks(half) => {
                let mut buffer = [0u8; HalfDigit::WIRE_LEN];
                let len = half
                    .encode(&mut buffer)
                    .map_err(|_| FrameError::BufferTooSmall)?;
                Frame::new(addr, MSG_SET_CLOCKS, &buffer[..len])
            }
            BoardCommand::SetDrivers { on } => {
                Frame::new(addr, MSG_SET_DRIVERS, &[u8::from(*on)])
            }
        }
    }
}

/// Commands from the host to the master
///
/// The control link is point-to-point, so these frames carry the
/// broadcast address. Parameters are raw wire values; range checks
/// happen in the master's request handler, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Heartbeat request
    Ping,
    /// Request a status report
    GetStatus,
    /// Start or resume choreography playback
    Play,
    /// Pause choreography playback
    Pause,
    /// Stop choreography playback
    Stop,
    /// Jump to the next keyframe
    Next,
    /// Jump to the previous keyframe
    Prev,
    /// Apply one keyframe by index without changing playback
    Apply { index: u8 },
    /// Load a stored choreography by name
    Load { name: String<MAX_NAME_LEN> },
    /// Delete a stored choreography by name
    Delete { name: String<MAX_NAME_LEN> },
    /// Request the list of stored choreography names
    List,
    /// Set the choreography auto-trigger mode
    SetAutoMode { mode: u8 },
    /// Set the auto-trigger frequency
    SetFrequency { frequency: u8 },
    /// Enable or disable one choreography for auto/random selection
    SetEnabled {
        name: String<MAX_NAME_LEN>,
        enabled: bool,
    },
    /// Begin a choreography document upload
    DocBegin { name: String<MAX_NAME_LEN> },
    /// One chunk of the document body
    DocData { chunk: Vec<u8, MAX_PAYLOAD_SIZE> },
    /// Finish the upload and store the document
    DocEnd,
    /// Set the display animation mode
    SetDisplayMode { mode: u8 },
    /// Set the wall clock (weekday 0 = Monday)
    SetTime { weekday: u8, hour: u8, minute: u8 },
    /// Set one weekday's sleep hours as a 24-bit mask (bit N = hour N)
    SetSleep { weekday: u8, hours: u32 },
    /// Trim one clock's hands by signed degree amounts
    Adjust {
        board: u8,
        clock: u8,
        hour: i8,
        minute: i8,
    },
    /// Drive a single hand to an angle with a direction policy
    Position {
        board: u8,
        clock: u8,
        hand: Hand,
        angle: i16,
        mode: MovementMode,
    },
    /// Set the speed and acceleration used by adjust/position tests
    SetDesigner { speed: u16, accel: u16 },
    /// Switch stepper driver power on all boards
    SetDrivers { on: bool },
    /// Drive the whole grid to the stop pose
    GridStop,
}

impl HostCommand {
    /// Parse a command from a control link frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let p = &frame.payload;
        match frame.msg_type {
            MSG_PING => Ok(HostCommand::Ping),
            MSG_GET_STATUS => Ok(HostCommand::GetStatus),
            MSG_PLAY => Ok(HostCommand::Play),
            MSG_PAUSE => Ok(HostCommand::Pause),
            MSG_STOP => Ok(HostCommand::Stop),
            MSG_NEXT => Ok(HostCommand::Next),
            MSG_PREV => Ok(HostCommand::Prev),
            MSG_APPLY => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::Apply { index: p[0] })
            }
            MSG_LOAD => Ok(HostCommand::Load {
                name: parse_name(p)?,
            }),
            MSG_DELETE => Ok(HostCommand::Delete {
                name: parse_name(p)?,
            }),
            MSG_LIST => Ok(HostCommand::List),
            MSG_SET_AUTO_MODE => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetAutoMode { mode: p[0] })
            }
            MSG_SET_FREQUENCY => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetFrequency { frequency: p[0] })
            }
            MSG_SET_ENABLED => {
                if p.len() < 2 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetEnabled {
                    enabled: p[0] != 0,
                    name: parse_name(&p[1..])?,
                })
            }
            MSG_DOC_BEGIN => Ok(HostCommand::DocBegin {
                name: parse_name(p)?,
            }),
            MSG_DOC_DATA => {
                let mut chunk = Vec::new();
                chunk
                    .extend_from_slice(p)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Ok(HostCommand::DocData { chunk })
            }
            MSG_DOC_END => Ok(HostCommand::DocEnd),
            MSG_SET_DISPLAY_MODE => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetDisplayMode { mode: p[0] })
            }
            MSG_SET_TIME => {
                if p.len() < 3 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetTime {
                    weekday: p[0],
                    hour: p[1],
                    minute: p[2],
                })
            }
            MSG_SET_SLEEP => {
                if p.len() < 5 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetSleep {
                    weekday: p[0],
                    hours: u32::from_le_bytes([p[1], p[2], p[3], p[4]]),
                })
            }
            MSG_ADJUST => {
                if p.len() < 4 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::Adjust {
                    board: p[0],
                    clock: p[1],
                    hour: p[2] as i8,
                    minute: p[3] as i8,
                })
            }
            MSG_POSITION => {
                if p.len() < 6 {
                    return Err(FrameError::InvalidFrame);
                }
                let hand = Hand::from_byte(p[2]).ok_or(FrameError::InvalidFrame)?;
                let mode = MovementMode::from_byte(p[5]).ok_or(FrameError::InvalidFrame)?;
                Ok(HostCommand::Position {
                    board: p[0],
                    clock: p[1],
                    hand,
                    angle: i16::from_le_bytes([p[3], p[4]]),
                    mode,
                })
            }
            MSG_SET_DESIGNER => {
                if p.len() < 4 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetDesigner {
                    speed: u16::from_le_bytes([p[0], p[1]]),
                    accel: u16::from_le_bytes([p[2], p[3]]),
                })
            }
            MSG_DRIVERS => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(HostCommand::SetDrivers { on: p[0] != 0 })
            }
            MSG_GRID_STOP => Ok(HostCommand::GridStop),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this command into a frame (for testing or a host bridge)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let addr = BROADCAST_ADDR;
        match self {
            HostCommand::Ping => Ok(Frame::empty(addr, MSG_PING)),
            HostCommand::GetStatus => Ok(Frame::empty(addr, MSG_GET_STATUS)),
            HostCommand::Play => Ok(Frame::empty(addr, MSG_PLAY)),
            HostCommand::Pause => Ok(Frame::empty(addr, MSG_PAUSE)),
            HostCommand::Stop => Ok(Frame::empty(addr, MSG_STOP)),
            HostCommand::Next => Ok(Frame::empty(addr, MSG_NEXT)),
            HostCommand::Prev => Ok(Frame::empty(addr, MSG_PREV)),
            HostCommand::Apply { index } => Frame::new(addr, MSG_APPLY, &[*index]),
            HostCommand::Load { name } => Frame::new(addr, MSG_LOAD, name.as_bytes()),
            HostCommand::Delete { name } => Frame::new(addr, MSG_DELETE, name.as_bytes()),
            HostCommand::List => Ok(Frame::empty(addr, MSG_LIST)),
            HostCommand::SetAutoMode { mode } => Frame::new(addr, MSG_SET_AUTO_MODE, &[*mode]),
            HostCommand::SetFrequency { frequency } => {
                Frame::new(addr, MSG_SET_FREQUENCY, &[*frequency])
            }
            HostCommand::SetEnabled { name, enabled } => {
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .push(u8::from(*enabled))
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(name.as_bytes())
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(addr, MSG_SET_ENABLED, &payload)
            }
            HostCommand::DocBegin { name } => Frame::new(addr, MSG_DOC_BEGIN, name.as_bytes()),
            HostCommand::DocData { chunk } => Frame::new(addr, MSG_DOC_DATA, chunk),
            HostCommand::DocEnd => Ok(Frame::empty(addr, MSG_DOC_END)),
            HostCommand::SetDisplayMode { mode } => {
                Frame::new(addr, MSG_SET_DISPLAY_MODE, &[*mode])
            }
            HostCommand::SetTime {
                weekday,
                hour,
                minute,
            } => Frame::new(addr, MSG_SET_TIME, &[*weekday, *hour, *minute]),
            HostCommand::SetSleep { weekday, hours } => {
                let mask = hours.to_le_bytes();
                Frame::new(
                    addr,
                    MSG_SET_SLEEP,
                    &[*weekday, mask[0], mask[1], mask[2], mask[3]],
                )
            }
            HostCommand::Adjust {
                board,
                clock,
                hour,
                minute,
            } => Frame::new(
                addr,
                MSG_ADJUST,
                &[*board, *clock, *hour as u8, *minute as u8],
            ),
            HostCommand::Position {
                board,
                clock,
                hand,
                angle,
                mode,
            } => {
                let a = angle.to_le_bytes();
                Frame::new(
                    addr,
                    MSG_POSITION,
                    &[*board, *clock, hand.to_byte(), a[0], a[1], mode.to_byte()],
                )
            }
            HostCommand::SetDesigner { speed, accel } => {
                let s = speed.to_le_bytes();
                let a = accel.to_le_bytes();
                Frame::new(addr, MSG_SET_DESIGNER, &[s[0], s[1], a[0], a[1]])
            }
            HostCommand::SetDrivers { on } => Frame::new(addr, MSG_DRIVERS, &[u8::from(*on)]),
            HostCommand::GridStop => Ok(Frame::empty(addr, MSG_GRID_STOP)),
        }
    }
}

/// Snapshot of the master state for the host
///
/// Wire format: 12 fixed bytes, then the loaded choreography name.
/// Fixed part: display mode, auto mode, frequency, playback state
/// (0 stopped / 1 playing / 2 paused), keyframe index, keyframe count,
/// loaded flag, drivers flag, designer speed (u16 LE), designer accel
/// (u16 LE). The name runs to the end of the payload and is empty when
/// nothing is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub display_mode: u8,
    pub auto_mode: u8,
    pub frequency: u8,
    pub playback: u8,
    pub keyframe_index: u8,
    pub keyframe_count: u8,
    pub loaded: bool,
    pub drivers_on: bool,
    pub designer_speed: u16,
    pub designer_accel: u16,
    pub name: String<MAX_NAME_LEN>,
}

/// Replies from the master to the host
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterReply {
    /// Command accepted
    Ack,
    /// Command rejected with an error code
    Nack { code: u8 },
    /// Heartbeat response
    Pong,
    /// Status report
    Status(StatusReport),
    /// One stored choreography name (list entry; flag = enabled)
    Name {
        name: String<MAX_NAME_LEN>,
        enabled: bool,
    },
    /// End of a name list
    ListEnd { count: u8 },
}

impl MasterReply {
    /// Encode this reply into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let addr = BROADCAST_ADDR;
        match self {
            MasterReply::Ack => Ok(Frame::empty(addr, MSG_ACK)),
            MasterReply::Nack { code } => Frame::new(addr, MSG_NACK, &[*code]),
            MasterReply::Pong => Ok(Frame::empty(addr, MSG_PONG)),
            MasterReply::Status(report) => {
                let speed = report.designer_speed.to_le_bytes();
                let accel = report.designer_accel.to_le_bytes();
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .extend_from_slice(&[
                        report.display_mode,
                        report.auto_mode,
                        report.frequency,
                        report.playback,
                        report.keyframe_index,
                        report.keyframe_count,
                        u8::from(report.loaded),
                        u8::from(report.drivers_on),
                        speed[0],
                        speed[1],
                        accel[0],
                        accel[1],
                    ])
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(report.name.as_bytes())
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(addr, MSG_STATUS, &payload)
            }
            MasterReply::Name { name, enabled } => {
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .push(u8::from(*enabled))
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(name.as_bytes())
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(addr, MSG_NAME, &payload)
            }
            MasterReply::ListEnd { count } => Frame::new(addr, MSG_LIST_END, &[*count]),
        }
    }

    /// Parse a reply from a frame (for a host bridge or tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        let p = &frame.payload;
        match frame.msg_type {
            MSG_ACK => Ok(MasterReply::Ack),
            MSG_NACK => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(MasterReply::Nack { code: p[0] })
            }
            MSG_PONG => Ok(MasterReply::Pong),
            MSG_STATUS => {
                if p.len() < 12 {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(MasterReply::Status(StatusReport {
                    display_mode: p[0],
                    auto_mode: p[1],
                    frequency: p[2],
                    playback: p[3],
                    keyframe_index: p[4],
                    keyframe_count: p[5],
                    loaded: p[6] != 0,
                    drivers_on: p[7] != 0,
                    designer_speed: u16::from_le_bytes([p[8], p[9]]),
                    designer_accel: u16::from_le_bytes([p[10], p[11]]),
                    name: parse_name(&p[12..])?,
                }))
            }
            MSG_NAME => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(MasterReply::Name {
                    enabled: p[0] != 0,
                    name: parse_name(&p[1..])?,
                })
            }
            MSG_LIST_END => {
                if p.is_empty() {
                    return Err(FrameError::InvalidFrame);
                }
                Ok(MasterReply::ListEnd { count: p[0] })
            }
            _ => Err(FrameError::InvalidFrame),
        }
    }
}

/// Parse a UTF-8 name of up to [`MAX_NAME_LEN`] bytes
fn parse_name(bytes: &[u8]) -> Result<String<MAX_NAME_LEN>, FrameError> {
    let text = core::str::from_utf8(bytes).map_err(|_| FrameError::InvalidFrame)?;
    let mut name = String::new();
    name.push_str(text).map_err(|_| FrameError::InvalidFrame)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockTargetState;

    fn sample_half_digit() -> HalfDigit {
        let clock = ClockTargetState {
            angle_h: 300,
            angle_m: 90,
            speed_h: 400,
            speed_m: 400,
            accel_h: 150,
            accel_m: 150,
            mode_h: MovementMode::MinDistance,
            mode_m: MovementMode::MinDistance,
            adjust_h: 0,
            adjust_m: 0,
        };
        HalfDigit {
            clocks: [clock; 3],
            counters: [1, 2, 3],
        }
    }

    fn name(text: &str) -> String<MAX_NAME_LEN> {
        let mut s = String::new();
        s.push_str(text).unwrap();
        s
    }

    #[test]
    fn test_set_clocks_roundtrip() {
        let original = BoardCommand::SetClocks(sample_half_digit());
        let frame = original.to_frame(5).unwrap();
        assert_eq!(frame.addr, 5);
        assert_eq!(frame.msg_type, MSG_SET_CLOCKS);
        assert_eq!(frame.payload.len(), HalfDigit::WIRE_LEN);

        let parsed = BoardCommand::from_frame(&frame).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_set_clocks_undersized_payload_rejected() {
        let frame = Frame::new(0, MSG_SET_CLOCKS, &[0u8; 30]).unwrap();
        assert_eq!(
            BoardCommand::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_set_drivers_roundtrip() {
        let original = BoardCommand::SetDrivers { on: false };
        let frame = original.to_frame(BROADCAST_ADDR).unwrap();
        assert_eq!(frame.msg_type, MSG_SET_DRIVERS);
        assert_eq!(BoardCommand::from_frame(&frame).unwrap(), original);
    }

    #[test]
    fn test_host_command_roundtrip() {
        let commands = [
            HostCommand::Ping,
            HostCommand::Play,
            HostCommand::Apply { index: 7 },
            HostCommand::Load {
                name: name("fireworks"),
            },
            HostCommand::SetEnabled {
                name: name("waves"),
                enabled: false,
            },
            HostCommand::SetTime {
                weekday: 2,
                hour: 13,
                minute: 37,
            },
            HostCommand::SetSleep {
                weekday: 6,
                hours: 0x0000_00FF,
            },
            HostCommand::Adjust {
                board: 3,
                clock: 1,
                hour: -5,
                minute: 2,
            },
            HostCommand::Position {
                board: 7,
                clock: 2,
                hand: Hand::Minute,
                angle: 315,
                mode: MovementMode::CounterClockwise,
            },
            HostCommand::SetDesigner {
                speed: 2500,
                accel: 800,
            },
            HostCommand::GridStop,
        ];

        for original in commands {
            let frame = original.to_frame().unwrap();
            let parsed = HostCommand::from_frame(&frame).unwrap();
            assert_eq!(original, parsed);
        }
    }

    #[test]
    fn test_host_command_name_not_utf8() {
        let frame = Frame::new(BROADCAST_ADDR, MSG_LOAD, &[0xFF, 0xFE]).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_host_command_name_too_long() {
        let long = [b'a'; MAX_NAME_LEN + 1];
        let frame = Frame::new(BROADCAST_ADDR, MSG_LOAD, &long).unwrap();
        assert_eq!(
            HostCommand::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_host_command_unknown_type() {
        let frame = Frame::empty(BROADCAST_ADDR, 0x7F);
        assert_eq!(
            HostCommand::from_frame(&frame),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_status_roundtrip() {
        let original = MasterReply::Status(StatusReport {
            display_mode: 4,
            auto_mode: 3,
            frequency: 1,
            playback: 1,
            keyframe_index: 12,
            keyframe_count: 32,
            loaded: true,
            drivers_on: true,
            designer_speed: 1000,
            designer_accel: 500,
            name: name("fireworks"),
        });
        let frame = original.to_frame().unwrap();
        let parsed = MasterReply::from_frame(&frame).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_name_reply_roundtrip() {
        let original = MasterReply::Name {
            name: name("heartbeat"),
            enabled: true,
        };
        let frame = original.to_frame().unwrap();
        assert_eq!(MasterReply::from_frame(&frame).unwrap(), original);
    }
}
