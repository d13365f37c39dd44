//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use polychron_core::api::{ControlRequest, ControlResponse};

/// Channel capacity for decoded control-link requests
const REQUEST_CHANNEL_SIZE: usize = 8;

/// Channel capacity for queued replies; a directory listing is the
/// longest burst a single request produces
const REPLY_CHANNEL_SIZE: usize = 32;

/// Requests decoded from the control link
pub static REQUEST_CHANNEL: Channel<CriticalSectionRawMutex, ControlRequest, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Replies from the conductor, drained back onto the control link
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, ControlResponse, REPLY_CHANNEL_SIZE> =
    Channel::new();
