//! Choreography engine
//!
//! Named keyframe sequences for the whole grid: the data model and its
//! JSON document form, the flat named-document store, the pure cascade
//! delay function, and the playback state machine that dispatches
//! keyframes through the clock grid.

pub mod cascade;
pub mod engine;
#[cfg(feature = "json")]
pub mod json;
pub mod model;
pub mod store;

pub use cascade::{cascade_delay, CascadeMode};
pub use engine::{PlaybackState, Player};
pub use model::{
    ChoreoName, Choreography, ClockPose, HandDir, Keyframe, PoseGrid, MAX_CHOREOGRAPHIES,
    MAX_COMMENT_LEN, MAX_KEYFRAMES, MAX_NAME_LEN,
};
#[cfg(feature = "json")]
pub use store::MemoryStore;
pub use store::{ChoreoStore, StoreError};
