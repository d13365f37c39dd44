//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod bus;
pub mod pacer;

pub use bus::{ClockBus, RecordingBus};
pub use pacer::{Pacer, RecordingPacer};
