//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod conductor;
pub mod control_rx;
pub mod control_tx;
pub mod tick;

pub use conductor::conductor_task;
pub use control_rx::control_rx_task;
pub use control_tx::control_tx_task;
pub use tick::tick_task;
