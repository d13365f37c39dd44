//! Tick task for time-based updates
//!
//! Provides the conductor's periodic heartbeat for:
//! - Wall-clock minute tracking
//! - Auto display scheduling
//! - Settling staged poses onto the bus

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u32 = 100;

/// Signal to notify the conductor of a tick
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u64> = Signal::new();

/// Tick task - sends periodic tick signals with a timestamp
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));

    loop {
        ticker.next().await;

        // Conductor sees time as milliseconds since boot
        TICK_SIGNAL.signal(Instant::now().as_millis());
    }
}
