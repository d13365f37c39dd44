//! Conductor task
//!
//! Single owner of the engine and the clock bus. Control requests and
//! tick signals interleave in one cooperative context; cascade and
//! animation pacing block here while the link tasks keep queueing.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::Instant;

use polychron_core::api::Controller;

use crate::bus::{TimePacer, UartClockBus};
use crate::channels::{REPLY_CHANNEL, REQUEST_CHANNEL};
use crate::storage::FlashStore;
use crate::tasks::tick::TICK_SIGNAL;

/// Conductor task - main coordination loop
#[embassy_executor::task]
pub async fn conductor_task(
    mut controller: Controller<FlashStore<'static>>,
    mut bus: UartClockBus,
) {
    info!("Conductor task started");
    info!("{} choreographies stored", controller.store_mut().len());

    let mut pacer = TimePacer;

    loop {
        match select(REQUEST_CHANNEL.receive(), TICK_SIGNAL.wait()).await {
            Either::First(request) => {
                debug!("Request: {:?}", request);
                let now_ms = Instant::now().as_millis();
                let replies = controller.handle(request, now_ms, &mut bus, &mut pacer);
                for reply in replies {
                    REPLY_CHANNEL.send(reply).await;
                }
                persist_if_dirty(&mut controller).await;
            }
            Either::Second(now_ms) => {
                controller.tick(now_ms, &mut bus, &mut pacer);
                persist_if_dirty(&mut controller).await;
            }
        }
    }
}

/// Push a config snapshot to flash when a request changed it.
async fn persist_if_dirty(controller: &mut Controller<FlashStore<'static>>) {
    if controller.take_dirty() {
        let config = controller.config().clone();
        if let Err(e) = controller.store_mut().save_config(&config).await {
            warn!("Config save failed: {:?}", e);
        }
    }
}
