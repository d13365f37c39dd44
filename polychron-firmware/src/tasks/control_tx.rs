//! Control link transmit task
//!
//! Drains conductor replies onto the control link.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::REPLY_CHANNEL;

/// Control TX task - sends reply frames to the control surface
#[embassy_executor::task]
pub async fn control_tx_task(mut tx: BufferedUartTx) {
    info!("Control TX task started");

    loop {
        let reply = REPLY_CHANNEL.receive().await;

        let frame = match reply.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Reply rejected: {:?}", e);
                continue;
            }
        };

        let mut buf = [0u8; 64];
        match frame.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("Failed to send reply: {:?}", e);
                }
            }
            Err(e) => {
                warn!("Reply encode failed: {:?}", e);
            }
        }
    }
}
