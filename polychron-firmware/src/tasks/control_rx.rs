//! Control link receive task
//!
//! Receives frames from the control surface and queues decoded
//! requests for the conductor.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use polychron_protocol::{FrameParser, HostCommand};

use crate::channels::REQUEST_CHANNEL;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Control RX task - receives and parses frames from the control link
#[embassy_executor::task]
pub async fn control_rx_task(mut rx: BufferedUartRx) {
    info!("Control RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        // Read available bytes
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                // Feed bytes to parser
                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match HostCommand::from_frame(&frame) {
                            Ok(request) => {
                                // Queue for the conductor, dropping if full
                                if REQUEST_CHANNEL.try_send(request).is_err() {
                                    warn!("Request channel full, dropping command");
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse control command: {:?}", e);
                            }
                        },
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
