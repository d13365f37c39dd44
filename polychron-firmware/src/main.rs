//! Polychron - kinetic clock sculpture master firmware
//!
//! Main firmware binary for the RP2040 master controller. Owns the
//! display engine and feeds eight clock boards over a one-way UART
//! bus, with a second UART carrying the control link.
//!
//! Named after the Greek "polychronos" meaning "many times" -
//! twenty-four clock faces keeping their own time until told to agree.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart, UartTx};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use polychron_core::api::Controller;

use crate::bus::UartClockBus;
use crate::storage::FlashStore;

// Heap allocator for JSON documents
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 128KB (a full 48KB document plus serializer growth)
const HEAP_SIZE: usize = 128 * 1024;

mod bus;
mod channels;
mod storage;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Polychron master firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Persistence first: document index and config come out of flash
    let mut store = FlashStore::new(p.FLASH, p.DMA_CH0);
    let config = store.init().await;

    let mut controller = Controller::new(store, rosc_seed());
    controller.restore_config(config);
    info!("Engine restored");

    // Setup UART for the control link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for control link");

    // Clock bus TX; one way, nothing ever comes back
    let bus_tx = UartTx::new_blocking(p.UART1, p.PIN_8, UartConfig::default());
    let bus = UartClockBus::new(bus_tx);

    info!("Clock bus initialized");

    // Spawn tasks
    spawner.spawn(tasks::tick_task()).unwrap();
    spawner.spawn(tasks::control_rx_task(rx)).unwrap();
    spawner.spawn(tasks::control_tx_task(tx)).unwrap();
    spawner.spawn(tasks::conductor_task(controller, bus)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Seed from the ring oscillator's random bit.
fn rosc_seed() -> u32 {
    let mut seed = 0u32;
    for _ in 0..u32::BITS {
        seed = (seed << 1) | embassy_rp::pac::ROSC.randombit().read().randombit() as u32;
    }
    seed
}
