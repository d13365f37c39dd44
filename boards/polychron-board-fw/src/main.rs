//! Polychron - clock board firmware
//!
//! One slave board carries three clocks, six steppers. Core0 listens
//! on the shared bus and queues decoded commands; core1 runs the
//! stepping loop and owns every motor pin. The board never transmits.
//!
//! The bus address comes from four solder straps read once at boot.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{Executor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::multicore::{spawn_core1, Stack};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUartRx, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use embedded_io_async::Read;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use polychron_core::board::Board;
use polychron_core::motion::Direction;
use polychron_protocol::{BoardCommand, FrameParser, Hand, BROADCAST_ADDR, CLOCKS_PER_BOARD};

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Step pulse width and direction setup, in core clock cycles (2us)
const STEP_PULSE_CYCLES: u32 = 250;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Core1 runs its own executor for the stepping loop
static mut CORE1_STACK: Stack<65536> = Stack::new();
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

/// Commands decoded on core0, drained by the stepping loop on core1
static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, BoardCommand, 8> = Channel::new();

/// One stepper's STEP/DIR pin pair.
struct StepPins {
    step: Output<'static>,
    dir: Output<'static>,
}

impl StepPins {
    fn new(step: Output<'static>, dir: Output<'static>) -> Self {
        Self { step, dir }
    }

    /// Emit one step edge in the given direction.
    fn step(&mut self, direction: Direction) {
        let level = match direction {
            Direction::Clockwise => Level::High,
            Direction::CounterClockwise => Level::Low,
        };
        self.dir.set_level(level);

        // Direction setup, then the step pulse
        cortex_m::asm::delay(STEP_PULSE_CYCLES);
        self.step.set_high();
        cortex_m::asm::delay(STEP_PULSE_CYCLES);
        self.step.set_low();
    }
}

/// Main entry point (core0)
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Polychron board firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Address straps; open reads high, a jumper to ground sets the bit
    let strap0 = Input::new(p.PIN_16, Pull::Up);
    let strap1 = Input::new(p.PIN_17, Pull::Up);
    let strap2 = Input::new(p.PIN_18, Pull::Up);
    let strap3 = Input::new(p.PIN_19, Pull::Up);
    let address = Board::address_from_straps([
        strap0.is_high(),
        strap1.is_high(),
        strap2.is_high(),
        strap3.is_high(),
    ]);
    info!("Board address {} from straps", address);

    let board = Board::new(address);

    // Six STEP/DIR pairs: hour then minute, clock by clock
    let motors = [
        StepPins::new(Output::new(p.PIN_2, Level::Low), Output::new(p.PIN_3, Level::Low)),
        StepPins::new(Output::new(p.PIN_4, Level::Low), Output::new(p.PIN_5, Level::Low)),
        StepPins::new(Output::new(p.PIN_6, Level::Low), Output::new(p.PIN_7, Level::Low)),
        StepPins::new(Output::new(p.PIN_8, Level::Low), Output::new(p.PIN_9, Level::Low)),
        StepPins::new(Output::new(p.PIN_10, Level::Low), Output::new(p.PIN_11, Level::Low)),
        StepPins::new(Output::new(p.PIN_12, Level::Low), Output::new(p.PIN_13, Level::Low)),
    ];

    // Driver enable is active low; boards power up live
    let enable = Output::new(p.PIN_14, Level::Low);

    // The stepping loop gets core1 to itself
    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| {
                spawner.spawn(stepping_task(board, motors, enable)).unwrap();
            });
        },
    );

    // Bus RX stays on core0
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    // The TX half idles; the bus is one way
    let (_tx, rx) = uart.split();

    spawner.spawn(bus_rx_task(rx, address)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Bus RX task - feeds the frame parser and filters by address
#[embassy_executor::task]
async fn bus_rx_task(mut rx: BufferedUartRx, address: u8) {
    info!("Bus RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];
    let mut dropped: u32 = 0;

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => {
                            if frame.addr != address && frame.addr != BROADCAST_ADDR {
                                continue;
                            }
                            match BoardCommand::from_frame(&frame) {
                                Ok(command) => {
                                    // Queue for core1, dropping if full
                                    if COMMAND_CHANNEL.try_send(command).is_err() {
                                        warn!("Command channel full, dropping frame");
                                    }
                                }
                                Err(e) => {
                                    dropped += 1;
                                    warn!("Dropped malformed command ({} total): {:?}", dropped, e);
                                }
                            }
                        }
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            dropped += 1;
                            warn!("Frame parse error ({} dropped): {:?}", dropped, e);
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

/// Stepping loop (core1) - drains commands, settles targets, emits
/// step edges and tracks the enable pin.
#[embassy_executor::task]
async fn stepping_task(
    mut board: Board,
    mut motors: [StepPins; CLOCKS_PER_BOARD * 2],
    mut enable: Output<'static>,
) {
    info!("Stepping loop running on core1");

    loop {
        while let Ok(command) = COMMAND_CHANNEL.try_receive() {
            match command {
                BoardCommand::SetClocks(message) => board.receive(&message),
                BoardCommand::SetDrivers { on } => board.set_drivers(on),
            }
        }

        board.poll();

        let now_us = Instant::now().as_micros();
        board.run(now_us, |slot, hand, direction| {
            let index = slot * 2
                + match hand {
                    Hand::Hour => 0,
                    Hand::Minute => 1,
                };
            motors[index].step(direction);
        });

        // Enable is active low
        let level = if board.drivers_on() { Level::Low } else { Level::High };
        enable.set_level(level);

        yield_now().await;
    }
}
