//! EZApp Lynx demo unit
//!
//! RP2040 board with an HC-05 style Bluetooth SPP module on UART0. The
//! phone app pairs with the module and renders the GUI described in
//! [`gui`].
//!
//! Wiring:
//!
//! | RP2040 | SPP module |
//! |--------|------------|
//! | GPIO0  | RXD        |
//! | GPIO1  | TXD        |
//! | GPIO2  | STATE      |
//! | GPIO3  | RESET      |

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Instant, Timer};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ezapp_core::{AuthLevel, DynamicFields, EzApp, PasswordAuth, Registry, TimedTracker};
use ezapp_hal::RamStorage;
use ezapp_hal_rp2040::{EmbassyTicks, SppTransport};

use crate::gui::DemoGui;

mod gui;

// Heap allocator for the field list
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

/// Baud rate the SPP module ships with
const SPP_BAUD: u32 = 9600;

/// Password that lifts the unit from read-only to open
const PASSWORD: &[u8] = b"1234";

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("EZApp demo starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = SPP_BAUD;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    let state = Input::new(p.PIN_2, Pull::Down);
    let reset = Output::new(p.PIN_3, Level::High);
    let transport = SppTransport::new(uart, state).with_reset(reset);

    let mut led = Output::new(p.PIN_25, Level::Low);

    let mut registry = Registry::new(DynamicFields::new(), RamStorage::<64>::new());
    let mut gui = match DemoGui::build(&mut registry) {
        Ok(gui) => gui,
        Err(e) => {
            error!("GUI layout failed: {}", e);
            loop {
                Timer::after_secs(60).await;
            }
        }
    };
    registry.set_auth_level(AuthLevel::ReadOnly);
    info!("{} fields registered", registry.field_count());

    let mut app = EzApp::new(transport, registry)
        .with_tracker(TimedTracker::new(EmbassyTicks))
        .with_authenticator(PasswordAuth::new(PASSWORD));
    app.init();

    info!("SPP link initialized");

    let mut was_connected = false;
    loop {
        app.task();

        let connected = app.is_connected();
        if connected != was_connected {
            info!("app {}", if connected { "connected" } else { "disconnected" });
            was_connected = connected;
        }

        let uptime = Instant::now().as_secs() as u32;
        if gui.update(app.registry_mut(), uptime) {
            led.set_high();
        } else {
            led.set_low();
        }

        Timer::after_millis(1).await;
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
