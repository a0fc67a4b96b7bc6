//! Bluetooth SPP module on a buffered UART
//!
//! HC-05 style modules expose a STATE pin that is high while a phone is
//! paired and a RESET pin that restarts the module when pulled low.

use embassy_rp::gpio::{Input, Output};
use embassy_time::{block_for, Duration};
use embedded_io::{Read, ReadReady, Write};
use ezapp_hal::ByteTransport;

/// How long RESET is held low
const RESET_PULSE: Duration = Duration::from_millis(10);

/// Settle time after releasing RESET
const RESET_SETTLE: Duration = Duration::from_millis(100);

/// SPP module transport
pub struct SppTransport<U> {
    uart: U,
    state: Input<'static>,
    reset: Option<Output<'static>>,
}

impl<U> SppTransport<U>
where
    U: Read + ReadReady + Write,
{
    /// `state` reads high while the module reports a connection
    pub fn new(uart: U, state: Input<'static>) -> Self {
        Self {
            uart,
            state,
            reset: None,
        }
    }

    /// Pulse `reset` low whenever the link is reinitialised
    pub fn with_reset(mut self, reset: Output<'static>) -> Self {
        self.reset = Some(reset);
        self
    }

    /// Discard everything waiting in the receive buffer
    fn drain(&mut self) {
        let mut scratch = [0u8; 16];
        while self.uart.read_ready().unwrap_or(false) {
            match self.uart.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }
}

impl<U> ByteTransport for SppTransport<U>
where
    U: Read + ReadReady + Write,
{
    fn init(&mut self) {
        if let Some(reset) = self.reset.as_mut() {
            reset.set_low();
            block_for(RESET_PULSE);
            reset.set_high();
            block_for(RESET_SETTLE);
        }
        self.drain();

        #[cfg(feature = "defmt")]
        defmt::debug!("SPP link reset");
    }

    fn kbhit(&mut self) -> bool {
        self.uart.read_ready().unwrap_or(false)
    }

    fn getc(&mut self) -> u8 {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(1) => byte[0],
            _ => 0,
        }
    }

    fn putc(&mut self, byte: u8) {
        if let Err(_e) = self.uart.write_all(&[byte]) {
            #[cfg(feature = "defmt")]
            defmt::warn!("SPP write failed: {}", defmt::Debug2Format(&_e));
        }
    }

    fn is_connected(&mut self) -> bool {
        self.state.is_high()
    }
}
