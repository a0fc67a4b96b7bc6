//! RP2040-specific HAL for EZApp units
//!
//! Implements the `ezapp-hal` traits on top of embassy-rp:
//!
//! - [`spp::SppTransport`] - buffered UART wired to a Bluetooth SPP module
//! - [`tick::EmbassyTicks`] - embassy time driver as a tick source

#![no_std]

pub mod spp;
pub mod tick;

pub use ezapp_hal::{ByteTransport, TickSource};
pub use spp::SppTransport;
pub use tick::EmbassyTicks;
