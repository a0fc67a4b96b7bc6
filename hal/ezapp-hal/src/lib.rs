//! EZApp Hardware Abstraction Layer
//!
//! This crate defines the collaborators the EZApp stack needs from the
//! board it runs on. Chip-specific code (a UART wired to a Bluetooth SPP
//! module, an EEPROM, a timer) implements these traits; the protocol and
//! registry crates only ever see the traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ezapp-firmware, etc.)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ezapp-core (registry, dispatcher)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ezapp-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::ByteTransport`] - Duplex byte stream (Bluetooth SPP, UART)
//! - [`storage::PersistentStorage`] - Byte-addressable EEPROM-like storage
//! - [`tick::TickSource`] - Free-running tick counter

#![no_std]
#![deny(unsafe_code)]

pub mod storage;
pub mod tick;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use storage::{NoStorage, PersistentStorage, RamStorage};
pub use tick::TickSource;
pub use transport::ByteTransport;
