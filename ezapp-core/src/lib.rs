//! Field registry and command handling for EZApp Lynx units
//!
//! A unit describes its GUI as an ordered list of fields. The phone app
//! reads the list once, then polls values and pushes edits back. This
//! crate holds everything above the frame codec:
//!
//! - Location-tagged payload pointers (RAM, read-only, persistent)
//! - Field model, capability word and per-type config blobs
//! - The field registry and its typed constructors
//! - The request dispatcher
//! - Link liveness tracking
//! - [`EzApp`], the poll-driven context tying it together
//!
//! ```text
//! transport bytes ─▶ FrameParser ─▶ dispatch ─▶ Registry
//!                                      │
//! transport bytes ◀── FrameWriter ◀────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod app;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod field;
pub mod link;
pub mod pointer;
pub mod registry;

#[cfg(test)]
mod testing;

pub use app::{EzApp, TransportSink};
pub use auth::{Authenticator, OpenAccess, PasswordAuth};
pub use config::{AuthLevel, Palette, PollFlags, Rgb, UnitConfig};
pub use dispatch::dispatch;
pub use field::{Field, FieldIndex, FieldType, INVALID_INDEX};
pub use link::{ConnectionTracker, SimpleTracker, TimedTracker};
pub use pointer::{Extended, Location, UniversalPtr};
pub use registry::{FieldStore, Registry, RegistryError, StaticFields};

#[cfg(feature = "alloc")]
pub use registry::DynamicFields;
