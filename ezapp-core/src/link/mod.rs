//! Link liveness
//!
//! Tracks whether the app is actually talking to us, on top of the
//! transport's own link status.

mod tracker;

pub use tracker::{ConnectionTracker, SimpleTracker, TimedTracker, LINK_TIMEOUT_SECONDS};
