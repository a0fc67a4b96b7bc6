//! Connection tracker implementations

use ezapp_hal::{ByteTransport, TickSource};

/// Idle time after which a timed link is declared dead
pub const LINK_TIMEOUT_SECONDS: u8 = 8;

/// Application-level connection status
///
/// Distinct from the transport's own link status: a link is only
/// connected here once a valid frame has been exchanged.
pub trait ConnectionTracker {
    /// A valid frame was received and dispatched
    fn frame_received(&mut self);

    /// Periodic check, run after every receive pass
    fn poll<T: ByteTransport + ?Sized>(&mut self, transport: &mut T);

    fn is_connected(&self) -> bool;
}

/// Connected from the first valid frame on, never cleared
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTracker {
    connected: bool,
}

impl SimpleTracker {
    pub const fn new() -> Self {
        Self { connected: false }
    }
}

impl ConnectionTracker for SimpleTracker {
    fn frame_received(&mut self) {
        self.connected = true;
    }

    fn poll<T: ByteTransport + ?Sized>(&mut self, _transport: &mut T) {}

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Connection with an idle timeout
///
/// Counts whole seconds without a valid frame while the transport
/// reports a link. At [`LINK_TIMEOUT_SECONDS`] the connection is dropped
/// and the transport is reinitialized. Losing the transport link drops
/// the connection at once.
pub struct TimedTracker<S> {
    ticks: S,
    valid: bool,
    last_seen: u32,
    idle_seconds: u8,
}

impl<S: TickSource> TimedTracker<S> {
    pub fn new(ticks: S) -> Self {
        Self {
            ticks,
            valid: false,
            last_seen: 0,
            idle_seconds: 0,
        }
    }

    /// Whole seconds since the last valid frame
    pub fn idle_seconds(&self) -> u8 {
        self.idle_seconds
    }

    pub fn tick_source_mut(&mut self) -> &mut S {
        &mut self.ticks
    }

    fn ticks_per_second(&self) -> u32 {
        self.ticks.ticks_per_second().max(1)
    }
}

impl<S: TickSource> ConnectionTracker for TimedTracker<S> {
    fn frame_received(&mut self) {
        self.valid = true;
        self.idle_seconds = 0;
        self.last_seen = self.ticks.ticks();
    }

    fn poll<T: ByteTransport + ?Sized>(&mut self, transport: &mut T) {
        if !self.valid {
            return;
        }
        if !transport.is_connected() {
            #[cfg(feature = "defmt")]
            defmt::info!("transport link lost");
            self.valid = false;
            return;
        }

        let per_second = self.ticks_per_second();
        let elapsed = self.ticks.ticks().wrapping_sub(self.last_seen);
        let seconds = elapsed / per_second;
        if seconds == 0 {
            return;
        }
        self.last_seen = self.last_seen.wrapping_add(seconds * per_second);
        self.idle_seconds = self
            .idle_seconds
            .saturating_add(seconds.min(u32::from(u8::MAX)) as u8);

        if self.idle_seconds >= LINK_TIMEOUT_SECONDS {
            #[cfg(feature = "defmt")]
            defmt::warn!("no frame for {=u8}s, resetting link", self.idle_seconds);
            self.valid = false;
            transport.init();
        }
    }

    fn is_connected(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualTicks, MockTransport};

    #[test]
    fn test_simple_tracker() {
        let mut tracker = SimpleTracker::new();
        let mut transport = MockTransport::new();
        assert!(!tracker.is_connected());

        tracker.frame_received();
        transport.connected = false;
        tracker.poll(&mut transport);
        assert!(tracker.is_connected());
        assert_eq!(transport.init_calls, 0);
    }

    #[test]
    fn test_timeout_resets_transport_once() {
        let mut tracker = TimedTracker::new(ManualTicks::new(1000));
        let mut transport = MockTransport::new();

        tracker.frame_received();
        assert!(tracker.is_connected());

        for _ in 0..7 {
            tracker.tick_source_mut().advance_seconds(1);
            tracker.poll(&mut transport);
        }
        assert!(tracker.is_connected());
        assert_eq!(tracker.idle_seconds(), 7);

        tracker.tick_source_mut().advance_seconds(1);
        tracker.poll(&mut transport);
        assert!(!tracker.is_connected());
        assert_eq!(transport.init_calls, 1);

        for _ in 0..20 {
            tracker.tick_source_mut().advance_seconds(1);
            tracker.poll(&mut transport);
        }
        assert_eq!(transport.init_calls, 1);
    }

    #[test]
    fn test_frame_restarts_idle_count() {
        let mut tracker = TimedTracker::new(ManualTicks::new(100));
        let mut transport = MockTransport::new();
        tracker.frame_received();

        for _ in 0..6 {
            tracker.tick_source_mut().advance_seconds(1);
            tracker.poll(&mut transport);
        }
        tracker.frame_received();
        assert_eq!(tracker.idle_seconds(), 0);

        for _ in 0..6 {
            tracker.tick_source_mut().advance_seconds(1);
            tracker.poll(&mut transport);
        }
        assert!(tracker.is_connected());
        assert_eq!(transport.init_calls, 0);
    }

    #[test]
    fn test_partial_seconds_accumulate() {
        let mut tracker = TimedTracker::new(ManualTicks::new(1000));
        let mut transport = MockTransport::new();
        tracker.frame_received();

        for _ in 0..3 {
            tracker.tick_source_mut().now += 500;
            tracker.poll(&mut transport);
        }
        assert_eq!(tracker.idle_seconds(), 1);
    }

    #[test]
    fn test_lost_transport_drops_immediately() {
        let mut tracker = TimedTracker::new(ManualTicks::new(1000));
        let mut transport = MockTransport::new();
        tracker.frame_received();

        transport.connected = false;
        tracker.poll(&mut transport);
        assert!(!tracker.is_connected());
        assert_eq!(transport.init_calls, 0);
    }

    #[test]
    fn test_wrapping_ticks() {
        let mut tracker = TimedTracker::new(ManualTicks::new(10));
        tracker.tick_source_mut().now = u32::MAX - 5;
        let mut transport = MockTransport::new();
        tracker.frame_received();

        tracker.tick_source_mut().advance_seconds(9);
        tracker.poll(&mut transport);
        assert!(!tracker.is_connected());
        assert_eq!(transport.init_calls, 1);
    }
}
