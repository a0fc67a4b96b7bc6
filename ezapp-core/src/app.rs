//! Poll-driven EZApp context
//!
//! [`EzApp`] owns everything the protocol needs: the transport, the
//! frame parser, the field registry, a liveness tracker and the login
//! check. The application calls [`EzApp::task`] from its main loop.

use ezapp_hal::{ByteTransport, NoStorage, PersistentStorage};
use ezapp_protocol::{ByteSink, Frame, FrameParser};

use crate::auth::{Authenticator, OpenAccess};
use crate::dispatch::dispatch;
use crate::link::{ConnectionTracker, SimpleTracker};
use crate::registry::{FieldStore, Registry, StaticFields, DEFAULT_MAX_FIELDS};

/// Sends frame bytes straight to a transport
pub struct TransportSink<'a, T: ?Sized>(pub &'a mut T);

impl<T: ByteTransport + ?Sized> ByteSink for TransportSink<'_, T> {
    fn put_byte(&mut self, byte: u8) {
        self.0.putc(byte);
    }
}

/// Protocol context
pub struct EzApp<
    T,
    F = StaticFields<DEFAULT_MAX_FIELDS>,
    E = NoStorage,
    C = SimpleTracker,
    A = OpenAccess,
> {
    transport: T,
    parser: FrameParser,
    registry: Registry<F, E>,
    tracker: C,
    auth: A,
}

impl<T, F, E> EzApp<T, F, E>
where
    T: ByteTransport,
    F: FieldStore,
    E: PersistentStorage,
{
    /// Context with the simple tracker that accepts every login
    pub fn new(transport: T, registry: Registry<F, E>) -> Self {
        Self {
            transport,
            parser: FrameParser::new(),
            registry,
            tracker: SimpleTracker::new(),
            auth: OpenAccess,
        }
    }
}

impl<T, F, E, C, A> EzApp<T, F, E, C, A>
where
    T: ByteTransport,
    F: FieldStore,
    E: PersistentStorage,
    C: ConnectionTracker,
    A: Authenticator,
{
    /// Replace the liveness tracker
    pub fn with_tracker<C2: ConnectionTracker>(self, tracker: C2) -> EzApp<T, F, E, C2, A> {
        EzApp {
            transport: self.transport,
            parser: self.parser,
            registry: self.registry,
            tracker,
            auth: self.auth,
        }
    }

    /// Replace the login check
    pub fn with_authenticator<A2: Authenticator>(self, auth: A2) -> EzApp<T, F, E, C, A2> {
        EzApp {
            transport: self.transport,
            parser: self.parser,
            registry: self.registry,
            tracker: self.tracker,
            auth,
        }
    }

    /// Open the transport
    pub fn init(&mut self) {
        self.parser.reset();
        self.transport.init();
    }

    /// Run one pass: read until one frame has been handled or the
    /// receive queue is empty, then run the liveness check
    ///
    /// Returns true if a valid frame was dispatched.
    pub fn task(&mut self) -> bool {
        let mut handled = false;
        while self.transport.kbhit() {
            let byte = self.transport.getc();
            match self.parser.feed(byte) {
                Ok(None) => {}
                Ok(Some(frame)) => {
                    self.tracker.frame_received();
                    dispatch(
                        &frame,
                        &mut self.registry,
                        &mut self.auth,
                        &mut TransportSink(&mut self.transport),
                    );
                    handled = true;
                    break;
                }
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("bad frame: {}", _e);
                    Frame::<0>::nack().write_to(&mut TransportSink(&mut self.transport));
                    break;
                }
            }
        }
        self.tracker.poll(&mut self.transport);
        handled
    }

    /// Application-level connection status
    pub fn is_connected(&self) -> bool {
        self.tracker.is_connected()
    }

    pub fn registry(&self) -> &Registry<F, E> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<F, E> {
        &mut self.registry
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn tracker_mut(&mut self) -> &mut C {
        &mut self.tracker
    }
}
