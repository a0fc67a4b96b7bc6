//! Byte transport abstraction
//!
//! The EZApp stack is poll-driven: it checks [`ByteTransport::kbhit`]
//! before every read so a single task pass never blocks waiting for the
//! link.

/// Duplex byte channel to the phone
///
/// Typically a UART connected to a Bluetooth SPP module, but any
/// byte stream works.
pub trait ByteTransport {
    /// Reset and reopen the channel
    ///
    /// Called once at startup and again whenever the link is declared dead.
    fn init(&mut self);

    /// Returns true if at least one received byte is waiting
    fn kbhit(&mut self) -> bool;

    /// Consume one received byte
    ///
    /// Only called after [`ByteTransport::kbhit`] returned true.
    fn getc(&mut self) -> u8;

    /// Send one byte
    fn putc(&mut self, byte: u8);

    /// Link-layer connection status (for example the SPP module's
    /// "connected" pin), independent of whether valid frames arrive
    fn is_connected(&mut self) -> bool;
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn init(&mut self) {
        (**self).init();
    }

    fn kbhit(&mut self) -> bool {
        (**self).kbhit()
    }

    fn getc(&mut self) -> u8 {
        (**self).getc()
    }

    fn putc(&mut self, byte: u8) {
        (**self).putc(byte);
    }

    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }
}
