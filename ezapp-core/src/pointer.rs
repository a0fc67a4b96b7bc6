//! Location-tagged payload pointers
//!
//! A field's extended payload may live in RAM, in read-only program
//! storage, or in byte-addressable persistent storage. [`Extended`]
//! owns the description of where it lives; [`UniversalPtr`] is a
//! short-lived read cursor over it that routes every byte through
//! exactly one of the three read paths.

use ezapp_hal::{NoStorage, PersistentStorage};
use ezapp_protocol::{ByteSink, FrameWriter, MAX_PAYLOAD_SIZE};
use heapless::Vec;

/// Largest RAM-resident extended payload
///
/// One byte below the frame payload limit so an extended write
/// (`[index, bytes…]`) always fits in a single frame.
pub const MAX_EXT_SIZE: usize = MAX_PAYLOAD_SIZE - 1;

/// Persistent address that means "no data"
pub const NO_DATA_ADDRESS: u16 = 0xFFFF;

/// Bytes at or above this value end a string, as does 0
pub const STRING_STOP: u8 = 0x7F;

/// Where a payload lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Location {
    /// Mutable memory owned by the registry
    Ram = 0,
    /// Constant data compiled into the program
    ReadOnly = 1,
    /// EEPROM-like storage behind [`PersistentStorage`]
    Persistent = 2,
}

/// Backing store of an extended payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtStorage {
    /// Registry-owned buffer, zero-padded to its declared length
    Ram(Vec<u8, MAX_EXT_SIZE>),
    /// Constant data; `None` is a null pointer
    ReadOnly(Option<&'static [u8]>),
    /// `len` bytes starting at `addr`
    Persistent { addr: u16, len: u16 },
}

/// A field's extended payload: where it lives and how to read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extended {
    pub storage: ExtStorage,
    /// Strings stop at the first 0 or high byte; blobs are exactly `len` bytes
    pub is_string: bool,
}

impl Extended {
    /// RAM buffer of `capacity` bytes holding `initial`
    ///
    /// `capacity` is clamped to [`MAX_EXT_SIZE`]; `initial` is truncated
    /// to fit. Strings keep room for their terminator.
    pub fn ram(initial: &[u8], capacity: usize, is_string: bool) -> Self {
        let mut ext = Self {
            storage: ExtStorage::Ram(Vec::new()),
            is_string,
        };
        if let ExtStorage::Ram(buf) = &mut ext.storage {
            let _ = buf.resize(capacity.min(MAX_EXT_SIZE), 0);
        }
        ext.write(initial, is_string, &mut NoStorage);
        ext
    }

    /// Constant string
    pub fn rom_str(text: &'static str) -> Self {
        Self {
            storage: ExtStorage::ReadOnly(Some(text.as_bytes())),
            is_string: true,
        }
    }

    /// Constant byte blob
    pub fn rom_bytes(bytes: &'static [u8]) -> Self {
        Self {
            storage: ExtStorage::ReadOnly(Some(bytes)),
            is_string: false,
        }
    }

    /// Persistent region
    pub fn persistent(addr: u16, len: u16, is_string: bool) -> Self {
        Self {
            storage: ExtStorage::Persistent { addr, len },
            is_string,
        }
    }

    /// Location tag
    pub fn location(&self) -> Location {
        match self.storage {
            ExtStorage::Ram(_) => Location::Ram,
            ExtStorage::ReadOnly(_) => Location::ReadOnly,
            ExtStorage::Persistent { .. } => Location::Persistent,
        }
    }

    /// Declared length in bytes
    pub fn len(&self) -> u16 {
        match &self.storage {
            ExtStorage::Ram(buf) => buf.len() as u16,
            ExtStorage::ReadOnly(bytes) => {
                bytes.map_or(0, |b| b.len().min(usize::from(u16::MAX)) as u16)
            }
            ExtStorage::Persistent { len, .. } => *len,
        }
    }

    /// Returns true if the declared length is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read cursor positioned at the first byte
    pub fn pointer(&self) -> UniversalPtr<'_> {
        let target = match &self.storage {
            ExtStorage::Ram(buf) => Target::Ram(Some(buf.as_slice())),
            ExtStorage::ReadOnly(bytes) => Target::ReadOnly(*bytes),
            ExtStorage::Persistent { addr, .. } => Target::Persistent(*addr),
        };
        UniversalPtr {
            target,
            is_string: self.is_string,
            len: self.len(),
        }
    }

    /// Overwrite the payload with `data`
    ///
    /// At most `len` bytes are stored. When `terminate` is set the data is
    /// cut one byte short of `len` if needed and followed by a 0. Writes
    /// to read-only storage are ignored.
    pub fn write<E: PersistentStorage + ?Sized>(
        &mut self,
        data: &[u8],
        terminate: bool,
        storage: &mut E,
    ) {
        match &mut self.storage {
            ExtStorage::Ram(buf) => {
                let room = if terminate {
                    buf.len().saturating_sub(1)
                } else {
                    buf.len()
                };
                let n = data.len().min(room);
                buf[..n].copy_from_slice(&data[..n]);
                buf[n..].fill(0);
            }
            ExtStorage::ReadOnly(_) => {}
            ExtStorage::Persistent { addr, len } => {
                let len = usize::from(*len);
                let room = if terminate { len.saturating_sub(1) } else { len };
                let n = data.len().min(room);
                let mut at = *addr;
                for &byte in &data[..n] {
                    storage.write_byte(at, byte);
                    at = at.wrapping_add(1);
                }
                if terminate && n < len {
                    storage.write_byte(at, 0);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target<'a> {
    Ram(Option<&'a [u8]>),
    ReadOnly(Option<&'a [u8]>),
    Persistent(u16),
}

/// Read cursor over a location-tagged payload
///
/// Each [`UniversalPtr::deref_byte`] reads through the path selected by
/// the tag and advances the cursor by one byte. Reads past the end of a
/// RAM or read-only slice yield 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniversalPtr<'a> {
    target: Target<'a>,
    is_string: bool,
    len: u16,
}

impl<'a> UniversalPtr<'a> {
    /// A null RAM pointer
    pub const fn null() -> Self {
        Self {
            target: Target::Ram(None),
            is_string: true,
            len: 0,
        }
    }

    /// Wrap a constant string, as used for labels
    pub const fn from_static(text: Option<&'static str>) -> Self {
        let target = match text {
            Some(t) => Target::ReadOnly(Some(t.as_bytes())),
            None => Target::ReadOnly(None),
        };
        Self {
            target,
            is_string: true,
            len: 0,
        }
    }

    /// Location tag
    pub fn location(&self) -> Location {
        match self.target {
            Target::Ram(_) => Location::Ram,
            Target::ReadOnly(_) => Location::ReadOnly,
            Target::Persistent(_) => Location::Persistent,
        }
    }

    /// Per-location null test
    pub fn is_null(&self) -> bool {
        match self.target {
            Target::Ram(bytes) | Target::ReadOnly(bytes) => bytes.is_none(),
            Target::Persistent(addr) => addr == NO_DATA_ADDRESS,
        }
    }

    /// Whether reads stop at a string terminator
    pub fn is_string(&self) -> bool {
        self.is_string
    }

    /// Declared length (0 for unbounded strings)
    pub fn len(&self) -> u16 {
        self.len
    }

    /// Returns true if the declared length is zero
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read one byte and advance
    pub fn deref_byte<E: PersistentStorage + ?Sized>(&mut self, storage: &mut E) -> u8 {
        match &mut self.target {
            Target::Ram(bytes) | Target::ReadOnly(bytes) => match bytes {
                Some(slice) => {
                    let current: &'a [u8] = *slice;
                    match current.split_first() {
                        Some((&first, rest)) => {
                            *slice = rest;
                            first
                        }
                        None => 0,
                    }
                }
                None => 0,
            },
            Target::Persistent(addr) => {
                let byte = storage.read_byte(*addr);
                *addr = addr.wrapping_add(1);
                byte
            }
        }
    }

    /// `cap`, or the declared length when it is non-zero and smaller
    fn limit(&self, cap: usize) -> usize {
        if self.len == 0 {
            cap
        } else {
            cap.min(usize::from(self.len))
        }
    }

    /// Stream a string: bytes up to (not including) the first 0 or
    /// byte >= 0x7F, then one 0 terminator
    ///
    /// A null pointer sends only the terminator. A non-zero declared
    /// length also bounds the read, and the text is cut short so the
    /// terminator still fits in the frame.
    pub fn transmit_string<E, W>(&mut self, storage: &mut E, out: &mut FrameWriter<'_, W>)
    where
        E: PersistentStorage + ?Sized,
        W: ByteSink + ?Sized,
    {
        if !self.is_null() {
            for _ in 0..self.limit(usize::MAX) {
                if out.remaining() <= 1 {
                    break;
                }
                let byte = self.deref_byte(storage);
                if byte == 0 || byte >= STRING_STOP {
                    break;
                }
                out.byte(byte);
            }
        }
        if out.remaining() > 0 {
            out.byte(0);
        }
    }

    /// Stream the payload: strings as in [`UniversalPtr::transmit_string`],
    /// blobs as `len` bytes or as many as the frame has room for (nothing
    /// if null)
    pub fn transmit_info<E, W>(&mut self, storage: &mut E, out: &mut FrameWriter<'_, W>)
    where
        E: PersistentStorage + ?Sized,
        W: ByteSink + ?Sized,
    {
        if self.is_string {
            self.transmit_string(storage, out);
        } else if !self.is_null() {
            for _ in 0..self.len {
                if out.remaining() == 0 {
                    break;
                }
                let byte = self.deref_byte(storage);
                out.byte(byte);
            }
        }
    }

    /// Collect a string into `out` without its terminator
    ///
    /// Stops at `N` bytes or at a non-zero declared length.
    pub fn read_string<E: PersistentStorage + ?Sized, const N: usize>(
        &mut self,
        storage: &mut E,
    ) -> Vec<u8, N> {
        let mut out = Vec::new();
        if self.is_null() {
            return out;
        }
        for _ in 0..self.limit(N) {
            let byte = self.deref_byte(storage);
            if byte == 0 || byte >= STRING_STOP {
                break;
            }
            let _ = out.push(byte);
        }
        out
    }

    /// Collect exactly `len` bytes (capped at `N`)
    pub fn read_bytes<E: PersistentStorage + ?Sized, const N: usize>(
        &mut self,
        storage: &mut E,
    ) -> Vec<u8, N> {
        let mut out = Vec::new();
        if self.is_null() {
            return out;
        }
        for _ in 0..usize::from(self.len).min(N) {
            let byte = self.deref_byte(storage);
            let _ = out.push(byte);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ezapp_hal::RamStorage;
    use ezapp_protocol::{FrameParser, EOF, SOF};

    /// Payload of a frame written by `f`
    fn transmitted(
        f: impl FnOnce(&mut FrameWriter<'_, Vec<u8, 128>>),
    ) -> Vec<u8, MAX_PAYLOAD_SIZE> {
        let mut out = Vec::<u8, 128>::new();
        let mut writer = FrameWriter::begin(&mut out, 0, 0x44);
        f(&mut writer);
        writer.finish();
        let mut parser: FrameParser = FrameParser::new();
        parser.feed_bytes(&out).unwrap().unwrap().payload
    }

    #[test]
    fn test_null_tests_are_per_location() {
        assert!(UniversalPtr::null().is_null());
        assert!(UniversalPtr::from_static(None).is_null());
        assert!(!UniversalPtr::from_static(Some("")).is_null());
        assert!(Extended::persistent(NO_DATA_ADDRESS, 4, true).pointer().is_null());
        assert!(!Extended::persistent(0, 4, true).pointer().is_null());
    }

    #[test]
    fn test_deref_advances_each_location() {
        let mut storage = RamStorage::<8>::from_bytes([10, 11, 12, 13, 14, 15, 16, 17]);

        let ram = Extended::ram(&[1, 2], 4, false);
        let mut ptr = ram.pointer();
        assert_eq!(ptr.location(), Location::Ram);
        assert_eq!(ptr.deref_byte(&mut storage), 1);
        assert_eq!(ptr.deref_byte(&mut storage), 2);
        assert_eq!(ptr.deref_byte(&mut storage), 0);

        let rom = Extended::rom_str("ab");
        let mut ptr = rom.pointer();
        assert_eq!(ptr.location(), Location::ReadOnly);
        assert_eq!(ptr.deref_byte(&mut storage), b'a');
        assert_eq!(ptr.deref_byte(&mut storage), b'b');
        // past the end
        assert_eq!(ptr.deref_byte(&mut storage), 0);

        let ee = Extended::persistent(6, 2, false);
        let mut ptr = ee.pointer();
        assert_eq!(ptr.location(), Location::Persistent);
        assert_eq!(ptr.deref_byte(&mut storage), 16);
        assert_eq!(ptr.deref_byte(&mut storage), 17);
        // past the end of the device reads erased
        assert_eq!(ptr.deref_byte(&mut storage), 0xFF);
    }

    #[test]
    fn test_transmit_string_terminates() {
        let payload = transmitted(|w| {
            UniversalPtr::from_static(Some("Hi")).transmit_string(&mut NoStorage, w)
        });
        assert_eq!(&payload[..], b"Hi\0");

        let payload = transmitted(|w| UniversalPtr::null().transmit_string(&mut NoStorage, w));
        assert_eq!(&payload[..], &[0]);

        let payload = transmitted(|w| {
            UniversalPtr::from_static(Some("")).transmit_string(&mut NoStorage, w)
        });
        assert_eq!(&payload[..], &[0]);
    }

    #[test]
    fn test_transmit_string_stops_at_high_byte() {
        let ext = Extended::rom_bytes(&[b'o', b'k', 0x7F, b'x']);
        let mut ptr = ext.pointer();
        let payload = transmitted(|w| ptr.transmit_string(&mut NoStorage, w));
        assert_eq!(&payload[..], b"ok\0");

        let mut storage = RamStorage::<4>::from_bytes([b'e', b'e', 0x80, b'z']);
        let ext = Extended::persistent(0, 4, true);
        let payload = transmitted(|w| ext.pointer().transmit_string(&mut storage, w));
        assert_eq!(&payload[..], b"ee\0");
    }

    #[test]
    fn test_transmit_info_blob_is_fixed_length() {
        let mut storage = RamStorage::<4>::from_bytes([0, SOF, 0x80, EOF]);
        let ext = Extended::persistent(0, 4, false);
        let payload = transmitted(|w| ext.pointer().transmit_info(&mut storage, w));
        assert_eq!(&payload[..], &[0, SOF, 0x80, EOF]);

        let ext = Extended::persistent(NO_DATA_ADDRESS, 4, false);
        let payload = transmitted(|w| ext.pointer().transmit_info(&mut storage, w));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_transmit_string_fits_frame() {
        const LONG: &str = "A label far longer than a single frame can carry";
        let payload = transmitted(|w| {
            w.byte(0x01);
            UniversalPtr::from_static(Some(LONG)).transmit_string(&mut NoStorage, w)
        });
        assert_eq!(payload.len(), MAX_PAYLOAD_SIZE);
        assert_eq!(&payload[1..MAX_PAYLOAD_SIZE - 1], &LONG.as_bytes()[..MAX_PAYLOAD_SIZE - 2]);
        assert_eq!(payload[MAX_PAYLOAD_SIZE - 1], 0);
    }

    #[test]
    fn test_transmit_info_blob_fits_frame() {
        let mut storage = RamStorage::<64>::from_bytes([0x55; 64]);
        let ext = Extended::persistent(0, 64, false);
        let payload = transmitted(|w| {
            w.bytes(&[1, 2, 3]);
            ext.pointer().transmit_info(&mut storage, w)
        });
        assert_eq!(payload.len(), MAX_PAYLOAD_SIZE);
        assert!(payload[3..].iter().all(|&b| b == 0x55));
    }

    #[test]
    fn test_read_string_stops_at_declared_length() {
        let mut storage = RamStorage::<8>::from_bytes(*b"abcdnext");
        let ext = Extended::persistent(0, 4, true);
        let text: Vec<u8, 16> = ext.pointer().read_string(&mut storage);
        assert_eq!(&text[..], b"abcd");

        let ext = Extended::rom_str("lynx");
        let text: Vec<u8, 2> = ext.pointer().read_string(&mut NoStorage);
        assert_eq!(&text[..], b"ly");
    }

    #[test]
    fn test_ram_string_keeps_terminator_room() {
        let ext = Extended::ram(b"overflow", 4, true);
        assert_eq!(ext.len(), 4);
        assert_eq!(ext.storage, ExtStorage::Ram(Vec::from_slice(b"ove\0").unwrap()));
    }

    #[test]
    fn test_persistent_write_terminates_string() {
        let mut storage = RamStorage::<8>::new();
        let mut ext = Extended::persistent(2, 4, true);

        ext.write(b"ab", true, &mut storage);
        assert_eq!(
            storage.as_bytes(),
            &[0xFF, 0xFF, b'a', b'b', 0, 0xFF, 0xFF, 0xFF]
        );

        ext.write(b"wxyz", true, &mut storage);
        assert_eq!(&storage.as_bytes()[2..6], b"wxy\0");

        let read: Vec<u8, 8> = ext.pointer().read_string(&mut storage);
        assert_eq!(&read[..], b"wxy");
    }

    #[test]
    fn test_read_only_write_ignored() {
        let mut ext = Extended::rom_str("fixed");
        ext.write(b"new", true, &mut NoStorage);
        assert_eq!(ext, Extended::rom_str("fixed"));
    }
}
