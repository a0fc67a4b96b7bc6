//! Persistent storage abstractions
//!
//! Provides a byte-addressable view of EEPROM-like storage. Wear
//! levelling, if any, lives below this trait.

/// Byte-addressable persistent storage
pub trait PersistentStorage {
    /// Read one byte
    ///
    /// Addresses past [`PersistentStorage::size`] read as erased (0xFF).
    fn read_byte(&mut self, addr: u16) -> u8;

    /// Write one byte
    ///
    /// Writes past [`PersistentStorage::size`] are ignored.
    fn write_byte(&mut self, addr: u16, value: u8);

    /// Number of addressable bytes
    fn size(&self) -> u16;
}

/// Value of an erased storage byte
pub const ERASED_BYTE: u8 = 0xFF;

/// Placeholder for boards without persistent storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoStorage;

impl PersistentStorage for NoStorage {
    fn read_byte(&mut self, _addr: u16) -> u8 {
        ERASED_BYTE
    }

    fn write_byte(&mut self, _addr: u16, _value: u8) {}

    fn size(&self) -> u16 {
        0
    }
}

/// Storage image held in RAM
///
/// Useful on hosts and as a write-back cache in front of slow flash.
#[derive(Debug, Clone)]
pub struct RamStorage<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStorage<N> {
    /// Create an erased image
    pub const fn new() -> Self {
        Self {
            bytes: [ERASED_BYTE; N],
        }
    }

    /// Create an image from existing contents
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> PersistentStorage for RamStorage<N> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.bytes
            .get(usize::from(addr))
            .copied()
            .unwrap_or(ERASED_BYTE)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        if let Some(slot) = self.bytes.get_mut(usize::from(addr)) {
            *slot = value;
        }
    }

    fn size(&self) -> u16 {
        N.min(usize::from(u16::MAX)) as u16
    }
}
