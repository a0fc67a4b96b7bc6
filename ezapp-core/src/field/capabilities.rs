//! Field capability word
//!
//! Every field starts with a 16-bit word:
//!
//! ```text
//! bit   0-3  field type (0 = empty record)
//! bit   4    kbhit: value changed by the app, not yet read locally
//! bit   5    read-only for the app
//! bit   6    clear value after an extended read
//! bit   7    reserved
//! bit   8    has value
//! bit   9    has config blob
//! bit  10    has label
//! bit  11    has extended payload
//! bit 12-15  reserved
//! ```

use super::FieldType;

const TYPE_MASK: u16 = 0x000F;
const KBHIT: u16 = 1 << 4;
const READ_ONLY: u16 = 1 << 5;
const CLEAR_ON_READ: u16 = 1 << 6;
const HAS_VALUE: u16 = 1 << 8;
const HAS_CONFIG: u16 = 1 << 9;
const HAS_LABEL: u16 = 1 << 10;
const HAS_EXT: u16 = 1 << 11;

/// Decoded capability word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    pub field_type: Option<FieldType>,
    pub kbhit: bool,
    pub read_only: bool,
    pub clear_on_read: bool,
    pub has_value: bool,
    pub has_config: bool,
    pub has_label: bool,
    pub has_ext: bool,
}

impl Capabilities {
    /// Capabilities of a bare field of the given type
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            kbhit: false,
            read_only: false,
            clear_on_read: false,
            has_value: false,
            has_config: false,
            has_label: false,
            has_ext: false,
        }
    }

    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub const fn clear_on_read(mut self) -> Self {
        self.clear_on_read = true;
        self
    }

    /// Type byte as sent in a field response
    pub fn type_byte(&self) -> u8 {
        self.field_type.map_or(0, FieldType::to_byte)
    }

    /// Pack into the 16-bit word
    pub fn bits(&self) -> u16 {
        let flags = [
            (self.kbhit, KBHIT),
            (self.read_only, READ_ONLY),
            (self.clear_on_read, CLEAR_ON_READ),
            (self.has_value, HAS_VALUE),
            (self.has_config, HAS_CONFIG),
            (self.has_label, HAS_LABEL),
            (self.has_ext, HAS_EXT),
        ];
        flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(u16::from(self.type_byte()) & TYPE_MASK, |acc, (_, bit)| {
                acc | bit
            })
    }

    /// Unpack from the 16-bit word
    pub fn from_bits(bits: u16) -> Self {
        Self {
            field_type: FieldType::from_byte((bits & TYPE_MASK) as u8),
            kbhit: bits & KBHIT != 0,
            read_only: bits & READ_ONLY != 0,
            clear_on_read: bits & CLEAR_ON_READ != 0,
            has_value: bits & HAS_VALUE != 0,
            has_config: bits & HAS_CONFIG != 0,
            has_label: bits & HAS_LABEL != 0,
            has_ext: bits & HAS_EXT != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_layout() {
        let mut caps = Capabilities::new(FieldType::Analog).read_only(true);
        caps.has_value = true;
        caps.has_config = true;
        caps.has_label = true;
        assert_eq!(caps.bits(), 0x0702 | 0x0020);

        let mut caps = Capabilities::new(FieldType::String).clear_on_read();
        caps.has_ext = true;
        assert_eq!(caps.bits(), 0x0841);
    }

    #[test]
    fn test_from_bits() {
        let caps = Capabilities::from_bits(0x0F74);
        assert_eq!(caps.field_type, Some(FieldType::Digital));
        assert!(caps.kbhit && caps.read_only && caps.clear_on_read);
        assert!(caps.has_value && caps.has_config && caps.has_label && caps.has_ext);
        assert_eq!(caps.bits(), 0x0F74);
    }

    #[test]
    fn test_empty_record() {
        let caps = Capabilities::default();
        assert_eq!(caps.bits(), 0);
        assert_eq!(caps.type_byte(), 0);
        assert_eq!(Capabilities::from_bits(0x000E).field_type, None);
    }
}
