//! Field model
//!
//! A field is one GUI element. [`Field`] is the fully decoded working
//! copy an operation loads, edits and writes back; [`StoredField`] is
//! what the registry keeps, holding only the parts whose has-bit is set
//! in its capability word.

pub mod capabilities;
pub mod config_blob;

pub use capabilities::Capabilities;
pub use config_blob::{
    Align, AnalogConfig, AnalogStyle, ButtonStyle, ConfigBlob, DigitalStyle, FieldStyle,
    StringKind, CONFIG_BLOB_SIZE,
};

use crate::pointer::Extended;

/// Position of a field in the registry
pub type FieldIndex = u8;

/// Index value reported for a field that could not be added
pub const INVALID_INDEX: FieldIndex = 0xFF;

/// Index of the title field
pub const TITLE_INDEX: FieldIndex = 0;

/// GUI element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FieldType {
    /// Text, editable text or binary data
    String = 1,
    /// Bar, gauge, number or slider
    Analog = 2,
    /// Button group or pulldown
    Buttons = 3,
    /// LED or switch
    Digital = 4,
    /// Blank space, optionally labelled
    Spacer = 5,
    /// Pop-up message
    Alert = 6,
    /// Appearance for the following fields
    Style = 7,
}

impl FieldType {
    /// Parse from the capability word's type bits
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FieldType::String),
            2 => Some(FieldType::Analog),
            3 => Some(FieldType::Buttons),
            4 => Some(FieldType::Digital),
            5 => Some(FieldType::Spacer),
            6 => Some(FieldType::Alert),
            7 => Some(FieldType::Style),
            _ => None,
        }
    }

    /// Wire value
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Decoded field record
///
/// `Field::default()` is the zeroed record that operations on an
/// unknown index act on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub caps: Capabilities,
    pub value: u16,
    pub config: ConfigBlob,
    pub label: Option<&'static str>,
    pub ext: Option<Extended>,
}

impl Field {
    /// Start a field with the given capabilities
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: u16) -> Self {
        self.caps.has_value = true;
        self.value = value;
        self
    }

    pub fn with_config(mut self, config: ConfigBlob) -> Self {
        self.caps.has_config = true;
        self.config = config;
        self
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.caps.has_label = true;
        self.label = Some(label);
        self
    }

    pub fn with_ext(mut self, ext: Extended) -> Self {
        self.caps.has_ext = true;
        self.ext = Some(ext);
        self
    }

    /// Field type, `None` for the zeroed record
    pub fn field_type(&self) -> Option<FieldType> {
        self.caps.field_type
    }
}

/// Registry-resident form of a field
///
/// Sub-structures are present exactly when the matching has-bit of the
/// capability word is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredField {
    word: u16,
    value: Option<u16>,
    config: Option<ConfigBlob>,
    label: Option<&'static str>,
    ext: Option<Extended>,
}

impl StoredField {
    /// Pack a working record, dropping parts whose has-bit is clear
    pub fn pack(field: &Field) -> Self {
        let caps = field.caps;
        Self {
            word: caps.bits(),
            value: caps.has_value.then_some(field.value),
            config: caps.has_config.then_some(field.config),
            label: if caps.has_label { field.label } else { None },
            ext: if caps.has_ext { field.ext.clone() } else { None },
        }
    }

    /// Decode into a working record
    pub fn unpack(&self) -> Field {
        Field {
            caps: Capabilities::from_bits(self.word),
            value: self.value.unwrap_or(0),
            config: self.config.unwrap_or_default(),
            label: self.label,
            ext: self.ext.clone(),
        }
    }

    /// Decoded capability word
    pub fn caps(&self) -> Capabilities {
        Capabilities::from_bits(self.word)
    }

    /// Stored value without decoding the whole record
    pub fn value(&self) -> u16 {
        self.value.unwrap_or(0)
    }

    pub fn label(&self) -> Option<&'static str> {
        self.label
    }

    /// Stored extended payload
    pub fn ext(&self) -> Option<&Extended> {
        self.ext.as_ref()
    }
}
