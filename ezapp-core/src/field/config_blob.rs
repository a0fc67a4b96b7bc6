//! Per-type 8-byte field configuration
//!
//! The app interprets the blob according to the field type. Multi-byte
//! numbers are little-endian; colors are B, G, R.
//!
//! | Type    | Layout                                                    |
//! |---------|-----------------------------------------------------------|
//! | String  | kind, capacity, 0…                                        |
//! | Analog  | style, decimals (low nibble), scale u16, max u16, min u16 |
//! | Buttons | style, count, flags (bit 0: captions in extended), 0…     |
//! | Digital | style, on B G R, off B G R, 0                             |
//! | Spacer  | size, B G R, flags (bit 0: dynamic), 0…                   |
//! | Alert   | level, 0…                                                 |
//! | Style   | font size, alignment, fg B G R, bg B G R                  |

use crate::config::Rgb;

/// Size of every config blob
pub const CONFIG_BLOB_SIZE: usize = 8;

/// Raw config bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigBlob(pub [u8; CONFIG_BLOB_SIZE]);

/// How a string field is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StringKind {
    /// Text shown to the user
    Display = 0,
    /// Text the user can edit
    Input = 1,
    /// Fixed-length binary data shown as hex
    Binary = 2,
}

/// How an analog value is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AnalogStyle {
    Bar = 0,
    Gauge = 1,
    Number = 2,
    /// The only style the app can change
    Slider = 3,
}

/// Analog field parameters
///
/// The app shows `value * scale / 10^decimals`, clamped to `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogConfig {
    pub style: AnalogStyle,
    /// Decimal places, 0-15
    pub decimals: u8,
    pub scale: u16,
    pub max: u16,
    pub min: u16,
}

impl AnalogConfig {
    /// Unscaled integer display from 0 to `max`
    pub const fn plain(style: AnalogStyle, max: u16) -> Self {
        Self {
            style,
            decimals: 0,
            scale: 1,
            max,
            min: 0,
        }
    }
}

/// Button group behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ButtonStyle {
    /// Value bit N is set while button N is pressed
    Momentary = 0,
    /// Value bit N toggles on each press of button N
    Toggle = 1,
    /// One button with an off and on caption; value is 0 or 1
    TwoState = 2,
    /// Drop-down list; value is the selected option
    Pulldown = 3,
}

/// Digital indicator behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DigitalStyle {
    /// Read-only lamp
    Led = 0,
    /// Switch the app can flip
    Switch = 1,
}

/// Text alignment of a style block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Align {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// Appearance applied by a style field to the fields after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldStyle {
    pub font_size: u8,
    pub align: Align,
    pub foreground: Rgb,
    pub background: Rgb,
}

impl Default for FieldStyle {
    fn default() -> Self {
        Self {
            font_size: 12,
            align: Align::Left,
            foreground: Rgb::BLACK,
            background: Rgb::WHITE,
        }
    }
}

const BUTTONS_CAPTIONS_IN_EXT: u8 = 0x01;
const SPACER_DYNAMIC: u8 = 0x01;

impl ConfigBlob {
    pub fn string(kind: StringKind, capacity: u8) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = kind as u8;
        b[1] = capacity;
        Self(b)
    }

    pub fn analog(config: &AnalogConfig) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = config.style as u8;
        b[1] = config.decimals & 0x0F;
        b[2..4].copy_from_slice(&config.scale.to_le_bytes());
        b[4..6].copy_from_slice(&config.max.to_le_bytes());
        b[6..8].copy_from_slice(&config.min.to_le_bytes());
        Self(b)
    }

    pub fn buttons(style: ButtonStyle, count: u8, captions_in_ext: bool) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = style as u8;
        b[1] = count;
        if captions_in_ext {
            b[2] |= BUTTONS_CAPTIONS_IN_EXT;
        }
        Self(b)
    }

    pub fn digital(style: DigitalStyle, on: Rgb, off: Rgb) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = style as u8;
        b[1..4].copy_from_slice(&on.to_wire());
        b[4..7].copy_from_slice(&off.to_wire());
        Self(b)
    }

    pub fn spacer(size: u8, color: Rgb, dynamic: bool) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = size;
        b[1..4].copy_from_slice(&color.to_wire());
        if dynamic {
            b[4] |= SPACER_DYNAMIC;
        }
        Self(b)
    }

    pub fn alert(level: u8) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = level;
        Self(b)
    }

    pub fn style(style: &FieldStyle) -> Self {
        let mut b = [0u8; CONFIG_BLOB_SIZE];
        b[0] = style.font_size;
        b[1] = style.align as u8;
        b[2..5].copy_from_slice(&style.foreground.to_wire());
        b[5..8].copy_from_slice(&style.background.to_wire());
        Self(b)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; CONFIG_BLOB_SIZE] {
        &self.0
    }
}
