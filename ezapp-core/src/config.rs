//! Unit configuration record
//!
//! The unit-wide settings the app reads with a config request. The wire
//! layout is 19 bytes, little-endian, packed:
//!
//! ```text
//! offset  size  field
//! 0       2     field count
//! 2       2     poll flags (bits 0-1 auth level, bit 2 config changed)
//! 4       2     display rate
//! 6       9     3 × color, each stored B, G, R
//! 15      4     key
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Packed size of [`UnitConfig`]
pub const UNIT_CONFIG_SIZE: usize = 19;

/// Access tier applied to the whole unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AuthLevel {
    /// Values visible and writable
    #[default]
    Open = 0,
    /// Values visible, writes refused
    ReadOnly = 1,
    /// Values hidden (polled as zero), writes refused
    Locked = 2,
}

impl AuthLevel {
    /// Parse from the low two bits of the poll flags
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => AuthLevel::Open,
            1 => AuthLevel::ReadOnly,
            _ => AuthLevel::Locked,
        }
    }

    /// Returns true if remote writes are accepted
    pub fn allows_writes(self) -> bool {
        self == AuthLevel::Open
    }

    /// Returns true if polled values must be hidden
    pub fn hides_values(self) -> bool {
        self == AuthLevel::Locked
    }
}

const POLL_AUTH_MASK: u16 = 0x0003;
const POLL_CONFIG_CHANGED: u16 = 0x0004;

/// Status word sent with every poll, extended and login response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PollFlags {
    /// Current access tier
    pub auth_level: AuthLevel,
    /// Fields or unit settings changed since the app last read the config
    pub config_changed: bool,
}

impl PollFlags {
    /// Pack into the 16-bit wire word
    pub fn bits(self) -> u16 {
        let mut bits = u16::from(self.auth_level as u8) & POLL_AUTH_MASK;
        if self.config_changed {
            bits |= POLL_CONFIG_CHANGED;
        }
        bits
    }

    /// Unpack from the 16-bit wire word
    pub fn from_bits(bits: u16) -> Self {
        Self {
            auth_level: AuthLevel::from_bits((bits & POLL_AUTH_MASK) as u8),
            config_changed: bits & POLL_CONFIG_CHANGED != 0,
        }
    }
}

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const RED: Rgb = Rgb::new(0xFF, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 0xFF, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 0xFF);

    /// Create a color from its components
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Wire order is blue, green, red
    pub const fn to_wire(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

/// The three unit colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Palette {
    /// Screen background
    pub background: Rgb,
    /// Default text color
    pub foreground: Rgb,
    /// Highlight color for titles and controls
    pub accent: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb::WHITE,
            foreground: Rgb::BLACK,
            accent: Rgb::BLUE,
        }
    }
}

/// Unit-wide configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitConfig {
    /// Number of registered fields, including the title
    pub field_count: u16,
    /// Auth level and change flag
    pub poll_flags: PollFlags,
    /// Refresh rate hint for the app (0 = app default)
    pub rate: u16,
    /// Screen colors
    pub palette: Palette,
    /// Opaque key the app may use to cache a unit's layout
    pub key: u32,
}

impl UnitConfig {
    /// Set the access tier
    ///
    /// Authentication callbacks call this on a successful login.
    pub fn set_auth_level(&mut self, level: AuthLevel) {
        self.poll_flags.auth_level = level;
    }

    /// Current access tier
    pub fn auth_level(&self) -> AuthLevel {
        self.poll_flags.auth_level
    }

    /// Flag the layout as changed so the app reloads it
    pub fn mark_config_changed(&mut self) {
        self.poll_flags.config_changed = true;
    }

    /// Pack into the wire layout
    pub fn to_bytes(&self) -> [u8; UNIT_CONFIG_SIZE] {
        let mut out = [0u8; UNIT_CONFIG_SIZE];
        out[0..2].copy_from_slice(&self.field_count.to_le_bytes());
        out[2..4].copy_from_slice(&self.poll_flags.bits().to_le_bytes());
        out[4..6].copy_from_slice(&self.rate.to_le_bytes());
        out[6..9].copy_from_slice(&self.palette.background.to_wire());
        out[9..12].copy_from_slice(&self.palette.foreground.to_wire());
        out[12..15].copy_from_slice(&self.palette.accent.to_wire());
        out[15..19].copy_from_slice(&self.key.to_le_bytes());
        out
    }
}
