//! Typed field constructors
//!
//! Each constructor fills in the capability word and config blob for one
//! kind of GUI element and appends it. Button captions are separated by
//! `'\t'`, one caption per button or pulldown option.

use ezapp_hal::PersistentStorage;

use super::{FieldStore, Registry, RegistryError};
use crate::config::Rgb;
use crate::field::{
    AnalogConfig, AnalogStyle, ButtonStyle, Capabilities, ConfigBlob, DigitalStyle, Field,
    FieldIndex, FieldStyle, FieldType, StringKind,
};
use crate::pointer::{Extended, MAX_EXT_SIZE};

/// Caption separator for buttons and pulldowns
pub const CAPTION_SEPARATOR: char = '\t';

fn caption_count(captions: &str) -> u8 {
    captions
        .split(CAPTION_SEPARATOR)
        .count()
        .min(usize::from(u8::MAX)) as u8
}

fn clamp_len(len: usize) -> u8 {
    len.min(MAX_EXT_SIZE) as u8
}

impl<F: FieldStore, E: PersistentStorage> Registry<F, E> {
    /// Constant text
    pub fn add_string_rom(
        &mut self,
        label: &'static str,
        text: &'static str,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::String).read_only(true))
                .with_config(ConfigBlob::string(StringKind::Display, clamp_len(text.len())))
                .with_label(label)
                .with_ext(Extended::rom_str(text)),
        )
    }

    /// Text the application updates with [`Registry::set_value_string_ram`]
    pub fn add_string_ram(
        &mut self,
        label: &'static str,
        text: &[u8],
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::String).read_only(true))
                .with_config(ConfigBlob::string(StringKind::Display, MAX_EXT_SIZE as u8))
                .with_label(label)
                .with_ext(Extended::ram(text, MAX_EXT_SIZE, true)),
        )
    }

    /// Text box the app can edit, holding up to `capacity - 1` characters
    pub fn add_text_input(
        &mut self,
        label: &'static str,
        initial: &[u8],
        capacity: usize,
    ) -> Result<FieldIndex, RegistryError> {
        let capacity = capacity.min(MAX_EXT_SIZE);
        self.append(
            Field::new(Capabilities::new(FieldType::String))
                .with_config(ConfigBlob::string(StringKind::Input, capacity as u8))
                .with_label(label)
                .with_ext(Extended::ram(initial, capacity, true)),
        )
    }

    /// Text kept in `len` bytes of persistent storage at `addr`
    pub fn add_string_persistent(
        &mut self,
        label: &'static str,
        addr: u16,
        len: u16,
        editable: bool,
    ) -> Result<FieldIndex, RegistryError> {
        let kind = if editable {
            StringKind::Input
        } else {
            StringKind::Display
        };
        self.append(
            Field::new(Capabilities::new(FieldType::String).read_only(!editable))
                .with_config(ConfigBlob::string(kind, len.min(u16::from(u8::MAX)) as u8))
                .with_label(label)
                .with_ext(Extended::persistent(addr, len, true)),
        )
    }

    /// Fixed-length binary data in persistent storage, edited as hex by the app
    pub fn add_bytes_persistent(
        &mut self,
        label: &'static str,
        addr: u16,
        len: u16,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::String))
                .with_config(ConfigBlob::string(
                    StringKind::Binary,
                    len.min(u16::from(u8::MAX)) as u8,
                ))
                .with_label(label)
                .with_ext(Extended::persistent(addr, len, false)),
        )
    }

    /// Integer indicator from 0 to `max`
    pub fn add_analog(
        &mut self,
        label: &'static str,
        style: AnalogStyle,
        max: u16,
    ) -> Result<FieldIndex, RegistryError> {
        self.add_analog_scaled(label, AnalogConfig::plain(style, max))
    }

    /// Scaled analog indicator; sliders are writable by the app
    pub fn add_analog_scaled(
        &mut self,
        label: &'static str,
        config: AnalogConfig,
    ) -> Result<FieldIndex, RegistryError> {
        let read_only = config.style != AnalogStyle::Slider;
        self.append(
            Field::new(Capabilities::new(FieldType::Analog).read_only(read_only))
                .with_value(0)
                .with_config(ConfigBlob::analog(&config))
                .with_label(label),
        )
    }

    pub fn add_slider(&mut self, label: &'static str, max: u16) -> Result<FieldIndex, RegistryError> {
        self.add_analog(label, AnalogStyle::Slider, max)
    }

    /// Drop-down list; the value is the selected option
    pub fn add_pulldown(
        &mut self,
        label: &'static str,
        options: &'static str,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::Buttons))
                .with_value(0)
                .with_config(ConfigBlob::buttons(
                    ButtonStyle::Pulldown,
                    caption_count(options),
                    true,
                ))
                .with_label(label)
                .with_ext(Extended::rom_str(options)),
        )
    }

    /// Button group whose captions are the label
    pub fn add_buttons_rom(
        &mut self,
        captions: &'static str,
        style: ButtonStyle,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::Buttons))
                .with_value(0)
                .with_config(ConfigBlob::buttons(style, caption_count(captions), false))
                .with_label(captions),
        )
    }

    /// Button group with captions copied into RAM
    pub fn add_buttons_ram(
        &mut self,
        captions: &str,
        style: ButtonStyle,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::Buttons))
                .with_value(0)
                .with_config(ConfigBlob::buttons(style, caption_count(captions), true))
                .with_ext(Extended::ram(
                    captions.as_bytes(),
                    captions.len() + 1,
                    true,
                )),
        )
    }

    /// One button alternating between two captions, `"off\ton"`
    pub fn add_button_two_state(
        &mut self,
        captions: &'static str,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::Buttons))
                .with_value(0)
                .with_config(ConfigBlob::buttons(ButtonStyle::TwoState, 1, false))
                .with_label(captions),
        )
    }

    /// LED or switch; only switches are writable by the app
    pub fn add_digital(
        &mut self,
        label: &'static str,
        style: DigitalStyle,
        on: Rgb,
        off: Rgb,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::Digital).read_only(style == DigitalStyle::Led))
                .with_value(0)
                .with_config(ConfigBlob::digital(style, on, off))
                .with_label(label),
        )
    }

    /// Blank gap of `size` pixels in the background color
    pub fn add_spacer(&mut self, size: u8) -> Result<FieldIndex, RegistryError> {
        let color = self.unit().palette.background;
        self.append(
            Field::new(Capabilities::new(FieldType::Spacer))
                .with_config(ConfigBlob::spacer(size, color, false)),
        )
    }

    /// Spacer the application can resize at run time through its value
    pub fn add_spacer_dynamic(
        &mut self,
        label: Option<&'static str>,
        color: Rgb,
        size: u8,
    ) -> Result<FieldIndex, RegistryError> {
        let mut field = Field::new(Capabilities::new(FieldType::Spacer).read_only(true))
            .with_value(u16::from(size))
            .with_config(ConfigBlob::spacer(size, color, true));
        if let Some(label) = label {
            field = field.with_label(label);
        }
        self.append(field)
    }

    /// Pop-up message of up to `capacity - 1` characters
    ///
    /// Hidden until [`Registry::raise_alert`]; the app dismisses it by
    /// reading the message.
    pub fn add_alert(
        &mut self,
        label: &'static str,
        level: u8,
        capacity: usize,
    ) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(
                Capabilities::new(FieldType::Alert)
                    .read_only(true)
                    .clear_on_read(),
            )
            .with_value(0)
            .with_config(ConfigBlob::alert(level))
            .with_label(label)
            .with_ext(Extended::ram(&[], capacity, true)),
        )
    }

    /// Show an alert with `message`
    pub fn raise_alert(&mut self, index: FieldIndex, message: &[u8]) {
        self.set_value_string_ram(index, message);
        self.set_value(index, 1);
    }

    /// Appearance for the fields that follow
    pub fn add_style(&mut self, style: &FieldStyle) -> Result<FieldIndex, RegistryError> {
        self.append(
            Field::new(Capabilities::new(FieldType::Style)).with_config(ConfigBlob::style(style)),
        )
    }
}
