//! Demo screen
//!
//! Lays out one field of most kinds and mirrors the app's edits back
//! into the indicators.

use defmt::*;
use ezapp_core::field::{AnalogStyle, ButtonStyle, DigitalStyle};
use ezapp_core::{FieldIndex, FieldStore, Registry, RegistryError, Rgb};
use ezapp_hal::PersistentStorage;
use heapless::Vec;

/// Modes offered by the pulldown
const MODES: &str = "Off\tSlow\tFast";

/// Longest name accepted from the text box
const NAME_CAPACITY: usize = 17;

/// Seconds between uptime refreshes
const UPTIME_PERIOD: u32 = 1;

/// Indices of the demo fields
pub struct DemoGui {
    level: FieldIndex,
    level_bar: FieldIndex,
    power: FieldIndex,
    power_led: FieldIndex,
    mode: FieldIndex,
    reset: FieldIndex,
    name: FieldIndex,
    greeting: FieldIndex,
    uptime: FieldIndex,
    alert: FieldIndex,
    last_uptime: u32,
    alert_raised: bool,
}

impl DemoGui {
    /// Append the demo fields to `registry`
    pub fn build<F, E>(registry: &mut Registry<F, E>) -> Result<Self, RegistryError>
    where
        F: FieldStore,
        E: PersistentStorage,
    {
        registry.set_title("EZApp Demo");
        registry.add_string_rom("", "Drag the slider or flip the switch")?;
        registry.add_spacer(8)?;

        let level = registry.add_slider("Level", 100)?;
        let level_bar = registry.add_analog("Output", AnalogStyle::Bar, 100)?;
        let power = registry.add_digital("Power", DigitalStyle::Switch, Rgb::GREEN, Rgb::BLACK)?;
        let power_led = registry.add_digital("Running", DigitalStyle::Led, Rgb::GREEN, Rgb::RED)?;
        let mode = registry.add_pulldown("Mode", MODES)?;
        let reset = registry.add_buttons_rom("Reset", ButtonStyle::Momentary)?;

        registry.add_spacer(8)?;
        let name = registry.add_text_input("Your name", b"", NAME_CAPACITY)?;
        let greeting = registry.add_string_ram("", b"Hello!")?;
        let uptime = registry.add_analog("Uptime (s)", AnalogStyle::Number, u16::MAX)?;
        let alert = registry.add_alert("Warning", 1, 32)?;

        Ok(Self {
            level,
            level_bar,
            power,
            power_led,
            mode,
            reset,
            name,
            greeting,
            uptime,
            alert,
            last_uptime: 0,
            alert_raised: false,
        })
    }

    /// React to edits from the app and refresh the indicators
    ///
    /// Returns the requested power state.
    pub fn update<F, E>(&mut self, registry: &mut Registry<F, E>, uptime_secs: u32) -> bool
    where
        F: FieldStore,
        E: PersistentStorage,
    {
        if registry.take_change(self.reset).is_some() {
            info!("reset");
            registry.set_value(self.level, 0);
            registry.set_value(self.level_bar, 0);
            self.alert_raised = false;
        }

        if let Some(level) = registry.take_change(self.level) {
            debug!("level -> {}", level);
            registry.set_value(self.level_bar, level);
            if level >= 100 && !self.alert_raised {
                registry.raise_alert(self.alert, b"Level at maximum");
                self.alert_raised = true;
            } else if level < 100 {
                self.alert_raised = false;
            }
        }

        if let Some(power) = registry.take_change(self.power) {
            info!("power -> {}", power != 0);
            registry.set_value(self.power_led, power);
        }

        if let Some(mode) = registry.take_change(self.mode) {
            info!("mode -> {}", mode);
        }

        if registry.get_kbhit(self.name) {
            let name: Vec<u8, NAME_CAPACITY> = registry.get_value_string(self.name);
            let mut greeting: Vec<u8, 32> = Vec::new();
            let _ = greeting.extend_from_slice(b"Hello, ");
            let _ = greeting.extend_from_slice(&name);
            let _ = greeting.push(b'!');
            registry.set_value_string_ram(self.greeting, &greeting);
        }

        if uptime_secs.wrapping_sub(self.last_uptime) >= UPTIME_PERIOD {
            self.last_uptime = uptime_secs;
            registry.set_value(self.uptime, uptime_secs.min(u32::from(u16::MAX)) as u16);
        }

        registry.peek_value(self.power) != 0
    }
}
