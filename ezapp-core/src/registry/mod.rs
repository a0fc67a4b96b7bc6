//! Field registry
//!
//! An append-only, index-addressed sequence of fields plus the unit-wide
//! configuration. Index 0 is always the title field.
//!
//! Every index-addressed operation loads the field into a decoded
//! scratch [`Field`], edits it, and packs it back into the store. An
//! index that does not exist loads as `Field::default()` and is never
//! written back, so reads return defaults and writes have no effect.

mod builders;
pub mod store;

pub use builders::CAPTION_SEPARATOR;
pub use store::{FieldStore, StaticFields, DEFAULT_MAX_FIELDS};

#[cfg(feature = "alloc")]
pub use store::DynamicFields;

use ezapp_hal::{NoStorage, PersistentStorage};
use ezapp_protocol::{ByteSink, FrameWriter, MaskOp};
use heapless::Vec;

use crate::config::{AuthLevel, Palette, UnitConfig};
use crate::field::{
    Capabilities, ConfigBlob, Field, FieldIndex, FieldType, StoredField, StringKind, TITLE_INDEX,
};
use crate::pointer::{Extended, Location, UniversalPtr};

/// Label of the title field until the application sets its own
pub const DEFAULT_TITLE: &str = "CCS EZ App Lynx";

/// Most fields a registry can hold, title included
///
/// Indices are one byte on the wire and 0xFF is reserved.
pub const MAX_FIELD_COUNT: usize = 255;

/// Errors reported to the local application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// No room for another field
    Full,
    /// Index is not a registered field
    IndexOutOfRange,
    /// Field has no extended payload, or its length is zero
    NoExtendedPayload,
    /// Payload lives in read-only storage or the field is read-only
    ReadOnlyStorage,
}

/// The registry
pub struct Registry<F = StaticFields<DEFAULT_MAX_FIELDS>, E = NoStorage> {
    fields: F,
    storage: E,
    unit: UnitConfig,
}

impl<const N: usize> Default for Registry<StaticFields<N>, NoStorage> {
    fn default() -> Self {
        Self::new(StaticFields::new(), NoStorage)
    }
}

impl<F: FieldStore, E: PersistentStorage> Registry<F, E> {
    /// Create a registry holding only the title field
    ///
    /// Any fields already in `fields` are discarded.
    pub fn new(fields: F, storage: E) -> Self {
        let mut registry = Self {
            fields,
            storage,
            unit: UnitConfig::default(),
        };
        registry.clear_all();
        registry
    }

    fn title_field() -> Field {
        Field::new(Capabilities::new(FieldType::String).read_only(true))
            .with_config(ConfigBlob::string(StringKind::Display, 0))
            .with_label(DEFAULT_TITLE)
    }

    /// Remove every field and recreate the title
    pub fn clear_all(&mut self) {
        self.fields.clear();
        // only fails for a zero-capacity store
        let _ = self.fields.push(StoredField::pack(&Self::title_field()));
        self.sync_count();
        self.unit.mark_config_changed();
    }

    fn sync_count(&mut self) {
        self.unit.field_count = self.fields.len() as u16;
    }

    /// Append a field and return its index
    pub fn append(&mut self, field: Field) -> Result<FieldIndex, RegistryError> {
        let index = self.fields.len();
        if index >= MAX_FIELD_COUNT {
            return Err(RegistryError::Full);
        }
        if self.fields.push(StoredField::pack(&field)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("field registry full at {=usize} fields", index);
            return Err(RegistryError::Full);
        }
        self.sync_count();
        self.unit.mark_config_changed();
        Ok(index as FieldIndex)
    }

    /// Number of fields, title included
    pub fn field_count(&self) -> u16 {
        self.unit.field_count
    }

    /// Returns true if `index` is a registered field
    pub fn contains(&self, index: FieldIndex) -> bool {
        usize::from(index) < self.fields.len()
    }

    /// Decoded copy of a field, zeroed if `index` is out of range
    pub fn field(&self, index: FieldIndex) -> Field {
        self.fields
            .get(usize::from(index))
            .map(StoredField::unpack)
            .unwrap_or_default()
    }

    fn store(&mut self, index: FieldIndex, field: &Field) {
        if let Some(slot) = self.fields.get_mut(usize::from(index)) {
            *slot = StoredField::pack(field);
        }
    }

    /// Load, edit and write back one field
    fn update<R>(&mut self, index: FieldIndex, edit: impl FnOnce(&mut Field) -> R) -> R {
        let mut scratch = self.field(index);
        let result = edit(&mut scratch);
        self.store(index, &scratch);
        result
    }

    /// Read a value and clear its kbhit bit
    pub fn get_value(&mut self, index: FieldIndex) -> u16 {
        let field = self.field(index);
        if field.caps.kbhit {
            self.update(index, |f| f.caps.kbhit = false);
        }
        field.value
    }

    /// Read a value without touching kbhit
    pub fn peek_value(&self, index: FieldIndex) -> u16 {
        self.fields
            .get(usize::from(index))
            .map_or(0, StoredField::value)
    }

    /// Value of a field the app changed since the last read, clearing kbhit
    pub fn take_change(&mut self, index: FieldIndex) -> Option<u16> {
        if self.get_kbhit(index) {
            Some(self.get_value(index))
        } else {
            None
        }
    }

    pub fn set_value(&mut self, index: FieldIndex, value: u16) {
        self.update(index, |f| f.value = value);
    }

    /// Returns true if the app changed the field since it was last read
    pub fn get_kbhit(&self, index: FieldIndex) -> bool {
        self.fields
            .get(usize::from(index))
            .is_some_and(|f| f.caps().kbhit)
    }

    /// Read an extended string and clear kbhit
    ///
    /// The terminator is not included. Empty for fields without an
    /// extended payload.
    pub fn get_value_string<const N: usize>(&mut self, index: FieldIndex) -> Vec<u8, N> {
        let text = match self.fields.get(usize::from(index)).and_then(StoredField::ext) {
            Some(ext) => ext.pointer().read_string(&mut self.storage),
            None => Vec::new(),
        };
        if self.get_kbhit(index) {
            self.update(index, |f| f.caps.kbhit = false);
        }
        text
    }

    /// Raw extended payload, exactly its declared length (capped at `N`)
    pub fn ext_bytes<const N: usize>(&mut self, index: FieldIndex) -> Vec<u8, N> {
        match self.fields.get(usize::from(index)).and_then(StoredField::ext) {
            Some(ext) => ext.pointer().read_bytes(&mut self.storage),
            None => Vec::new(),
        }
    }

    fn replace_ext(&mut self, index: FieldIndex, ext: Extended) {
        self.update(index, |f| {
            f.caps.has_ext = true;
            f.ext = Some(ext);
        });
    }

    /// Point the extended payload at a constant string
    pub fn set_value_string_rom(&mut self, index: FieldIndex, text: &'static str) {
        self.replace_ext(index, Extended::rom_str(text));
    }

    /// Copy `text` into the field's RAM payload
    ///
    /// An existing RAM buffer keeps its capacity; otherwise a buffer just
    /// large enough for `text` and its terminator is created.
    pub fn set_value_string_ram(&mut self, index: FieldIndex, text: &[u8]) {
        let mut scratch = self.field(index);
        match scratch.ext.as_mut() {
            Some(ext) if ext.location() == Location::Ram => {
                let terminate = ext.is_string;
                ext.write(text, terminate, &mut self.storage);
            }
            _ => {
                scratch.ext = Some(Extended::ram(text, text.len() + 1, true));
                scratch.caps.has_ext = true;
            }
        }
        self.store(index, &scratch);
    }

    /// Point the extended payload at `len` bytes of persistent storage
    pub fn set_value_string_persistent(&mut self, index: FieldIndex, addr: u16, len: u16) {
        self.replace_ext(index, Extended::persistent(addr, len, true));
    }

    pub fn set_label(&mut self, index: FieldIndex, label: &'static str) {
        if !self.contains(index) {
            return;
        }
        self.update(index, |f| {
            f.caps.has_label = true;
            f.label = Some(label);
        });
        self.unit.mark_config_changed();
    }

    /// Replace the title text
    pub fn set_title(&mut self, title: &'static str) {
        self.set_label(TITLE_INDEX, title);
    }

    pub fn set_read_only(&mut self, index: FieldIndex, read_only: bool) {
        self.update(index, |f| f.caps.read_only = read_only);
    }

    pub fn set_clear_on_read(&mut self, index: FieldIndex, clear_on_read: bool) {
        self.update(index, |f| f.caps.clear_on_read = clear_on_read);
    }

    /// Zero a field's value
    pub fn clear_value(&mut self, index: FieldIndex) {
        self.set_value(index, 0);
    }

    fn check_ext_writable(&self, index: FieldIndex) -> Result<(), RegistryError> {
        if usize::from(index) >= usize::from(self.field_count()) {
            return Err(RegistryError::IndexOutOfRange);
        }
        let stored = self
            .fields
            .get(usize::from(index))
            .ok_or(RegistryError::IndexOutOfRange)?;
        let ext = stored.ext().ok_or(RegistryError::NoExtendedPayload)?;
        if ext.location() == Location::ReadOnly || stored.caps().read_only {
            return Err(RegistryError::ReadOnlyStorage);
        }
        if ext.is_empty() {
            return Err(RegistryError::NoExtendedPayload);
        }
        Ok(())
    }

    /// Returns true if the app may replace the field's extended payload
    ///
    /// The index must be in range, the payload must not live in read-only
    /// storage, its length must be non-zero and the field must not be
    /// read-only.
    pub fn is_ext_writable(&self, index: FieldIndex) -> bool {
        self.check_ext_writable(index).is_ok()
    }

    /// Replace an extended payload on behalf of the app
    ///
    /// String fields and string payloads are null-terminated. A successful
    /// write sets kbhit.
    pub fn write_ext(&mut self, index: FieldIndex, data: &[u8]) -> Result<(), RegistryError> {
        self.check_ext_writable(index)?;
        let mut scratch = self.field(index);
        let is_string_field = scratch.field_type() == Some(FieldType::String);
        if let Some(ext) = scratch.ext.as_mut() {
            let terminate = is_string_field || ext.is_string;
            ext.write(data, terminate, &mut self.storage);
        }
        scratch.caps.kbhit = true;
        self.store(index, &scratch);
        Ok(())
    }

    /// Apply a masked write on behalf of the app
    ///
    /// Refused unless the unit is open and the field has a writable
    /// value. Returns true if the value was updated, which also sets
    /// kbhit.
    pub fn apply_update(&mut self, index: FieldIndex, op: Option<MaskOp>, data: u16) -> bool {
        let Some(op) = op else {
            return false;
        };
        if !self.unit.auth_level().allows_writes() {
            return false;
        }
        let caps = self.field(index).caps;
        if !self.contains(index) || !caps.has_value || caps.read_only {
            return false;
        }
        self.update(index, |f| {
            f.value = op.apply(f.value, data);
            f.caps.kbhit = true;
        });
        true
    }

    /// Stream a field's label as a terminated string
    pub fn transmit_label<W: ByteSink + ?Sized>(
        &mut self,
        index: FieldIndex,
        out: &mut FrameWriter<'_, W>,
    ) {
        let label = self
            .fields
            .get(usize::from(index))
            .and_then(StoredField::label);
        UniversalPtr::from_static(label).transmit_string(&mut self.storage, out);
    }

    /// Stream a field's extended payload
    pub fn transmit_ext<W: ByteSink + ?Sized>(
        &mut self,
        index: FieldIndex,
        out: &mut FrameWriter<'_, W>,
    ) {
        let mut ptr = self
            .fields
            .get(usize::from(index))
            .and_then(StoredField::ext)
            .map_or(UniversalPtr::null(), Extended::pointer);
        ptr.transmit_info(&mut self.storage, out);
    }

    /// Unit configuration
    pub fn unit(&self) -> &UnitConfig {
        &self.unit
    }

    /// Mutable unit configuration
    pub fn unit_mut(&mut self) -> &mut UnitConfig {
        &mut self.unit
    }

    pub fn set_auth_level(&mut self, level: AuthLevel) {
        self.unit.set_auth_level(level);
    }

    pub fn auth_level(&self) -> AuthLevel {
        self.unit.auth_level()
    }

    /// Refresh rate hint for the app
    pub fn set_display_rate(&mut self, rate: u16) {
        self.unit.rate = rate;
        self.unit.mark_config_changed();
    }

    pub fn set_colors(&mut self, palette: Palette) {
        self.unit.palette = palette;
        self.unit.mark_config_changed();
    }

    /// Layout cache key for the app
    pub fn set_key(&mut self, key: u32) {
        self.unit.key = key;
        self.unit.mark_config_changed();
    }

    /// Called once the app has read the config
    pub fn clear_config_changed(&mut self) {
        self.unit.poll_flags.config_changed = false;
    }

    pub fn storage(&self) -> &E {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut E {
        &mut self.storage
    }
}
