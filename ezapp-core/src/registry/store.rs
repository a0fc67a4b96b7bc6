//! Field storage backends
//!
//! The registry appends to and indexes into a [`FieldStore`]. Two stores
//! are provided: a fixed-capacity `heapless::Vec` and, with the `alloc`
//! feature, a heap-backed `alloc::vec::Vec`.

use crate::field::StoredField;

/// Default capacity of [`StaticFields`], title included
pub const DEFAULT_MAX_FIELDS: usize = 32;

/// Ordered, append-only field storage
pub trait FieldStore {
    /// Number of stored fields
    fn len(&self) -> usize;

    /// Field at `index`
    fn get(&self, index: usize) -> Option<&StoredField>;

    /// Mutable field at `index`
    fn get_mut(&mut self, index: usize) -> Option<&mut StoredField>;

    /// Append a field, handing it back if there is no room
    fn push(&mut self, field: StoredField) -> Result<(), StoredField>;

    /// Remove every field
    fn clear(&mut self);

    /// Returns true if no field is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed-capacity storage
pub type StaticFields<const N: usize = DEFAULT_MAX_FIELDS> = heapless::Vec<StoredField, N>;

impl<const N: usize> FieldStore for heapless::Vec<StoredField, N> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&StoredField> {
        self.as_slice().get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut StoredField> {
        self.as_mut_slice().get_mut(index)
    }

    fn push(&mut self, field: StoredField) -> Result<(), StoredField> {
        heapless::Vec::push(self, field)
    }

    fn clear(&mut self) {
        heapless::Vec::clear(self);
    }
}

/// Heap-backed storage
#[cfg(feature = "alloc")]
pub type DynamicFields = alloc::vec::Vec<StoredField>;

#[cfg(feature = "alloc")]
impl FieldStore for alloc::vec::Vec<StoredField> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&StoredField> {
        self.as_slice().get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut StoredField> {
        self.as_mut_slice().get_mut(index)
    }

    /// Allocation failure is reported instead of aborting
    fn push(&mut self, field: StoredField) -> Result<(), StoredField> {
        if self.try_reserve(1).is_err() {
            return Err(field);
        }
        alloc::vec::Vec::push(self, field);
        Ok(())
    }

    fn clear(&mut self) {
        alloc::vec::Vec::clear(self);
    }
}
