//! Per-field validation steps
//!
//! Every step receives a [`FieldCheck`]: one descriptor of a record's schema
//! together with the values the record holds for it. Steps only append
//! issues; none of them stops the run.

pub mod bindings;
pub mod cardinality;
pub mod references;
pub mod schema;
pub mod types;

use tessera_models::{FieldEntry, FieldValue};
use tessera_schema::{FieldDescriptor, TypeRef};

pub struct FieldCheck<'a> {
    /// Path of the record holding the field
    pub record_path: &'a str,
    pub field: &'a FieldDescriptor,
    /// Populated wire keys of the field (several only for a misused choice)
    pub entries: Vec<FieldEntry<'a>>,
    /// Occurrences held as side-channel content because some of them carry
    /// only metadata
    pub kept: usize,
}

impl<'a> FieldCheck<'a> {
    /// `Appointment.status`, or `DeviceRequest.code[x]` for a choice
    pub fn field_path(&self) -> String {
        if self.field.kind.is_choice() {
            format!("{}.{}[x]", self.record_path, self.field.name)
        } else {
            format!("{}.{}", self.record_path, self.field.name)
        }
    }

    pub fn entry_path(&self, entry: &FieldEntry<'_>) -> String {
        format!("{}.{}", self.record_path, entry.key)
    }

    /// Declared type of the value stored under a wire key of this field
    pub fn declared_type(&self, key: &str) -> Option<TypeRef> {
        self.field
            .wire_keys()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, alt)| alt.unwrap_or_else(|| self.field.kind.types().remove(0)))
    }

    /// Every occurrence with its path; repetitions are indexed
    pub fn items(&self) -> Vec<(String, &'a FieldValue)> {
        self.entries
            .iter()
            .flat_map(|entry| {
                let path = self.entry_path(entry);
                match entry.value {
                    FieldValue::Repeated(items) => items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (format!("{}[{}]", path, i), item))
                        .collect::<Vec<_>>(),
                    single => vec![(path, single)],
                }
            })
            .collect()
    }

    /// Occurrences grouped under their declared type
    pub fn typed_items(&self) -> Vec<(TypeRef, String, &'a FieldValue)> {
        self.entries
            .iter()
            .filter_map(|entry| Some((entry, self.declared_type(entry.key)?)))
            .flat_map(|(entry, type_ref)| {
                let path = self.entry_path(entry);
                match entry.value {
                    FieldValue::Repeated(items) => items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (type_ref.clone(), format!("{}[{}]", path, i), item))
                        .collect::<Vec<_>>(),
                    single => vec![(type_ref, path, single)],
                }
            })
            .collect()
    }
}
