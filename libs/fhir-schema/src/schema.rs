//! Record schemas
//!
//! A [`RecordSchema`] is the ordered field list of one record type plus the
//! per-schema rename table the codecs consult. Construction never fails;
//! [`RecordSchema::check`] enforces the descriptor invariants and is run by
//! the registry on every `register`.

use crate::descriptor::{FieldDescriptor, TypeRef};
use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Whether a record type is a standalone resource or an embedded data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    #[default]
    Resource,
    DataType,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource => f.write_str("resource"),
            Self::DataType => f.write_str("data type"),
        }
    }
}

/// Bidirectional host alias <-> wire name table
///
/// Some wire names collide with host-language keywords (`class`, `type`);
/// those fields carry an alias in host-facing representations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    to_wire: BTreeMap<String, String>,
    to_host: BTreeMap<String, String>,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, wire: impl Into<String>) {
        let alias = alias.into();
        let wire = wire.into();
        self.to_host.insert(wire.clone(), alias.clone());
        self.to_wire.insert(alias, wire);
    }

    /// Wire name for a host name; names without an alias map to themselves
    pub fn wire_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_wire.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Host name for a wire name; names without an alias map to themselves
    pub fn host_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_host.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn is_empty(&self) -> bool {
        self.to_wire.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_wire.len()
    }

    /// (alias, wire) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.to_wire.iter().map(|(a, w)| (a.as_str(), w.as_str()))
    }
}

/// A wire key resolved against a schema
#[derive(Debug, Clone, Copy)]
pub struct ResolvedKey<'a> {
    pub index: usize,
    pub field: &'a FieldDescriptor,
    /// The populated alternative, for choice fields
    pub alternative: Option<&'a TypeRef>,
}

impl<'a> ResolvedKey<'a> {
    /// Declared type of the value stored under this key
    pub fn type_ref(&self) -> TypeRef {
        match self.alternative {
            Some(alt) => alt.clone(),
            None => self.field.kind.types().remove(0),
        }
    }
}

/// Named, ordered list of field descriptors for one record type
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    kind: RecordKind,
    fields: Vec<FieldDescriptor>,
    renames: RenameTable,
    key_index: HashMap<String, (usize, Option<usize>)>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, kind: RecordKind, fields: Vec<FieldDescriptor>) -> Self {
        let mut schema = Self {
            name: name.into(),
            kind,
            fields,
            renames: RenameTable::new(),
            key_index: HashMap::new(),
        };
        schema.rebuild_index();
        schema
    }

    pub fn resource(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, RecordKind::Resource, fields)
    }

    pub fn data_type(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, RecordKind::DataType, fields)
    }

    /// Register a host alias for a wire key
    pub fn with_rename(mut self, alias: impl Into<String>, wire: impl Into<String>) -> Self {
        self.renames.insert(alias, wire);
        self
    }

    fn rebuild_index(&mut self) {
        self.key_index.clear();
        for (index, field) in self.fields.iter().enumerate() {
            match &field.kind {
                crate::FieldKind::Choice(alternatives) => {
                    for (alt_index, alt) in alternatives.iter().enumerate() {
                        self.key_index
                            .entry(field.key_for(alt))
                            .or_insert((index, Some(alt_index)));
                    }
                }
                _ => {
                    self.key_index
                        .entry(field.name.clone())
                        .or_insert((index, None));
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn renames(&self) -> &RenameTable {
        &self.renames
    }

    /// Field descriptor by (wire) field name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve a wire key (`status`, `valueString`) or host alias
    pub fn resolve(&self, key: &str) -> Option<ResolvedKey<'_>> {
        let key = self.renames.wire_name(key);
        let (index, alt) = *self.key_index.get(key)?;
        let field = &self.fields[index];
        let alternative = match (&field.kind, alt) {
            (crate::FieldKind::Choice(alternatives), Some(i)) => alternatives.get(i),
            _ => None,
        };
        Some(ResolvedKey {
            index,
            field,
            alternative,
        })
    }

    /// Canonical wire key for a key that may be a host alias
    pub fn wire_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.renames.wire_name(key)
    }

    /// Host-facing key for a wire key
    pub fn host_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.renames.host_name(key)
    }

    /// If `key` looks like an alternative of a choice field that the schema
    /// does not declare (e.g. `valueQuantity` on a string|boolean choice),
    /// return that choice field.
    pub fn undeclared_choice_for(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| {
            field.kind.is_choice()
                && key.len() > field.name.len()
                && key.starts_with(field.name.as_str())
                && key[field.name.len()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_uppercase)
        })
    }

    /// Enforce descriptor invariants
    pub fn check(&self) -> Result<()> {
        let mut keys = HashSet::new();
        for field in &self.fields {
            field.check(&self.name)?;
            for (key, _) in field.wire_keys() {
                if !keys.insert(key.clone()) {
                    return Err(SchemaError::DuplicateField {
                        type_name: self.name.clone(),
                        key,
                    });
                }
            }
        }

        for (alias, wire) in self.renames.iter() {
            if keys.contains(alias) {
                return Err(SchemaError::RenameConflict {
                    type_name: self.name.clone(),
                    alias: alias.to_string(),
                    reason: "an existing wire key".to_string(),
                });
            }
            if !keys.contains(wire) {
                return Err(SchemaError::RenameConflict {
                    type_name: self.name.clone(),
                    alias: alias.to_string(),
                    reason: format!("unknown wire key '{}'", wire),
                });
            }
        }

        Ok(())
    }
}
