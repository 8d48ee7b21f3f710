//! Record instances
//!
//! A [`RecordInstance`] is the runtime value of one record type: its type
//! name, the populated fields keyed by canonical wire key, and an opaque
//! side channel for content no schema field accounts for.
//!
//! Absent fields are simply missing from the map; a present field always
//! carries a value. Nested records are owned; references are not.

use crate::primitive::PrimitiveValue;
use crate::reference::ReferenceValue;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tessera_schema::{FieldDescriptor, TypeRef};

/// Value stored under one wire key
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Primitive(PrimitiveValue),
    Single(Box<RecordInstance>),
    /// Ordered occurrences of a field with `max > 1`
    Repeated(Vec<FieldValue>),
    Reference(ReferenceValue),
}

impl FieldValue {
    pub fn record(instance: RecordInstance) -> Self {
        Self::Single(Box::new(instance))
    }

    /// The occurrences this value stands for: the elements of a repetition,
    /// or the value itself
    pub fn items(&self) -> &[FieldValue] {
        match self {
            Self::Repeated(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    pub fn count(&self) -> usize {
        self.items().len()
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self, Self::Repeated(_))
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Self::Primitive(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            Self::Single(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceValue> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(PrimitiveValue::as_str)
    }

    /// Short description of the value's shape, for diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Single(_) => "record",
            Self::Repeated(_) => "repetition",
            Self::Reference(_) => "reference",
        }
    }
}

impl From<PrimitiveValue> for FieldValue {
    fn from(value: PrimitiveValue) -> Self {
        Self::Primitive(value)
    }
}

impl From<RecordInstance> for FieldValue {
    fn from(value: RecordInstance) -> Self {
        Self::record(value)
    }
}

impl From<ReferenceValue> for FieldValue {
    fn from(value: ReferenceValue) -> Self {
        Self::Reference(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(values: Vec<FieldValue>) -> Self {
        Self::Repeated(values)
    }
}

impl From<Vec<RecordInstance>> for FieldValue {
    fn from(records: Vec<RecordInstance>) -> Self {
        Self::Repeated(records.into_iter().map(Self::record).collect())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Primitive(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Primitive(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Primitive(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Primitive(value.into())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Primitive(value.into())
    }
}

/// One populated wire key of a field
#[derive(Debug, Clone, Copy)]
pub struct FieldEntry<'a> {
    pub key: &'a str,
    pub value: &'a FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordInstance {
    type_name: String,
    fields: IndexMap<String, FieldValue>,
    unknown: Map<String, Value>,
}

impl RecordInstance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            unknown: Map::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(key)
    }

    /// Store a value under a wire key without consulting any schema
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Chaining form of [`RecordInstance::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Populated fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown.is_empty()
    }

    /// Occurrences stored under a key (0 when absent)
    pub fn count(&self, key: &str) -> usize {
        self.fields.get(key).map_or(0, FieldValue::count)
    }

    /// Every populated wire key belonging to `field`, in declaration order
    /// of its alternatives
    pub fn entries_for<'a>(&'a self, field: &FieldDescriptor) -> Vec<FieldEntry<'a>> {
        field
            .wire_keys()
            .into_iter()
            .filter_map(|(key, _)| {
                self.fields
                    .get_key_value(key.as_str())
                    .map(|(key, value)| FieldEntry { key, value })
            })
            .collect()
    }

    /// The first populated alternative of a choice field
    pub fn choice_value(&self, field: &FieldDescriptor) -> Option<(TypeRef, &FieldValue)> {
        field
            .wire_keys()
            .into_iter()
            .find_map(|(key, alt)| Some((alt?, self.fields.get(key.as_str())?)))
    }

    /// Unrecognised content, in the JSON convention of the wire formats
    pub fn unknown(&self) -> &Map<String, Value> {
        &self.unknown
    }

    pub fn unknown_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.unknown
    }

    pub fn insert_unknown(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.unknown.insert(key.into(), value)
    }
}
