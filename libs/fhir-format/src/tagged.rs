//! Tagged-object codec
//!
//! The tagged form is an in-memory object tree: primitives keep host-native
//! scalar types (integers, exact decimals, partial dates, raw bytes) and the
//! root object carries the record type as an explicit tag. Keys use the
//! host spelling of renamed fields (`end_`) unless [`KeyNames::Wire`] is
//! asked for; decoding accepts both.
//!
//! Content layout matches the tree codec: schema order, then keys no
//! descriptor accounts for, then unknown content in the JSON convention.

use crate::error::{DecodeError, EncodeError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::str::FromStr;
use tessera_models::{
    parse_decimal, FieldValue, PartialDate, PartialDateTime, PartialTime, PrimitiveValue,
    RecordInstance, ReferenceValue,
};
use tessera_schema::{PrimitiveKind, RecordSchema, ScalarClass, SchemaRegistry, TypeRef};

/// Member of a tagged object carrying the type tag in the JSON bridge
pub const TYPE_TAG_KEY: &str = "resourceType";

const ROOT_PATH: &str = "<root>";

#[derive(Debug, Clone, PartialEq)]
pub enum TaggedValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
    Date(PartialDate),
    DateTime(PartialDateTime),
    Time(PartialTime),
    Binary(Vec<u8>),
    List(Vec<TaggedValue>),
    Object(TaggedObject),
}

impl TaggedValue {
    pub fn as_object(&self) -> Option<&TaggedObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TaggedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "a boolean",
            Self::Integer(_) => "an integer",
            Self::Decimal(_) => "a decimal",
            Self::String(_) => "a string",
            Self::Date(_) => "a date",
            Self::DateTime(_) => "a date-time",
            Self::Time(_) => "a time",
            Self::Binary(_) => "binary data",
            Self::List(_) => "a list",
            Self::Object(_) => "an object",
        }
    }
}

impl From<PrimitiveValue> for TaggedValue {
    fn from(value: PrimitiveValue) -> Self {
        match value {
            PrimitiveValue::Boolean(b) => Self::Boolean(b),
            PrimitiveValue::Integer(i) => Self::Integer(i),
            PrimitiveValue::Decimal(d) => Self::Decimal(d),
            PrimitiveValue::String(s) => Self::String(s),
            PrimitiveValue::Date(d) => Self::Date(d),
            PrimitiveValue::DateTime(dt) => Self::DateTime(dt),
            PrimitiveValue::Time(t) => Self::Time(t),
            PrimitiveValue::Binary(bytes) => Self::Binary(bytes),
        }
    }
}

impl From<&str> for TaggedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for TaggedValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for TaggedValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<TaggedObject> for TaggedValue {
    fn from(value: TaggedObject) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<TaggedValue>> for TaggedValue {
    fn from(value: Vec<TaggedValue>) -> Self {
        Self::List(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedObject {
    pub type_tag: Option<String>,
    pub entries: IndexMap<String, TaggedValue>,
}

impl TaggedObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tagged(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: Some(type_tag.into()),
            entries: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<TaggedValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TaggedValue>) -> Option<TaggedValue> {
        self.entries.insert(key.into(), value.into())
    }
}

/// Spelling of renamed field keys in encoded objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyNames {
    /// Host aliases (`end_`)
    #[default]
    Host,
    /// Canonical wire names (`end`)
    Wire,
}

pub fn encode_tagged(record: &RecordInstance, registry: &SchemaRegistry) -> Result<TaggedObject, EncodeError> {
    encode_tagged_with(record, registry, KeyNames::Host)
}

pub fn encode_tagged_with(
    record: &RecordInstance,
    registry: &SchemaRegistry,
    names: KeyNames,
) -> Result<TaggedObject, EncodeError> {
    let schema = registry
        .get(record.type_name())
        .ok_or_else(|| EncodeError::UnknownType(record.type_name().to_string()))?;

    let mut object = TaggedEncoder { registry, names }.object(record, Some(schema));
    object.type_tag = Some(record.type_name().to_string());
    Ok(object)
}

pub fn decode_tagged(object: &TaggedObject, registry: &SchemaRegistry) -> Result<RecordInstance, DecodeError> {
    let type_name = object
        .type_tag
        .as_deref()
        .ok_or_else(|| DecodeError::MissingTypeTag {
            path: ROOT_PATH.to_string(),
        })?;
    let schema = registry.get(type_name).ok_or_else(|| DecodeError::UnknownType {
        type_name: type_name.to_string(),
        path: type_name.to_string(),
    })?;
    TaggedDecoder { registry }.record(object, schema, type_name)
}

// ============================================================================
// Encoding
// ============================================================================

struct TaggedEncoder<'r> {
    registry: &'r SchemaRegistry,
    names: KeyNames,
}

impl TaggedEncoder<'_> {
    fn object(&self, record: &RecordInstance, schema: Option<&RecordSchema>) -> TaggedObject {
        let mut object = TaggedObject::new();

        if let Some(schema) = schema {
            for field in schema.fields() {
                for (key, _) in field.wire_keys() {
                    if let Some(value) = record.get(&key) {
                        let name = match self.names {
                            KeyNames::Host => schema.host_key(&key).to_string(),
                            KeyNames::Wire => key.clone(),
                        };
                        object.entries.insert(name, self.value(value));
                    }
                }
            }
        }
        for (key, value) in record.iter() {
            let known = schema.is_some_and(|s| s.resolve(key).is_some() && s.wire_key(key) == key);
            if !known {
                object.entries.insert(key.to_string(), self.value(value));
            }
        }

        for (key, value) in record.unknown() {
            object.entries.insert(key.clone(), json_to_tagged(value));
        }
        object
    }

    fn value(&self, value: &FieldValue) -> TaggedValue {
        match value {
            FieldValue::Primitive(primitive) => primitive.clone().into(),
            FieldValue::Single(record) => {
                let schema = self.registry.get(record.type_name());
                TaggedValue::Object(self.object(record, schema))
            }
            FieldValue::Reference(reference) => TaggedValue::Object(reference_object(reference)),
            FieldValue::Repeated(items) => {
                TaggedValue::List(items.iter().map(|item| self.value(item)).collect())
            }
        }
    }
}

fn reference_object(reference: &ReferenceValue) -> TaggedObject {
    let mut object = TaggedObject::new();
    if !reference.reference.is_empty() {
        object.insert(ReferenceValue::REFERENCE_KEY, reference.reference.as_str());
    }
    if let Some(target_type) = &reference.target_type {
        object.insert(ReferenceValue::TYPE_KEY, target_type.as_str());
    }
    if let Some(display) = &reference.display {
        object.insert(ReferenceValue::DISPLAY_KEY, display.as_str());
    }
    for (key, value) in &reference.unknown {
        object.insert(key.clone(), json_to_tagged(value));
    }
    object
}

// ============================================================================
// Decoding
// ============================================================================

struct TaggedDecoder<'r> {
    registry: &'r SchemaRegistry,
}

impl TaggedDecoder<'_> {
    fn record(
        &self,
        object: &TaggedObject,
        schema: &RecordSchema,
        path: &str,
    ) -> Result<RecordInstance, DecodeError> {
        if let Some(tag) = object.type_tag.as_deref().filter(|tag| *tag != schema.name()) {
            return Err(DecodeError::shape(
                path,
                format!("a {} object", schema.name()),
                format!("a {} object", tag),
            ));
        }

        let mut record = RecordInstance::new(schema.name());
        for (key, value) in &object.entries {
            let resolved = if key.starts_with('_') {
                None
            } else {
                schema.resolve(key)
            };
            let Some(resolved) = resolved else {
                tracing::trace!(path, key = key.as_str(), "preserving unknown entry");
                record.insert_unknown(key.clone(), tagged_to_json(value));
                continue;
            };

            let wire_key = schema.wire_key(key).to_string();
            let field_path = format!("{}.{}", path, wire_key);
            let type_ref = resolved.type_ref();

            let repeated = resolved.field.cardinality.is_repeated();
            let decoded = match value {
                TaggedValue::Null => continue,
                TaggedValue::List(items) if items.contains(&TaggedValue::Null) => {
                    let TypeRef::Primitive(kind) = &type_ref else {
                        return Err(DecodeError::shape(
                            format!("{}[{}]", field_path, null_index(items)),
                            format!("a {} object", type_ref),
                            "null",
                        ));
                    };
                    let values = kept_values(*kind, items, &field_path)?;
                    record.insert_unknown(wire_key, values);
                    continue;
                }
                TaggedValue::List(items) if !repeated && items.len() == 1 => {
                    self.item(&items[0], &type_ref, &field_path)?
                }
                // A longer list for a single-valued field is an occurrence
                // problem the validator reports, not a decoding failure
                TaggedValue::List(items) => {
                    let items = items
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| {
                            self.item(item, &type_ref, &format!("{}[{}]", field_path, idx))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    FieldValue::Repeated(items)
                }
                other if repeated => {
                    return Err(DecodeError::shape(field_path, "a list", other.describe()));
                }
                other => self.item(other, &type_ref, &field_path)?,
            };
            record.insert(wire_key, decoded);
        }
        Ok(record)
    }

    fn item(&self, value: &TaggedValue, type_ref: &TypeRef, path: &str) -> Result<FieldValue, DecodeError> {
        match (type_ref, value) {
            (TypeRef::Primitive(kind), value) => {
                primitive(*kind, value, path).map(FieldValue::Primitive)
            }
            (TypeRef::Complex(_), TaggedValue::Object(object)) if type_ref.is_reference() => {
                reference(object, path).map(FieldValue::Reference)
            }
            (TypeRef::Complex(type_name), TaggedValue::Object(object)) => {
                let schema = self.registry.get(type_name).ok_or_else(|| DecodeError::UnknownType {
                    type_name: type_name.clone(),
                    path: path.to_string(),
                })?;
                Ok(FieldValue::record(self.record(object, schema, path)?))
            }
            (TypeRef::Complex(type_name), other) => Err(DecodeError::shape(
                path,
                format!("a {} object", type_name),
                other.describe(),
            )),
        }
    }
}

fn null_index(items: &[TaggedValue]) -> usize {
    items.iter().position(|item| *item == TaggedValue::Null).unwrap_or(0)
}

/// A repeated primitive with items that carry only `_key` metadata, as the
/// side-channel array the tree codec keeps for it
fn kept_values(kind: PrimitiveKind, items: &[TaggedValue], path: &str) -> Result<Value, DecodeError> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            TaggedValue::Null => Ok(Value::Null),
            item => primitive(kind, item, &format!("{}[{}]", path, idx))
                .map(|value| tagged_to_json(&TaggedValue::from(value))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Native scalars are taken as they are; text goes through the lexical
/// parser of the primitive kind
fn primitive(kind: PrimitiveKind, value: &TaggedValue, path: &str) -> Result<PrimitiveValue, DecodeError> {
    let malformed = |source| DecodeError::MalformedPrimitive {
        path: path.to_string(),
        source,
    };

    let decoded = match (kind.scalar_class(), value) {
        (ScalarClass::Boolean, TaggedValue::Boolean(b)) => PrimitiveValue::Boolean(*b),
        (ScalarClass::Integer, TaggedValue::Integer(i)) => PrimitiveValue::Integer(*i),
        (ScalarClass::Decimal, TaggedValue::Decimal(d)) => PrimitiveValue::Decimal(*d),
        (ScalarClass::Decimal, TaggedValue::Integer(i)) => PrimitiveValue::Decimal(Decimal::from(*i)),
        (ScalarClass::Text, TaggedValue::String(s)) => PrimitiveValue::String(s.clone()),
        (ScalarClass::Date, TaggedValue::Date(d)) => PrimitiveValue::Date(*d),
        (ScalarClass::DateTime, TaggedValue::DateTime(dt)) => {
            if kind == PrimitiveKind::Instant && !dt.is_instant() {
                // Reparse for the same error the lexical path reports
                return PrimitiveValue::parse(kind, &dt.to_string()).map_err(malformed);
            }
            PrimitiveValue::DateTime(dt.clone())
        }
        (ScalarClass::DateTime, TaggedValue::Date(d)) if kind != PrimitiveKind::Instant => {
            PrimitiveValue::DateTime(PartialDateTime::from_date(*d))
        }
        (ScalarClass::Time, TaggedValue::Time(t)) => PrimitiveValue::Time(t.clone()),
        (ScalarClass::Binary, TaggedValue::Binary(bytes)) => PrimitiveValue::Binary(bytes.clone()),
        (_, TaggedValue::String(text)) => PrimitiveValue::parse(kind, text).map_err(malformed)?,
        (_, other) => {
            return Err(DecodeError::shape(
                path,
                format!("a {} value", kind),
                other.describe(),
            ))
        }
    };
    Ok(decoded)
}

fn reference(object: &TaggedObject, path: &str) -> Result<ReferenceValue, DecodeError> {
    let mut reference = ReferenceValue::default();
    for (key, value) in &object.entries {
        let slot = match key.as_str() {
            ReferenceValue::REFERENCE_KEY | ReferenceValue::TYPE_KEY | ReferenceValue::DISPLAY_KEY => {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    DecodeError::shape(format!("{}.{}", path, key), "a string", value.describe())
                })?
            }
            _ => {
                reference.unknown.insert(key.clone(), tagged_to_json(value));
                continue;
            }
        };
        match key.as_str() {
            ReferenceValue::REFERENCE_KEY => reference.reference = slot,
            ReferenceValue::TYPE_KEY => reference.target_type = Some(slot),
            _ => reference.display = Some(slot),
        }
    }
    Ok(reference)
}

// ============================================================================
// JSON values
// ============================================================================

/// Tagged value as JSON: temporal values and binaries become their lexical
/// text, decimals keep their exact digits, object tags become `resourceType`
pub fn tagged_to_json(value: &TaggedValue) -> Value {
    match value {
        TaggedValue::Null => Value::Null,
        TaggedValue::Boolean(b) => Value::Bool(*b),
        TaggedValue::Integer(i) => Value::Number((*i).into()),
        TaggedValue::Decimal(d) => {
            let text = d.to_string();
            Number::from_str(&text)
                .map(Value::Number)
                .unwrap_or(Value::String(text))
        }
        TaggedValue::String(s) => Value::String(s.clone()),
        TaggedValue::Date(d) => Value::String(d.to_string()),
        TaggedValue::DateTime(dt) => Value::String(dt.to_string()),
        TaggedValue::Time(t) => Value::String(t.to_string()),
        TaggedValue::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
        TaggedValue::List(items) => Value::Array(items.iter().map(tagged_to_json).collect()),
        TaggedValue::Object(object) => to_json(object),
    }
}

pub fn to_json(object: &TaggedObject) -> Value {
    let mut map = Map::new();
    if let Some(tag) = &object.type_tag {
        map.insert(TYPE_TAG_KEY.to_string(), Value::String(tag.clone()));
    }
    for (key, value) in &object.entries {
        map.insert(key.clone(), tagged_to_json(value));
    }
    Value::Object(map)
}

/// JSON as a tagged value. Schema-free: strings stay strings until a
/// decoder reads them as the declared primitive kind.
pub fn json_to_tagged(value: &Value) -> TaggedValue {
    match value {
        Value::Null => TaggedValue::Null,
        Value::Bool(b) => TaggedValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TaggedValue::Integer(i),
            None => {
                let text = n.to_string();
                match parse_decimal(&text) {
                    Ok(d) => TaggedValue::Decimal(d),
                    Err(_) => TaggedValue::String(text),
                }
            }
        },
        Value::String(s) => TaggedValue::String(s.clone()),
        Value::Array(items) => TaggedValue::List(items.iter().map(json_to_tagged).collect()),
        Value::Object(map) => TaggedValue::Object(json_object_to_tagged(map)),
    }
}

fn json_object_to_tagged(map: &Map<String, Value>) -> TaggedObject {
    let mut object = TaggedObject::new();
    for (key, value) in map {
        match (key.as_str(), value) {
            (TYPE_TAG_KEY, Value::String(tag)) => object.type_tag = Some(tag.clone()),
            _ => {
                object.entries.insert(key.clone(), json_to_tagged(value));
            }
        }
    }
    object
}

/// The root of a JSON document as a tagged object
pub fn from_json(value: &Value) -> Result<TaggedObject, DecodeError> {
    match value {
        Value::Object(map) => Ok(json_object_to_tagged(map)),
        other => Err(DecodeError::shape(
            ROOT_PATH,
            "a JSON object",
            json_to_tagged(other).describe(),
        )),
    }
}

/// Encode a record as JSON text, with wire names for renamed fields
pub fn record_to_json(record: &RecordInstance, registry: &SchemaRegistry) -> Result<String, EncodeError> {
    let object = encode_tagged_with(record, registry, KeyNames::Wire)?;
    Ok(serde_json::to_string_pretty(&to_json(&object))?)
}

/// Decode a record from JSON text
pub fn record_from_json(input: &str, registry: &SchemaRegistry) -> Result<RecordInstance, DecodeError> {
    let value: Value = serde_json::from_str(input)?;
    decode_tagged(&from_json(&value)?, registry)
}
