//! Tree codec
//!
//! Maps a [`RecordInstance`] to a [`TreeNode`] document and back:
//! - the root element name is the record type
//! - a primitive is an element with a `value` attribute
//! - a choice field is written under its suffixed key (`valueString`)
//! - a field with `max > 1` is a run of same-named elements, and decodes to
//!   a repetition even when only one element is present
//! - below the root, `id` (and an extension's `url`) are attributes
//!
//! Fields are written in schema order, then keys no descriptor accounts for,
//! then preserved unknown content. Decoding accepts renamed fields under
//! either spelling and keeps every element it cannot place. A repeated
//! primitive with an item that carries only an `id` or extensions is kept
//! whole as side-channel content: values under the field's key, metadata
//! under `_key`, both aligned by index.

use crate::error::{DecodeError, EncodeError};
use crate::tagged::{tagged_to_json, TaggedValue};
use crate::unknown::{self, meta_key};
use crate::xml::{self, TreeNode};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use tessera_models::{FieldValue, PrimitiveValue, RecordInstance, ReferenceValue};
use tessera_schema::{PrimitiveKind, RecordSchema, SchemaRegistry, TypeRef};

pub const EXTENSION_TYPE: &str = "Extension";

/// Keys written as attributes on a nested record's element
fn attribute_keys(type_name: &str) -> &'static [&'static str] {
    if type_name == EXTENSION_TYPE {
        &["id", "url"]
    } else {
        &["id"]
    }
}

pub fn encode_tree(
    record: &RecordInstance,
    registry: &SchemaRegistry,
) -> Result<TreeNode, EncodeError> {
    let schema = registry
        .get(record.type_name())
        .ok_or_else(|| EncodeError::UnknownType(record.type_name().to_string()))?;

    let mut root = TreeNode::new(record.type_name());
    TreeEncoder { registry }.write_record(&mut root, record, Some(schema), &[]);
    Ok(root)
}

pub fn decode_tree(root: &TreeNode, registry: &SchemaRegistry) -> Result<RecordInstance, DecodeError> {
    let schema = registry
        .get(&root.name)
        .ok_or_else(|| DecodeError::UnknownType {
            type_name: root.name.clone(),
            path: root.name.clone(),
        })?;
    TreeDecoder { registry }.record(root, schema, &root.name)
}

/// Encode a record straight to XML text
pub fn record_to_xml(record: &RecordInstance, registry: &SchemaRegistry) -> Result<String, EncodeError> {
    xml::to_xml(&encode_tree(record, registry)?)
}

/// Decode a record from XML text
pub fn record_from_xml(input: &str, registry: &SchemaRegistry) -> Result<RecordInstance, DecodeError> {
    decode_tree(&xml::parse_xml(input)?, registry)
}

// ============================================================================
// Encoding
// ============================================================================

struct TreeEncoder<'r> {
    registry: &'r SchemaRegistry,
}

impl TreeEncoder<'_> {
    fn write_record(
        &self,
        node: &mut TreeNode,
        record: &RecordInstance,
        schema: Option<&RecordSchema>,
        attribute_keys: &[&str],
    ) {
        let unknown = record.unknown();

        let mut keys: Vec<String> = Vec::new();
        if let Some(schema) = schema {
            for field in schema.fields() {
                for (key, _) in field.wire_keys() {
                    if record.contains(&key)
                        || unknown.contains_key(&meta_key(&key))
                        || kept_items(unknown, &key).is_some()
                    {
                        keys.push(key);
                    }
                }
            }
        }
        for key in record.keys() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }

        let mut consumed: HashSet<String> = HashSet::new();
        for key in &keys {
            let meta_name = meta_key(key);
            let meta = unknown.get(&meta_name);
            consumed.insert(meta_name);

            match (record.get(key), meta) {
                (Some(FieldValue::Primitive(value)), None)
                    if attribute_keys.contains(&key.as_str()) =>
                {
                    node.attributes.insert(key.clone(), value.to_wire_text());
                }
                (Some(value), meta) => self.write_value(node, key, value, meta),
                (None, meta) => match kept_items(unknown, key) {
                    Some(items) => {
                        consumed.insert(key.clone());
                        node.children.extend(unknown::json_to_nodes(key, items, meta));
                    }
                    None => node.children.extend(unknown::primitive_node(key, None, meta)),
                },
            }
        }

        let mut rest = Vec::new();
        for (key, value) in unknown {
            if consumed.contains(key) {
                continue;
            }
            match value {
                Value::String(text) if attribute_keys.contains(&key.as_str()) => {
                    node.attributes.insert(key.clone(), text.clone());
                }
                _ => rest.push((key, value)),
            }
        }
        node.children.extend(unknown::members_to_nodes(rest, unknown));
    }

    fn write_value(&self, node: &mut TreeNode, key: &str, value: &FieldValue, meta: Option<&Value>) {
        match value {
            FieldValue::Primitive(primitive) => {
                node.children
                    .extend(unknown::primitive_node(key, Some(primitive.to_wire_text()), meta));
            }
            FieldValue::Single(record) => {
                let mut child = TreeNode::new(key);
                let schema = self.registry.get(record.type_name());
                self.write_record(&mut child, record, schema, attribute_keys(record.type_name()));
                node.children.push(child);
            }
            FieldValue::Reference(reference) => node.children.push(reference_node(key, reference)),
            FieldValue::Repeated(items) => {
                let metas = meta.and_then(Value::as_array);
                for (idx, item) in items.iter().enumerate() {
                    let item_meta = metas.and_then(|m| m.get(idx)).filter(|m| !m.is_null());
                    self.write_value(node, key, item, item_meta);
                }
            }
        }
    }
}

/// Side-channel values of a repeated field that could not be a repetition
fn kept_items<'a>(unknown: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    unknown.get(key).filter(|value| value.is_array())
}

/// `reference`, `type`, then any other members, then `display`
fn reference_node(key: &str, reference: &ReferenceValue) -> TreeNode {
    let mut node = TreeNode::new(key);
    let unknown = &reference.unknown;

    if let Some(Value::String(id)) = unknown.get("id") {
        node.attributes.insert("id".to_string(), id.clone());
    }
    let extensions: Vec<_> = unknown.iter().filter(|(k, _)| k.as_str() == "extension").collect();
    node.children.extend(unknown::members_to_nodes(extensions, unknown));

    let member = |name: &str, value: Option<String>| {
        unknown::primitive_node(name, value, unknown.get(&meta_key(name)))
    };
    let literal = (!reference.reference.is_empty()).then(|| reference.reference.clone());
    node.children
        .extend(member(ReferenceValue::REFERENCE_KEY, literal));
    node.children
        .extend(member(ReferenceValue::TYPE_KEY, reference.target_type.clone()));

    let own = [
        ReferenceValue::REFERENCE_KEY,
        ReferenceValue::TYPE_KEY,
        ReferenceValue::DISPLAY_KEY,
        "extension",
    ];
    let rest: Vec<_> = unknown
        .iter()
        .filter(|(k, v)| {
            let base = k.strip_prefix('_').unwrap_or(k);
            !own.contains(&base) && !(k.as_str() == "id" && v.is_string())
        })
        .collect();
    node.children.extend(unknown::members_to_nodes(rest, unknown));

    node.children
        .extend(member(ReferenceValue::DISPLAY_KEY, reference.display.clone()));
    node
}

// ============================================================================
// Decoding
// ============================================================================

struct TreeDecoder<'r> {
    registry: &'r SchemaRegistry,
}

impl TreeDecoder<'_> {
    fn record(
        &self,
        node: &TreeNode,
        schema: &RecordSchema,
        path: &str,
    ) -> Result<RecordInstance, DecodeError> {
        if node.value().is_some() {
            return Err(DecodeError::shape(
                path,
                format!("a {} element", schema.name()),
                "a primitive value",
            ));
        }

        let mut record = RecordInstance::new(schema.name());
        for (name, text) in &node.attributes {
            let primitive = schema
                .resolve(name)
                .and_then(|resolved| match resolved.type_ref() {
                    TypeRef::Primitive(kind) => Some(kind),
                    TypeRef::Complex(_) => None,
                });
            match primitive {
                Some(kind) => {
                    let attr_path = format!("{}.{}", path, name);
                    let value = parse_primitive(kind, text, &attr_path)?;
                    record.insert(schema.wire_key(name).to_string(), value);
                }
                None => {
                    record.insert_unknown(name.clone(), Value::String(text.clone()));
                }
            }
        }

        for (name, nodes) in group_children(node) {
            match schema.resolve(name) {
                Some(resolved) => {
                    let key = schema.wire_key(name).to_string();
                    let repeated = resolved.field.cardinality.is_repeated();
                    self.field(&mut record, key, resolved.type_ref(), repeated, &nodes, path)?;
                }
                None => {
                    tracing::trace!(path, element = name, "preserving unknown element");
                    for child in nodes {
                        unknown::insert_element(record.unknown_mut(), child);
                    }
                }
            }
        }
        Ok(record)
    }

    fn field(
        &self,
        record: &mut RecordInstance,
        key: String,
        type_ref: TypeRef,
        repeated: bool,
        nodes: &[&TreeNode],
        path: &str,
    ) -> Result<(), DecodeError> {
        let field_path = format!("{}.{}", path, key);

        // Occurrence counts are the validator's concern: a second element
        // for a single-valued field still decodes, as a repetition
        if let (false, [only]) = (repeated, nodes) {
            let (value, meta) = self.value(only, &type_ref, &field_path)?;
            if let Some(value) = value {
                record.insert(key.clone(), value);
            }
            if let Some(meta) = meta {
                record.insert_unknown(meta_key(&key), meta);
            }
            return Ok(());
        }

        let mut items = Vec::with_capacity(nodes.len());
        let mut metas = Vec::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            let item_path = format!("{}[{}]", field_path, idx);
            let (value, meta) = self.value(node, &type_ref, &item_path)?;
            items.push(value);
            metas.push(meta);
        }

        if metas.iter().any(Option::is_some) {
            let metas = metas.into_iter().map(|m| m.unwrap_or(Value::Null)).collect();
            record.insert_unknown(meta_key(&key), Value::Array(metas));
        }

        // Only primitives come back without a value
        if items.iter().any(Option::is_none) {
            let values = items
                .into_iter()
                .map(|item| match item {
                    Some(FieldValue::Primitive(primitive)) => {
                        tagged_to_json(&TaggedValue::from(primitive))
                    }
                    _ => Value::Null,
                })
                .collect();
            record.insert_unknown(key, Value::Array(values));
            return Ok(());
        }
        record.insert(key, FieldValue::Repeated(items.into_iter().flatten().collect()));
        Ok(())
    }

    /// One element as a field value; primitives may carry only metadata
    fn value(
        &self,
        node: &TreeNode,
        type_ref: &TypeRef,
        path: &str,
    ) -> Result<(Option<FieldValue>, Option<Value>), DecodeError> {
        match type_ref {
            TypeRef::Primitive(kind) => {
                if let Some(child) = node.children.iter().find(|c| c.name != "extension") {
                    return Err(DecodeError::shape(
                        path,
                        format!("a {} value", kind),
                        format!("a complex element containing '{}'", child.name),
                    ));
                }
                let meta = unknown::primitive_meta(node);
                let value = node
                    .value()
                    .map(|text| parse_primitive(*kind, text, path))
                    .transpose()?;
                if value.is_none() && meta.is_none() {
                    return Err(DecodeError::shape(
                        path,
                        format!("a {} value", kind),
                        "an empty element",
                    ));
                }
                Ok((value.map(FieldValue::Primitive), meta))
            }
            TypeRef::Complex(_) if type_ref.is_reference() => {
                Ok((Some(FieldValue::Reference(self.reference(node, path)?)), None))
            }
            TypeRef::Complex(type_name) => {
                let schema = self.registry.get(type_name).ok_or_else(|| DecodeError::UnknownType {
                    type_name: type_name.clone(),
                    path: path.to_string(),
                })?;
                let record = self.record(node, schema, path)?;
                Ok((Some(FieldValue::record(record)), None))
            }
        }
    }

    fn reference(&self, node: &TreeNode, path: &str) -> Result<ReferenceValue, DecodeError> {
        if node.value().is_some() {
            return Err(DecodeError::shape(path, "a Reference element", "a primitive value"));
        }

        let mut reference = ReferenceValue::default();
        for (name, text) in &node.attributes {
            reference.unknown.insert(name.clone(), Value::String(text.clone()));
        }

        for (name, nodes) in group_children(node) {
            // reference/type/display are single primitives; anything else is kept
            let member = match nodes.as_slice() {
                [only] if only.children.iter().all(|c| c.name == "extension") => {
                    only.value().map(|text| (*only, text.to_string()))
                }
                _ => None,
            };

            match (name, member) {
                (ReferenceValue::REFERENCE_KEY, Some((only, text))) => {
                    reference.reference = text;
                    keep_meta(&mut reference, name, only);
                }
                (ReferenceValue::TYPE_KEY, Some((only, text))) => {
                    reference.target_type = Some(text);
                    keep_meta(&mut reference, name, only);
                }
                (ReferenceValue::DISPLAY_KEY, Some((only, text))) => {
                    reference.display = Some(text);
                    keep_meta(&mut reference, name, only);
                }
                _ => {
                    for child in nodes {
                        unknown::insert_element(&mut reference.unknown, child);
                    }
                }
            }
        }
        Ok(reference)
    }
}

fn keep_meta(reference: &mut ReferenceValue, name: &str, node: &TreeNode) {
    if let Some(meta) = unknown::primitive_meta(node) {
        reference.unknown.insert(meta_key(name), meta);
    }
}

/// Child elements grouped by name, in order of first appearance
fn group_children(node: &TreeNode) -> IndexMap<&str, Vec<&TreeNode>> {
    let mut groups: IndexMap<&str, Vec<&TreeNode>> = IndexMap::new();
    for child in &node.children {
        groups.entry(child.name.as_str()).or_default().push(child);
    }
    groups
}

fn parse_primitive(kind: PrimitiveKind, text: &str, path: &str) -> Result<PrimitiveValue, DecodeError> {
    PrimitiveValue::parse(kind, text).map_err(|source| DecodeError::MalformedPrimitive {
        path: path.to_string(),
        source,
    })
}
