//! Unknown content in the JSON convention
//!
//! Elements no schema field accounts for are kept as JSON values the way
//! the standard's JSON form would carry them:
//! - a primitive element becomes its value; its `id` and extensions move to
//!   a `_name` sibling entry
//! - repeated elements become arrays, with `_name` arrays aligned by index
//!   and padded with `null`
//! - complex elements become objects; `id` and `url` attributes are members
//!
//! The same convention carries `id`/extension metadata of known primitive
//! fields, so both codecs can re-emit it unchanged.

use crate::xml::TreeNode;
use serde_json::{Map, Value};

/// Names whose JSON form is always an array
const ARRAY_NAMES: [&str; 2] = ["extension", "modifierExtension"];

/// Members of a JSON object written as XML attributes rather than children
const ATTRIBUTE_MEMBERS: [&str; 2] = ["id", "url"];

pub(crate) fn meta_key(name: &str) -> String {
    format!("_{}", name)
}

/// Convert one element, returning its value and any primitive metadata
pub(crate) fn element_to_json(node: &TreeNode) -> (Value, Option<Value>) {
    if let Some(text) = node.value() {
        return (parse_primitive(text), primitive_meta(node));
    }

    let mut obj = Map::new();
    for (name, value) in &node.attributes {
        obj.insert(name.clone(), Value::String(value.clone()));
    }
    for child in &node.children {
        insert_element(&mut obj, child);
    }
    (Value::Object(obj), None)
}

/// `id` attribute and child elements of a primitive element, if it has any
pub(crate) fn primitive_meta(node: &TreeNode) -> Option<Value> {
    let mut meta = Map::new();
    for (name, value) in node.attributes.iter().filter(|(name, _)| *name != "value") {
        meta.insert(name.clone(), Value::String(value.clone()));
    }
    for child in &node.children {
        insert_element(&mut meta, child);
    }
    (!meta.is_empty()).then_some(Value::Object(meta))
}

/// Add an element to an object under its own name
pub(crate) fn insert_element(map: &mut Map<String, Value>, node: &TreeNode) {
    let (value, meta) = element_to_json(node);
    insert_json_property(map, &node.name, value, meta);
}

fn insert_json_property(map: &mut Map<String, Value>, name: &str, value: Value, meta: Option<Value>) {
    match map.entry(name.to_string()) {
        serde_json::map::Entry::Vacant(v) => {
            if ARRAY_NAMES.contains(&name) {
                v.insert(Value::Array(vec![value]));
            } else {
                v.insert(value);
            }
        }
        serde_json::map::Entry::Occupied(mut o) => match o.get_mut() {
            Value::Array(arr) => arr.push(value),
            existing => {
                let old = existing.take();
                *existing = Value::Array(vec![old, value]);
            }
        },
    }

    let meta_key = meta_key(name);
    if meta.is_none() && !map.contains_key(&meta_key) {
        return;
    }

    let value_count = match map.get(name) {
        Some(Value::Array(arr)) => arr.len(),
        Some(_) => 1,
        None => 0,
    };
    let value_is_array = matches!(map.get(name), Some(Value::Array(_)));

    match map.entry(meta_key) {
        serde_json::map::Entry::Vacant(v) => {
            if let Some(m) = meta {
                if value_is_array {
                    let mut arr = vec![Value::Null; value_count.saturating_sub(1)];
                    arr.push(m);
                    v.insert(Value::Array(arr));
                } else {
                    v.insert(m);
                }
            }
        }
        serde_json::map::Entry::Occupied(mut o) => match o.get_mut() {
            Value::Array(arr) => {
                arr.resize(value_count.saturating_sub(1), Value::Null);
                arr.push(meta.unwrap_or(Value::Null));
            }
            existing => {
                if value_is_array {
                    let first = existing.take();
                    let mut arr = vec![first];
                    arr.resize(value_count.saturating_sub(1), Value::Null);
                    arr.push(meta.unwrap_or(Value::Null));
                    *existing = Value::Array(arr);
                } else if let Some(m) = meta {
                    *existing = m;
                }
            }
        },
    }
}

/// Booleans and canonical integers become JSON scalars; everything else
/// stays text so that re-encoding reproduces it exactly
fn parse_primitive(input: &str) -> Value {
    match input {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match input.parse::<i64>() {
            Ok(int) if int.to_string() == input => Value::Number(int.into()),
            _ => Value::String(input.to_string()),
        },
    }
}

/// Elements for one JSON member, with its `_name` metadata if present
pub(crate) fn json_to_nodes(name: &str, value: &Value, meta: Option<&Value>) -> Vec<TreeNode> {
    match value {
        Value::Array(items) => {
            let meta_items = meta.and_then(Value::as_array);
            items
                .iter()
                .enumerate()
                .flat_map(|(idx, item)| {
                    let item_meta = meta_items.and_then(|m| m.get(idx));
                    json_to_nodes(name, item, item_meta)
                })
                .collect()
        }
        Value::Object(obj) => vec![object_node(name, obj)],
        Value::Null => primitive_node(name, None, meta).into_iter().collect(),
        primitive => primitive_node(name, Some(primitive_text(primitive)), meta)
            .into_iter()
            .collect(),
    }
}

/// Children of an element for the members of a JSON object
pub(crate) fn members_to_nodes<'a>(
    obj: impl IntoIterator<Item = (&'a String, &'a Value)>,
    all: &Map<String, Value>,
) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    for (key, value) in obj {
        match key.strip_prefix('_') {
            // Metadata travels with its value; orphaned metadata stands alone
            Some(base) if all.contains_key(base) => {}
            Some(base) => nodes.extend(json_to_nodes(base, &Value::Null, Some(value))),
            None => nodes.extend(json_to_nodes(key, value, all.get(&meta_key(key)))),
        }
    }
    nodes
}

fn object_node(name: &str, obj: &Map<String, Value>) -> TreeNode {
    let mut node = TreeNode::new(name);
    let mut members = Vec::new();
    for (key, value) in obj {
        match value {
            Value::String(text) if ATTRIBUTE_MEMBERS.contains(&key.as_str()) => {
                node.attributes.insert(key.clone(), text.clone());
            }
            _ => members.push((key, value)),
        }
    }
    node.children = members_to_nodes(members, obj);
    node
}

/// A primitive element; `None` when there is neither a value nor metadata
pub(crate) fn primitive_node(name: &str, value: Option<String>, meta: Option<&Value>) -> Option<TreeNode> {
    let mut node = TreeNode::new(name);
    if let Some(value) = value {
        node.attributes.insert("value".to_string(), value);
    }

    if let Some(Value::Object(meta)) = meta {
        let mut members = Vec::new();
        for (key, value) in meta {
            match value {
                Value::String(text) if key == "id" => {
                    node.attributes.insert(key.clone(), text.clone());
                }
                _ => members.push((key, value)),
            }
        }
        node.children = members_to_nodes(members, meta);
    }

    (!node.is_empty()).then_some(node)
}

fn primitive_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
