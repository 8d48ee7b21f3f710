//! Declarative schema definitions
//!
//! The serialized shape schemas are authored in (JSON or YAML). A definition
//! document is a list of [`SchemaDefinition`]s; each converts into a
//! [`RecordSchema`]. Choice fields follow the standard's `[x]` convention:
//!
//! ```json
//! { "name": "value[x]", "type": ["string", "boolean"], "cardinality": "0..1" }
//! ```

use crate::descriptor::{
    BindingStrength, Cardinality, CodeBinding, FieldDescriptor, FieldKind, TypeRef,
};
use crate::error::{Result, SchemaError};
use crate::schema::{RecordKind, RecordSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CHOICE_MARKER: &str = "[x]";

/// One record type as authored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub name: String,

    #[serde(default)]
    pub kind: RecordKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Host aliases for wire names that collide with reserved words
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<RenameDefinition>,

    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameDefinition {
    pub alias: String,
    pub wire: String,
}

/// One field as authored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name; a `[x]` suffix marks a choice field
    pub name: String,

    /// Type codes; more than one only for choice fields
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// `min..max`, defaults to `0..1`
    #[serde(default = "default_cardinality")]
    pub cardinality: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<BindingDefinition>,

    /// Permitted reference targets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_types: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_modifier: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BindingDefinition {
    pub strength: BindingStrength,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,

    /// code system URI -> codes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub codes: BTreeMap<String, Vec<String>>,
}

fn default_cardinality() -> String {
    Cardinality::OPTIONAL.to_string()
}

impl FieldDefinition {
    pub fn is_choice(&self) -> bool {
        self.name.ends_with(CHOICE_MARKER)
    }

    fn into_descriptor(self, type_name: &str) -> Result<FieldDescriptor> {
        let is_choice = self.is_choice();
        let name = self.name.trim_end_matches(CHOICE_MARKER).to_string();

        let kind = if is_choice {
            FieldKind::Choice(self.types.iter().map(|c| TypeRef::from_code(c)).collect())
        } else {
            match self.types.as_slice() {
                [code] => match TypeRef::from_code(code) {
                    TypeRef::Primitive(kind) => FieldKind::Primitive(kind),
                    TypeRef::Complex(name) => FieldKind::Complex(name),
                },
                _ => {
                    return Err(SchemaError::InvalidChoice {
                        type_name: type_name.to_string(),
                        field: name,
                        reason: format!(
                            "{} types declared on a field without the [x] marker",
                            self.types.len()
                        ),
                    })
                }
            }
        };

        let binding = self.binding.map(|b| {
            let mut binding = CodeBinding::new(b.strength);
            binding.value_set = b.value_set;
            for (system, codes) in b.codes {
                binding = binding.with_codes(system, codes);
            }
            binding
        });

        Ok(FieldDescriptor {
            name,
            kind,
            cardinality: Cardinality::parse(&self.cardinality)?,
            binding,
            reference_targets: self.target_types,
            is_modifier: self.is_modifier,
        })
    }
}

impl TryFrom<SchemaDefinition> for RecordSchema {
    type Error = SchemaError;

    fn try_from(def: SchemaDefinition) -> Result<Self> {
        let name = def.name;
        let fields = def
            .fields
            .into_iter()
            .map(|f| f.into_descriptor(&name))
            .collect::<Result<Vec<_>>>()?;

        let mut schema = RecordSchema::new(name, def.kind, fields);
        for rename in def.renames {
            schema = schema.with_rename(rename.alias, rename.wire);
        }
        Ok(schema)
    }
}

impl From<&FieldDescriptor> for FieldDefinition {
    fn from(field: &FieldDescriptor) -> Self {
        let (name, types) = match &field.kind {
            FieldKind::Primitive(kind) => (field.name.clone(), vec![kind.code().to_string()]),
            FieldKind::Complex(name) => (field.name.clone(), vec![name.clone()]),
            FieldKind::Choice(alternatives) => (
                format!("{}{}", field.name, CHOICE_MARKER),
                alternatives.iter().map(|a| a.code().to_string()).collect(),
            ),
        };

        Self {
            name,
            types,
            cardinality: field.cardinality.to_string(),
            binding: field.binding.as_ref().map(|b| BindingDefinition {
                strength: b.strength,
                value_set: b.value_set.clone(),
                codes: b
                    .allowed_codes
                    .iter()
                    .map(|(system, codes)| (system.clone(), codes.iter().cloned().collect()))
                    .collect(),
            }),
            target_types: field.reference_targets.clone(),
            is_modifier: field.is_modifier,
        }
    }
}

impl From<&RecordSchema> for SchemaDefinition {
    fn from(schema: &RecordSchema) -> Self {
        Self {
            name: schema.name().to_string(),
            kind: schema.kind(),
            description: None,
            renames: schema
                .renames()
                .iter()
                .map(|(alias, wire)| RenameDefinition {
                    alias: alias.to_string(),
                    wire: wire.to_string(),
                })
                .collect(),
            fields: schema.fields().iter().map(FieldDefinition::from).collect(),
        }
    }
}

/// Parse a JSON definition document (a list of schema definitions)
pub fn parse_json(text: &str) -> Result<Vec<SchemaDefinition>> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a YAML definition document (a list of schema definitions)
pub fn parse_yaml(text: &str) -> Result<Vec<SchemaDefinition>> {
    Ok(serde_yaml::from_str(text)?)
}
