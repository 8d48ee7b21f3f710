//! Error types for schema definitions and the registry

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema already registered: {0}")]
    DuplicateSchema(String),

    #[error("unknown record type: {0}")]
    UnknownType(String),

    #[error("{type_name}.{field}: invalid cardinality {min}..{max}")]
    InvalidCardinality {
        type_name: String,
        field: String,
        min: u32,
        max: String,
    },

    #[error("{type_name}: wire key '{key}' is declared more than once")]
    DuplicateField { type_name: String, key: String },

    #[error("{type_name}.{field}: {reason}")]
    InvalidChoice {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("{type_name}.{field}: binding is only allowed on coded fields")]
    InvalidBinding { type_name: String, field: String },

    #[error("{type_name}.{field}: reference targets declared on a non-reference field")]
    InvalidReferenceTargets { type_name: String, field: String },

    #[error("unknown primitive type code: {0}")]
    UnknownPrimitive(String),

    #[error("{type_name}: rename alias '{alias}' conflicts with {reason}")]
    RenameConflict {
        type_name: String,
        alias: String,
        reason: String,
    },

    #[error("invalid cardinality text: {0}")]
    InvalidCardinalityText(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
