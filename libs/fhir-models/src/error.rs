//! Error types for record instances and primitive values

use tessera_schema::PrimitiveKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{type_name} has no field '{key}'")]
    UnknownField { type_name: String, key: String },

    #[error("{type_name}.{field} is not a choice field")]
    NotAChoice { type_name: String, field: String },

    #[error("{type_name}.{field} has no alternative of type {alternative}")]
    NotAnAlternative {
        type_name: String,
        field: String,
        alternative: String,
    },

    #[error("{type_name}.{field} expects {expected}")]
    WrongValueKind {
        type_name: String,
        field: String,
        expected: String,
    },

    #[error("repeated values cannot be nested inside another repetition")]
    NestedRepeated,

    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
}

/// A primitive lexical form that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} value '{text}': {reason}")]
pub struct PrimitiveError {
    pub kind: PrimitiveKind,
    pub text: String,
    pub reason: String,
}

impl PrimitiveError {
    pub(crate) fn new(kind: PrimitiveKind, text: &str, reason: impl ToString) -> Self {
        Self {
            kind,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
