//! Primitive data types
//!
//! The standard's primitive types, keyed by their wire code (`dateTime`,
//! `base64Binary`, ...). Each primitive belongs to a [`ScalarClass`], which is
//! the host-side shape a value of that type takes once decoded.

use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    PositiveInt,
    UnsignedInt,
    Integer64,
    Decimal,
    String,
    Code,
    Id,
    Markdown,
    Uri,
    Url,
    Canonical,
    Oid,
    Uuid,
    Base64Binary,
    Date,
    DateTime,
    Instant,
    Time,
}

/// Host-side shape of a decoded primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarClass {
    Boolean,
    Integer,
    Decimal,
    Text,
    Binary,
    Date,
    DateTime,
    Time,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 20] = [
        Self::Boolean,
        Self::Integer,
        Self::PositiveInt,
        Self::UnsignedInt,
        Self::Integer64,
        Self::Decimal,
        Self::String,
        Self::Code,
        Self::Id,
        Self::Markdown,
        Self::Uri,
        Self::Url,
        Self::Canonical,
        Self::Oid,
        Self::Uuid,
        Self::Base64Binary,
        Self::Date,
        Self::DateTime,
        Self::Instant,
        Self::Time,
    ];

    /// Wire code of this primitive (e.g. `dateTime`)
    pub fn code(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::PositiveInt => "positiveInt",
            Self::UnsignedInt => "unsignedInt",
            Self::Integer64 => "integer64",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Code => "code",
            Self::Id => "id",
            Self::Markdown => "markdown",
            Self::Uri => "uri",
            Self::Url => "url",
            Self::Canonical => "canonical",
            Self::Oid => "oid",
            Self::Uuid => "uuid",
            Self::Base64Binary => "base64Binary",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::Instant => "instant",
            Self::Time => "time",
        }
    }

    /// Look up a primitive by its wire code
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.code() == code)
    }

    pub fn parse(code: &str) -> Result<Self> {
        Self::from_code(code).ok_or_else(|| SchemaError::UnknownPrimitive(code.to_string()))
    }

    pub fn scalar_class(self) -> ScalarClass {
        match self {
            Self::Boolean => ScalarClass::Boolean,
            Self::Integer | Self::PositiveInt | Self::UnsignedInt | Self::Integer64 => {
                ScalarClass::Integer
            }
            Self::Decimal => ScalarClass::Decimal,
            Self::Base64Binary => ScalarClass::Binary,
            Self::Date => ScalarClass::Date,
            Self::DateTime | Self::Instant => ScalarClass::DateTime,
            Self::Time => ScalarClass::Time,
            Self::String
            | Self::Code
            | Self::Id
            | Self::Markdown
            | Self::Uri
            | Self::Url
            | Self::Canonical
            | Self::Oid
            | Self::Uuid => ScalarClass::Text,
        }
    }

    /// Whether a code binding may be attached to this primitive
    pub fn is_coded(self) -> bool {
        matches!(self, Self::Code)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_code("CodeableConcept"), None);
    }

    #[test]
    fn serde_uses_wire_codes() {
        let json = serde_json::to_string(&PrimitiveKind::Base64Binary).unwrap();
        assert_eq!(json, "\"base64Binary\"");
        let kind: PrimitiveKind = serde_json::from_str("\"dateTime\"").unwrap();
        assert_eq!(kind, PrimitiveKind::DateTime);
    }

    #[test]
    fn instant_is_a_date_time() {
        assert_eq!(PrimitiveKind::Instant.scalar_class(), ScalarClass::DateTime);
        assert_eq!(PrimitiveKind::Oid.scalar_class(), ScalarClass::Text);
    }
}
