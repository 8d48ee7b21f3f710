//! Primitive values
//!
//! Every primitive field carries one [`PrimitiveValue`]. The value is the
//! decoded host form; [`PrimitiveValue::to_wire_text`] renders the lexical
//! form both codecs share.

use crate::error::PrimitiveError;
use crate::temporal::{PartialDate, PartialDateTime, PartialTime};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use tessera_schema::{PrimitiveKind, ScalarClass};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
    Date(PartialDate),
    DateTime(PartialDateTime),
    Time(PartialTime),
    Binary(Vec<u8>),
}

impl PrimitiveValue {
    /// Parse the lexical form of a primitive of the given kind
    pub fn parse(kind: PrimitiveKind, text: &str) -> Result<Self, PrimitiveError> {
        let err = |reason: &dyn fmt::Display| PrimitiveError::new(kind, text, reason);

        match kind.scalar_class() {
            ScalarClass::Boolean => match text {
                "true" => Ok(Self::Boolean(true)),
                "false" => Ok(Self::Boolean(false)),
                _ => Err(err(&"expected true or false")),
            },
            ScalarClass::Integer => {
                if text.starts_with('+') || (text.len() > 1 && text.starts_with('0')) {
                    return Err(err(&"not a canonical integer"));
                }
                text.parse::<i64>().map(Self::Integer).map_err(|e| err(&e))
            }
            ScalarClass::Decimal => parse_decimal(text).map(Self::Decimal).map_err(|e| err(&e)),
            ScalarClass::Text => Ok(Self::String(text.to_string())),
            ScalarClass::Binary => STANDARD
                .decode(text.trim())
                .map(Self::Binary)
                .map_err(|e| err(&e)),
            ScalarClass::Date => text.parse().map(Self::Date).map_err(|e| err(&e)),
            ScalarClass::DateTime => {
                let value: PartialDateTime = text.parse().map_err(|e| err(&e))?;
                if kind == PrimitiveKind::Instant && !value.is_instant() {
                    return Err(err(&"an instant needs seconds and a time zone"));
                }
                Ok(Self::DateTime(value))
            }
            ScalarClass::Time => text.parse().map(Self::Time).map_err(|e| err(&e)),
        }
    }

    pub fn scalar_class(&self) -> ScalarClass {
        match self {
            Self::Boolean(_) => ScalarClass::Boolean,
            Self::Integer(_) => ScalarClass::Integer,
            Self::Decimal(_) => ScalarClass::Decimal,
            Self::String(_) => ScalarClass::Text,
            Self::Date(_) => ScalarClass::Date,
            Self::DateTime(_) => ScalarClass::DateTime,
            Self::Time(_) => ScalarClass::Time,
            Self::Binary(_) => ScalarClass::Binary,
        }
    }

    /// Lexical form of the value
    pub fn to_wire_text(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::String(s) => s.clone(),
            Self::Date(d) => d.to_string(),
            Self::DateTime(dt) => dt.to_string(),
            Self::Time(t) => t.to_string(),
            Self::Binary(bytes) => STANDARD.encode(bytes),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_text())
    }
}

/// Decimal text keeps its scale (`1.50` stays `1.50`); exponent notation is
/// accepted and normalised.
pub fn parse_decimal(text: &str) -> Result<Decimal, rust_decimal::Error> {
    if text.contains(['e', 'E']) {
        return Decimal::from_scientific(text);
    }
    Decimal::from_str(text)
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<Decimal> for PrimitiveValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<PartialDate> for PrimitiveValue {
    fn from(value: PartialDate) -> Self {
        Self::Date(value)
    }
}

impl From<PartialDateTime> for PrimitiveValue {
    fn from(value: PartialDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<PartialTime> for PrimitiveValue {
    fn from(value: PartialTime) -> Self {
        Self::Time(value)
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}
