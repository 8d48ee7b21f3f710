//! Field descriptors
//!
//! A [`FieldDescriptor`] is the schema of one named field: its declared type
//! (primitive, complex, or a choice between several types), cardinality,
//! optional code binding and, for reference-typed fields, the record types a
//! reference may point at.

use crate::error::{Result, SchemaError};
use crate::primitive::PrimitiveKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const REFERENCE_TYPE: &str = "Reference";
pub const CODING_TYPE: &str = "Coding";
pub const CODEABLE_CONCEPT_TYPE: &str = "CodeableConcept";

/// A declared type: either a primitive or a named complex record type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    Complex(String),
}

impl TypeRef {
    /// Resolve a type code; primitive codes win over complex names
    pub fn from_code(code: &str) -> Self {
        match PrimitiveKind::from_code(code) {
            Some(kind) => Self::Primitive(kind),
            None => Self::Complex(code.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Primitive(kind) => kind.code(),
            Self::Complex(name) => name,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Complex(name) if name == REFERENCE_TYPE)
    }

    /// Types a code binding can apply to
    pub fn is_coded(&self) -> bool {
        match self {
            Self::Primitive(kind) => kind.is_coded(),
            Self::Complex(name) => name == CODING_TYPE || name == CODEABLE_CONCEPT_TYPE,
        }
    }

    /// Suffix appended to a choice field's name for this alternative
    pub fn choice_suffix(&self) -> String {
        choice_suffix(self.code())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// `dateTime` -> `DateTime`, `CodeableConcept` -> `CodeableConcept`
pub fn choice_suffix(type_code: &str) -> String {
    let mut chars = type_code.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// What kind of value a field holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    Complex(String),
    /// Polymorphic field; exactly one alternative may be populated
    Choice(Vec<TypeRef>),
}

impl FieldKind {
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Choice(_))
    }

    /// True for `Reference` fields and choices with a `Reference` alternative
    pub fn accepts_reference(&self) -> bool {
        match self {
            Self::Complex(name) => name == REFERENCE_TYPE,
            Self::Choice(alternatives) => alternatives.iter().any(TypeRef::is_reference),
            Self::Primitive(_) => false,
        }
    }

    pub fn is_coded(&self) -> bool {
        match self {
            Self::Primitive(kind) => kind.is_coded(),
            Self::Complex(name) => TypeRef::Complex(name.clone()).is_coded(),
            Self::Choice(alternatives) => alternatives.iter().any(TypeRef::is_coded),
        }
    }

    /// Declared types of the field; a single entry for non-choice fields
    pub fn types(&self) -> Vec<TypeRef> {
        match self {
            Self::Primitive(kind) => vec![TypeRef::Primitive(*kind)],
            Self::Complex(name) => vec![TypeRef::Complex(name.clone())],
            Self::Choice(alternatives) => alternatives.clone(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{}", kind),
            Self::Complex(name) => f.write_str(name),
            Self::Choice(alternatives) => {
                let codes: Vec<&str> = alternatives.iter().map(TypeRef::code).collect();
                write!(f, "{}", codes.join("|"))
            }
        }
    }
}

/// Upper bound of a cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Max {
    Bounded(u32),
    Unbounded,
}

/// `min..max` occurrence constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    pub max: Max,
}

impl Cardinality {
    pub const OPTIONAL: Self = Self::new(0, Max::Bounded(1));
    pub const REQUIRED: Self = Self::new(1, Max::Bounded(1));
    pub const MANY: Self = Self::new(0, Max::Unbounded);
    pub const AT_LEAST_ONE: Self = Self::new(1, Max::Unbounded);

    pub const fn new(min: u32, max: Max) -> Self {
        Self { min, max }
    }

    /// Parse the textual form, e.g. `0..1` or `1..*`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || SchemaError::InvalidCardinalityText(text.to_string());
        let (min, max) = text.split_once("..").ok_or_else(invalid)?;
        let min: u32 = min.trim().parse().map_err(|_| invalid())?;
        let max = match max.trim() {
            "*" => Max::Unbounded,
            n => Max::Bounded(n.parse().map_err(|_| invalid())?),
        };
        Ok(Self { min, max })
    }

    pub fn is_valid(&self) -> bool {
        match self.max {
            Max::Bounded(max) => self.min <= max,
            Max::Unbounded => true,
        }
    }

    pub fn is_required(&self) -> bool {
        self.min > 0
    }

    /// Whether the field is carried as a sequence (max > 1)
    pub fn is_repeated(&self) -> bool {
        match self.max {
            Max::Bounded(max) => max > 1,
            Max::Unbounded => true,
        }
    }

    pub fn exceeds_max(&self, count: usize) -> bool {
        match self.max {
            Max::Bounded(max) => count > max as usize,
            Max::Unbounded => false,
        }
    }

    pub fn max_text(&self) -> String {
        match self.max {
            Max::Bounded(max) => max.to_string(),
            Max::Unbounded => "*".to_string(),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max_text())
    }
}

/// Binding strength (required | extensible | preferred | example)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrength {
    Required,
    Extensible,
    Preferred,
    Example,
}

impl fmt::Display for BindingStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "required",
            Self::Extensible => "extensible",
            Self::Preferred => "preferred",
            Self::Example => "example",
        };
        f.write_str(s)
    }
}

/// Allow-list of codes a coded field is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBinding {
    pub strength: BindingStrength,
    pub value_set: Option<String>,
    /// code system URI -> permitted codes
    pub allowed_codes: BTreeMap<String, BTreeSet<String>>,
}

impl CodeBinding {
    pub fn new(strength: BindingStrength) -> Self {
        Self {
            strength,
            value_set: None,
            allowed_codes: BTreeMap::new(),
        }
    }

    pub fn with_value_set(mut self, url: impl Into<String>) -> Self {
        self.value_set = Some(url.into());
        self
    }

    pub fn with_codes<I, S>(mut self, system: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_codes
            .entry(system.into())
            .or_default()
            .extend(codes.into_iter().map(Into::into));
        self
    }

    /// False when the binding names no codes at all
    pub fn is_enumerated(&self) -> bool {
        self.allowed_codes.values().any(|codes| !codes.is_empty())
    }

    /// Membership test. A code without a system (a `code` primitive) matches
    /// any system's set; an unrecognised system never matches.
    pub fn contains(&self, system: Option<&str>, code: &str) -> bool {
        match system {
            Some(system) => self
                .allowed_codes
                .get(system)
                .is_some_and(|codes| codes.contains(code)),
            None => self.allowed_codes.values().any(|codes| codes.contains(code)),
        }
    }
}

/// Schema of one named field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
    pub binding: Option<CodeBinding>,
    /// Permitted target record types; empty means any
    pub reference_targets: Vec<String>,
    pub is_modifier: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cardinality: Cardinality::OPTIONAL,
            binding: None,
            reference_targets: Vec::new(),
            is_modifier: false,
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, FieldKind::Primitive(kind))
    }

    pub fn complex(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Complex(type_name.into()))
    }

    pub fn reference<I, S>(name: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::complex(name, REFERENCE_TYPE).with_targets(targets)
    }

    /// Choice field from type codes, e.g. `["CodeableConcept", "Reference"]`
    pub fn choice<I, S>(name: impl Into<String>, type_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives = type_codes
            .into_iter()
            .map(|code| TypeRef::from_code(code.as_ref()))
            .collect();
        Self::new(name, FieldKind::Choice(alternatives))
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn required(self) -> Self {
        let max = self.cardinality.max;
        self.with_cardinality(Cardinality::new(1, max))
    }

    pub fn repeated(self) -> Self {
        let min = self.cardinality.min;
        self.with_cardinality(Cardinality::new(min, Max::Unbounded))
    }

    pub fn with_binding(mut self, binding: CodeBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn modifier(mut self) -> Self {
        self.is_modifier = true;
        self
    }

    /// Wire key of one alternative of this field
    pub fn key_for(&self, type_ref: &TypeRef) -> String {
        if self.kind.is_choice() {
            format!("{}{}", self.name, type_ref.choice_suffix())
        } else {
            self.name.clone()
        }
    }

    /// Every wire key this field can appear under
    pub fn wire_keys(&self) -> Vec<(String, Option<TypeRef>)> {
        match &self.kind {
            FieldKind::Choice(alternatives) => alternatives
                .iter()
                .map(|alt| (self.key_for(alt), Some(alt.clone())))
                .collect(),
            _ => vec![(self.name.clone(), None)],
        }
    }

    pub(crate) fn check(&self, type_name: &str) -> Result<()> {
        if !self.cardinality.is_valid() {
            return Err(SchemaError::InvalidCardinality {
                type_name: type_name.to_string(),
                field: self.name.clone(),
                min: self.cardinality.min,
                max: self.cardinality.max_text(),
            });
        }

        if let FieldKind::Choice(alternatives) = &self.kind {
            if alternatives.len() < 2 {
                return Err(SchemaError::InvalidChoice {
                    type_name: type_name.to_string(),
                    field: self.name.clone(),
                    reason: "a choice needs at least two alternatives".to_string(),
                });
            }
            let mut seen = BTreeSet::new();
            for alt in alternatives {
                if !seen.insert(alt.choice_suffix()) {
                    return Err(SchemaError::InvalidChoice {
                        type_name: type_name.to_string(),
                        field: self.name.clone(),
                        reason: format!("alternative '{}' is listed twice", alt),
                    });
                }
            }
        }

        if self.binding.is_some() && !self.kind.is_coded() {
            return Err(SchemaError::InvalidBinding {
                type_name: type_name.to_string(),
                field: self.name.clone(),
            });
        }

        if !self.reference_targets.is_empty() && !self.kind.accepts_reference() {
            return Err(SchemaError::InvalidReferenceTargets {
                type_name: type_name.to_string(),
                field: self.name.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_text() {
        let c = Cardinality::parse("1..*").unwrap();
        assert_eq!(c, Cardinality::AT_LEAST_ONE);
        assert_eq!(c.to_string(), "1..*");
        assert!(c.is_required());
        assert!(c.is_repeated());
        assert!(Cardinality::parse("1").is_err());
        assert!(Cardinality::parse("a..1").is_err());
        assert!(!Cardinality::parse("2..1").unwrap().is_valid());
    }

    #[test]
    fn choice_keys_are_suffixed() {
        let field = FieldDescriptor::choice("value", ["string", "dateTime", "Reference"]);
        let keys: Vec<String> = field.wire_keys().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["valueString", "valueDateTime", "valueReference"]);
        assert!(field.kind.accepts_reference());
    }

    #[test]
    fn binding_membership() {
        let binding = CodeBinding::new(BindingStrength::Required)
            .with_codes("http://example.org/status", ["booked", "cancelled"]);
        assert!(binding.contains(None, "booked"));
        assert!(binding.contains(Some("http://example.org/status"), "cancelled"));
        assert!(!binding.contains(Some("http://other.org"), "booked"));
        assert!(!binding.contains(None, "bogus"));
    }

    #[test]
    fn check_rejects_single_alternative_choice() {
        let field = FieldDescriptor::choice("value", ["string"]);
        assert!(matches!(
            field.check("Observation"),
            Err(SchemaError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn check_rejects_binding_on_string() {
        let field = FieldDescriptor::primitive("name", PrimitiveKind::String)
            .with_binding(CodeBinding::new(BindingStrength::Example));
        assert!(matches!(
            field.check("Patient"),
            Err(SchemaError::InvalidBinding { .. })
        ));
    }
}
