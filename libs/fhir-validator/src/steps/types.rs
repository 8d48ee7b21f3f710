//! Type checking of field values
//!
//! Each occurrence must have the shape of its declared type:
//! - primitives: the scalar class of the primitive kind, plus the lexical
//!   rules the kind adds on top (`positiveInt > 0`, `id` pattern, ...)
//! - `Reference`: a reference value
//! - other complex types: a nested record of exactly that type

use super::FieldCheck;
use crate::validator::{IssueKind, ValidationIssue};
use regex::Regex;
use std::sync::OnceLock;
use tessera_models::{FieldValue, PrimitiveValue};
use tessera_schema::{PrimitiveKind, TypeRef};

pub fn check_types(check: &FieldCheck<'_>, issues: &mut Vec<ValidationIssue>) {
    for (type_ref, path, item) in check.typed_items() {
        if let Some(problem) = type_problem(&type_ref, item) {
            issues.push(ValidationIssue::error(IssueKind::TypeMismatch, path, problem));
        }
    }
}

fn type_problem(type_ref: &TypeRef, item: &FieldValue) -> Option<String> {
    match (type_ref, item) {
        (_, FieldValue::Repeated(_)) => {
            Some("a repetition cannot contain another repetition".to_string())
        }
        (TypeRef::Primitive(kind), FieldValue::Primitive(value)) => {
            if value.scalar_class() != kind.scalar_class() {
                return Some(format!(
                    "expected {}, found a {:?} value",
                    kind,
                    value.scalar_class()
                ));
            }
            lexical_problem(*kind, value)
        }
        (TypeRef::Complex(_), FieldValue::Reference(_)) if type_ref.is_reference() => None,
        (TypeRef::Complex(name), FieldValue::Single(record)) if !type_ref.is_reference() => {
            (record.type_name() != name).then(|| {
                format!("expected a {} record, found {}", name, record.type_name())
            })
        }
        (expected, found) => Some(format!("expected {}, found a {}", expected, found.shape())),
    }
}

/// Rules a primitive kind adds on top of its scalar class
fn lexical_problem(kind: PrimitiveKind, value: &PrimitiveValue) -> Option<String> {
    match (kind, value) {
        (PrimitiveKind::PositiveInt, PrimitiveValue::Integer(i)) if *i < 1 => {
            Some(format!("positiveInt must be at least 1, found {}", i))
        }
        (PrimitiveKind::UnsignedInt, PrimitiveValue::Integer(i)) if *i < 0 => {
            Some(format!("unsignedInt must not be negative, found {}", i))
        }
        (
            PrimitiveKind::Integer | PrimitiveKind::PositiveInt | PrimitiveKind::UnsignedInt,
            PrimitiveValue::Integer(i),
        ) if i32::try_from(*i).is_err() => {
            Some(format!("{} is outside the 32-bit range of {}", i, kind))
        }
        (PrimitiveKind::Instant, PrimitiveValue::DateTime(dt)) if !dt.is_instant() => {
            Some("an instant needs seconds and a time zone".to_string())
        }
        (_, PrimitiveValue::String(text)) => text_problem(kind, text),
        _ => None,
    }
}

fn text_problem(kind: PrimitiveKind, text: &str) -> Option<String> {
    let pattern = match kind {
        PrimitiveKind::Id => id_pattern(),
        PrimitiveKind::Code => code_pattern(),
        PrimitiveKind::Oid => oid_pattern(),
        PrimitiveKind::Uuid => uuid_pattern(),
        PrimitiveKind::Uri | PrimitiveKind::Url | PrimitiveKind::Canonical => uri_pattern(),
        _ => {
            return text
                .trim()
                .is_empty()
                .then(|| format!("{} must not be empty", kind));
        }
    };

    (!pattern.is_match(text)).then(|| format!("'{}' is not a valid {}", text, kind))
}

fn id_pattern() -> &'static Regex {
    static ID_RE: OnceLock<Regex> = OnceLock::new();
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-.]{1,64}$").expect("id regex must compile"))
}

fn code_pattern() -> &'static Regex {
    static CODE_RE: OnceLock<Regex> = OnceLock::new();
    CODE_RE.get_or_init(|| Regex::new(r"^[^\s]+( [^\s]+)*$").expect("code regex must compile"))
}

fn oid_pattern() -> &'static Regex {
    static OID_RE: OnceLock<Regex> = OnceLock::new();
    OID_RE.get_or_init(|| {
        Regex::new(r"^urn:oid:[0-2](\.(0|[1-9][0-9]*))+$").expect("oid regex must compile")
    })
}

fn uuid_pattern() -> &'static Regex {
    static UUID_RE: OnceLock<Regex> = OnceLock::new();
    UUID_RE.get_or_init(|| {
        Regex::new(r"^urn:uuid:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("uuid regex must compile")
    })
}

fn uri_pattern() -> &'static Regex {
    static URI_RE: OnceLock<Regex> = OnceLock::new();
    URI_RE.get_or_init(|| Regex::new(r"^\S+$").expect("uri regex must compile"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_models::{RecordInstance, ReferenceValue};

    fn primitive(kind: PrimitiveKind, value: impl Into<PrimitiveValue>) -> Option<String> {
        type_problem(&TypeRef::Primitive(kind), &FieldValue::Primitive(value.into()))
    }

    #[test]
    fn scalar_classes_must_match() {
        assert!(primitive(PrimitiveKind::Boolean, true).is_none());
        assert!(primitive(PrimitiveKind::Boolean, "true").is_some());
        assert!(primitive(PrimitiveKind::Decimal, 3i64).is_some());
    }

    #[test]
    fn lexical_rules() {
        assert!(primitive(PrimitiveKind::PositiveInt, 0i64).is_some());
        assert!(primitive(PrimitiveKind::PositiveInt, 15i64).is_none());
        assert!(primitive(PrimitiveKind::UnsignedInt, -1i64).is_some());
        assert!(primitive(PrimitiveKind::Integer, 1i64 << 40).is_some());
        assert!(primitive(PrimitiveKind::Integer64, 1i64 << 40).is_none());
        assert!(primitive(PrimitiveKind::Id, "example-1.a").is_none());
        assert!(primitive(PrimitiveKind::Id, "has space").is_some());
        assert!(primitive(PrimitiveKind::Code, "booked").is_none());
        assert!(primitive(PrimitiveKind::Code, " booked").is_some());
        assert!(primitive(PrimitiveKind::Oid, "urn:oid:1.2.840.10008").is_none());
        assert!(primitive(PrimitiveKind::Oid, "1.2.3").is_some());
        assert!(primitive(
            PrimitiveKind::Uuid,
            "urn:uuid:a76d9bbf-f293-4fb7-ad4c-2851cac77162"
        )
        .is_none());
        assert!(primitive(PrimitiveKind::Uri, "http://a b").is_some());
        assert!(primitive(PrimitiveKind::String, "  ").is_some());
    }

    #[test]
    fn instants_need_full_precision() {
        let date_only: tessera_models::PartialDateTime = "2024-01-01".parse().unwrap();
        assert!(primitive(PrimitiveKind::Instant, date_only.clone()).is_some());
        assert!(primitive(PrimitiveKind::DateTime, date_only).is_none());
    }

    #[test]
    fn complex_types() {
        let period = TypeRef::Complex("Period".to_string());
        let reference = TypeRef::Complex("Reference".to_string());

        assert!(type_problem(&period, &RecordInstance::new("Period").into()).is_none());
        assert!(type_problem(&period, &RecordInstance::new("Quantity").into()).is_some());
        assert!(type_problem(&reference, &ReferenceValue::new("Device/1").into()).is_none());
        assert!(type_problem(&reference, &RecordInstance::new("Reference").into()).is_some());
        assert!(type_problem(&period, &ReferenceValue::new("Device/1").into()).is_some());
        assert!(type_problem(&period, &FieldValue::Repeated(vec![])).is_some());
    }
}
