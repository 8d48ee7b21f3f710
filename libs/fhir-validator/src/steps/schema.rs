//! Record-level schema checks
//!
//! Keys no descriptor accounts for, unknown side-channel content, and
//! (optionally) the presence of modifier fields.

use super::FieldCheck;
use crate::plan::SchemaPlan;
use crate::validator::{IssueKind, IssueSeverity, ValidationIssue};
use crate::UnknownContentHandling;
use tessera_models::RecordInstance;
use tessera_schema::RecordSchema;

/// Field keys that resolve to no descriptor. A key shaped like an alternative
/// of a choice field (`valueQuantity` on a `string|boolean` choice) is a
/// type mismatch rather than an unknown field.
pub fn check_unmatched_keys(
    record: &RecordInstance,
    schema: &RecordSchema,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for key in record.keys() {
        let key_path = format!("{}.{}", path, key);

        if schema.resolve(key).is_some() {
            if schema.wire_key(key) != key {
                issues.push(ValidationIssue::error(
                    IssueKind::UnknownField,
                    key_path,
                    format!(
                        "'{}' is a host alias; records are keyed by the wire name '{}'",
                        key,
                        schema.wire_key(key)
                    ),
                ));
            }
            continue;
        }

        match schema.undeclared_choice_for(key) {
            Some(choice) => issues.push(ValidationIssue::error(
                IssueKind::TypeMismatch,
                key_path,
                format!(
                    "'{}' is not a declared alternative of {}[x] ({})",
                    key, choice.name, choice.kind
                ),
            )),
            None => issues.push(ValidationIssue::error(
                IssueKind::UnknownField,
                key_path,
                format!("{} has no field '{}'", schema.name(), key),
            )),
        }
    }
}

/// Side-channel content. Primitive metadata (`_status`) of a known field is
/// part of that field and never reported, nor are the kept items of a
/// repeated primitive whose items carry only metadata.
pub fn check_unknown_content(
    record: &RecordInstance,
    schema: &RecordSchema,
    path: &str,
    plan: &SchemaPlan,
    issues: &mut Vec<ValidationIssue>,
) {
    let severity = match plan.unknown_content {
        UnknownContentHandling::Allow => return,
        UnknownContentHandling::Warning => IssueSeverity::Warning,
        UnknownContentHandling::Error => IssueSeverity::Error,
    };

    for (key, value) in record.unknown() {
        let is_metadata = key
            .strip_prefix('_')
            .is_some_and(|field| schema.resolve(field).is_some());
        let is_kept = value.is_array() && schema.resolve(key).is_some();
        if is_metadata || is_kept {
            continue;
        }

        issues.push(ValidationIssue::new(
            severity,
            IssueKind::UnknownField,
            format!("{}.{}", path, key),
            format!("unrecognised content '{}' is not part of {}", key, schema.name()),
        ));
    }
}

/// Information issue for each populated modifier field
pub fn check_modifiers(check: &FieldCheck<'_>, issues: &mut Vec<ValidationIssue>) {
    if !check.field.is_modifier || check.entries.is_empty() {
        return;
    }
    issues.push(ValidationIssue::information(
        IssueKind::ModifierPresent,
        check.field_path(),
        format!(
            "'{}' is a modifier; its value changes how the record is interpreted",
            check.field.name
        ),
    ));
}
