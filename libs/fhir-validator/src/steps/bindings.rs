//! Code-binding membership
//!
//! Coded values are compared with the allow-list carried by the field's
//! binding; no terminology server is consulted. A `code` primitive matches a
//! code of any system in the list, a `Coding` must match within its own
//! system, and a `CodeableConcept` passes when any of its codings does.
//!
//! Only `required` bindings produce errors. Misses against weaker bindings
//! are reported at the severity the plan assigns, or not at all.

use super::FieldCheck;
use crate::plan::TerminologyPlan;
use crate::validator::{IssueKind, IssueSeverity, ValidationIssue};
use crate::AdvisoryHandling;
use tessera_models::{FieldValue, RecordInstance};
use tessera_schema::{CodeBinding, CODEABLE_CONCEPT_TYPE, CODING_TYPE};

pub fn check_bindings(
    check: &FieldCheck<'_>,
    plan: &TerminologyPlan,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(binding) = check.field.binding.as_ref() else {
        return;
    };
    // A binding that names no codes cannot be checked locally
    if !binding.is_enumerated() {
        return;
    }

    let severity = match plan.handling(binding.strength) {
        None => IssueSeverity::Error,
        Some(AdvisoryHandling::Ignore) => return,
        Some(AdvisoryHandling::Information) => IssueSeverity::Information,
        Some(AdvisoryHandling::Warning) => IssueSeverity::Warning,
    };

    for (type_ref, path, item) in check.typed_items() {
        // Uncoded alternatives of a choice field are not bound
        if !type_ref.is_coded() {
            continue;
        }
        let Some(miss) = membership_miss(binding, item) else {
            continue;
        };
        issues.push(ValidationIssue::new(
            severity,
            IssueKind::CodeNotInValueSet,
            path,
            format!("{} ({} binding{})", miss, binding.strength, value_set_suffix(binding)),
        ));
    }
}

/// Describes why a coded value falls outside the binding, if it does
fn membership_miss(binding: &CodeBinding, item: &FieldValue) -> Option<String> {
    match item {
        FieldValue::Primitive(value) => {
            let code = value.as_str()?;
            (!binding.contains(None, code))
                .then(|| format!("code '{}' is not in the value set", code))
        }
        FieldValue::Single(record) if record.type_name() == CODING_TYPE => {
            coding_miss(binding, record)
        }
        FieldValue::Single(record) if record.type_name() == CODEABLE_CONCEPT_TYPE => {
            concept_miss(binding, record)
        }
        _ => None,
    }
}

fn coding_miss(binding: &CodeBinding, coding: &RecordInstance) -> Option<String> {
    let code = coding.get("code").and_then(FieldValue::as_str)?;
    let system = coding.get("system").and_then(FieldValue::as_str);
    if binding.contains(system, code) {
        return None;
    }
    Some(match system {
        Some(system) => format!("code '{}' from system '{}' is not in the value set", code, system),
        None => format!("code '{}' is not in the value set", code),
    })
}

fn concept_miss(binding: &CodeBinding, concept: &RecordInstance) -> Option<String> {
    let codings: Vec<&RecordInstance> = concept
        .get("coding")
        .map(|value| value.items().iter().filter_map(FieldValue::as_record).collect())
        .unwrap_or_default();

    if codings.is_empty() {
        return Some("the concept has no coding from the value set".to_string());
    }
    if codings.iter().any(|coding| coding_miss(binding, coding).is_none()) {
        return None;
    }

    let misses: Vec<String> = codings
        .iter()
        .filter_map(|coding| coding.get("code").and_then(FieldValue::as_str))
        .map(|code| format!("'{}'", code))
        .collect();
    Some(format!(
        "none of the codings ({}) is in the value set",
        misses.join(", ")
    ))
}

fn value_set_suffix(binding: &CodeBinding) -> String {
    match &binding.value_set {
        Some(url) => format!(" to {}", url),
        None => String::new(),
    }
}
