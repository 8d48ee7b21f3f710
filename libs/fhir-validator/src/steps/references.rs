//! Reference target checks

use super::FieldCheck;
use crate::plan::ReferencesPlan;
use crate::validator::{IssueKind, ValidationIssue};
use tessera_models::FieldValue;

/// A reference's target type must be one of the field's allowed targets.
/// References without a known target type are not checked.
pub fn check_reference_targets(
    check: &FieldCheck<'_>,
    plan: &ReferencesPlan,
    issues: &mut Vec<ValidationIssue>,
) {
    let targets = &check.field.reference_targets;
    if targets.is_empty() {
        return;
    }

    for (path, item) in check.items() {
        let FieldValue::Reference(reference) = item else {
            continue;
        };
        let target = if plan.infer_from_literal {
            reference.target_type_or_inferred()
        } else {
            reference.target_type.as_deref()
        };

        match target {
            Some(target) if !targets.iter().any(|t| t == target) => {
                issues.push(ValidationIssue::error(
                    IssueKind::InvalidReferenceTarget,
                    path,
                    format!(
                        "reference to {} is not allowed here; expected one of {}",
                        target,
                        targets.join(", ")
                    ),
                ));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_models::{RecordInstance, ReferenceValue};
    use tessera_schema::FieldDescriptor;

    fn run(reference: ReferenceValue, infer: bool) -> Vec<ValidationIssue> {
        let field = FieldDescriptor::choice("code", ["Reference", "CodeableConcept"])
            .with_targets(["Device"]);
        let record = RecordInstance::new("DeviceRequest").with("codeReference", reference);
        let check = FieldCheck {
            record_path: "DeviceRequest",
            field: &field,
            entries: record.entries_for(&field),
            kept: 0,
        };
        let mut issues = Vec::new();
        check_reference_targets(
            &check,
            &ReferencesPlan {
                infer_from_literal: infer,
            },
            &mut issues,
        );
        issues
    }

    #[test]
    fn explicit_hint_is_checked() {
        assert!(run(ReferenceValue::new("Device/1").with_type("Device"), false).is_empty());
        let issues = run(ReferenceValue::new("Patient/1").with_type("Patient"), false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InvalidReferenceTarget);
        assert_eq!(issues[0].path, "DeviceRequest.codeReference");
    }

    #[test]
    fn literal_inference_is_opt_in() {
        assert!(run(ReferenceValue::new("Patient/1"), false).is_empty());
        assert_eq!(run(ReferenceValue::new("Patient/1"), true).len(), 1);
        assert!(run(ReferenceValue::new("#contained"), true).is_empty());
    }
}
