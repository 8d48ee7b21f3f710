//! Occurrence counts and choice exclusivity

use super::FieldCheck;
use crate::validator::{IssueKind, ValidationIssue};

/// `min`/`max` occurrence check
///
/// For a choice field the count is taken per alternative, so populating two
/// alternatives is reported once, as an ambiguous choice, rather than also
/// as an excess occurrence.
pub fn check_cardinality(check: &FieldCheck<'_>, issues: &mut Vec<ValidationIssue>) {
    let cardinality = &check.field.cardinality;
    let count = check
        .entries
        .iter()
        .map(|entry| entry.value.count())
        .max()
        .unwrap_or(0)
        .max(check.kept);

    if count == 0 && cardinality.is_required() {
        issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            check.field_path(),
            format!(
                "missing required field '{}' (cardinality {})",
                check.field.name, cardinality
            ),
        ));
    } else if cardinality.exceeds_max(count) {
        issues.push(ValidationIssue::error(
            IssueKind::CardinalityExceeded,
            check.field_path(),
            format!(
                "field '{}' has {} occurrences, at most {} allowed",
                check.field.name,
                count,
                cardinality.max_text()
            ),
        ));
    } else if count < cardinality.min as usize {
        issues.push(ValidationIssue::error(
            IssueKind::MissingRequiredField,
            check.field_path(),
            format!(
                "field '{}' has {} occurrences, at least {} required",
                check.field.name, count, cardinality.min
            ),
        ));
    }
}

/// At most one alternative of a choice field may be populated
pub fn check_choice_exclusivity(check: &FieldCheck<'_>, issues: &mut Vec<ValidationIssue>) {
    if !check.field.kind.is_choice() || check.entries.len() < 2 {
        return;
    }

    let keys: Vec<&str> = check.entries.iter().map(|e| e.key).collect();
    issues.push(ValidationIssue::error(
        IssueKind::AmbiguousChoice,
        check.field_path(),
        format!(
            "choice field '{}[x]' has {} alternatives populated: {}",
            check.field.name,
            keys.len(),
            keys.join(", ")
        ),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_models::{FieldValue, RecordInstance};
    use tessera_schema::{Cardinality, FieldDescriptor, Max, PrimitiveKind};

    fn run(field: &FieldDescriptor, record: &RecordInstance) -> Vec<ValidationIssue> {
        let check = FieldCheck {
            record_path: record.type_name(),
            field,
            entries: record.entries_for(field),
            kept: 0,
        };
        let mut issues = Vec::new();
        check_cardinality(&check, &mut issues);
        check_choice_exclusivity(&check, &mut issues);
        issues
    }

    #[test]
    fn missing_required_field() {
        let field = FieldDescriptor::primitive("status", PrimitiveKind::Code)
            .with_cardinality(Cardinality::REQUIRED);
        let issues = run(&field, &RecordInstance::new("Appointment"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingRequiredField);
        assert_eq!(issues[0].path, "Appointment.status");
    }

    #[test]
    fn exceeded_and_below_minimum() {
        let field = FieldDescriptor::primitive("alias", PrimitiveKind::String)
            .with_cardinality(Cardinality::new(2, Max::Bounded(3)));

        let many = RecordInstance::new("Group").with(
            "alias",
            ["a", "b", "c", "d"].map(FieldValue::from).to_vec(),
        );
        assert_eq!(run(&field, &many)[0].kind, IssueKind::CardinalityExceeded);

        let few = RecordInstance::new("Group").with("alias", vec![FieldValue::from("a")]);
        assert_eq!(run(&field, &few)[0].kind, IssueKind::MissingRequiredField);
    }

    #[test]
    fn two_alternatives_are_ambiguous_once() {
        let field = FieldDescriptor::choice("value", ["string", "boolean"]);
        let record = RecordInstance::new("Extension")
            .with("valueString", "x")
            .with("valueBoolean", true);
        let issues = run(&field, &record);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::AmbiguousChoice);
        assert_eq!(issues[0].path, "Extension.value[x]");
    }

    #[test]
    fn kept_occurrences_are_counted() {
        let field = FieldDescriptor::primitive("alias", PrimitiveKind::String)
            .with_cardinality(Cardinality::new(1, Max::Bounded(2)));
        let record = RecordInstance::new("Group");
        let check = |kept| {
            let check = FieldCheck {
                record_path: "Group",
                field: &field,
                entries: record.entries_for(&field),
                kept,
            };
            let mut issues = Vec::new();
            check_cardinality(&check, &mut issues);
            issues
        };

        assert!(check(2).is_empty());
        assert_eq!(check(3)[0].kind, IssueKind::CardinalityExceeded);
        assert_eq!(check(0)[0].kind, IssueKind::MissingRequiredField);
    }

    #[test]
    fn empty_repetition_counts_as_absent() {
        let field = FieldDescriptor::complex("participant", "AppointmentParticipant")
            .with_cardinality(Cardinality::AT_LEAST_ONE);
        let record =
            RecordInstance::new("Appointment").with("participant", Vec::<RecordInstance>::new());
        assert_eq!(run(&field, &record)[0].kind, IssueKind::MissingRequiredField);
    }
}
