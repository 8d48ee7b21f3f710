//! Structural equality and hashing
//!
//! Two records are structurally equal when they have the same type name and
//! the same populated fields with structurally equal values. Field insertion
//! order is irrelevant; the order of repeated occurrences is not. Unknown
//! side-channel content takes no part in the comparison.

use crate::primitive::PrimitiveValue;
use crate::record::{FieldValue, RecordInstance};
use crate::reference::ReferenceValue;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

pub fn structural_eq(a: &RecordInstance, b: &RecordInstance) -> bool {
    a.type_name() == b.type_name()
        && a.len() == b.len()
        && a.iter().all(|(key, value)| {
            b.get(key)
                .is_some_and(|other| field_value_eq(value, other))
        })
}

pub fn field_value_eq(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Primitive(x), FieldValue::Primitive(y)) => x == y,
        (FieldValue::Single(x), FieldValue::Single(y)) => structural_eq(x, y),
        (FieldValue::Repeated(xs), FieldValue::Repeated(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| field_value_eq(x, y))
        }
        (FieldValue::Reference(x), FieldValue::Reference(y)) => reference_eq(x, y),
        _ => false,
    }
}

fn reference_eq(a: &ReferenceValue, b: &ReferenceValue) -> bool {
    a.reference == b.reference && a.target_type == b.target_type && a.display == b.display
}

/// Hash consistent with [`structural_eq`]
pub fn structural_hash(record: &RecordInstance) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_record(record, &mut hasher);
    hasher.finish()
}

fn hash_record<H: Hasher>(record: &RecordInstance, state: &mut H) {
    record.type_name().hash(state);
    let mut keys: Vec<&str> = record.keys().collect();
    keys.sort_unstable();
    keys.len().hash(state);
    for key in keys {
        key.hash(state);
        if let Some(value) = record.get(key) {
            hash_value(value, state);
        }
    }
}

fn hash_value<H: Hasher>(value: &FieldValue, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        FieldValue::Primitive(p) => hash_primitive(p, state),
        FieldValue::Single(record) => hash_record(record, state),
        FieldValue::Repeated(items) => {
            items.len().hash(state);
            for item in items {
                hash_value(item, state);
            }
        }
        FieldValue::Reference(r) => {
            r.reference.hash(state);
            r.target_type.hash(state);
            r.display.hash(state);
        }
    }
}

fn hash_primitive<H: Hasher>(value: &PrimitiveValue, state: &mut H) {
    match value {
        // 1.5 == 1.50, so hash the normalised form
        PrimitiveValue::Decimal(d) => {
            std::mem::discriminant(value).hash(state);
            d.normalize().hash(state);
        }
        other => other.hash(state),
    }
}

/// Drop structural duplicates, keeping the first occurrence of each record
pub fn dedup_structural(records: Vec<RecordInstance>) -> Vec<RecordInstance> {
    let mut buckets: HashMap<u64, Vec<usize>> = HashMap::new();
    let mut kept: Vec<RecordInstance> = Vec::with_capacity(records.len());

    for record in records {
        let hash = structural_hash(&record);
        let bucket = buckets.entry(hash).or_default();
        if bucket.iter().any(|&i| structural_eq(&kept[i], &record)) {
            continue;
        }
        bucket.push(kept.len());
        kept.push(record);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn participant(status: &str) -> RecordInstance {
        RecordInstance::new("AppointmentParticipant")
            .with("status", status)
            .with("actor", ReferenceValue::new("Patient/1"))
    }

    fn appointment(status: &str) -> RecordInstance {
        RecordInstance::new("Appointment")
            .with("status", status)
            .with("participant", vec![participant("accepted")])
    }

    #[test]
    fn field_order_is_irrelevant() {
        let a = RecordInstance::new("Period")
            .with("start", "2020")
            .with("end", "2021");
        let b = RecordInstance::new("Period")
            .with("end", "2021")
            .with("start", "2020");
        assert!(structural_eq(&a, &b));
        assert_eq!(structural_hash(&a), structural_hash(&b));
    }

    #[test]
    fn repetition_order_matters() {
        let a = RecordInstance::new("Appointment")
            .with("participant", vec![participant("accepted"), participant("declined")]);
        let b = RecordInstance::new("Appointment")
            .with("participant", vec![participant("declined"), participant("accepted")]);
        assert!(!structural_eq(&a, &b));
    }

    #[test]
    fn type_name_and_values_matter() {
        assert!(structural_eq(&appointment("booked"), &appointment("booked")));
        assert!(!structural_eq(&appointment("booked"), &appointment("cancelled")));

        let renamed = RecordInstance::new("Encounter").with("status", "booked");
        let original = RecordInstance::new("Appointment").with("status", "booked");
        assert!(!structural_eq(&renamed, &original));
    }

    #[test]
    fn absent_is_not_empty() {
        let a = RecordInstance::new("Appointment").with("participant", FieldValue::Repeated(vec![]));
        let b = RecordInstance::new("Appointment");
        assert!(!structural_eq(&a, &b));
    }

    #[test]
    fn unknown_content_is_ignored() {
        let mut a = appointment("booked");
        a.insert_unknown("extra", json!(1));
        assert!(structural_eq(&a, &appointment("booked")));
        assert_eq!(structural_hash(&a), structural_hash(&appointment("booked")));
    }

    #[test]
    fn decimals_hash_by_value() {
        let a = RecordInstance::new("Quantity").with("value", Decimal::from_str("1.5").unwrap());
        let b = RecordInstance::new("Quantity").with("value", Decimal::from_str("1.50").unwrap());
        assert!(structural_eq(&a, &b));
        assert_eq!(structural_hash(&a), structural_hash(&b));
    }

    #[test]
    fn dedup_keeps_first_occurrences() {
        let records = vec![
            appointment("booked"),
            appointment("cancelled"),
            appointment("booked"),
        ];
        let unique = dedup_structural(records);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[1].get("status").and_then(FieldValue::as_str), Some("cancelled"));
    }
}
