use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tessera_schema::{
    BindingStrength, Cardinality, FieldKind, Max, PrimitiveKind, RecordKind, SchemaDefinition,
    SchemaError, SchemaRegistry, TypeRef,
};

#[test]
fn builtin_registry_loads() {
    let registry = SchemaRegistry::builtin().expect("built-in definitions must load");

    for name in [
        "Coding",
        "CodeableConcept",
        "Identifier",
        "Period",
        "Quantity",
        "Attachment",
        "Annotation",
        "Extension",
        "Appointment",
        "AppointmentParticipant",
        "DeviceRequest",
        "DeviceRequestParameter",
        "Communication",
        "CommunicationPayload",
    ] {
        assert!(registry.contains(name), "{} missing", name);
    }
}

#[test]
fn appointment_status_is_a_required_binding() {
    let registry = SchemaRegistry::builtin().unwrap();
    let appointment = registry.lookup("Appointment").unwrap();
    assert_eq!(appointment.kind(), RecordKind::Resource);

    let status = appointment.field("status").unwrap();
    assert_eq!(status.kind, FieldKind::Primitive(PrimitiveKind::Code));
    assert_eq!(status.cardinality, Cardinality::REQUIRED);

    let binding = status.binding.as_ref().unwrap();
    assert_eq!(binding.strength, BindingStrength::Required);
    let codes: usize = binding.allowed_codes.values().map(|c| c.len()).sum();
    assert_eq!(codes, 10);
    assert!(binding.contains(None, "booked"));
    assert!(binding.contains(None, "cancelled"));

    let participant = appointment.field("participant").unwrap();
    assert_eq!(
        participant.kind,
        FieldKind::Complex("AppointmentParticipant".to_string())
    );
    assert_eq!(participant.cardinality.min, 1);
    assert_eq!(participant.cardinality.max, Max::Unbounded);
}

#[test]
fn device_request_code_is_a_choice() {
    let registry = SchemaRegistry::builtin().unwrap();
    let request = registry.lookup("DeviceRequest").unwrap();

    let reference = request.resolve("codeReference").unwrap();
    assert_eq!(reference.field.name, "code");
    assert!(reference.alternative.unwrap().is_reference());

    let concept = request.resolve("codeCodeableConcept").unwrap();
    assert_eq!(
        concept.alternative,
        Some(&TypeRef::Complex("CodeableConcept".to_string()))
    );
    assert_eq!(reference.field.reference_targets, vec!["Device".to_string()]);
}

#[test]
fn renamed_fields_resolve_by_alias() {
    let registry = SchemaRegistry::builtin().unwrap();
    let appointment = registry.lookup("Appointment").unwrap();
    assert_eq!(appointment.resolve("end_").unwrap().field.name, "end");
    assert_eq!(appointment.host_key("end"), "end_");
}

#[test]
fn definitions_export_and_reload() {
    let registry = SchemaRegistry::builtin().unwrap();
    let definitions: Vec<SchemaDefinition> =
        registry.schemas().map(SchemaDefinition::from).collect();
    let text = serde_json::to_string(&definitions).unwrap();

    let mut reloaded = SchemaRegistry::new();
    assert_eq!(reloaded.load_json(&text).unwrap(), registry.len());
    assert!(matches!(
        reloaded.load_json(&text),
        Err(SchemaError::DuplicateSchema(_))
    ));
}

#[test]
fn load_path_reads_a_directory() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("definitions");
    let mut registry = SchemaRegistry::new();
    let count = registry.load_path(&dir).unwrap();
    assert_eq!(count, SchemaRegistry::builtin().unwrap().len());
    assert!(fs::metadata(dir.join("appointment.json")).is_ok());
}

#[test]
fn registry_is_shareable_across_threads() {
    let registry = Arc::new(SchemaRegistry::builtin().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.lookup("Appointment").unwrap().fields().len())
        })
        .collect();

    let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(counts.windows(2).all(|w| w[0] == w[1]));
}
