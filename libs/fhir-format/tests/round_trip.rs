use quickcheck::{QuickCheck, TestResult};
use serde_json::{json, Value};
use tessera_format::{
    decode_tagged, encode_tagged, encode_tagged_with, from_json, parse_xml, record_from_json,
    record_from_xml, record_to_json, record_to_xml, DecodeError, EncodeError, KeyNames,
    TaggedObject, TaggedValue,
};
use tessera_models::{structural_eq, FieldValue, PrimitiveValue, RecordBuilder, RecordInstance};
use tessera_schema::SchemaRegistry;

fn registry() -> SchemaRegistry {
    SchemaRegistry::builtin().expect("builtin schemas load")
}

fn appointment() -> RecordInstance {
    RecordInstance::new("Appointment")
        .with("status", "booked")
        .with(
            "participant",
            vec![RecordInstance::new("AppointmentParticipant").with("status", "accepted")],
        )
}

// ============================================================================
// Decode Errors
// ============================================================================

#[test]
fn unregistered_root_type() {
    let err = record_from_xml(r#"<Patient><id value="1"/></Patient>"#, &registry()).unwrap_err();
    assert!(matches!(&err, DecodeError::UnknownType { type_name, .. } if type_name == "Patient"));
    assert_eq!(err.path(), Some("Patient"));

    let err = record_from_json(r#"{"resourceType": "Patient"}"#, &registry()).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownType { .. }));
}

#[test]
fn encoding_an_unregistered_type_fails() {
    let record = RecordInstance::new("Patient");
    assert!(matches!(
        record_to_xml(&record, &registry()),
        Err(EncodeError::UnknownType(name)) if name == "Patient"
    ));
    assert!(matches!(
        encode_tagged(&record, &registry()),
        Err(EncodeError::UnknownType(_))
    ));
}

#[test]
fn malformed_primitives_name_their_path() {
    let registry = registry();

    let err = record_from_xml(
        r#"<Appointment><status value="booked"/><minutesDuration value="ninety"/></Appointment>"#,
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedPrimitive { .. }));
    assert_eq!(err.path(), Some("Appointment.minutesDuration"));

    let err = record_from_xml(
        r#"<Appointment>
             <requestedPeriod><start value="2013-12-10"/></requestedPeriod>
             <requestedPeriod><start value="next week"/></requestedPeriod>
           </Appointment>"#,
        &registry,
    )
    .unwrap_err();
    assert_eq!(err.path(), Some("Appointment.requestedPeriod[1].start"));

    let err = record_from_json(
        r#"{"resourceType": "Appointment", "start": "yesterday"}"#,
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedPrimitive { .. }));
    assert_eq!(err.path(), Some("Appointment.start"));
}

#[test]
fn instants_without_a_zone_are_malformed() {
    let err = record_from_xml(
        r#"<Appointment><start value="2013-12-10T09:00:00"/></Appointment>"#,
        &registry(),
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedPrimitive { .. }));
}

#[test]
fn shape_mismatches() {
    let registry = registry();

    // A primitive field holding a complex element
    let err = record_from_xml(
        r#"<Appointment><status><coding/></status></Appointment>"#,
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
    assert_eq!(err.path(), Some("Appointment.status"));

    // A complex field holding a primitive value
    let err = record_from_xml(
        r#"<Appointment><requestedPeriod value="2013"/></Appointment>"#,
        &registry,
    )
    .unwrap_err();
    assert_eq!(err.path(), Some("Appointment.requestedPeriod[0]"));

    // A repeated field that is not a list
    let err = record_from_json(
        r#"{"resourceType": "Appointment", "participant": {"status": "accepted"}}"#,
        &registry,
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
    assert_eq!(err.path(), Some("Appointment.participant"));

    // A scalar where an object is expected
    let err = record_from_json(
        r#"{"resourceType": "DeviceRequest", "occurrencePeriod": "2013"}"#,
        &registry,
    )
    .unwrap_err();
    assert_eq!(err.path(), Some("DeviceRequest.occurrencePeriod"));

    assert!(matches!(
        from_json(&json!(["not", "an", "object"])),
        Err(DecodeError::ShapeMismatch { .. })
    ));
}

#[test]
fn tagged_objects_need_a_type_tag() {
    let object = TaggedObject::new().with("status", "booked");
    let err = decode_tagged(&object, &registry()).unwrap_err();
    assert!(matches!(err, DecodeError::MissingTypeTag { .. }));

    let err = record_from_json(r#"{"status": "booked"}"#, &registry()).unwrap_err();
    assert!(matches!(err, DecodeError::MissingTypeTag { .. }));
}

#[test]
fn syntax_errors() {
    assert!(matches!(
        record_from_xml("<Appointment>", &registry()),
        Err(DecodeError::Xml(_))
    ));
    assert!(matches!(
        record_from_json("{", &registry()),
        Err(DecodeError::Json(_))
    ));
}

// ============================================================================
// Keys and Counts
// ============================================================================

#[test]
fn renamed_keys_use_either_spelling() {
    let registry = registry();

    let host = record_from_json(
        r#"{"resourceType": "Appointment", "end_": "2013-12-10T11:00:00Z"}"#,
        &registry,
    )
    .unwrap();
    let wire = record_from_json(
        r#"{"resourceType": "Appointment", "end": "2013-12-10T11:00:00Z"}"#,
        &registry,
    )
    .unwrap();
    assert_eq!(host, wire);
    assert!(host.contains("end"));

    let object = encode_tagged(&host, &registry).unwrap();
    assert!(object.get("end_").is_some());
    assert!(object.get("end").is_none());

    let object = encode_tagged_with(&host, &registry, KeyNames::Wire).unwrap();
    assert!(object.get("end").is_some());

    // Text forms always carry the wire name
    assert!(record_to_json(&host, &registry).unwrap().contains(r#""end":"#));
    assert!(record_to_xml(&host, &registry).unwrap().contains("<end "));
}

#[test]
fn choice_fields_keep_their_suffix() {
    let record = record_from_json(
        r#"{
            "resourceType": "DeviceRequest",
            "codeReference": {"reference": "Device/pump"},
            "occurrenceDateTime": "2013-05-08"
        }"#,
        &registry(),
    )
    .unwrap();

    let code = record.get("codeReference").and_then(FieldValue::as_reference).unwrap();
    assert_eq!(code.reference, "Device/pump");
    assert!(record.contains("occurrenceDateTime"));

    let xml = record_to_xml(&record, &registry()).unwrap();
    let document = parse_xml(&xml).unwrap();
    assert!(document.child("codeReference").is_some());
    assert_eq!(
        document.child("occurrenceDateTime").and_then(|n| n.value()),
        Some("2013-05-08")
    );
}

#[test]
fn repeated_fields_always_decode_to_repetitions() {
    let record = record_from_xml(
        r#"<Appointment><participant><status value="accepted"/></participant></Appointment>"#,
        &registry(),
    )
    .unwrap();
    let participant = record.get("participant").unwrap();
    assert!(participant.is_repeated());
    assert_eq!(participant.count(), 1);
}

#[test]
fn extra_occurrences_decode_for_the_validator() {
    let record = record_from_xml(
        r#"<Appointment><status value="booked"/><status value="cancelled"/></Appointment>"#,
        &registry(),
    )
    .unwrap();
    let status = record.get("status").unwrap();
    assert!(status.is_repeated());
    assert_eq!(status.items()[1].as_str(), Some("cancelled"));
}

#[test]
fn single_item_lists_decode_like_single_elements() {
    let registry = registry();
    let record = RecordBuilder::new(registry.lookup("Appointment").unwrap())
        .set("status", FieldValue::Repeated(vec!["booked".into()]))
        .unwrap()
        .build();
    assert!(!record.get("status").unwrap().is_repeated());

    let via_tree = record_from_xml(&record_to_xml(&record, &registry).unwrap(), &registry).unwrap();
    let via_tagged = decode_tagged(&encode_tagged(&record, &registry).unwrap(), &registry).unwrap();
    assert_eq!(via_tree, record);
    assert_eq!(via_tagged, record);
    assert!(structural_eq(&via_tree, &via_tagged));

    let listed = record_from_json(
        r#"{"resourceType": "Appointment", "status": ["booked"]}"#,
        &registry,
    )
    .unwrap();
    assert_eq!(listed, record);
}

#[test]
fn native_and_textual_scalars_agree() {
    let registry = registry();
    let object = TaggedObject::tagged("Appointment")
        .with("minutesDuration", 15i64)
        .with("start", "2013-12-10T09:00:00Z");
    let native = decode_tagged(&object, &registry).unwrap();

    let textual = record_from_xml(
        r#"<Appointment>
             <start value="2013-12-10T09:00:00Z"/>
             <minutesDuration value="15"/>
           </Appointment>"#,
        &registry,
    )
    .unwrap();
    assert_eq!(native, textual);
    assert_eq!(
        native.get("minutesDuration").and_then(FieldValue::as_primitive),
        Some(&PrimitiveValue::Integer(15))
    );
}

// ============================================================================
// Unknown Content
// ============================================================================

#[test]
fn unknown_elements_survive_both_codecs() {
    let registry = registry();
    let record = record_from_xml(
        r#"<Appointment>
             <status value="booked"/>
             <participant>
               <status value="accepted"/>
               <seat><row value="B"/></seat>
             </participant>
             <flavour value="mild"/>
           </Appointment>"#,
        &registry,
    )
    .unwrap();
    assert_eq!(record.unknown().get("flavour"), Some(&json!("mild")));

    let json = record_to_json(&record, &registry).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["flavour"], json!("mild"));
    assert_eq!(value["participant"][0]["seat"]["row"], json!("B"));

    let from_json = record_from_json(&json, &registry).unwrap();
    assert_eq!(from_json, record);

    let document = parse_xml(&record_to_xml(&from_json, &registry).unwrap()).unwrap();
    assert_eq!(document.child("flavour").and_then(|n| n.value()), Some("mild"));
    let seat = document
        .child("participant")
        .and_then(|p| p.child("seat"))
        .unwrap();
    assert_eq!(seat.child("row").and_then(|n| n.value()), Some("B"));
}

#[test]
fn repetitions_with_extension_only_items_survive_both_codecs() {
    let registry = registry();
    let json = r#"{
        "resourceType": "DeviceRequest",
        "status": "active",
        "instantiatesUri": [null, "http://example.org/protocol"],
        "_instantiatesUri": [
            {"extension": [{"url": "http://example.org/absent-reason", "valueCode": "unknown"}]},
            null
        ]
    }"#;
    let xml = r#"<DeviceRequest>
                   <instantiatesUri>
                     <extension url="http://example.org/absent-reason">
                       <valueCode value="unknown"/>
                     </extension>
                   </instantiatesUri>
                   <instantiatesUri value="http://example.org/protocol"/>
                   <status value="active"/>
                 </DeviceRequest>"#;

    let from_json = record_from_json(json, &registry).unwrap();
    let from_xml = record_from_xml(xml, &registry).unwrap();
    assert_eq!(from_json, from_xml);
    assert!(!from_json.contains("instantiatesUri"));
    assert_eq!(
        from_json.unknown().get("instantiatesUri"),
        Some(&json!([null, "http://example.org/protocol"]))
    );

    let document = parse_xml(&record_to_xml(&from_json, &registry).unwrap()).unwrap();
    let uris: Vec<_> = document.children_named("instantiatesUri").collect();
    assert_eq!(uris.len(), 2);
    assert_eq!(uris[0].value(), None);
    assert!(uris[0].child("extension").is_some());
    assert_eq!(uris[1].value(), Some("http://example.org/protocol"));
    let xml_again = record_to_xml(&from_json, &registry).unwrap();
    assert_eq!(record_from_xml(&xml_again, &registry).unwrap(), from_json);

    let again: Value = serde_json::from_str(&record_to_json(&from_xml, &registry).unwrap()).unwrap();
    assert_eq!(again, serde_json::from_str::<Value>(json).unwrap());
}

#[test]
fn extension_only_items_still_check_their_siblings() {
    let err = record_from_json(
        r#"{
            "resourceType": "Appointment",
            "status": "booked",
            "requestedPeriod": [null]
        }"#,
        &registry(),
    )
    .unwrap_err();
    assert_eq!(err.path(), Some("Appointment.requestedPeriod[0]"));

    let err = record_from_json(
        r#"{
            "resourceType": "DeviceRequest",
            "instantiatesUri": [null, 42],
            "_instantiatesUri": [{"id": "u1"}, null]
        }"#,
        &registry(),
    )
    .unwrap_err();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
    assert_eq!(err.path(), Some("DeviceRequest.instantiatesUri[1]"));
}

#[test]
fn multi_line_text_survives_the_tree_codec() {
    let registry = registry();
    let record = appointment().with("description", "line1\nline2\tend\r\nlast");

    let xml = record_to_xml(&record, &registry).unwrap();
    let back = record_from_xml(&xml, &registry).unwrap();
    assert_eq!(back, record);
    assert_eq!(
        back.get("description").and_then(FieldValue::as_str),
        Some("line1\nline2\tend\r\nlast")
    );
}

#[test]
fn unknown_content_is_not_structural() {
    let registry = registry();
    let plain = record_from_xml(
        r#"<Appointment><status value="booked"/></Appointment>"#,
        &registry,
    )
    .unwrap();
    let extra = record_from_xml(
        r#"<Appointment><status value="booked"/><flavour value="mild"/></Appointment>"#,
        &registry,
    )
    .unwrap();
    assert_ne!(plain, extra);
    assert!(structural_eq(&plain, &extra));
}

#[test]
fn references_keep_unknown_members() {
    let registry = registry();
    let record = record_from_json(
        r#"{
            "resourceType": "Communication",
            "subject": {
                "reference": "Patient/example",
                "identifier": {"value": "MRN-12345"}
            }
        }"#,
        &registry,
    )
    .unwrap();
    let subject = record.get("subject").and_then(FieldValue::as_reference).unwrap();
    assert_eq!(subject.unknown.get("identifier"), Some(&json!({"value": "MRN-12345"})));

    let again = record_from_xml(&record_to_xml(&record, &registry).unwrap(), &registry).unwrap();
    assert_eq!(again, record);
}

// ============================================================================
// Properties
// ============================================================================

/// Characters XML 1.0 can represent at all
fn xml_safe(text: &str) -> bool {
    text.chars().all(|c| {
        matches!(
            c,
            '\t' | '\n' | '\r'
                | '\u{20}'..='\u{D7FF}'
                | '\u{E000}'..='\u{FFFD}'
                | '\u{10000}'..='\u{10FFFF}'
        )
    })
}

#[test]
fn property_records_survive_every_codec() {
    fn prop(description: String, minutes: i64, urgent: bool) -> TestResult {
        if !xml_safe(&description) {
            return TestResult::discard();
        }
        let registry = registry();
        let mut record = appointment()
            .with("description", description)
            .with("minutesDuration", minutes);
        if urgent {
            record.insert_unknown("urgency", json!({"level": "high"}));
        }

        let via_xml = record_to_xml(&record, &registry)
            .ok()
            .and_then(|xml| record_from_xml(&xml, &registry).ok());
        let via_json = record_to_json(&record, &registry)
            .ok()
            .and_then(|json| record_from_json(&json, &registry).ok());
        let via_tagged = encode_tagged(&record, &registry)
            .ok()
            .and_then(|object| decode_tagged(&object, &registry).ok());

        TestResult::from_bool(
            via_xml.as_ref() == Some(&record)
                && via_json.as_ref() == Some(&record)
                && via_tagged.as_ref() == Some(&record),
        )
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(String, i64, bool) -> TestResult);
}

#[test]
fn tagged_values_are_host_native() {
    let record = record_from_xml(
        r#"<Appointment>
             <start value="2013-12-10T09:00:00Z"/>
             <minutesDuration value="30"/>
           </Appointment>"#,
        &registry(),
    )
    .unwrap();
    let object = encode_tagged(&record, &registry()).unwrap();

    assert_eq!(object.type_tag.as_deref(), Some("Appointment"));
    assert_eq!(object.get("minutesDuration"), Some(&TaggedValue::Integer(30)));
    assert!(matches!(object.get("start"), Some(TaggedValue::DateTime(_))));
}
