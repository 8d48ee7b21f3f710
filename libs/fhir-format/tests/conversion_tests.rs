use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tessera_format::{
    decode_tagged, decode_tree, encode_tagged, encode_tree, parse_xml, record_from_json,
    record_from_xml, record_to_json, record_to_xml,
};
use tessera_models::structural_eq;
use tessera_schema::SchemaRegistry;

fn registry() -> SchemaRegistry {
    SchemaRegistry::builtin().expect("builtin schemas load")
}

/// Helper to normalize JSON for comparison (ignoring formatting/whitespace differences)
fn normalize_json(json_str: &str) -> Value {
    serde_json::from_str(json_str).expect("Failed to parse JSON")
}

/// Helper to get test data directory
fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

/// Discover all test file base names that have both a `.json` and an `.xml` form
fn discover_test_cases() -> Vec<String> {
    let data_dir = test_data_dir();
    let mut test_cases = std::collections::HashSet::new();

    if let Ok(entries) = fs::read_dir(&data_dir) {
        for entry in entries.flatten() {
            if let Some(file_name) = entry.file_name().to_str() {
                if let Some(stem) = file_name.strip_suffix(".json") {
                    if data_dir.join(format!("{}.xml", stem)).exists() {
                        test_cases.insert(stem.to_string());
                    }
                }
            }
        }
    }

    let mut cases: Vec<_> = test_cases.into_iter().collect();
    cases.sort();
    cases
}

/// Helper to load test files
fn load_test_files(base_name: &str) -> (String, String) {
    let json_path = test_data_dir().join(format!("{}.json", base_name));
    let xml_path = test_data_dir().join(format!("{}.xml", base_name));

    let json = fs::read_to_string(&json_path)
        .unwrap_or_else(|_| panic!("Failed to read {}", json_path.display()));
    let xml = fs::read_to_string(&xml_path)
        .unwrap_or_else(|_| panic!("Failed to read {}", xml_path.display()));

    (json, xml)
}

// ============================================================================
// Test Discovery and File Validation
// ============================================================================

#[test]
fn test_data_files_exist() {
    let test_cases = discover_test_cases();
    assert!(
        test_cases.len() >= 3,
        "Expected fixture pairs in {}, found {:?}",
        test_data_dir().display(),
        test_cases
    );

    for base_name in &test_cases {
        let (json, xml) = load_test_files(base_name);
        normalize_json(&json);
        parse_xml(&xml).unwrap_or_else(|e| panic!("{}.xml is not well-formed: {}", base_name, e));
    }
}

// ============================================================================
// Both Forms Decode to the Same Record
// ============================================================================

#[test]
fn test_xml_and_json_decode_to_the_same_record() {
    let registry = registry();
    for base_name in discover_test_cases() {
        let (json, xml) = load_test_files(&base_name);

        let from_xml = record_from_xml(&xml, &registry)
            .unwrap_or_else(|e| panic!("{}: XML decode failed: {}", base_name, e));
        let from_json = record_from_json(&json, &registry)
            .unwrap_or_else(|e| panic!("{}: JSON decode failed: {}", base_name, e));

        assert_eq!(from_xml, from_json, "{}: decoded records differ", base_name);
        assert!(structural_eq(&from_xml, &from_json));
    }
}

// ============================================================================
// XML -> JSON
// ============================================================================

#[test]
fn test_xml_to_json_conversion() {
    let registry = registry();
    for base_name in discover_test_cases() {
        let (expected_json, xml) = load_test_files(&base_name);

        let record = record_from_xml(&xml, &registry).unwrap();
        let json = record_to_json(&record, &registry).unwrap();

        assert_eq!(
            normalize_json(&json),
            normalize_json(&expected_json),
            "{}: XML -> JSON output differs from the fixture",
            base_name
        );
    }
}

// ============================================================================
// JSON -> XML
// ============================================================================

#[test]
fn test_json_to_xml_conversion() {
    let registry = registry();
    for base_name in discover_test_cases() {
        let (json, expected_xml) = load_test_files(&base_name);

        let record = record_from_json(&json, &registry).unwrap();
        let xml = record_to_xml(&record, &registry).unwrap();

        assert_eq!(
            parse_xml(&xml).unwrap(),
            parse_xml(&expected_xml).unwrap(),
            "{}: JSON -> XML output differs from the fixture:\n{}",
            base_name,
            xml
        );
    }
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_xml_round_trip() {
    let registry = registry();
    for base_name in discover_test_cases() {
        let (_, xml) = load_test_files(&base_name);
        let document = parse_xml(&xml).unwrap();

        let record = decode_tree(&document, &registry).unwrap();
        assert_eq!(
            encode_tree(&record, &registry).unwrap(),
            document,
            "{}: XML round trip changed the document",
            base_name
        );
    }
}

#[test]
fn test_json_round_trip() {
    let registry = registry();
    for base_name in discover_test_cases() {
        let (json, _) = load_test_files(&base_name);

        let record = record_from_json(&json, &registry).unwrap();
        let again = record_from_json(&record_to_json(&record, &registry).unwrap(), &registry).unwrap();
        assert_eq!(record, again, "{}: JSON round trip changed the record", base_name);
    }
}

#[test]
fn test_tree_through_tagged_reproduces_the_tree() {
    let registry = registry();
    for base_name in discover_test_cases() {
        let (_, xml) = load_test_files(&base_name);
        let document = parse_xml(&xml).unwrap();

        let record = decode_tree(&document, &registry).unwrap();
        let tagged = encode_tagged(&record, &registry).unwrap();
        let back = decode_tagged(&tagged, &registry).unwrap();

        assert_eq!(back, record, "{}", base_name);
        assert_eq!(encode_tree(&back, &registry).unwrap(), document, "{}", base_name);
    }
}
