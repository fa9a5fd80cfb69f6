//! Integration test for the canonical expression string (parse → serialize → parse).
//!
//! This test verifies that:
//! 1. Every stored expression survives a trip through the segment buffer
//! 2. Normalization is idempotent
//! 3. The validator gives the stored verdict, before and after the trip

use glob::glob;
use pretty_assertions::assert_eq;
use pricing_logic::formula::{normalize, validate_builtin};
use pricing_logic::{Buffer, Segment};
use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
struct Case {
    expression: String,
    error: Option<String>,
}

fn load_cases() -> Vec<Case> {
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/*.json");
    let mut cases = Vec::new();
    for path in glob(pattern).expect("valid glob pattern").flatten() {
        let json = fs::read_to_string(&path).unwrap();
        let mut found: Vec<Case> = serde_json::from_str(&json)
            .unwrap_or_else(|e| panic!("bad fixture {}: {}", path.display(), e));
        cases.append(&mut found);
    }
    assert!(!cases.is_empty(), "no fixtures under {}", pattern);
    cases
}

#[test]
fn test_roundtrip_law() {
    for case in load_cases() {
        let buffer = Buffer::parse(&case.expression);
        let serialized = buffer.serialize();
        assert_eq!(serialized, case.expression);
        assert_eq!(Buffer::parse(&serialized), buffer);
    }
}

#[test]
fn test_validator_verdicts() {
    for case in load_cases() {
        let verdict = validate_builtin(&case.expression).err().map(|e| e.to_string());
        assert_eq!(verdict, case.error, "for {:?}", case.expression);
        assert_eq!(
            validate_builtin(&Buffer::parse(&case.expression).serialize()).is_ok(),
            case.error.is_none()
        );
    }
}

#[test]
fn test_normalize_idempotent_on_parsed_buffers() {
    for case in load_cases() {
        let segments = Buffer::parse(&case.expression).segments().to_vec();
        assert_eq!(normalize(segments.clone()), segments);
    }
}

#[test]
fn test_normalize_arbitrary_sequences() {
    let inputs: Vec<Vec<Segment>> = vec![
        vec![],
        vec![Segment::reference("a")],
        vec![Segment::text("x"), Segment::text(""), Segment::text("y")],
        vec![
            Segment::reference("a"),
            Segment::reference("b"),
            Segment::text("+"),
            Segment::reference("c"),
        ],
    ];
    for input in inputs {
        let once = normalize(input);
        assert_eq!(normalize(once.clone()), once);
        assert!(once.first().is_some_and(Segment::is_text));
        assert!(once.last().is_some_and(Segment::is_text));
    }
}
