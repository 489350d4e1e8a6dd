//! Property-based tests for the field writer.
//!
//! ## Test Categories
//!
//! ### 1. Duration rules
//! - `finalize_duration` always yields a duration its classification accepts
//! - Valid requests pass through untouched
//!
//! ### 2. Timestamp encoding
//! - `(end - start) / 1000` equals the ring time for every anchor and ring
//!
//! ### 3. Sanitizer
//! - Range guarantees per field kind
//! - Sanitizing is idempotent, so accepted values read back unchanged
//!
//! ### 4. Writer
//! - Invalid field names are never submitted
//! - Repeating a write against a stateless store changes nothing

use calllog_fields::core::{
    finalize_duration, validate_duration, AttributeMap, CallClassification, FieldValue,
};
use calllog_fields::registry::{LogicalAttribute, TimestampFields};
use calllog_fields::sanitizer::{is_valid_field_name, ValueSanitizer};
use calllog_fields::store::InMemoryRecordStore;
use calllog_fields::timestamp::derive_ring_timestamps;
use calllog_fields::writer::{FallbackWriter, WriteMode};
use proptest::prelude::*;

fn classification() -> impl Strategy<Value = CallClassification> {
    prop::sample::select(CallClassification::ALL.to_vec())
}

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<i64>().prop_map(FieldValue::Integer),
        ".{0,300}".prop_map(FieldValue::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(FieldValue::Bytes),
    ]
}

fn field_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "type",
        "duration",
        "ring_duration",
        "ring_time",
        "ring_times",
        "missed_reason",
        "record_duration",
        "data1",
        "subscription_component_name",
        "reason",
    ])
    .prop_map(str::to_string)
}

proptest! {
    #[test]
    fn test_finalize_duration_always_valid(c in classification(), requested in any::<i64>()) {
        let decision = finalize_duration(c, requested);
        prop_assert!(validate_duration(c, decision.value));
        prop_assert_eq!(decision.substituted, !validate_duration(c, requested));
        if !decision.substituted {
            prop_assert_eq!(decision.value, requested);
        }
    }

    #[test]
    fn test_timestamp_delta_encodes_ring(
        ring in 0..=(i64::MAX / 1000),
        anchor in prop::option::of(any::<i64>()),
        now in any::<i64>(),
    ) {
        let mut draft = AttributeMap::new();
        if let Some(anchor) = anchor {
            draft.put("date", anchor);
        }
        let fields = TimestampFields::date_last_modified();
        let derived = derive_ring_timestamps(&mut draft, &fields, ring, now).unwrap();
        let start = draft.get_i64("date").unwrap();
        let end = draft.get_i64("last_modified").unwrap();
        prop_assert_eq!(start, derived.start);
        prop_assert_eq!(end, derived.end);
        prop_assert_eq!((end - start) / 1000, ring);
        if let Some(anchor) = anchor {
            if anchor.checked_add(ring * 1000).is_some() {
                prop_assert_eq!(start, anchor);
            }
        }
    }

    #[test]
    fn test_sanitizer_ranges(field in field_name(), value in field_value()) {
        let sanitizer = ValueSanitizer::new();
        let Ok(clean) = sanitizer.sanitize(&field, &value) else {
            // Only the literal "null" is refused.
            prop_assert!(value.as_str().is_some_and(|s| s.eq_ignore_ascii_case("null")));
            return Ok(());
        };
        match field.as_str() {
            "type" => prop_assert!((1..=6).contains(&clean.as_i64().unwrap())),
            "duration" | "ring_duration" | "ring_time" | "record_duration" => {
                prop_assert!(clean.as_i64().unwrap() >= 0)
            }
            "ring_times" => prop_assert!(clean.as_i64().unwrap() >= 1),
            "missed_reason" => prop_assert!((0..=10).contains(&clean.as_i64().unwrap())),
            _ => match &clean {
                FieldValue::Integer(v) => prop_assert!(v.abs() <= 1_000_000),
                FieldValue::Text(t) => prop_assert!(t.encode_utf16().count() <= 255),
                _ => prop_assert_eq!(&clean, &value),
            },
        }
    }

    #[test]
    fn test_sanitizer_idempotent(field in field_name(), value in field_value()) {
        let sanitizer = ValueSanitizer::new();
        if let Ok(clean) = sanitizer.sanitize(&field, &value) {
            prop_assert_eq!(sanitizer.sanitize(&field, &clean).unwrap(), clean);
        }
    }

    #[test]
    fn test_whitespace_names_invalid(
        prefix in "[a-z_]{0,6}",
        ws in "[ \t\n]",
        suffix in "[a-z_]{0,6}",
    ) {
        let name = format!("{prefix}{ws}{suffix}");
        prop_assert!(!is_valid_field_name(&name));
    }

    #[test]
    fn test_writer_repeat_is_stable(
        rejected in prop::collection::vec(any::<bool>(), 4),
        partial in any::<bool>(),
        defensive in any::<bool>(),
        ring in 0i64..600,
    ) {
        let candidates = ["c0", "c1", "c2", "c3"];
        let store = candidates
            .iter()
            .zip(&rejected)
            .filter(|(_, r)| **r)
            .fold(
                InMemoryRecordStore::new("prop").with_columns(candidates),
                |store, (field, _)| store.reject_field(*field, partial),
            );
        let mode = if defensive {
            WriteMode::DefensiveAll
        } else {
            WriteMode::StopAtFirstSuccess
        };
        let writer = FallbackWriter::new();
        let write = |draft: &mut AttributeMap| {
            writer
                .write_value(
                    &store,
                    draft,
                    LogicalAttribute::RingDuration,
                    &candidates,
                    mode,
                    FieldValue::Integer(ring),
                )
                .unwrap()
        };

        let mut draft = AttributeMap::new();
        let first = write(&mut draft);
        let snapshot = draft.clone();
        let second = write(&mut draft);

        prop_assert_eq!(&draft, &snapshot);
        prop_assert_eq!(first.succeeded(), second.succeeded());
        for field in first.failed() {
            prop_assert!(!draft.contains(field));
        }
    }
}
