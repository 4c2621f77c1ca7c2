//! Property-based tests for structural contracts
//!
//! Tests invariants:
//! - Validating a normalized value returns it unchanged
//! - Keys outside the schema never survive validation
//! - Array length bounds are enforced exactly
//! - Number ranges are enforced exactly

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use crate::core::generation::contracts::{FieldSchema, FieldType, ObjectSchema, ViolationKind};

// ============================================================================
// Strategies
// ============================================================================

fn npc_schema() -> ObjectSchema {
    ObjectSchema::new(vec![
        FieldSchema::required("name", FieldType::String, "Name"),
        FieldSchema::optional("mood", FieldType::one_of(&["calm", "angry"]), "Mood")
            .with_default(json!("calm")),
        FieldSchema::required(
            "mannerisms",
            FieldType::list_between(FieldType::String, 3, 5),
            "Mannerisms",
        ),
    ])
}

fn arb_items(range: std::ops::Range<usize>) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z ]{1,20}", range)
}

fn arb_extra_keys() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("x[a-z]{1,8}", "[a-z]{0,8}", 0..4).prop_map(|m| {
        m.into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    })
}

proptest! {
    #[test]
    fn validation_is_idempotent(name in "[A-Z][a-z]{1,10}", items in arb_items(3..6)) {
        let schema = npc_schema();
        let first = schema.validate(&json!({ "name": name, "mannerisms": items })).unwrap();
        let second = schema.validate(&first).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unknown_keys_are_stripped(extra in arb_extra_keys(), items in arb_items(3..6)) {
        let mut input = extra.clone();
        input.insert("name".to_string(), json!("Ilsa"));
        input.insert("mannerisms".to_string(), json!(items));

        let normalized = npc_schema().validate(&Value::Object(input)).unwrap();
        let object = normalized.as_object().unwrap();
        for key in extra.keys() {
            prop_assert!(!object.contains_key(key));
        }
        prop_assert_eq!(object.len(), 3);
    }

    #[test]
    fn list_bounds_are_exact(items in arb_items(0..9)) {
        let len = items.len();
        let result = npc_schema().validate(&json!({ "name": "Brom", "mannerisms": items }));
        if (3..=5).contains(&len) {
            prop_assert!(result.is_ok());
        } else {
            let err = result.unwrap_err();
            prop_assert_eq!(err.field, "mannerisms");
            let is_length = matches!(err.kind, ViolationKind::Length { found, .. } if found == len);
            prop_assert!(is_length);
        }
    }

    #[test]
    fn number_range_is_exact(n in -10i64..20) {
        let schema = ObjectSchema::new(vec![FieldSchema::required(
            "numSecrets",
            FieldType::number_between(3.0, 5.0),
            "How many",
        )]);
        let result = schema.validate(&json!({ "numSecrets": n }));
        prop_assert_eq!(result.is_ok(), (3..=5).contains(&n));
    }
}
