//! Property-based tests for block options
//!
//! Tests invariants:
//! - Custom text resolves to its trimmed form
//! - Whitespace-only custom text is a violation naming the option
//! - Choice options accept exactly their listed values

use indexmap::IndexMap;
use proptest::prelude::*;

use crate::core::generation::contracts::ViolationKind;
use crate::core::generation::options::{resolve_options, BlockError, BlockOption, OptionValue};

const CONTAINERS: &[&str] = &["Pocket", "Backpack", "Chest", "Barrel"];

// ============================================================================
// Strategies
// ============================================================================

fn container() -> BlockOption {
    BlockOption::choice("container", "Container", CONTAINERS, "Chest").allowing_custom()
}

/// Custom text with something other than whitespace in it
fn arb_custom_text() -> impl Strategy<Value = String> {
    ("[ \t]{0,4}", "[a-zA-Z][a-zA-Z ,'-]{0,30}", "[ \t\n]{0,4}")
        .prop_map(|(lead, body, trail)| format!("{}{}{}", lead, body, trail))
}

fn arb_whitespace() -> impl Strategy<Value = String> {
    "[ \t\n]{0,8}"
}

fn arb_listed_value() -> impl Strategy<Value = String> {
    prop::sample::select(CONTAINERS).prop_map(|v| v.to_string())
}

fn arb_unlisted_value() -> impl Strategy<Value = String> {
    "[a-z]{1,12}".prop_filter("listed", |v| !CONTAINERS.contains(&v.as_str()))
}

proptest! {
    #[test]
    fn custom_text_resolves_trimmed(text in arb_custom_text()) {
        let resolved = container().resolve(&OptionValue::custom(text.clone())).unwrap();
        prop_assert_eq!(resolved, text.trim());
    }

    #[test]
    fn whitespace_custom_text_is_rejected(text in arb_whitespace()) {
        let err = container().resolve(&OptionValue::custom(text)).unwrap_err();
        prop_assert_eq!(err.field, "container");
        prop_assert_eq!(err.kind, ViolationKind::EmptyCustomValue);
    }

    #[test]
    fn listed_values_are_accepted(value in arb_listed_value()) {
        let option = container();
        prop_assert!(option.accepts(&OptionValue::fixed(value.clone())).is_ok());
        prop_assert_eq!(option.resolve(&OptionValue::fixed(value.clone())).unwrap(), value);
    }

    #[test]
    fn unlisted_values_are_rejected(value in arb_unlisted_value()) {
        let result = container().accepts(&OptionValue::fixed(value.clone()));
        prop_assert_eq!(
            result,
            Err(BlockError::NotAllowed { option: "container".to_string(), value })
        );
    }

    #[test]
    fn resolved_options_keep_declaration_order(text in arb_custom_text()) {
        let options = vec![
            BlockOption::text("theme", "Theme"),
            container(),
            BlockOption::choice("size", "Size", &["Small", "Large"], "Small"),
        ];
        let mut values = IndexMap::new();
        values.insert("container".to_string(), OptionValue::custom(text));

        let resolved = resolve_options(&options, &values).unwrap();
        let ids: Vec<&str> = resolved.keys().map(String::as_str).collect();
        prop_assert_eq!(ids, vec!["theme", "container", "size"]);
        prop_assert_eq!(resolved["size"].as_str(), "Small");
    }
}
