//! Property-based invariant tests for the selector engine.
//!
//! 1. Parsing never panics; errors point inside the input
//! 2. A tour attribute selector keeps its source text and value
//! 3. It matches exactly the element carrying that value
//! 4. Prefix selectors match every element whose value starts with the prefix

use proptest::prelude::*;
use tourkit_core::geometry::ViewportSize;
use tourkit_dom::{Document, MemoryDocument, NodeSpec, Selector};

fn slug() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(-[a-z0-9]{1,8}){0,3}"
}

proptest! {
    #[test]
    fn parse_never_panics(input in "\\PC{0,40}") {
        if let Err(err) = Selector::parse(&input) {
            prop_assert!(err.position <= input.len());
            prop_assert_eq!(err.input, input);
        }
    }

    #[test]
    fn selector_shaped_noise_never_panics(input in "[\\[\\]=\"'#.:>, a-z*^$~()-]{0,32}") {
        let _ = Selector::parse(&input);
    }

    #[test]
    fn tour_selector_keeps_source_and_value(value in slug()) {
        let source = format!("[data-tour=\"{value}\"]");
        let selector = Selector::parse(&source).unwrap();
        prop_assert_eq!(selector.as_str(), source.as_str());
        prop_assert_eq!(selector.attribute_value(Some("data-tour")), Some(value.as_str()));
    }

    #[test]
    fn tour_selector_matches_only_its_element(value in slug(), other in slug()) {
        prop_assume!(value != other);
        let mut doc = MemoryDocument::new(ViewportSize::new(1024.0, 768.0));
        let body = doc.body();
        let decoy = doc.append(body, NodeSpec::new("div").tour(&other));
        let wanted = doc.append(body, NodeSpec::new("section").tour(&value));

        let selector = Selector::parse(&format!("[data-tour=\"{value}\"]")).unwrap();
        prop_assert_eq!(doc.query_selector_all(&selector), vec![wanted]);
        prop_assert!(!selector.matches(&doc, decoy));
    }

    #[test]
    fn prefix_selector_matches_by_prefix(value in slug(), cut in 1usize..8) {
        let prefix: String = value.chars().take(cut).collect();
        let mut doc = MemoryDocument::new(ViewportSize::new(1024.0, 768.0));
        let body = doc.body();
        let node = doc.append(body, NodeSpec::new("div").tour(&value));

        let selector = Selector::parse(&format!("[data-tour^=\"{prefix}\"]")).unwrap();
        prop_assert!(selector.matches(&doc, node));
    }
}
