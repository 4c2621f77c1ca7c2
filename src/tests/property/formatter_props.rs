//! Property-based tests for the formatter
//!
//! Tests invariants:
//! - Escaped text never contains raw markup characters
//! - Bookshelf anchors follow the order of the books
//! - Patching a known key never adds nodes

use proptest::prelude::*;

use crate::core::generation::formatter::{escape, format, PatchPlacement};
use crate::core::generation::output::{Book, Bookshelf, FlowOutput};

fn arb_books() -> impl Strategy<Value = Vec<Book>> {
    prop::collection::hash_set("[A-Za-z<>&' ]{1,20}", 1..6).prop_map(|titles| {
        titles
            .into_iter()
            .map(|title| Book {
                description: format!("About {}", title),
                title,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn escape_removes_markup_characters(text in ".{0,100}") {
        let escaped = escape(&text);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
    }

    #[test]
    fn bookshelf_anchors_follow_book_order(books in arb_books()) {
        let rendered = format(&FlowOutput::Bookshelf(Bookshelf { books: books.clone() }));
        let keys: Vec<&str> = rendered.anchors().iter().map(|a| a.entity_key.as_str()).collect();
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
        prop_assert_eq!(keys, titles);
    }

    #[test]
    fn patching_known_key_keeps_node_count(books in arb_books(), pick in any::<prop::sample::Index>()) {
        let mut rendered = format(&FlowOutput::Bookshelf(Bookshelf { books: books.clone() }));
        let before = rendered.nodes.len();
        let key = &books[pick.index(books.len())].title;

        let placement = rendered.patch(key, "<p>passage</p>".to_string());
        prop_assert_eq!(placement, PatchPlacement::InPlace);
        prop_assert_eq!(rendered.nodes.len(), before);
        prop_assert_eq!(
            rendered.fragment(key).and_then(|f| f.patch.as_deref()),
            Some("<p>passage</p>")
        );
    }
}
