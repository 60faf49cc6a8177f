//! HTML parsing and a mutable arena DOM.
//!
//! The navigator parses every fetched page with [`parse_document`],
//! locates the content region with [`selector::Selector`] queries and
//! copies the region's children into the live document with
//! [`Document::import_node`].

pub mod dom;
pub mod entities;
pub mod selector;
pub mod serialize;
pub mod tokenizer;
pub mod tree_builder;

pub use dom::{Attribute, Document, ElementData, Node, NodeId, NodeKind};
pub use selector::Selector;

use tokenizer::Tokenizer;
use tree_builder::TreeBuilder;

/// Parse a full HTML document. The result always contains `html`,
/// `head` and `body` elements.
pub fn parse_document(source: &str) -> Document {
    let tokens = Tokenizer::new(source).tokenize();
    TreeBuilder::build(tokens)
}

/// Parse markup as body content. The parsed nodes are the children of
/// the returned document's `body`.
pub fn parse_fragment(source: &str) -> Document {
    let tokens = Tokenizer::new(source).tokenize();
    TreeBuilder::build_fragment(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fragment_round_trips_through_inner_html() {
        let markup = "<section class=\"intro\"><h1>首頁</h1><p>Hi &amp; bye</p></section>";
        let doc = parse_fragment(markup);
        assert_eq!(doc.inner_html(doc.body().unwrap()), markup);
    }

    proptest! {
        #[test]
        fn parse_never_panics_and_has_body(input in ".{0,200}") {
            let doc = parse_document(&input);
            prop_assert!(doc.body().is_some());
            prop_assert!(doc.head().is_some());
        }

        #[test]
        fn tag_soup_never_panics(parts in proptest::collection::vec(
            prop_oneof![
                Just("<p>"), Just("</p>"), Just("<li>"), Just("<ul>"), Just("</ul>"),
                Just("<div id=content>"), Just("</div>"), Just("<script>"), Just("</script>"),
                Just("<!--"), Just("-->"), Just("text"), Just("&amp;"), Just("<"), Just(">"),
            ],
            0..40,
        )) {
            let input: String = parts.concat();
            let doc = parse_document(&input);
            let body = doc.body().unwrap();
            // Every reachable node points back at its parent.
            for node in doc.descendants(body) {
                let parent = doc.parent(node).unwrap();
                prop_assert!(doc.children(parent).contains(&node));
            }
        }
    }
}
