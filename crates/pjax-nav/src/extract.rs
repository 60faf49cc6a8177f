//! Locating the replaceable content region.
//!
//! Lookup order: element with the content id, first match of the
//! content selector, first `main` element. Fetched documents fall back
//! to `body`; the live document gets a synthesized container instead.

use pjax_html::{Document, NodeId, Selector};
use pjax_types::config::PjaxConfig;

/// Run the three-tier lookup against `doc`.
pub fn resolve_content_container(doc: &Document, config: &PjaxConfig) -> Option<NodeId> {
    if let Some(id) = config.content_id()
        && let Some(node) = doc.get_element_by_id(id)
    {
        return Some(node);
    }
    if let Some(selector) = Selector::parse(&config.content_selector)
        && let Some(node) = doc.query_selector(doc.root, &selector)
    {
        return Some(node);
    }
    doc.first_by_tag(&config.main_tag)
}

/// Resolve the container of the live document, synthesizing one when
/// the markup has none.
///
/// The synthesized element is a `main_tag` element carrying the
/// content id. When both the navigation bar and the footer exist, the
/// nodes between them move into it (order kept) and it is placed right
/// after the navigation bar. Otherwise it is appended to `body`.
pub fn ensure_content_container(doc: &mut Document, config: &PjaxConfig) -> NodeId {
    if let Some(existing) = resolve_content_container(doc, config) {
        return existing;
    }

    let container = doc.create_element(&config.main_tag);
    if let Some(id) = config.content_id() {
        doc.set_attribute(container, "id", id);
    }

    let nav = doc.first_by_tag(&config.navigation_bar_tag);
    let footer = doc.first_by_tag(&config.footer_tag);
    match (nav, footer) {
        (Some(nav), Some(footer)) => {
            let to_move = siblings_between(doc, nav, footer);
            log::debug!(
                "Synthesizing content container from {} node(s) between <{}> and <{}>",
                to_move.len(),
                config.navigation_bar_tag,
                config.footer_tag
            );
            for node in to_move {
                doc.append_child(container, node);
            }
            doc.insert_after(nav, container);
        },
        _ => {
            log::debug!("Synthesizing empty content container");
            let parent = doc.body().or_else(|| doc.html_element()).unwrap_or(doc.root);
            doc.append_child(parent, container);
        },
    }
    container
}

/// The node whose children become the new content: the container of
/// the fetched document, else its `body`.
pub fn extract_fragment(doc: &Document, config: &PjaxConfig) -> NodeId {
    resolve_content_container(doc, config)
        .or_else(|| doc.body())
        .unwrap_or(doc.root)
}

/// Following siblings of `start`, stopping at `end` or the last child.
fn siblings_between(doc: &Document, start: NodeId, end: NodeId) -> Vec<NodeId> {
    let Some(parent) = doc.parent(start) else {
        return Vec::new();
    };
    doc.children(parent)
        .iter()
        .copied()
        .skip_while(|&n| n != start)
        .skip(1)
        .take_while(|&n| n != end)
        .collect()
}
