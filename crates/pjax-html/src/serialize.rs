//! DOM to markup serialization.

use crate::dom::{Document, NodeId, NodeKind, is_raw_text_tag, is_void_tag};

/// Serialize the children of `id`.
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = doc.tag(id).is_some_and(is_raw_text_tag);
    for &child in doc.children(id) {
        write_node(doc, child, raw, &mut out);
    }
    out
}

/// Serialize `id` and its subtree.
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let raw = doc
        .parent(id)
        .and_then(|p| doc.tag(p))
        .is_some_and(is_raw_text_tag);
    let mut out = String::new();
    write_node(doc, id, raw, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, raw_parent: bool, out: &mut String) {
    match &doc.get(id).kind {
        NodeKind::Document => {
            for &child in doc.children(id) {
                write_node(doc, child, false, out);
            }
        },
        NodeKind::Text(text) if raw_parent => out.push_str(text),
        NodeKind::Text(text) => push_escaped(out, text, false),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        },
        NodeKind::Element(elem) => {
            out.push('<');
            out.push_str(&elem.tag);
            for attr in &elem.attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                push_escaped(out, &attr.value, true);
                out.push('"');
            }
            out.push('>');
            if is_void_tag(&elem.tag) {
                return;
            }
            let raw = is_raw_text_tag(&elem.tag);
            for &child in doc.children(id) {
                write_node(doc, child, raw, out);
            }
            out.push_str("</");
            out.push_str(&elem.tag);
            out.push('>');
        },
    }
}

/// Escape text for HTML output. Attribute values additionally escape
/// double quotes.
fn push_escaped(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
