//! HTML tree builder.
//!
//! Consumes a token stream and constructs an arena-based DOM tree.
//! Implements the parts of the WHATWG tree construction rules that
//! matter for page-fragment swapping: implicit `html`/`head`/`body`,
//! head-only content routed into `head`, void elements, implied end
//! tags for `p`, `li`, `dd`/`dt` and `option`, and tolerant end-tag
//! matching. The resulting document always has `html`, `head` and
//! `body` elements.

use crate::dom::{Attribute, Document, ElementData, NodeId, NodeKind, is_void_tag};
use crate::tokenizer::{StartTagToken, Token};

/// Elements that belong in `<head>` when seen before `<body>`.
fn is_head_content(tag: &str) -> bool {
    matches!(
        tag,
        "base" | "link" | "meta" | "noscript" | "script" | "style" | "template" | "title"
    )
}

/// Elements whose start tag closes an open `<p>`.
fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "ul"
    )
}

/// Elements that bound the search for an element "in scope".
fn is_scope_boundary(tag: &str) -> bool {
    matches!(
        tag,
        "html" | "body" | "table" | "td" | "th" | "caption" | "button" | "template"
    )
}

/// Builds a DOM tree from a token stream.
pub struct TreeBuilder {
    doc: Document,
    /// Stack of open element node IDs.
    open_elements: Vec<NodeId>,
    html: Option<NodeId>,
    head: Option<NodeId>,
    body: Option<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            open_elements: Vec::new(),
            html: None,
            head: None,
            body: None,
        }
    }

    /// Build a full document from a token stream.
    pub fn build(tokens: Vec<Token>) -> Document {
        let mut builder = Self::new();
        for token in tokens {
            builder.process_token(token);
        }
        builder.finish()
    }

    /// Build a document whose `<body>` holds the parsed nodes, treating
    /// the input as body content (head-only tags stay in place).
    pub fn build_fragment(tokens: Vec<Token>) -> Document {
        let mut builder = Self::new();
        builder.ensure_body();
        for token in tokens {
            builder.process_token(token);
        }
        builder.finish()
    }

    fn finish(mut self) -> Document {
        self.ensure_body();
        self.doc
    }

    fn process_token(&mut self, token: Token) {
        match token {
            Token::Doctype(_) | Token::Eof => {},
            Token::Comment(text) => {
                let id = self.doc.add_node(NodeKind::Comment(text));
                let parent = self.current_node();
                self.doc.append_child(parent, id);
            },
            Token::Character(text) => self.insert_text(&text),
            Token::StartTag(tag) => self.start_tag(tag),
            Token::EndTag(name) => self.end_tag(&name),
        }
    }

    // =============================================================
    // Token handlers
    // =============================================================

    fn insert_text(&mut self, text: &str) {
        if self.body.is_none() {
            let in_head_element = self
                .open_elements
                .last()
                .is_some_and(|&top| Some(top) != self.html && Some(top) != self.head);
            if !in_head_element {
                if text.chars().all(|c| c.is_ascii_whitespace()) {
                    return;
                }
                self.ensure_body();
            }
        }
        let parent = self.current_node();
        if let Some(&last) = self.doc.children(parent).last()
            && let NodeKind::Text(existing) = &mut self.doc.get_mut(last).kind
        {
            existing.push_str(text);
            return;
        }
        let id = self.doc.create_text(text);
        self.doc.append_child(parent, id);
    }

    fn start_tag(&mut self, tag: StartTagToken) {
        match tag.name.as_str() {
            "html" => {
                let html = self.ensure_html();
                self.merge_attributes(html, tag.attributes);
            },
            "head" => {
                if self.body.is_none() {
                    let head = self.ensure_head();
                    if self.open_elements.last() != Some(&head) {
                        self.open_elements.push(head);
                    }
                }
            },
            "body" => {
                let body = self.ensure_body();
                self.merge_attributes(body, tag.attributes);
            },
            name if self.body.is_none() && is_head_content(name) => {
                let head = self.ensure_head();
                self.insert_element(head, tag);
            },
            name => {
                self.ensure_body();
                self.close_implied(name);
                let parent = self.current_node();
                self.insert_element(parent, tag);
            },
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "html" | "body" => {},
            "head" => {
                if let Some(head) = self.head
                    && let Some(pos) = self.open_elements.iter().rposition(|&n| n == head)
                {
                    self.open_elements.truncate(pos);
                }
            },
            _ => {
                let found = self
                    .open_elements
                    .iter()
                    .rposition(|&n| self.doc.tag(n) == Some(name));
                if let Some(pos) = found {
                    self.open_elements.truncate(pos);
                }
            },
        }
    }

    // =============================================================
    // Helpers
    // =============================================================

    fn current_node(&self) -> NodeId {
        self.open_elements
            .last()
            .copied()
            .or(self.html)
            .unwrap_or(self.doc.root)
    }

    fn insert_element(&mut self, parent: NodeId, tag: StartTagToken) {
        let mut data = ElementData::new(&tag.name);
        data.attributes = tag
            .attributes
            .into_iter()
            .map(|(name, value)| Attribute { name, value })
            .collect();
        let void = is_void_tag(&data.tag);
        let id = self.doc.add_node(NodeKind::Element(data));
        self.doc.append_child(parent, id);
        if !void && !tag.self_closing {
            self.open_elements.push(id);
        }
    }

    fn merge_attributes(&mut self, id: NodeId, attributes: Vec<(String, String)>) {
        if let Some(elem) = self.doc.element_mut(id) {
            for (name, value) in attributes {
                if !elem.has_attribute(&name) {
                    elem.set_attribute(&name, &value);
                }
            }
        }
    }

    fn ensure_html(&mut self) -> NodeId {
        if let Some(html) = self.html {
            return html;
        }
        let html = self.doc.create_element("html");
        let root = self.doc.root;
        self.doc.append_child(root, html);
        self.open_elements.insert(0, html);
        self.html = Some(html);
        html
    }

    fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head {
            return head;
        }
        let html = self.ensure_html();
        let head = self.doc.create_element("head");
        match self.body {
            Some(body) => self.doc.insert_before(html, head, body),
            None => self.doc.append_child(html, head),
        }
        self.head = Some(head);
        head
    }

    fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let html = self.ensure_html();
        self.ensure_head();
        let body = self.doc.create_element("body");
        self.doc.append_child(html, body);
        self.open_elements.truncate(1);
        self.open_elements.push(body);
        self.body = Some(body);
        body
    }

    /// Pop elements implicitly closed by a start tag named `tag`.
    fn close_implied(&mut self, tag: &str) {
        if closes_paragraph(tag) {
            self.close_in_scope(&["p"], &[]);
        }
        match tag {
            "li" => self.close_in_scope(&["li"], &["ul", "ol"]),
            "dd" | "dt" => self.close_in_scope(&["dd", "dt"], &["dl"]),
            "option" => {
                if let Some(&top) = self.open_elements.last()
                    && self.doc.is_element(top, "option")
                {
                    self.open_elements.pop();
                }
            },
            _ => {},
        }
    }

    /// If an element named in `targets` is open within scope, pop the
    /// stack up to and including it. `extra_boundaries` extend the
    /// default scope boundaries.
    fn close_in_scope(&mut self, targets: &[&str], extra_boundaries: &[&str]) {
        for pos in (0..self.open_elements.len()).rev() {
            let Some(tag) = self.doc.tag(self.open_elements[pos]) else {
                continue;
            };
            if targets.contains(&tag) {
                self.open_elements.truncate(pos);
                return;
            }
            if is_scope_boundary(tag) || extra_boundaries.contains(&tag) {
                return;
            }
        }
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{parse_document, parse_fragment};

    #[test]
    fn implicit_structure() {
        let doc = parse_document("Hello");
        let html = doc.html_element().unwrap();
        let head = doc.head().unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.children(html), &[head, body]);
        assert_eq!(doc.text_content(body), "Hello");
    }

    #[test]
    fn head_content_routed_to_head() {
        let doc = parse_document(
            "<!DOCTYPE html><title>About</title><style>p{}</style><p>Body text</p>",
        );
        let head = doc.head().unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.elements_by_tag(head, "title").len(), 1);
        assert_eq!(doc.elements_by_tag(head, "style").len(), 1);
        assert_eq!(doc.title(), "About");
        assert_eq!(doc.inner_html(body), "<p>Body text</p>");
    }

    #[test]
    fn script_in_body_stays_in_body() {
        let doc = parse_document(
            "<html><head></head><body><main><script>init()</script></main></body></html>",
        );
        let main = doc.first_by_tag("main").unwrap();
        assert_eq!(doc.inner_html(main), "<script>init()</script>");
    }

    #[test]
    fn paragraph_closed_by_block() {
        let doc = parse_document("<body><p>one<div>two</div>");
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<p>one</p><div>two</div>");
    }

    #[test]
    fn list_items_close_each_other() {
        let doc = parse_document("<ul><li>a<li>b<li>c</ul><p>after");
        let body = doc.body().unwrap();
        assert_eq!(
            doc.inner_html(body),
            "<ul><li>a</li><li>b</li><li>c</li></ul><p>after</p>"
        );
    }

    #[test]
    fn nested_list_items_not_closed_across_lists() {
        let doc = parse_document("<ul><li>a<ul><li>b</ul></ul>");
        let body = doc.body().unwrap();
        assert_eq!(
            doc.inner_html(body),
            "<ul><li>a<ul><li>b</li></ul></li></ul>"
        );
    }

    #[test]
    fn void_elements_have_no_children() {
        let doc = parse_document("<p>a<br>b<img src=x>c</p>");
        let p = doc.first_by_tag("p").unwrap();
        assert_eq!(doc.inner_html(p), "a<br>b<img src=\"x\">c");
    }

    #[test]
    fn stray_end_tags_ignored() {
        let doc = parse_document("<div>a</span>b</div></body></html>trailing");
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<div>ab</div>trailing");
    }

    #[test]
    fn custom_elements_parsed_as_elements() {
        let doc = parse_document(
            "<body><navigation-bar></navigation-bar><main id=content>x</main><site-footer/></body>",
        );
        let body = doc.body().unwrap();
        let tags: Vec<&str> = doc
            .children(body)
            .iter()
            .filter_map(|&n| doc.tag(n))
            .collect();
        assert_eq!(tags, vec!["navigation-bar", "main", "site-footer"]);
    }

    #[test]
    fn fragment_keeps_head_tags_in_body() {
        let doc = parse_fragment("<title>t</title><p>x</p>");
        let body = doc.body().unwrap();
        assert_eq!(doc.inner_html(body), "<title>t</title><p>x</p>");
        assert!(doc.children(doc.head().unwrap()).is_empty());
    }

    #[test]
    fn html_attributes_merged() {
        let doc = parse_document("<html lang=zh><body class=home>");
        let html = doc.html_element().unwrap();
        assert_eq!(doc.get_attribute(html, "lang"), Some("zh"));
        assert_eq!(doc.get_attribute(doc.body().unwrap(), "class"), Some("home"));
    }

    #[test]
    fn empty_input_has_body() {
        let doc = parse_document("");
        assert!(doc.body().is_some());
        assert!(doc.head().is_some());
    }
}
