//! Arena-based mutable DOM tree.
//!
//! Nodes are stored in a flat `Vec` arena and linked by index. Detached
//! nodes stay in the arena with no parent; they are simply unreachable
//! from the root. Node ids are therefore stable for the lifetime of a
//! [`Document`], which lets callers hold on to a container id across
//! any number of subtree replacements.

use crate::selector::Selector;
use crate::serialize;

/// Index into the [`Document`]'s node arena.
pub type NodeId = usize;

// ------------------------------------------------------------------
// Node types
// ------------------------------------------------------------------

/// An HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub root: NodeId,
}

/// A single node in the DOM tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The kind of DOM node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Data associated with an Element node.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: Vec<Attribute>,
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Void elements never have children or an end tag.
pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose content is raw text (not parsed, not escaped).
pub fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

// ------------------------------------------------------------------
// ElementData
// ------------------------------------------------------------------

impl ElementData {
    /// Create a new `ElementData` with the given tag and no attributes.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Get an attribute value by name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }

    /// Check if this element has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.get_attribute("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Add a class token if not already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.get_attribute("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute("class", &value);
    }

    /// Remove every occurrence of a class token.
    pub fn remove_class(&mut self, class: &str) {
        let Some(existing) = self.get_attribute("class") else {
            return;
        };
        let value: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        let value = value.join(" ");
        self.set_attribute("class", &value);
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    pub fn href(&self) -> Option<&str> {
        self.get_attribute("href")
    }

    /// Custom elements carry a hyphen in their tag name.
    pub fn is_custom_element(&self) -> bool {
        self.tag.contains('-')
    }
}

// ------------------------------------------------------------------
// Document
// ------------------------------------------------------------------

impl Document {
    /// Create an empty document with a synthetic `Document` root node.
    pub fn new() -> Self {
        let root_node = Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root_node],
            root: 0,
        }
    }

    /// Add a new detached node to the arena and return its [`NodeId`].
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.add_node(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.add_node(NodeKind::Text(text.to_string()))
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Get the [`ElementData`] for a node, if it is an `Element`.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Tag name of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.element_mut(id) {
            elem.set_attribute(name, value);
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(elem) = self.element_mut(id) {
            elem.remove_attribute(name);
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(elem) = self.element_mut(id) {
            elem.add_class(class);
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(elem) = self.element_mut(id) {
            elem.remove_class(class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    // -- tree mutation ----------------------------------------------

    /// Detach a node from its current parent, if any.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&c| c != id);
        }
    }

    /// Append `child_id` as the last child of `parent_id`, moving it
    /// out of its previous position.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        self.detach(child_id);
        self.nodes[parent_id].children.push(child_id);
        self.nodes[child_id].parent = Some(parent_id);
    }

    /// Insert `new_id` immediately before `reference` under `parent_id`.
    /// Appends when `reference` is not a child of `parent_id`.
    pub fn insert_before(&mut self, parent_id: NodeId, new_id: NodeId, reference: NodeId) {
        self.detach(new_id);
        let children = &mut self.nodes[parent_id].children;
        match children.iter().position(|&c| c == reference) {
            Some(pos) => children.insert(pos, new_id),
            None => children.push(new_id),
        }
        self.nodes[new_id].parent = Some(parent_id);
    }

    /// Insert `new_id` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new_id: NodeId) {
        let Some(parent_id) = self.nodes[reference].parent else {
            return;
        };
        self.detach(new_id);
        let children = &mut self.nodes[parent_id].children;
        let pos = children
            .iter()
            .position(|&c| c == reference)
            .map(|p| p + 1)
            .unwrap_or(children.len());
        children.insert(pos, new_id);
        self.nodes[new_id].parent = Some(parent_id);
    }

    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        if self.nodes[child_id].parent == Some(parent_id) {
            self.detach(child_id);
        }
    }

    /// Put `new_id` in the position of `old_id`; `old_id` is detached.
    pub fn replace_child(&mut self, parent_id: NodeId, new_id: NodeId, old_id: NodeId) {
        if self.nodes[old_id].parent != Some(parent_id) {
            return;
        }
        self.detach(new_id);
        let children = &mut self.nodes[parent_id].children;
        if let Some(pos) = children.iter().position(|&c| c == old_id) {
            children[pos] = new_id;
        }
        self.nodes[old_id].parent = None;
        self.nodes[new_id].parent = Some(parent_id);
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id].children);
        for child in children {
            self.nodes[child].parent = None;
        }
    }

    /// Deep-copy `source_id` (from `source`) into this document's
    /// arena. The copy is detached; the caller places it. A document
    /// node is imported as a `div` wrapping its children.
    pub fn import_node(&mut self, source: &Document, source_id: NodeId) -> NodeId {
        let kind = match &source.nodes[source_id].kind {
            NodeKind::Document => NodeKind::Element(ElementData::new("div")),
            other => other.clone(),
        };
        let id = self.add_node(kind);
        for &child in &source.nodes[source_id].children {
            let copy = self.import_node(source, child);
            self.nodes[copy].parent = Some(id);
            self.nodes[id].children.push(copy);
        }
        id
    }

    // -- traversal --------------------------------------------------

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    /// Descendant elements of `id` in document order.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.element(n).is_some())
            .collect()
    }

    /// Nearest inclusive ancestor of `id` accepted by `predicate`.
    pub fn closest(&self, id: NodeId, predicate: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(elem) = self.element(node)
                && predicate(elem)
            {
                return Some(node);
            }
            current = self.nodes[node].parent;
        }
        None
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node].parent;
        }
        false
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    // -- queries ----------------------------------------------------

    /// Get the concatenated text content of a node and all its
    /// descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(s) = &self.nodes[id].kind {
            out.push_str(s);
        }
        for node in self.descendants(id) {
            if let NodeKind::Text(s) = &self.nodes[node].kind {
                out.push_str(s);
            }
        }
        out
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let text_id = self.create_text(text);
            self.append_child(id, text_id);
        }
    }

    /// Find the first connected element whose `id` attribute matches.
    pub fn get_element_by_id(&self, target: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.element(n).is_some_and(|e| e.id() == Some(target)))
    }

    /// First connected element with the given tag.
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(self.root, tag).into_iter().next()
    }

    /// Descendant elements of `scope` with the given tag.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.is_element(n, tag))
            .collect()
    }

    /// First descendant of `scope` matching `selector`.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.element(n).is_some_and(|e| selector.matches(e)))
    }

    /// Every descendant of `scope` matching `selector`.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|e| selector.matches(e)))
            .collect()
    }

    pub fn html_element(&self) -> Option<NodeId> {
        self.nodes[self.root]
            .children
            .iter()
            .copied()
            .find(|&n| self.is_element(n, "html"))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag("body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_by_tag("head")
    }

    /// The `<title>` text content, whitespace-trimmed. Empty when the
    /// document has no title.
    pub fn title(&self) -> String {
        self.first_by_tag("title")
            .map(|id| self.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    /// Set the document title, creating `<title>` in `<head>` if needed.
    pub fn set_title(&mut self, title: &str) {
        let title_id = match self.first_by_tag("title") {
            Some(id) => id,
            None => {
                let id = self.create_element("title");
                let parent = self.head().unwrap_or(self.root);
                self.append_child(parent, id);
                id
            },
        };
        self.set_text_content(title_id, title);
    }

    // -- serialization ----------------------------------------------

    /// Markup of the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        serialize::inner_html(self, id)
    }

    /// Markup of `id` itself and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::outer_html(self, id)
    }

    /// Replace the children of `id` with nodes parsed from `markup`.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        let parsed = crate::parse_fragment(markup);
        let Some(source_root) = parsed.body() else {
            return;
        };
        self.clear_children(id);
        for &child in parsed.children(source_root) {
            let copy = self.import_node(&parsed, child);
            self.append_child(id, copy);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
