//! Post-swap work on new content: script re-execution and custom
//! element reinitialization.
//!
//! Content copied in by markup does not run its scripts, so each
//! `<script>` is rebuilt in place and handed to a [`ScriptHost`]. Every
//! custom element (tag containing `-`) gets its registered
//! [`Reinitializable`] run, and a `Reinitialize` event is produced for
//! it whether or not one is registered.

use std::collections::HashMap;

use pjax_html::{Attribute, Document, NodeId};

use crate::events::NavEvent;

// -------------------------------------------------------------------
// Scripts
// -------------------------------------------------------------------

/// A recreated script element.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSource {
    /// The new `<script>` node, already in the document.
    pub node: NodeId,
    pub attributes: Vec<Attribute>,
    pub src: Option<String>,
    /// Inline source text.
    pub text: String,
}

/// Runs recreated scripts.
pub trait ScriptHost {
    fn execute(&mut self, script: &ScriptSource, document: &mut Document);
}

/// Logs each script and runs nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingScriptHost;

impl ScriptHost for LoggingScriptHost {
    fn execute(&mut self, script: &ScriptSource, _document: &mut Document) {
        match &script.src {
            Some(src) => log::debug!("Script re-executed: src={src}"),
            None => log::debug!("Inline script re-executed ({} bytes)", script.text.len()),
        }
    }
}

/// Replace every `<script>` under `container` with a fresh copy
/// (same attributes, same text) and pass each copy to `host`.
/// Returns the number of scripts handled.
pub fn execute_scripts(doc: &mut Document, container: NodeId, host: &mut dyn ScriptHost) -> usize {
    let scripts = doc.elements_by_tag(container, "script");
    let mut count = 0;
    for old in scripts {
        let Some(parent) = doc.parent(old) else {
            continue;
        };
        let attributes = doc
            .element(old)
            .map(|e| e.attributes.clone())
            .unwrap_or_default();
        let text = doc.text_content(old);

        let fresh = doc.create_element("script");
        for attr in &attributes {
            doc.set_attribute(fresh, &attr.name, &attr.value);
        }
        doc.set_text_content(fresh, &text);
        doc.replace_child(parent, fresh, old);

        let source = ScriptSource {
            node: fresh,
            src: doc.get_attribute(fresh, "src").map(str::to_string),
            attributes,
            text,
        };
        host.execute(&source, doc);
        count += 1;
    }
    count
}

// -------------------------------------------------------------------
// Components
// -------------------------------------------------------------------

/// Passed to [`Reinitializable::reinitialize`].
pub struct ComponentContext<'a> {
    pub document: &'a mut Document,
    /// The custom element being reinitialized.
    pub element: NodeId,
    /// Path of the page that was navigated to.
    pub path: &'a str,
}

/// A custom element implementation that can re-render itself after its
/// markup arrives through a content swap.
pub trait Reinitializable {
    fn reinitialize(&mut self, ctx: &mut ComponentContext<'_>);
}

/// Custom element implementations keyed by lowercase tag.
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Box<dyn Reinitializable>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` for `tag`, replacing any previous one.
    pub fn register(&mut self, tag: &str, component: Box<dyn Reinitializable>) {
        self.components.insert(tag.to_ascii_lowercase(), component);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(&tag.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn get_mut(&mut self, tag: &str) -> Option<&mut Box<dyn Reinitializable>> {
        self.components.get_mut(tag)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&String> = self.components.keys().collect();
        tags.sort();
        f.debug_struct("ComponentRegistry").field("tags", &tags).finish()
    }
}

/// Reinitialize every custom element under `container`, in document
/// order, returning one `Reinitialize` event per element.
///
/// Elements removed by an earlier component's re-render are skipped.
pub fn reinitialize_components(
    doc: &mut Document,
    container: NodeId,
    components: &mut ComponentRegistry,
    path: &str,
) -> Vec<NavEvent> {
    let custom: Vec<NodeId> = doc
        .descendant_elements(container)
        .into_iter()
        .filter(|&n| doc.element(n).is_some_and(|e| e.is_custom_element()))
        .collect();

    let mut events = Vec::with_capacity(custom.len());
    for element in custom {
        if !doc.contains(container, element) {
            continue;
        }
        let tag = doc.tag(element).unwrap_or_default().to_string();
        if let Some(component) = components.get_mut(&tag) {
            log::debug!("Reinitializing <{tag}>");
            component.reinitialize(&mut ComponentContext {
                document: &mut *doc,
                element,
                path,
            });
        }
        events.push(NavEvent::Reinitialize {
            target: element,
            tag,
            path: bubble_path(doc, element, container),
            pjax: true,
        });
    }
    events
}

/// `element` and its ancestors up to and including `container`.
fn bubble_path(doc: &Document, element: NodeId, container: NodeId) -> Vec<NodeId> {
    let mut path = vec![element];
    let mut current = element;
    while current != container {
        match doc.parent(current) {
            Some(parent) => {
                path.push(parent);
                current = parent;
            },
            None => break,
        }
    }
    path
}
