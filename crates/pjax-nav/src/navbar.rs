//! The floating navigation bar.
//!
//! Renders a `<nav class="floating-nav">` into each navigation-bar
//! element, marking the link of the current page with `current`. It
//! re-renders on every completed navigation and when its element
//! arrives inside swapped content.

use pjax_html::{Document, NodeId};
use pjax_types::config::PjaxConfig;

use crate::components::{ComponentContext, Reinitializable};
use crate::events::{NavEvent, NavListener};

/// A link in the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct NavLink {
    pub href: String,
    pub label: String,
}

impl NavLink {
    pub fn new(href: &str, label: &str) -> Self {
        Self {
            href: href.to_string(),
            label: label.to_string(),
        }
    }

    /// Whether this link points at the page with `path`.
    ///
    /// Compares last path segments. A link to `index.html` (or to a
    /// directory) is current for any path whose last segment is
    /// `index.html` or empty; other links need the same file name.
    pub fn is_current(&self, path: &str) -> bool {
        let target = self.href.split(['?', '#']).next().unwrap_or_default();
        let file = target.rsplit('/').next().unwrap_or_default();
        let page = path.rsplit('/').next().unwrap_or_default();
        if file.is_empty() || file == "index.html" {
            page.is_empty() || page == "index.html"
        } else {
            page == file
        }
    }
}

/// Navigation bar component.
#[derive(Debug, Clone)]
pub struct NavigationBar {
    tag: String,
    links: Vec<NavLink>,
}

impl NavigationBar {
    pub fn new(config: &PjaxConfig) -> Self {
        Self {
            tag: config.navigation_bar_tag.clone(),
            links: vec![
                NavLink::new("./index.html", "首頁"),
                NavLink::new("./coc.html", "行為準則"),
            ],
        }
    }

    pub fn with_links(mut self, links: Vec<NavLink>) -> Self {
        self.links = links;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    /// Replace the contents of `element` with the bar for `path`.
    pub fn render(&self, doc: &mut Document, element: NodeId, path: &str) {
        doc.clear_children(element);
        let nav = doc.create_element("nav");
        doc.add_class(nav, "floating-nav");
        for link in &self.links {
            let anchor = doc.create_element("a");
            doc.set_attribute(anchor, "href", &link.href);
            if link.is_current(path) {
                doc.add_class(anchor, "current");
            }
            doc.set_text_content(anchor, &link.label);
            doc.append_child(nav, anchor);
        }
        doc.append_child(element, nav);
    }

    /// Render every bar element in the document. Returns how many were
    /// rendered.
    pub fn render_all(&self, doc: &mut Document, path: &str) -> usize {
        let bars = doc.elements_by_tag(doc.root, &self.tag);
        for &bar in &bars {
            self.render(doc, bar, path);
        }
        bars.len()
    }
}

impl NavListener for NavigationBar {
    fn on_event(&mut self, event: &NavEvent, document: &mut Document) {
        if let NavEvent::Complete { path, .. } = event {
            self.render_all(document, path);
        }
    }
}

impl Reinitializable for NavigationBar {
    fn reinitialize(&mut self, ctx: &mut ComponentContext<'_>) {
        self.render(ctx.document, ctx.element, ctx.path);
    }
}
