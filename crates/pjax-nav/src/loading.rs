//! Progress bar shown while a navigation is in flight.

use pjax_html::{Document, NodeId};
use pjax_types::config::PjaxConfig;

const HIDDEN_STYLE: &str = "display: none";
const VISIBLE_STYLE: &str = "display: block";

/// Singleton progress bar plus the container transition marker.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    bar_id: String,
    style_id: String,
    transition_class: String,
}

impl LoadingIndicator {
    pub fn new(config: &PjaxConfig) -> Self {
        Self {
            bar_id: config.loading_bar_id.clone(),
            style_id: config.loading_style_id(),
            transition_class: config.transition_class.clone(),
        }
    }

    /// Insert the progress-bar and fade-in rules into `head` once.
    /// Returns whether a style element was added.
    pub fn ensure_styles(&self, doc: &mut Document) -> bool {
        if doc.get_element_by_id(&self.style_id).is_some() {
            return false;
        }
        let style = doc.create_element("style");
        doc.set_attribute(style, "id", &self.style_id);
        doc.set_text_content(style, &self.stylesheet());
        let parent = doc.head().or_else(|| doc.html_element()).unwrap_or(doc.root);
        doc.append_child(parent, style);
        true
    }

    /// Create the bar in `body` if absent, else unhide it, and mark
    /// `container` with the transition class.
    pub fn show(&self, doc: &mut Document, container: Option<NodeId>) {
        match doc.get_element_by_id(&self.bar_id) {
            Some(bar) => doc.set_attribute(bar, "style", VISIBLE_STYLE),
            None => {
                let bar = doc.create_element("div");
                doc.set_attribute(bar, "id", &self.bar_id);
                let parent = doc.body().unwrap_or(doc.root);
                doc.append_child(parent, bar);
            },
        }
        if let Some(container) = container {
            doc.add_class(container, &self.transition_class);
        }
    }

    /// Hide the bar if present.
    pub fn hide(&self, doc: &mut Document) {
        if let Some(bar) = doc.get_element_by_id(&self.bar_id) {
            doc.set_attribute(bar, "style", HIDDEN_STYLE);
        }
    }

    /// Drop the transition marker from `container`.
    pub fn clear_transition(&self, doc: &mut Document, container: NodeId) {
        doc.remove_class(container, &self.transition_class);
    }

    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.get_element_by_id(&self.bar_id)
            .is_some_and(|bar| doc.get_attribute(bar, "style") != Some(HIDDEN_STYLE))
    }

    fn stylesheet(&self) -> String {
        let bar = &self.bar_id;
        let transition = &self.transition_class;
        format!(
            "#{bar} {{ position: fixed; top: 0; left: 0; width: 100%; height: 3px; \
             background: rgba(66, 133, 244, 0.2); z-index: 9999; overflow: hidden; }}\n\
             #{bar}::after {{ content: ''; display: block; position: absolute; top: 0; left: 0; \
             width: 25%; height: 100%; background: #4285f4; \
             animation: pjax-loading 1s infinite cubic-bezier(0.4, 0, 0.2, 1); }}\n\
             @keyframes pjax-loading {{ 0% {{ left: -25%; }} 50% {{ left: 100%; }} 100% {{ left: 100%; }} }}\n\
             .{transition} {{ animation: pjax-fadein 0.3s ease-out; }}\n\
             @keyframes pjax-fadein {{ 0% {{ opacity: 0; }} 100% {{ opacity: 1; }} }}\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pjax_html::parse_document;

    fn setup() -> (Document, LoadingIndicator, NodeId) {
        let doc = parse_document("<main id=\"content\"></main>");
        let container = doc.get_element_by_id("content").unwrap();
        (doc, LoadingIndicator::new(&PjaxConfig::default()), container)
    }

    #[test]
    fn styles_inserted_once() {
        let (mut doc, indicator, _) = setup();
        assert!(indicator.ensure_styles(&mut doc));
        assert!(!indicator.ensure_styles(&mut doc));

        let head = doc.head().unwrap();
        let styles = doc.elements_by_tag(head, "style");
        assert_eq!(styles.len(), 1);
        assert_eq!(doc.get_attribute(styles[0], "id"), Some("pjax-loading-style"));
        let css = doc.text_content(styles[0]);
        assert!(css.contains("#pjax-loading {"));
        assert!(css.contains(".pjax-transition {"));
    }

    #[test]
    fn show_creates_singleton_bar() {
        let (mut doc, indicator, container) = setup();
        assert!(!indicator.is_visible(&doc));

        indicator.show(&mut doc, Some(container));
        indicator.show(&mut doc, Some(container));

        let body = doc.body().unwrap();
        let bars: Vec<_> = doc
            .descendant_elements(body)
            .into_iter()
            .filter(|&n| doc.get_attribute(n, "id") == Some("pjax-loading"))
            .collect();
        assert_eq!(bars.len(), 1);
        assert!(indicator.is_visible(&doc));
        assert!(doc.has_class(container, "pjax-transition"));
    }

    #[test]
    fn hide_then_show_again() {
        let (mut doc, indicator, _) = setup();
        indicator.hide(&mut doc);
        assert!(doc.get_element_by_id("pjax-loading").is_none());

        indicator.show(&mut doc, None);
        indicator.hide(&mut doc);
        assert!(!indicator.is_visible(&doc));
        indicator.show(&mut doc, None);
        assert!(indicator.is_visible(&doc));
    }

    #[test]
    fn clear_transition_removes_marker() {
        let (mut doc, indicator, container) = setup();
        indicator.show(&mut doc, Some(container));
        indicator.clear_transition(&mut doc, container);
        assert!(!doc.has_class(container, "pjax-transition"));
    }
}
