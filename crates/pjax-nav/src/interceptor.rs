//! Deciding which clicks become in-place navigations.

use pjax_html::{Document, ElementData, NodeId};
use pjax_types::config::PjaxConfig;
use url::Url;

/// An anchor eligible for interception: no opt-out marker, no target
/// frame, no download.
pub fn is_navigation_link(element: &ElementData, config: &PjaxConfig) -> bool {
    element.tag == "a"
        && !element.has_attribute(&config.opt_out_attribute)
        && !element.has_attribute("target")
        && !element.has_attribute("download")
}

/// The URL to navigate to for a click on `target`, or `None` when the
/// click should keep its default behavior.
///
/// The nearest eligible ancestor anchor must have a non-empty `href`
/// that is not an in-page fragment link and that resolves against
/// `location` to the same host.
pub fn intercepted_url(
    doc: &Document,
    target: NodeId,
    location: &Url,
    config: &PjaxConfig,
) -> Option<Url> {
    let link = doc.closest(target, |e| is_navigation_link(e, config))?;
    let href = doc.get_attribute(link, "href")?.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = location.join(href).ok()?;
    match (resolved.host_str(), location.host_str()) {
        (Some(link_host), Some(page_host)) if link_host == page_host => Some(resolved),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pjax_html::parse_document;

    fn click(markup: &str, id: &str) -> Option<String> {
        let doc = parse_document(markup);
        let target = doc.get_element_by_id(id).unwrap();
        let location = Url::parse("http://site.test/about.html").unwrap();
        intercepted_url(&doc, target, &location, &PjaxConfig::default()).map(|url| url.to_string())
    }

    #[test]
    fn relative_link_is_resolved() {
        assert_eq!(
            click("<a id=\"t\" href=\"./coc.html\">x</a>", "t").as_deref(),
            Some("http://site.test/coc.html")
        );
    }

    #[test]
    fn click_on_descendant_uses_ancestor_anchor() {
        assert_eq!(
            click("<a href=\"/blog.html\"><span><b id=\"t\">x</b></span></a>", "t").as_deref(),
            Some("http://site.test/blog.html")
        );
    }

    #[test]
    fn opted_out_and_special_links_pass_through() {
        assert_eq!(click("<a id=\"t\" href=\"/a.html\" data-no-pjax>x</a>", "t"), None);
        assert_eq!(click("<a id=\"t\" href=\"/a.html\" target=\"_blank\">x</a>", "t"), None);
        assert_eq!(click("<a id=\"t\" href=\"/a.pdf\" download>x</a>", "t"), None);
    }

    #[test]
    fn fragment_links_pass_through() {
        assert_eq!(click("<a id=\"t\" href=\"#section\">x</a>", "t"), None);
        assert_eq!(click("<a id=\"t\" href=\"  #top\">x</a>", "t"), None);
    }

    #[test]
    fn other_hosts_and_schemes_pass_through() {
        assert_eq!(click("<a id=\"t\" href=\"http://other.test/\">x</a>", "t"), None);
        assert_eq!(click("<a id=\"t\" href=\"mailto:hi@site.test\">x</a>", "t"), None);
    }

    #[test]
    fn same_host_other_port_is_intercepted() {
        assert_eq!(
            click("<a id=\"t\" href=\"http://site.test:8080/x.html\">x</a>", "t").as_deref(),
            Some("http://site.test:8080/x.html")
        );
    }

    #[test]
    fn non_links_pass_through() {
        assert_eq!(click("<button id=\"t\">x</button>", "t"), None);
        assert_eq!(click("<a id=\"t\">no href</a>", "t"), None);
        assert_eq!(click("<a id=\"t\" href=\"\">empty</a>", "t"), None);
    }
}
