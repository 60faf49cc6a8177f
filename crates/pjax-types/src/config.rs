//! Navigator configuration.
//!
//! Every field has a default matching the markup conventions of the
//! site, so an empty TOML document (or no file at all) is a valid
//! configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{PjaxError, Result};

/// Top-level configuration for the navigator and its collaborators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PjaxConfig {
    /// Selector of the replaceable content region (`#content`).
    pub content_selector: String,
    /// Semantic fallback tag for the content region, also used when a
    /// container has to be synthesized.
    pub main_tag: String,
    /// Tag of the persistent navigation bar element.
    pub navigation_bar_tag: String,
    /// Tag of the persistent footer element.
    pub footer_tag: String,
    /// Attribute that opts an anchor out of interception.
    pub opt_out_attribute: String,
    /// Id of the progress-bar element.
    pub loading_bar_id: String,
    /// Class added to the container while a navigation is pending.
    pub transition_class: String,
    /// Header sent with every fragment request.
    pub fragment_header: FragmentHeader,
    /// Descriptors filled in by `PageRegistry::init` when absent.
    pub default_pages: Vec<PageDefault>,
    pub http: HttpConfig,
}

/// A request header name/value pair.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FragmentHeader {
    pub name: String,
    pub value: String,
}

/// A default page descriptor (path and display title).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PageDefault {
    pub path: String,
    pub title: String,
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// `None` means reads block until the server closes the connection.
    pub read_timeout_secs: Option<u64>,
    pub max_redirects: u8,
    pub user_agent: String,
}

impl Default for PjaxConfig {
    fn default() -> Self {
        Self {
            content_selector: "#content".to_string(),
            main_tag: "main".to_string(),
            navigation_bar_tag: "navigation-bar".to_string(),
            footer_tag: "site-footer".to_string(),
            opt_out_attribute: "data-no-pjax".to_string(),
            loading_bar_id: "pjax-loading".to_string(),
            transition_class: "pjax-transition".to_string(),
            fragment_header: FragmentHeader::default(),
            default_pages: vec![
                PageDefault::new("/", "Home"),
                PageDefault::new("/index.html", "Home"),
                PageDefault::new("/coc.html", "Code of Conduct"),
            ],
            http: HttpConfig::default(),
        }
    }
}

impl Default for FragmentHeader {
    fn default() -> Self {
        Self {
            name: "X-Requested-With".to_string(),
            value: "XMLHttpRequest".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: None,
            max_redirects: 5,
            user_agent: "pjax-nav/0.1".to_string(),
        }
    }
}

impl PageDefault {
    pub fn new(path: &str, title: &str) -> Self {
        Self {
            path: path.to_string(),
            title: title.to_string(),
        }
    }
}

impl PjaxConfig {
    /// Parse a configuration from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        log::debug!("Loading config from {}", path.display());
        Self::from_toml_str(&source)
            .map_err(|e| PjaxError::Config(format!("{}: {e}", path.display())))
    }

    /// The content identifier: `content_selector` without its leading
    /// `#`, or `None` when the selector is not an id selector.
    pub fn content_id(&self) -> Option<&str> {
        self.content_selector
            .strip_prefix('#')
            .filter(|id| !id.is_empty() && !id.contains(['.', '[', ' ', ',']))
    }

    /// Id of the `<style>` element holding the loading-indicator rules.
    pub fn loading_style_id(&self) -> String {
        format!("{}-style", self.loading_bar_id)
    }

    fn validate(&self) -> Result<()> {
        if self.content_selector.trim().is_empty() {
            return Err(PjaxError::Config("content_selector is empty".into()));
        }
        if self.main_tag.trim().is_empty() {
            return Err(PjaxError::Config("main_tag is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_site_markup() {
        let cfg = PjaxConfig::default();
        assert_eq!(cfg.content_selector, "#content");
        assert_eq!(cfg.content_id(), Some("content"));
        assert_eq!(cfg.main_tag, "main");
        assert_eq!(cfg.navigation_bar_tag, "navigation-bar");
        assert_eq!(cfg.footer_tag, "site-footer");
        assert_eq!(cfg.opt_out_attribute, "data-no-pjax");
        assert_eq!(cfg.loading_style_id(), "pjax-loading-style");
        assert_eq!(cfg.fragment_header.name, "X-Requested-With");
        assert_eq!(cfg.fragment_header.value, "XMLHttpRequest");
        assert_eq!(cfg.default_pages.len(), 3);
        assert_eq!(cfg.http.connect_timeout_secs, 10);
        assert!(cfg.http.read_timeout_secs.is_none());
        assert_eq!(cfg.http.max_redirects, 5);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = PjaxConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.content_selector, "#content");
        assert_eq!(cfg.default_pages[2], PageDefault::new("/coc.html", "Code of Conduct"));
    }

    #[test]
    fn partial_override() {
        let cfg = PjaxConfig::from_toml_str(
            r#"
content_selector = ".page-body"
transition_class = "fade"

[http]
read_timeout_secs = 30

[[default_pages]]
path = "/"
title = "Start"
"#,
        )
        .unwrap();
        assert_eq!(cfg.content_selector, ".page-body");
        assert_eq!(cfg.content_id(), None);
        assert_eq!(cfg.transition_class, "fade");
        assert_eq!(cfg.http.read_timeout_secs, Some(30));
        assert_eq!(cfg.http.connect_timeout_secs, 10);
        assert_eq!(cfg.default_pages, vec![PageDefault::new("/", "Start")]);
    }

    #[test]
    fn empty_selector_rejected() {
        let err = PjaxConfig::from_toml_str("content_selector = \"  \"").unwrap_err();
        assert!(format!("{err}").contains("content_selector"));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = PjaxConfig::from_toml_str("content_selector = [").unwrap_err();
        assert!(matches!(err, PjaxError::TomlParse(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = PjaxConfig::load(Path::new("/nonexistent/pjax.toml")).unwrap_err();
        assert!(matches!(err, PjaxError::Io(_)));
    }
}
