//! The browsing context the navigator drives: live document, location,
//! session history and viewport scroll.

use pjax_html::{Document, parse_document};
use pjax_types::error::Result;
use url::Url;

use crate::history::{History, HistoryState};

/// A loaded page.
#[derive(Debug, Clone)]
pub struct Page {
    pub document: Document,
    pub history: History,
    location: Url,
    scroll: (i32, i32),
    full_load_request: Option<String>,
}

impl Page {
    pub fn new(document: Document, location: Url) -> Self {
        Self {
            document,
            history: History::new(),
            location,
            scroll: (0, 0),
            full_load_request: None,
        }
    }

    /// Parse `html` as the document loaded from `url`.
    pub fn from_html(url: &str, html: &str) -> Result<Self> {
        let location = Url::parse(url)?;
        Ok(Self::new(parse_document(html), location))
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Path component of the current location.
    pub fn path(&self) -> &str {
        self.location.path()
    }

    pub fn title(&self) -> String {
        self.document.title()
    }

    /// Record a new history entry for `url` and make it the location.
    pub fn push_state(&mut self, url: &Url, title: &str) {
        self.history.push_state(HistoryState::for_url(url), title);
        self.location = url.clone();
    }

    /// Overwrite the current history entry for `url` and make it the
    /// location.
    pub fn replace_state(&mut self, url: &Url, title: &str) {
        self.history.replace_state(HistoryState::for_url(url), title);
        self.location = url.clone();
    }

    /// Step back in history. The location follows the restored entry
    /// before the popped state is returned, as with a browser popstate.
    pub fn history_back(&mut self) -> Option<HistoryState> {
        let state = self.history.back()?;
        self.follow(&state);
        Some(state)
    }

    /// Step forward in history. See [`history_back`](Self::history_back).
    pub fn history_forward(&mut self) -> Option<HistoryState> {
        let state = self.history.forward()?;
        self.follow(&state);
        Some(state)
    }

    pub fn scroll_to(&mut self, x: i32, y: i32) {
        self.scroll = (x, y);
    }

    pub fn scroll_position(&self) -> (i32, i32) {
        self.scroll
    }

    /// Request a full browser load of `url`, replacing this page.
    pub fn assign_location(&mut self, url: &str) {
        log::info!("Full page load requested: {url}");
        self.full_load_request = Some(url.to_string());
    }

    /// The pending full-load request, if any.
    pub fn full_load_request(&self) -> Option<&str> {
        self.full_load_request.as_deref()
    }

    pub fn take_full_load_request(&mut self) -> Option<String> {
        self.full_load_request.take()
    }

    fn follow(&mut self, state: &HistoryState) {
        match Url::parse(&state.url) {
            Ok(url) => self.location = url,
            Err(e) => log::warn!("History entry has an unparsable URL {}: {e}", state.url),
        }
    }
}
