//! Session history: the state stack behind `push_state`,
//! `replace_state` and popstate.

use url::Url;

/// State object stored with each history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryState {
    pub url: String,
    pub path: String,
}

impl HistoryState {
    pub fn new(url: &str, path: &str) -> Self {
        Self {
            url: url.to_string(),
            path: path.to_string(),
        }
    }

    /// State for `url`, keyed by its path.
    pub fn for_url(url: &Url) -> Self {
        Self::new(url.as_str(), url.path())
    }
}

/// A single entry in the session history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub state: HistoryState,
    pub title: String,
}

/// Back stack, current entry and forward stack.
#[derive(Debug, Clone, Default)]
pub struct History {
    back_stack: Vec<HistoryEntry>,
    forward_stack: Vec<HistoryEntry>,
    current: Option<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry after the current one. Forward entries are dropped.
    pub fn push_state(&mut self, state: HistoryState, title: &str) {
        if let Some(entry) = self.current.take() {
            self.back_stack.push(entry);
        }
        self.forward_stack.clear();
        self.current = Some(HistoryEntry {
            state,
            title: title.to_string(),
        });
    }

    /// Overwrite the current entry (or create the first one).
    pub fn replace_state(&mut self, state: HistoryState, title: &str) {
        self.current = Some(HistoryEntry {
            state,
            title: title.to_string(),
        });
    }

    /// Step back one entry, returning the state to restore.
    pub fn back(&mut self) -> Option<HistoryState> {
        let prev = self.back_stack.pop()?;
        if let Some(current) = self.current.take() {
            self.forward_stack.push(current);
        }
        let state = prev.state.clone();
        self.current = Some(prev);
        Some(state)
    }

    /// Step forward one entry, returning the state to restore.
    pub fn forward(&mut self) -> Option<HistoryState> {
        let next = self.forward_stack.pop()?;
        if let Some(current) = self.current.take() {
            self.back_stack.push(current);
        }
        let state = next.state.clone();
        self.current = Some(next);
        Some(state)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.as_ref()
    }

    /// Total number of entries, including forward ones.
    pub fn len(&self) -> usize {
        self.back_stack.len() + usize::from(self.current.is_some()) + self.forward_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward_stack.is_empty()
    }
}
