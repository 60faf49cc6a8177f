//! Page registry: per-path lifecycle hooks.
//!
//! Paths are normalized to a leading `/`. Lookups for unregistered
//! paths fall back to the `/` descriptor, and to nothing after that;
//! callers treat a missing descriptor as "no hooks".

use std::collections::HashMap;
use std::fmt;

use pjax_html::{Document, NodeId};
use pjax_types::config::PageDefault;

/// Values handed to `on_load` / `on_unload` hooks. Built fresh for
/// each call.
pub struct NavigationContext<'a> {
    pub document: &'a mut Document,
    /// The live content container. Hooks may mutate inside it but must
    /// not detach it.
    pub container: NodeId,
    pub url: &'a str,
    pub path: &'a str,
}

/// A lifecycle callback.
pub type LifecycleHook = Box<dyn FnMut(&mut NavigationContext<'_>)>;

/// Registered behavior for one path.
#[derive(Default)]
pub struct PageDescriptor {
    /// Display title. Informational; the document title always comes
    /// from the fetched page.
    pub title: Option<String>,
    on_load: Option<LifecycleHook>,
    on_unload: Option<LifecycleHook>,
}

impl PageDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn on_load(mut self, hook: impl FnMut(&mut NavigationContext<'_>) + 'static) -> Self {
        self.on_load = Some(Box::new(hook));
        self
    }

    pub fn on_unload(mut self, hook: impl FnMut(&mut NavigationContext<'_>) + 'static) -> Self {
        self.on_unload = Some(Box::new(hook));
        self
    }

    pub fn has_on_load(&self) -> bool {
        self.on_load.is_some()
    }

    pub fn has_on_unload(&self) -> bool {
        self.on_unload.is_some()
    }

    /// Invoke the load hook. Absent hooks are no-ops.
    pub fn run_on_load(&mut self, ctx: &mut NavigationContext<'_>) {
        if let Some(hook) = self.on_load.as_mut() {
            hook(ctx);
        }
    }

    /// Invoke the unload hook. Absent hooks are no-ops.
    pub fn run_on_unload(&mut self, ctx: &mut NavigationContext<'_>) {
        if let Some(hook) = self.on_unload.as_mut() {
            hook(ctx);
        }
    }
}

impl fmt::Debug for PageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDescriptor")
            .field("title", &self.title)
            .field("on_load", &self.on_load.is_some())
            .field("on_unload", &self.on_unload.is_some())
            .finish()
    }
}

/// Prepend `/` when `path` lacks it.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Mapping from normalized path to [`PageDescriptor`].
#[derive(Debug, Default)]
pub struct PageRegistry {
    pages: HashMap<String, PageDescriptor>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `descriptor` under the normalized `path`, replacing any
    /// previous registration.
    pub fn register_page(&mut self, path: &str, descriptor: PageDescriptor) {
        let path = normalize_path(path);
        if self.pages.insert(path.clone(), descriptor).is_some() {
            log::debug!("Replaced page descriptor for {path}");
        }
    }

    /// The descriptor for `path`, else the `/` descriptor, else `None`.
    pub fn get_page_handler(&self, path: &str) -> Option<&PageDescriptor> {
        self.pages
            .get(&normalize_path(path))
            .or_else(|| self.pages.get("/"))
    }

    /// Mutable form of [`get_page_handler`](Self::get_page_handler),
    /// needed to run hooks.
    pub fn get_page_handler_mut(&mut self, path: &str) -> Option<&mut PageDescriptor> {
        let path = normalize_path(path);
        let key = if self.pages.contains_key(&path) {
            path
        } else {
            "/".to_string()
        };
        self.pages.get_mut(&key)
    }

    /// Register a titled descriptor for each default whose path has no
    /// entry yet. Never overwrites, so repeated calls are no-ops.
    pub fn init(&mut self, defaults: &[PageDefault]) {
        for default in defaults {
            let path = normalize_path(&default.path);
            if !self.pages.contains_key(&path) {
                self.pages
                    .insert(path, PageDescriptor::new().with_title(&default.title));
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages.contains_key(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}
