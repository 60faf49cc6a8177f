//! Same-origin page transitions without full reloads.
//!
//! The [`Navigator`] owns a [`Page`] (live document, location, history)
//! and replaces the children of a single content container with the
//! matching region of each fetched page. Page-specific behavior hangs
//! off the [`PageRegistry`]; independent components follow navigations
//! through the [`EventBus`] or opt into re-rendering through
//! [`Reinitializable`].

pub mod components;
pub mod events;
pub mod extract;
pub mod history;
pub mod interceptor;
pub mod loading;
pub mod navbar;
pub mod navigator;
pub mod page;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use components::{
    ComponentContext, ComponentRegistry, LoggingScriptHost, Reinitializable, ScriptHost,
    ScriptSource,
};
pub use events::{ChannelListener, EventBus, ListenerId, NavEvent, NavListener};
pub use history::{History, HistoryEntry, HistoryState};
pub use loading::LoadingIndicator;
pub use navbar::{NavLink, NavigationBar};
pub use navigator::{
    DomEvent, EventDisposition, NavState, NavigationOutcome, Navigator, PendingNavigation,
};
pub use page::Page;
pub use registry::{NavigationContext, PageDescriptor, PageRegistry};
