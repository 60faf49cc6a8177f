//! The navigator: intercepts same-origin navigations and swaps the
//! content container in place instead of loading a new document.
//!
//! A navigation is `Idle -> Pending -> Idle`. [`Navigator::navigate_to`]
//! drives both halves with the navigator's own [`Fetcher`]; embedders
//! with their own transport call [`Navigator::begin_navigation`] and
//! [`Navigator::complete_navigation`] separately. Each begin bumps a
//! generation counter and only the newest pending navigation may
//! complete: older ones come back as [`NavigationOutcome::Superseded`]
//! without touching the page.
//!
//! Any failure after `begin` (transport error, non-2xx status) falls
//! back to a full page load of the target URL, recorded on the
//! [`Page`]. The content container is never touched on that path.

use pjax_html::{NodeId, parse_document};
use pjax_net::{FetchRequest, FetchResponse, Fetcher};
use pjax_types::config::PjaxConfig;
use pjax_types::error::{PjaxError, Result};
use url::Url;

use crate::components::{
    ComponentRegistry, LoggingScriptHost, ScriptHost, execute_scripts, reinitialize_components,
};
use crate::events::{EventBus, ListenerId, NavEvent, NavListener};
use crate::extract::{ensure_content_container, extract_fragment};
use crate::history::HistoryState;
use crate::interceptor::intercepted_url;
use crate::loading::LoadingIndicator;
use crate::page::Page;
use crate::registry::{NavigationContext, PageRegistry};

// -------------------------------------------------------------------
// Public types
// -------------------------------------------------------------------

/// Host events routed through [`Navigator::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    /// A click on `target`.
    Click { target: NodeId },
    /// A history traversal delivering the restored entry's state.
    PopState { state: Option<HistoryState> },
}

/// What happened to a dispatched event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDisposition {
    /// Default action prevented; the navigator navigated.
    Handled(NavigationOutcome),
    /// Left to the default browser behavior.
    PassThrough,
}

/// Result of a navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// Content swapped in place.
    Completed {
        url: String,
        path: String,
        title: String,
    },
    /// Aborted; a full page load of `url` was requested instead.
    FellBack { url: String, reason: String },
    /// Discarded because a newer navigation started.
    Superseded { url: String, generation: u64 },
}

impl NavigationOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Completed { url, .. } | Self::FellBack { url, .. } | Self::Superseded { url, .. } => {
                url
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Navigator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Idle,
    Pending { url: String, generation: u64 },
}

/// A started navigation awaiting its fetch result.
#[derive(Debug, Clone)]
pub struct PendingNavigation {
    url: Url,
    push_state: bool,
    generation: u64,
    request: FetchRequest,
}

impl PendingNavigation {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The request to perform, fragment header included.
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }
}

// -------------------------------------------------------------------
// Navigator
// -------------------------------------------------------------------

pub struct Navigator<F: Fetcher> {
    page: Page,
    fetcher: F,
    config: PjaxConfig,
    registry: PageRegistry,
    components: ComponentRegistry,
    events: EventBus,
    scripts: Box<dyn ScriptHost>,
    indicator: LoadingIndicator,
    /// Resolved once; never re-resolved or replaced.
    container: NodeId,
    state: NavState,
    generation: u64,
}

impl<F: Fetcher> Navigator<F> {
    /// Take over `page`.
    ///
    /// Resolves (or synthesizes) the content container, installs the
    /// loading styles, fills registry defaults, records the current
    /// location as the current history entry and runs `on_load` for
    /// the current path.
    pub fn new(mut page: Page, fetcher: F, mut registry: PageRegistry, config: PjaxConfig) -> Self {
        let container = ensure_content_container(&mut page.document, &config);
        let indicator = LoadingIndicator::new(&config);
        indicator.ensure_styles(&mut page.document);
        registry.init(&config.default_pages);

        let location = page.location().clone();
        let title = page.title();
        page.replace_state(&location, &title);

        let mut navigator = Self {
            page,
            fetcher,
            config,
            registry,
            components: ComponentRegistry::new(),
            events: EventBus::new(),
            scripts: Box::new(LoggingScriptHost),
            indicator,
            container,
            state: NavState::Idle,
            generation: 0,
        };
        navigator.run_on_load(location.as_str(), location.path());
        log::info!("PJAX navigator initialized at {location}");
        navigator
    }

    pub fn with_script_host(mut self, host: Box<dyn ScriptHost>) -> Self {
        self.scripts = host;
        self
    }

    // -- accessors --------------------------------------------------

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// The content container of the live document.
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &PjaxConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PageRegistry {
        &mut self.registry
    }

    /// Tear down the navigator, keeping its registrations.
    pub fn into_registry(self) -> PageRegistry {
        self.registry
    }

    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    pub fn subscribe(&mut self, listener: Box<dyn NavListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<Box<dyn NavListener>> {
        self.events.unsubscribe(id)
    }

    pub fn is_loading(&self) -> bool {
        self.indicator.is_visible(&self.page.document)
    }

    // -- events -----------------------------------------------------

    /// Route a host event. Eligible link clicks and popstates carrying a
    /// URL navigate; everything else passes through.
    pub fn dispatch(&mut self, event: DomEvent) -> EventDisposition {
        match event {
            DomEvent::Click { target } => {
                if target >= self.page.document.nodes.len() {
                    return EventDisposition::PassThrough;
                }
                match intercepted_url(&self.page.document, target, self.page.location(), &self.config)
                {
                    Some(url) => EventDisposition::Handled(self.navigate_to(url.as_str(), true)),
                    None => EventDisposition::PassThrough,
                }
            },
            DomEvent::PopState {
                state: Some(state),
            } if !state.url.is_empty() => {
                EventDisposition::Handled(self.navigate_to(&state.url, false))
            },
            DomEvent::PopState { .. } => EventDisposition::PassThrough,
        }
    }

    /// Step back in history and restore that entry in place.
    pub fn go_back(&mut self) -> Option<NavigationOutcome> {
        if !self.page.history.can_go_back() {
            log::debug!("No history entry before {}", self.page.location());
            return None;
        }
        let state = self.page.history_back()?;
        self.restore(state)
    }

    /// Step forward in history and restore that entry in place.
    pub fn go_forward(&mut self) -> Option<NavigationOutcome> {
        if !self.page.history.can_go_forward() {
            log::debug!("No history entry after {}", self.page.location());
            return None;
        }
        let state = self.page.history_forward()?;
        self.restore(state)
    }

    fn restore(&mut self, state: HistoryState) -> Option<NavigationOutcome> {
        match self.dispatch(DomEvent::PopState { state: Some(state) }) {
            EventDisposition::Handled(outcome) => Some(outcome),
            EventDisposition::PassThrough => None,
        }
    }

    // -- navigation -------------------------------------------------

    /// Navigate to `url` (resolved against the current location).
    ///
    /// With `push_state` a history entry is added on success; popstate
    /// replays pass `false`.
    pub fn navigate_to(&mut self, url: &str, push_state: bool) -> NavigationOutcome {
        let pending = match self.begin_navigation(url, push_state) {
            Ok(pending) => pending,
            Err(e) => return self.fall_back(url, &e),
        };
        let result = self.fetcher.fetch(&pending.request);
        self.complete_navigation(pending, result)
    }

    /// First half of a navigation: run the current page's `on_unload`,
    /// show the loading indicator and enter `Pending`.
    ///
    /// The unload hook is not undone if the navigation later fails or
    /// is superseded.
    pub fn begin_navigation(&mut self, url: &str, push_state: bool) -> Result<PendingNavigation> {
        let target = self.page.location().join(url)?;

        let current_url = self.page.location().to_string();
        let current_path = self.page.path().to_string();
        if let Some(descriptor) = self.registry.get_page_handler_mut(&current_path) {
            descriptor.run_on_unload(&mut NavigationContext {
                document: &mut self.page.document,
                container: self.container,
                url: &current_url,
                path: &current_path,
            });
        }

        self.indicator
            .show(&mut self.page.document, Some(self.container));

        self.generation += 1;
        self.state = NavState::Pending {
            url: target.to_string(),
            generation: self.generation,
        };

        let header = &self.config.fragment_header;
        let request = FetchRequest::new(target.as_str()).with_header(&header.name, &header.value);
        log::debug!("Navigation #{} to {target} started", self.generation);

        Ok(PendingNavigation {
            url: target,
            push_state,
            generation: self.generation,
            request,
        })
    }

    /// Second half of a navigation: swap in the fetched content, or fall
    /// back to a full load on failure. Stale navigations are discarded.
    pub fn complete_navigation(
        &mut self,
        pending: PendingNavigation,
        result: Result<FetchResponse>,
    ) -> NavigationOutcome {
        let is_latest = matches!(
            self.state,
            NavState::Pending { generation, .. } if generation == pending.generation
        );
        if !is_latest {
            log::debug!(
                "Discarding superseded navigation #{} to {}",
                pending.generation,
                pending.url
            );
            return NavigationOutcome::Superseded {
                url: pending.url.to_string(),
                generation: pending.generation,
            };
        }

        match result.and_then(FetchResponse::error_for_status) {
            Ok(response) => self.swap_in(&pending, &response),
            Err(e) => self.fall_back(pending.url.as_str(), &e),
        }
    }

    fn swap_in(&mut self, pending: &PendingNavigation, response: &FetchResponse) -> NavigationOutcome {
        let url = pending.url.to_string();
        let path = pending.url.path().to_string();

        let fetched = parse_document(&response.text());
        let fragment = extract_fragment(&fetched, &self.config);

        self.events.emit(
            &NavEvent::BeforeReplace {
                url: url.clone(),
                path: path.clone(),
                content: fetched.inner_html(fragment),
            },
            &mut self.page.document,
        );

        let title = fetched.title();
        self.page.document.set_title(&title);

        let doc = &mut self.page.document;
        doc.clear_children(self.container);
        for &child in fetched.children(fragment) {
            let copy = doc.import_node(&fetched, child);
            doc.append_child(self.container, copy);
        }

        if pending.push_state {
            self.page.push_state(&pending.url, &title);
        }

        execute_scripts(&mut self.page.document, self.container, self.scripts.as_mut());
        let reinitialized = reinitialize_components(
            &mut self.page.document,
            self.container,
            &mut self.components,
            &path,
        );
        for event in &reinitialized {
            self.events.emit(event, &mut self.page.document);
        }

        self.indicator.hide(&mut self.page.document);
        self.page.scroll_to(0, 0);
        self.state = NavState::Idle;

        self.run_on_load(&url, &path);

        let title = self.page.title();
        self.events.emit(
            &NavEvent::Complete {
                url: url.clone(),
                path: path.clone(),
                title: title.clone(),
            },
            &mut self.page.document,
        );
        self.events.emit(
            &NavEvent::AfterReplace {
                url: url.clone(),
                path: path.clone(),
            },
            &mut self.page.document,
        );

        log::debug!("Navigation #{} to {url} complete", pending.generation);
        NavigationOutcome::Completed { url, path, title }
    }

    /// Abandon the navigation and hand `url` to a full page load.
    fn fall_back(&mut self, url: &str, reason: &PjaxError) -> NavigationOutcome {
        log::error!("PJAX navigation error: {reason}");
        self.indicator.hide(&mut self.page.document);
        self.indicator
            .clear_transition(&mut self.page.document, self.container);
        self.state = NavState::Idle;
        self.page.assign_location(url);
        NavigationOutcome::FellBack {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    fn run_on_load(&mut self, url: &str, path: &str) {
        if let Some(descriptor) = self.registry.get_page_handler_mut(path) {
            descriptor.run_on_load(&mut NavigationContext {
                document: &mut self.page.document,
                container: self.container,
                url,
                path,
            });
        }
    }
}

impl<F: Fetcher> std::fmt::Debug for Navigator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("location", &self.page.location().as_str())
            .field("container", &self.container)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
