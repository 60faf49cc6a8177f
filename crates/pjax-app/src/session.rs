//! A scripted browsing session: full loads, in-place navigations and
//! the hand-off between the two.

use anyhow::{Context, Result};
use pjax_html::NodeId;
use pjax_net::{FetchRequest, Fetcher, HttpFetcher};
use pjax_nav::{
    DomEvent, EventDisposition, History, HistoryState, NavigationBar, NavigationOutcome, Navigator,
    Page, PageRegistry,
};
use pjax_types::config::PjaxConfig;

/// One scripted action.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Call `navigate_to` directly.
    Navigate(String),
    /// Click the first link whose `href` attribute equals the value.
    Click(String),
    Back,
    Forward,
}

impl Step {
    pub fn parse(arg: &str) -> Self {
        match arg {
            "back" => Self::Back,
            "forward" => Self::Forward,
            _ => match arg.strip_prefix("click:") {
                Some(href) => Self::Click(href.to_string()),
                None => Self::Navigate(arg.to_string()),
            },
        }
    }
}

/// Load `url` the way a browser does without the navigator: plain GET,
/// new document, new history entry.
pub fn full_load(config: &PjaxConfig, url: &str, mut history: History) -> Result<Page> {
    let mut fetcher = HttpFetcher::new(config.http.clone());
    let response = fetcher
        .fetch(&FetchRequest::new(url))
        .with_context(|| format!("full load of {url}"))?;
    if !response.is_ok() {
        log::warn!("{url} answered with status {}", response.status);
    }

    let mut page = Page::from_html(&response.url, &response.text())?;
    history.push_state(HistoryState::for_url(page.location()), &page.title());
    page.history = history;
    log::info!("Loaded {} \"{}\"", page.location(), page.title());
    Ok(page)
}

/// Start a navigator on `page` with the navigation bar attached.
pub fn attach(mut page: Page, registry: PageRegistry, config: &PjaxConfig) -> Navigator<HttpFetcher> {
    let bar = NavigationBar::new(config);
    let path = page.path().to_string();
    bar.render_all(&mut page.document, &path);

    let fetcher = HttpFetcher::new(config.http.clone());
    let mut navigator = Navigator::new(page, fetcher, registry, config.clone());
    navigator
        .components_mut()
        .register(bar.tag(), Box::new(bar.clone()));
    navigator.subscribe(Box::new(bar));
    navigator
}

/// Perform `step`. Returns `None` when nothing was navigated in place.
pub fn run_step<F: Fetcher>(navigator: &mut Navigator<F>, step: &Step) -> Option<NavigationOutcome> {
    match step {
        Step::Navigate(url) => Some(navigator.navigate_to(url, true)),
        Step::Back => navigator.go_back(),
        Step::Forward => navigator.go_forward(),
        Step::Click(href) => {
            let Some(link) = find_link(navigator, href) else {
                log::warn!("No link with href {href:?} on {}", navigator.page().location());
                return None;
            };
            match navigator.dispatch(DomEvent::Click { target: link }) {
                EventDisposition::Handled(outcome) => Some(outcome),
                EventDisposition::PassThrough => {
                    // Default action: the browser follows the link itself.
                    match navigator.page().location().join(href) {
                        Ok(url) => navigator.page_mut().assign_location(url.as_str()),
                        Err(e) => log::warn!("Cannot follow {href:?}: {e}"),
                    }
                    None
                },
            }
        },
    }
}

/// Carry out a pending full-load request, replacing the navigator.
/// History and page registrations survive the reload. A reload that
/// fails is logged and the session stays on the current page.
pub fn settle(mut navigator: Navigator<HttpFetcher>, config: &PjaxConfig) -> Navigator<HttpFetcher> {
    let Some(url) = navigator.page_mut().take_full_load_request() else {
        return navigator;
    };
    match full_load(config, &url, navigator.page().history.clone()) {
        Ok(page) => attach(page, navigator.into_registry(), config),
        Err(e) => {
            log::error!(
                "Full load failed, staying on {}: {e:#}",
                navigator.page().location()
            );
            navigator
        },
    }
}

fn find_link<F: Fetcher>(navigator: &Navigator<F>, href: &str) -> Option<NodeId> {
    let doc = &navigator.page().document;
    doc.elements_by_tag(doc.root, "a")
        .into_iter()
        .find(|&a| doc.get_attribute(a, "href") == Some(href))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pjax_net::FetchResponse;
    use pjax_types::error::PjaxError;
    use std::collections::HashMap;

    struct Site(HashMap<String, String>);

    impl Fetcher for Site {
        fn fetch(&mut self, request: &FetchRequest) -> pjax_types::error::Result<FetchResponse> {
            self.0
                .get(&request.url)
                .map(|html| FetchResponse::html(&request.url, html))
                .ok_or_else(|| PjaxError::Network(format!("no route for {}", request.url)))
        }
    }

    fn page_html(title: &str, body: &str) -> String {
        format!(
            "<title>{title}</title><navigation-bar></navigation-bar>\
             <main id=\"content\">{body}</main><site-footer></site-footer>"
        )
    }

    fn navigator() -> Navigator<Site> {
        let routes = HashMap::from([
            ("http://site.test/coc.html".to_string(), page_html("CoC", "<h1>CoC</h1>")),
            ("http://site.test/".to_string(), page_html("Home", "<h1>Home</h1>")),
        ]);
        let page = Page::from_html(
            "http://site.test/",
            &page_html(
                "Home",
                "<a href=\"./coc.html\">CoC</a><a href=\"/file.pdf\" download>PDF</a>",
            ),
        )
        .unwrap();
        Navigator::new(page, Site(routes), PageRegistry::new(), PjaxConfig::default())
    }

    #[test]
    fn parse_steps() {
        assert_eq!(Step::parse("back"), Step::Back);
        assert_eq!(Step::parse("forward"), Step::Forward);
        assert_eq!(Step::parse("click:./coc.html"), Step::Click("./coc.html".to_string()));
        assert_eq!(Step::parse("/blog.html"), Step::Navigate("/blog.html".to_string()));
    }

    #[test]
    fn click_step_navigates_in_place() {
        let mut nav = navigator();
        let outcome = run_step(&mut nav, &Step::Click("./coc.html".to_string())).unwrap();
        assert!(outcome.is_completed());
        assert_eq!(nav.page().path(), "/coc.html");

        let back = run_step(&mut nav, &Step::Back).unwrap();
        assert_eq!(back.url(), "http://site.test/");
        assert!(run_step(&mut nav, &Step::Back).is_none());
    }

    #[test]
    fn pass_through_click_requests_full_load() {
        let mut nav = navigator();
        assert!(run_step(&mut nav, &Step::Click("/file.pdf".to_string())).is_none());
        assert_eq!(nav.page().full_load_request(), Some("http://site.test/file.pdf"));
    }

    #[test]
    fn failed_reload_keeps_current_page() {
        let config = PjaxConfig::default();
        let page = Page::from_html("http://site.test/", &page_html("Home", "<h1>Home</h1>")).unwrap();
        let mut nav = attach(page, PageRegistry::new(), &config);
        nav.page_mut().assign_location("http://[broken");

        let nav = settle(nav, &config);

        assert_eq!(nav.page().location().as_str(), "http://site.test/");
        assert_eq!(nav.page().title(), "Home");
        assert!(nav.page().full_load_request().is_none());
    }

    #[test]
    fn settle_without_request_is_a_no_op() {
        let config = PjaxConfig::default();
        let page = Page::from_html("http://site.test/", &page_html("Home", "<h1>Home</h1>")).unwrap();
        let nav = settle(attach(page, PageRegistry::new(), &config), &config);
        assert_eq!(nav.page().path(), "/");
    }

    #[test]
    fn missing_link_does_nothing() {
        let mut nav = navigator();
        assert!(run_step(&mut nav, &Step::Click("/nowhere.html".to_string())).is_none());
        assert!(nav.page().full_load_request().is_none());
    }
}
