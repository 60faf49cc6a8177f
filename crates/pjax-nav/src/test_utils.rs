//! Shared test fixtures: a scripted [`MockFetcher`] and sample pages.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pjax_net::http::parse_response;
use pjax_net::{FetchRequest, FetchResponse, Fetcher};
use pjax_types::error::{PjaxError, Result};

use crate::page::Page;

pub const ORIGIN: &str = "http://site.test";

/// Shared, ordered log of things that happened during a test.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

enum Route {
    Respond(FetchResponse),
    Fail(String),
    /// Raw bytes as they came off the wire.
    Wire(Vec<u8>),
}

/// Fetcher answering from a fixed route table and recording requests.
#[derive(Default)]
pub struct MockFetcher {
    routes: HashMap<String, Route>,
    pub requests: Vec<FetchRequest>,
    journal: Option<Journal>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` with status 200 at `path` under [`ORIGIN`].
    pub fn page(mut self, path: &str, html: &str) -> Self {
        let url = format!("{ORIGIN}{path}");
        self.routes
            .insert(url.clone(), Route::Respond(FetchResponse::html(&url, html)));
        self
    }

    pub fn status(mut self, path: &str, status: u16, body: &str) -> Self {
        let url = format!("{ORIGIN}{path}");
        let mut response = FetchResponse::html(&url, body);
        response.status = status;
        self.routes.insert(url, Route::Respond(response));
        self
    }

    /// Fail requests for `path` with a network error.
    pub fn fail(mut self, path: &str, message: &str) -> Self {
        self.routes
            .insert(format!("{ORIGIN}{path}"), Route::Fail(message.to_string()));
        self
    }

    /// Answer `path` by parsing `raw` with the HTTP client's response
    /// parser.
    pub fn wire(mut self, path: &str, raw: &[u8]) -> Self {
        self.routes
            .insert(format!("{ORIGIN}{path}"), Route::Wire(raw.to_vec()));
        self
    }

    /// Append `fetch <url>` to `journal` for every request.
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(Rc::clone(journal));
        self
    }

    pub fn requested_urls(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.url.as_str()).collect()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.push(request.clone());
        if let Some(journal) = &self.journal {
            journal.borrow_mut().push(format!("fetch {}", request.url));
        }
        match self.routes.get(&request.url) {
            Some(Route::Respond(response)) => Ok(response.clone()),
            Some(Route::Fail(message)) => Err(PjaxError::Network(message.clone())),
            Some(Route::Wire(raw)) => {
                let resp = parse_response(raw)?;
                Ok(FetchResponse {
                    url: request.url.clone(),
                    status: resp.status_code,
                    headers: resp.headers,
                    body: resp.body,
                })
            },
            None => Err(PjaxError::Network(format!("no route for {}", request.url))),
        }
    }
}

/// A full site page: navigation bar, `#content`, footer.
pub fn site_page(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head><body>\
         <navigation-bar></navigation-bar>\
         <main id=\"content\">{content}</main>\
         <site-footer></site-footer></body></html>"
    )
}

/// The standard fixture site.
pub fn site() -> MockFetcher {
    MockFetcher::new()
        .page("/", &site_page("Home", "<h1>Home</h1>"))
        .page("/index.html", &site_page("Home", "<h1>Home</h1>"))
        .page("/about.html", &site_page("About Us", "<h1>About</h1><div class=\"interactive-map\"></div>"))
        .page("/coc.html", &site_page("Code of Conduct", "<h1>Code of Conduct</h1>"))
        .page("/bare.html", "<title>Bare</title><p>no container</p>")
        .status("/broken.html", 500, &site_page("Error", "<h1>500</h1>"))
        .fail("/offline.html", "connection refused")
}

/// A live page at `path` with the given content.
pub fn live_page(path: &str, title: &str, content: &str) -> Page {
    match Page::from_html(&format!("{ORIGIN}{path}"), &site_page(title, content)) {
        Ok(page) => page,
        Err(e) => panic!("fixture page for {path}: {e}"),
    }
}
