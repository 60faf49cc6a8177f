//! Fetching page documents for the navigator.
//!
//! The navigator only talks to the [`Fetcher`] trait, so tests and
//! embedders can substitute their own transport. [`HttpFetcher`] is the
//! production implementation: a blocking HTTP/1.1 GET client, with
//! HTTPS under the `tls-rustls` feature.

pub mod http;
#[cfg(feature = "tls-rustls")]
pub mod tls;

pub use http::HttpFetcher;

use pjax_types::error::{PjaxError, Result};

/// A GET request for a page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Absolute URL.
    pub url: String,
    /// Extra request headers as (name, value) pairs.
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as seen by the navigator.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    /// Lowercased header names.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A 200 response with an HTML body.
    pub fn html(url: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    /// Whether the status is in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Turn a non-2xx response into [`PjaxError::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(PjaxError::Status(self.status))
        }
    }
}

/// Transport used by the navigator to retrieve pages.
pub trait Fetcher {
    /// Perform a GET. Transport failures are errors; HTTP error
    /// statuses are returned as responses.
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse> {
        (**self).fetch(request)
    }
}

/// Case-insensitive header lookup.
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_range() {
        let mut resp = FetchResponse::html("http://a/", "x");
        assert!(resp.is_ok());
        resp.status = 299;
        assert!(resp.is_ok());
        resp.status = 304;
        assert!(!resp.is_ok());
        resp.status = 500;
        assert!(!resp.is_ok());
    }

    #[test]
    fn error_for_status() {
        let mut resp = FetchResponse::html("http://a/", "x");
        resp.status = 404;
        let err = resp.error_for_status().unwrap_err();
        assert_eq!(format!("{err}"), "HTTP error! status: 404");
    }

    #[test]
    fn lossy_text() {
        let mut resp = FetchResponse::html("http://a/", "");
        resp.body = vec![b'o', b'k', 0xFF];
        assert_eq!(resp.text(), "ok\u{FFFD}");
    }

    #[test]
    fn request_headers_case_insensitive() {
        let req = FetchRequest::new("http://a/").with_header("X-Requested-With", "XMLHttpRequest");
        assert_eq!(req.header("x-requested-with"), Some("XMLHttpRequest"));
        assert_eq!(req.header("accept"), None);
    }
}
