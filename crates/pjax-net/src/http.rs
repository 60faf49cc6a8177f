//! Blocking HTTP/1.1 GET client over `std::net::TcpStream`.
//!
//! Follows redirects (301/302/303/307/308) up to the configured limit,
//! decodes chunked and `Content-Length` bodies, and caps bodies at
//! [`MAX_BODY_SIZE`]. A body cut short by the peer or by the read timeout
//! is a network error, never a partial success. HTTPS needs the
//! `tls-rustls` feature; without it HTTPS URLs are rejected so the caller
//! falls back to a full browser load.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use pjax_types::config::HttpConfig;
use pjax_types::error::{PjaxError, Result};
use url::Url;

use crate::{FetchRequest, FetchResponse, Fetcher, find_header};

/// Maximum response body size (8 MB).
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Production [`Fetcher`] backed by [`http_get`].
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    config: HttpConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchResponse> {
        http_get(request, &self.config)
    }
}

/// Perform a GET for `request`, following redirects.
///
/// Error statuses are returned as responses; only transport and
/// protocol failures are errors.
pub fn http_get(request: &FetchRequest, config: &HttpConfig) -> Result<FetchResponse> {
    let mut current = Url::parse(&request.url)?;
    for _ in 0..=config.max_redirects {
        match current.scheme() {
            "http" => {},
            #[cfg(feature = "tls-rustls")]
            "https" => {},
            #[cfg(not(feature = "tls-rustls"))]
            "https" => {
                return Err(PjaxError::Network(format!(
                    "HTTPS is not supported by this client: {current}"
                )));
            },
            other => {
                return Err(PjaxError::Network(format!(
                    "unsupported scheme for HTTP client: {other}"
                )));
            },
        }

        let resp = do_request(&current, request, config)?;

        if is_redirect(resp.status_code)
            && let Some(location) = find_header(&resp.headers, "location")
        {
            log::debug!("{current} redirected ({}) to {location}", resp.status_code);
            current = current.join(location)?;
            continue;
        }

        return Ok(FetchResponse {
            url: current.to_string(),
            status: resp.status_code,
            headers: resp.headers,
            body: resp.body,
        });
    }

    Err(PjaxError::Network("too many redirects".to_string()))
}

// -------------------------------------------------------------------
// Internal types
// -------------------------------------------------------------------

/// A raw parsed HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Headers with lowercased names.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

// -------------------------------------------------------------------
// Internals
// -------------------------------------------------------------------

fn do_request(url: &Url, request: &FetchRequest, config: &HttpConfig) -> Result<HttpResponse> {
    let host = url
        .host_str()
        .ok_or_else(|| PjaxError::InvalidUrl(format!("no host in {url}")))?;
    let port = url.port_or_known_default().unwrap_or(80);

    let mut stream = tcp_connect(host, port, config)?;

    #[cfg(feature = "tls-rustls")]
    if url.scheme() == "https" {
        let mut tls = crate::tls::connect(stream, host)?;
        return parse_response(&exchange(&mut tls, url, request, config)?);
    }

    parse_response(&exchange(&mut stream, url, request, config)?)
}

/// Send the request and read the whole raw response.
fn exchange(
    stream: &mut (impl Read + Write),
    url: &Url,
    request: &FetchRequest,
    config: &HttpConfig,
) -> Result<Vec<u8>> {
    send_request(stream, url, request, config)?;
    stream
        .flush()
        .map_err(|e| PjaxError::Network(format!("send request: {e}")))?;
    read_response(stream)
}

fn tcp_connect(host: &str, port: u16, config: &HttpConfig) -> Result<TcpStream> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| PjaxError::Network(format!("DNS resolution failed: {e}")))?
        .next()
        .ok_or_else(|| PjaxError::Network(format!("no addresses for {host}:{port}")))?;

    let connect_timeout = Duration::from_secs(config.connect_timeout_secs.max(1));
    let stream = TcpStream::connect_timeout(&addr, connect_timeout)
        .map_err(|e| PjaxError::Network(format!("TCP connect failed: {e}")))?;

    stream
        .set_read_timeout(config.read_timeout_secs.map(Duration::from_secs))
        .map_err(|e| PjaxError::Network(format!("set read timeout: {e}")))?;

    Ok(stream)
}

/// Write the request line and headers.
fn send_request(
    stream: &mut impl Write,
    url: &Url,
    request: &FetchRequest,
    config: &HttpConfig,
) -> Result<()> {
    let host_header = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let target = match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    };

    let mut head = format!(
        "GET {target} HTTP/1.1\r\n\
         Host: {host_header}\r\n\
         User-Agent: {}\r\n\
         Accept: text/html,*/*\r\n\
         Connection: close\r\n",
        config.user_agent,
    );
    for (name, value) in &request.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    stream
        .write_all(head.as_bytes())
        .map_err(|e| PjaxError::Network(format!("send request: {e}")))
}

/// Read until EOF. A read timeout is an error: the response may be
/// incomplete.
fn read_response(stream: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 8192];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() + n > MAX_BODY_SIZE + 4096 {
                    return Err(PjaxError::Network("response too large".to_string()));
                }
                buf.extend_from_slice(&chunk[..n]);
            },
            // TLS peers that close without close_notify. Framed bodies are
            // still length-checked by `parse_response`.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Err(PjaxError::Network(format!(
                    "read timed out after {} bytes",
                    buf.len()
                )));
            },
            Err(e) => return Err(PjaxError::Network(format!("read response: {e}"))),
        }
    }
    Ok(buf)
}

/// Split raw bytes into status code, headers and decoded body.
pub fn parse_response(data: &[u8]) -> Result<HttpResponse> {
    let header_end = find_subsequence(data, b"\r\n\r\n").ok_or_else(|| {
        PjaxError::Network("malformed HTTP response: no header terminator".to_string())
    })?;

    let header_str = std::str::from_utf8(&data[..header_end])
        .map_err(|_| PjaxError::Network("non-UTF-8 headers".to_string()))?;
    let mut lines = header_str.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| PjaxError::Network("empty response".to_string()))?;
    let status_code = parse_status_line(status_line)?;

    let headers: Vec<(String, String)> = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let raw_body = &data[header_end + 4..];
    let chunked = find_header(&headers, "transfer-encoding").is_some_and(|v| v.contains("chunked"));
    let body = if chunked {
        decode_chunked(raw_body)?
    } else if let Some(cl) = find_header(&headers, "content-length") {
        let len: usize = cl
            .parse()
            .map_err(|_| PjaxError::Network("bad Content-Length".to_string()))?;
        if len > MAX_BODY_SIZE {
            return Err(PjaxError::Network("response body exceeds 8 MB limit".to_string()));
        }
        if raw_body.len() < len {
            return Err(truncated(raw_body.len(), Some(len)));
        }
        raw_body[..len].to_vec()
    } else {
        raw_body.to_vec()
    };

    if body.len() > MAX_BODY_SIZE {
        return Err(PjaxError::Network("response body exceeds 8 MB limit".to_string()));
    }

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

/// `HTTP/1.x NNN reason` -> `NNN`.
fn parse_status_line(line: &str) -> Result<u16> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(PjaxError::Network(format!("bad status line: {line}")));
    }
    parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| PjaxError::Network(format!("bad status code in: {line}")))
}

fn decode_chunked(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut pos = 0;

    loop {
        let Some(i) = find_subsequence(&data[pos..], b"\r\n") else {
            // No terminating zero-size chunk.
            return Err(truncated(result.len(), None));
        };
        let line_end = pos + i;
        let size_line = std::str::from_utf8(&data[pos..line_end])
            .map_err(|_| PjaxError::Network("bad chunk size".to_string()))?;
        // Chunk extensions follow `;`.
        let size_str = size_line.split(';').next().unwrap_or_default().trim();
        let chunk_size = usize::from_str_radix(size_str, 16)
            .map_err(|_| PjaxError::Network("bad chunk size".to_string()))?;
        if chunk_size == 0 {
            return Ok(result);
        }

        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + chunk_size;
        if result.len() + chunk_size > MAX_BODY_SIZE {
            return Err(PjaxError::Network("chunked body exceeds 8 MB limit".to_string()));
        }
        if chunk_end + 2 > data.len() {
            return Err(truncated(result.len(), None));
        }
        result.extend_from_slice(&data[chunk_start..chunk_end]);
        pos = chunk_end + 2;
    }
}

fn truncated(received: usize, expected: Option<usize>) -> PjaxError {
    match expected {
        Some(len) => PjaxError::Network(format!("truncated body: {received} of {len} bytes")),
        None => PjaxError::Network(format!("truncated body: chunked stream ended after {received} bytes")),
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serve the given raw responses, one per connection, reporting
    /// each received request head on the returned channel.
    fn serve(responses: Vec<String>) -> (u16, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for resp in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());
                let _ = stream.write_all(resp.as_bytes());
                let _ = stream.flush();
            }
        });
        (port, rx)
    }

    #[test]
    fn parse_simple_response() {
        let raw = b"HTTP/1.1 200 OK\r\n\
                     Content-Type: text/html\r\n\
                     Content-Length: 13\r\n\
                     \r\n\
                     <html>hi</html>";
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(find_header(&resp.headers, "content-type"), Some("text/html"));
        assert_eq!(resp.body, b"<html>hi</htm");
    }

    #[test]
    fn parse_error_status_is_not_an_error() {
        let raw = b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\n\r\noops";
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.body, b"oops");
    }

    #[test]
    fn parse_chunked_response() {
        let raw = b"HTTP/1.1 200 OK\r\n\
                     Transfer-Encoding: chunked\r\n\
                     \r\n\
                     5;ext=1\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.body, b"hello world");
    }

    #[test]
    fn short_content_length_body_is_error() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n<main id=\"content\"><p>half";
        let err = parse_response(raw).unwrap_err();
        assert!(matches!(err, PjaxError::Network(_)));
        assert!(format!("{err}").contains("truncated body"), "{err}");
    }

    #[test]
    fn chunk_overrunning_data_is_error() {
        assert!(decode_chunked(b"a\r\nhello").is_err());
        assert!(decode_chunked(b"5\r\nhello").is_err());
    }

    #[test]
    fn chunked_without_terminator_is_error() {
        let err = decode_chunked(b"5\r\nhello\r\n").unwrap_err();
        assert!(format!("{err}").contains("after 5 bytes"), "{err}");
        assert!(decode_chunked(b"").is_err());
    }

    #[test]
    fn unframed_body_reads_to_eof() {
        let resp = parse_response(b"HTTP/1.0 200 OK\r\n\r\n<p>all</p>").unwrap();
        assert_eq!(resp.body, b"<p>all</p>");
    }

    #[test]
    fn missing_header_terminator_is_error() {
        assert!(parse_response(b"HTTP/1.1 200 OK\r\n").is_err());
    }

    #[test]
    fn status_line_parsing() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK").unwrap(), 200);
        assert_eq!(parse_status_line("HTTP/1.0 404").unwrap(), 404);
        assert!(parse_status_line("garbage").is_err());
        assert!(parse_status_line("HTTP/1.1 abc").is_err());
    }

    #[test]
    fn max_body_enforced_content_length() {
        let header = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", MAX_BODY_SIZE + 1);
        let err = parse_response(header.as_bytes()).unwrap_err();
        assert!(format!("{err}").contains("8 MB"));
    }

    #[test]
    fn redirect_codes() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(code));
        }
        assert!(!is_redirect(200));
        assert!(!is_redirect(304));
    }

    #[cfg(not(feature = "tls-rustls"))]
    #[test]
    fn https_rejected() {
        let req = FetchRequest::new("https://example.com/");
        let err = http_get(&req, &HttpConfig::default()).unwrap_err();
        assert!(format!("{err}").contains("HTTPS is not supported"));
    }

    #[cfg(feature = "tls-rustls")]
    #[test]
    fn https_is_attempted() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let req = FetchRequest::new(&format!("https://127.0.0.1:{port}/"));
        let err = http_get(&req, &HttpConfig::default()).unwrap_err();
        assert!(format!("{err}").contains("TCP connect failed"), "{err}");
    }

    #[cfg(feature = "tls-rustls")]
    #[test]
    fn https_to_plain_server_is_network_error() {
        let (port, _requests) = serve(vec!["HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok".to_string()]);
        let req = FetchRequest::new(&format!("https://127.0.0.1:{port}/"));
        let err = http_get(&req, &HttpConfig::default()).unwrap_err();
        assert!(matches!(err, PjaxError::Network(_)), "{err}");
    }

    #[test]
    fn unsupported_scheme_rejected() {
        let req = FetchRequest::new("ftp://example.com/file");
        let err = http_get(&req, &HttpConfig::default()).unwrap_err();
        assert!(format!("{err}").contains("unsupported scheme"));
    }

    #[test]
    fn sends_fragment_header_and_reads_body() {
        let (port, requests) = serve(vec![
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\n\r\n<p>page</p>"
                .to_string(),
        ]);
        let req = FetchRequest::new(&format!("http://127.0.0.1:{port}/about.html?x=1"))
            .with_header("X-Requested-With", "XMLHttpRequest");
        let mut fetcher = HttpFetcher::default();
        let resp = fetcher.fetch(&req).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text(), "<p>page</p>");

        let head = requests.recv().unwrap();
        assert!(head.starts_with("GET /about.html?x=1 HTTP/1.1\r\n"), "{head}");
        assert!(head.contains("X-Requested-With: XMLHttpRequest\r\n"), "{head}");
        assert!(head.contains(&format!("Host: 127.0.0.1:{port}\r\n")), "{head}");
    }

    #[test]
    fn follows_relative_redirect() {
        let (port, _requests) = serve(vec![
            "HTTP/1.1 302 Found\r\nLocation: /coc.html\r\nContent-Length: 0\r\n\r\n".to_string(),
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok".to_string(),
        ]);
        let req = FetchRequest::new(&format!("http://127.0.0.1:{port}/old"));
        let resp = http_get(&req, &HttpConfig::default()).unwrap();
        assert_eq!(resp.url, format!("http://127.0.0.1:{port}/coc.html"));
        assert_eq!(resp.body, b"ok");
    }

    #[test]
    fn too_many_redirects() {
        let config = HttpConfig {
            max_redirects: 1,
            ..HttpConfig::default()
        };
        let (port, _requests) = serve(vec![
            "HTTP/1.1 301 Moved\r\nLocation: /a\r\nContent-Length: 0\r\n\r\n".to_string(),
            "HTTP/1.1 301 Moved\r\nLocation: /b\r\nContent-Length: 0\r\n\r\n".to_string(),
        ]);
        let req = FetchRequest::new(&format!("http://127.0.0.1:{port}/start"));
        let err = http_get(&req, &config).unwrap_err();
        assert!(format!("{err}").contains("too many redirects"));
    }

    #[test]
    fn connection_closed_mid_body_is_error() {
        let (port, _requests) = serve(vec![
            "HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\n<main id=\"content\"><p>partial".to_string(),
        ]);
        let req = FetchRequest::new(&format!("http://127.0.0.1:{port}/about.html"));
        let err = http_get(&req, &HttpConfig::default()).unwrap_err();
        assert!(format!("{err}").contains("truncated body"), "{err}");
    }

    #[test]
    fn read_timeout_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 50\r\n\r\n<p>slow");
            let _ = stream.flush();
            std::thread::sleep(Duration::from_secs(3));
        });
        let config = HttpConfig {
            read_timeout_secs: Some(1),
            ..HttpConfig::default()
        };
        let req = FetchRequest::new(&format!("http://127.0.0.1:{port}/slow.html"));
        let err = http_get(&req, &config).unwrap_err();
        assert!(format!("{err}").contains("timed out"), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn connection_refused_is_network_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let req = FetchRequest::new(&format!("http://127.0.0.1:{port}/"));
        let err = http_get(&req, &HttpConfig::default()).unwrap_err();
        assert!(matches!(err, PjaxError::Network(_)));
    }
}
