//! Request / Response Model
//!
//! Minimal fetch-style request and response types plus the URL view used to
//! derive cache keys.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Default for RequestMethod {
    fn default() -> Self {
        Self::Get
    }
}

impl RequestMethod {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

/// Request mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Same-origin only
    SameOrigin,
    /// No CORS
    NoCors,
    /// CORS
    Cors,
    /// Top-level document load
    Navigate,
}

impl Default for RequestMode {
    fn default() -> Self {
        Self::Cors
    }
}

/// Fetch request
#[derive(Debug, Clone)]
pub struct Request {
    /// Request URL, absolute or origin-relative
    pub url: String,
    /// HTTP method
    pub method: RequestMethod,
    /// Request mode
    pub mode: RequestMode,
    /// Request headers (names stored lowercase)
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::Get,
            mode: RequestMode::Cors,
            headers: BTreeMap::new(),
        }
    }

    /// Create a top-level navigation request
    pub fn navigate(url: impl Into<String>) -> Self {
        let mut request = Self::get(url);
        request.mode = RequestMode::Navigate;
        request.headers.insert(
            "accept".to_string(),
            "text/html,application/xhtml+xml".to_string(),
        );
        request
    }

    /// Set the method
    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Whether the `Accept` header asks for HTML
    pub fn accepts_html(&self) -> bool {
        self.header("accept")
            .map(|accept| accept.contains("text/html"))
            .unwrap_or(false)
    }

    /// Parsed view over the URL
    pub fn url_parts(&self) -> UrlParts<'_> {
        UrlParts::parse(&self.url)
    }
}

/// Fetch response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Status text
    pub status_text: String,
    /// Response headers (names stored lowercase)
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Create an empty response with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: status_text_for(status).to_string(),
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Create a 200 response with a body
    pub fn ok_with_body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200).with_body(body)
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Only plain 200 responses may enter a cache generation
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}

/// Get status text for status code
fn status_text_for(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// Borrowed view over a request URL.
///
/// Origin-relative URLs (`/a?b`) have no origin. The fragment is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    /// `scheme://host[:port]`, if the URL is absolute
    pub origin: Option<&'a str>,
    /// Path, never empty
    pub path: &'a str,
    /// Query string without the leading `?`, if non-empty
    pub query: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    /// Split a URL into origin, path and query.
    pub fn parse(url: &'a str) -> Self {
        let url = match url.find('#') {
            Some(pos) => &url[..pos],
            None => url,
        };

        let (origin, rest) = match authority_start(url) {
            Some(host_start) => {
                let host_end = url[host_start..]
                    .find(|c: char| c == '/' || c == '?')
                    .map(|pos| host_start + pos)
                    .unwrap_or(url.len());
                (Some(&url[..host_end]), &url[host_end..])
            }
            None => (None, url),
        };

        let (path, query) = match rest.find('?') {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };

        Self {
            origin,
            path: if path.is_empty() { "/" } else { path },
            query: query.filter(|q| !q.is_empty()),
        }
    }

    /// Relative URLs always belong to the page's origin. A
    /// protocol-relative URL (`//host/..`) is compared by host.
    pub fn is_same_origin(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        match self.origin {
            Some(own) => match own.strip_prefix("//") {
                Some(host) => origin
                    .split_once("://")
                    .map_or(false, |(_, own_host)| own_host.eq_ignore_ascii_case(host)),
                None => own.eq_ignore_ascii_case(origin),
            },
            None => true,
        }
    }

    /// Whether the URL carries a query string
    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// Cache key: path plus query
    pub fn cache_key(&self) -> String {
        match self.query {
            Some(query) => alloc::format!("{}?{}", self.path, query),
            None => self.path.to_string(),
        }
    }

    /// Cache key with the query stripped
    pub fn path_key(&self) -> String {
        self.path.to_string()
    }
}

/// Offset where the host starts: after `scheme://`, or after a leading `//`.
/// A `://` inside the path or query does not count.
fn authority_start(url: &str) -> Option<usize> {
    if url.starts_with("//") {
        return Some(2);
    }
    let scheme_end = url.find("://")?;
    let scheme = &url[..scheme_end];
    let is_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then_some(scheme_end + 3)
}
