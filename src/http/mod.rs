//! Framework-agnostic HTTP surface.
//!
//! The crate does not run a server. Host frameworks translate their own request and
//! response objects into [`Request`]/[`Response`] and hand them to the
//! [`CacheEndpoint`], the [`DependencyMiddleware`] and any [`ComponentView`].

mod endpoint;
mod middleware;
mod view;

pub use endpoint::CacheEndpoint;
pub use middleware::DependencyMiddleware;
pub use view::ComponentView;

use serde::Serialize;
use std::collections::BTreeMap;

/// Content type of rendered component responses.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// An incoming request.
///
/// Header names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Request {
    /// HTTP method, uppercase.
    pub method: String,
    /// Request path, without query string.
    pub path: String,
    /// Headers keyed by lowercased name.
    #[serde(skip)]
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// Create a request with no headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// An outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// `Content-Type` header.
    pub content_type: String,
    /// Other headers, keyed by name as given.
    pub headers: BTreeMap<String, String>,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response.
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// `200 OK` with an HTML body.
    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, HTML_CONTENT_TYPE, body)
    }

    /// Empty response with the given status.
    pub fn empty(status: u16) -> Self {
        Self::new(status, "text/plain; charset=utf-8", Vec::new())
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the content type is HTML.
    pub fn is_html(&self) -> bool {
        self.content_type.trim_start().to_ascii_lowercase().starts_with("text/html")
    }
}
