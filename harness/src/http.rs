//! HTTP request and response types described as plain data.
//!
//! # Design
//! The harness resolves options into an `HttpRequest` and hands it to a
//! `Transport`; whatever comes back is drained once into a
//! `ResponseSnapshot`. Nothing downstream of the snapshot touches the
//! network again.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Ordered header list. Duplicate names are allowed and sent in order.
pub type Headers = Vec<(String, String)>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method {0:?}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    /// Case-insensitive, so `"get"` and `"GET"` are the same method.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            _ => return Err(UnknownMethod(s.to_string())),
        };
        Ok(method)
    }
}

/// A fully resolved request descriptor: exactly one method and path, one
/// connection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
    /// Forwarded to the transport untouched.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            Cow::Borrowed(self.path.as_str())
        } else {
            Cow::Owned(format!("/{}", self.path))
        };
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, path)
    }
}

/// Status and headers of a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub headers: Headers,
}

impl ResponseMeta {
    /// First value of the named header; names compare case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response whose body has been drained into memory exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub meta: ResponseMeta,
    pub body: Vec<u8>,
}
