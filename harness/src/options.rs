//! Request option accumulation and port resolution.
//!
//! # Design
//! `RequestOptions` is an ordered list of typed options. A test case holds
//! one base list; every call merges a copy of it with the call's path,
//! method and headers, so the base list is never mutated. Resolution into an
//! `HttpRequest` takes the last value of each single-valued option and
//! concatenates every header set in order.

use std::time::Duration;

use tracing::debug;

use crate::http::{Headers, HttpMethod, HttpRequest};

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PATH: &str = "/";
pub const HTTP_PORT: u16 = 80;
pub const HTTPS_PORT: u16 = 443;

/// A single typed request option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    /// `"http"`, `"https"`, optionally written with a trailing `://`.
    Scheme(String),
    Host(String),
    /// Port `0` asks the server for an ephemeral port.
    Port(u16),
    Path(String),
    Method(HttpMethod),
    Headers(Headers),
    /// Transport-specific: handed to the transport as its overall timeout.
    Timeout(Duration),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions(Vec<RequestOption>);

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, option: RequestOption) -> Self {
        self.0.push(option);
        self
    }

    pub fn push(&mut self, option: RequestOption) {
        self.0.push(option);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RequestOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Port the server-under-test should bind.
    ///
    /// Scans the whole list: an explicit port wins wherever it appears (the
    /// last one if there are several); otherwise the first scheme picks 443
    /// for https and 80 for anything else; with neither, 80.
    pub fn resolve_port(&self) -> u16 {
        let mut explicit = None;
        let mut from_scheme = None;
        for option in &self.0 {
            match option {
                RequestOption::Port(port) => explicit = Some(*port),
                RequestOption::Scheme(scheme) if from_scheme.is_none() => {
                    from_scheme = Some(default_port(scheme));
                }
                _ => {}
            }
        }
        let port = explicit.or(from_scheme).unwrap_or(HTTP_PORT);
        debug!(port, "resolved listen port");
        port
    }

    /// Copy of these options with the per-call overrides appended.
    ///
    /// Headers are appended only when supplied.
    pub fn merged(&self, path: &str, method: HttpMethod, headers: Option<&Headers>) -> Self {
        let mut merged = self.clone();
        merged.push(RequestOption::Path(path.to_string()));
        merged.push(RequestOption::Method(method));
        if let Some(headers) = headers {
            merged.push(RequestOption::Headers(headers.clone()));
        }
        merged
    }

    /// Resolve into a request descriptor aimed at `port`.
    pub fn to_request(&self, port: u16, body: Option<Vec<u8>>) -> HttpRequest {
        let mut request = HttpRequest {
            method: HttpMethod::default(),
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port,
            path: DEFAULT_PATH.to_string(),
            headers: Vec::new(),
            body,
            timeout: None,
        };
        for option in &self.0 {
            match option {
                RequestOption::Scheme(scheme) => request.scheme = normalize_scheme(scheme),
                RequestOption::Host(host) => request.host = host.clone(),
                RequestOption::Path(path) => request.path = path.clone(),
                RequestOption::Method(method) => request.method = *method,
                RequestOption::Headers(headers) => request.headers.extend(headers.iter().cloned()),
                RequestOption::Timeout(timeout) => request.timeout = Some(*timeout),
                RequestOption::Port(_) => {}
            }
        }
        request
    }
}

impl FromIterator<RequestOption> for RequestOptions {
    fn from_iter<I: IntoIterator<Item = RequestOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<RequestOption>> for RequestOptions {
    fn from(options: Vec<RequestOption>) -> Self {
        Self(options)
    }
}

fn normalize_scheme(scheme: &str) -> String {
    scheme.trim_end_matches("://").to_ascii_lowercase()
}

fn default_port(scheme: &str) -> u16 {
    if normalize_scheme(scheme) == "https" {
        HTTPS_PORT
    } else {
        HTTP_PORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(s: &str) -> RequestOption {
        RequestOption::Scheme(s.to_string())
    }

    #[test]
    fn empty_options_resolve_to_80() {
        assert_eq!(RequestOptions::new().resolve_port(), 80);
    }

    #[test]
    fn https_scheme_resolves_to_443() {
        let options = RequestOptions::from(vec![scheme("https://")]);
        assert_eq!(options.resolve_port(), 443);
    }

    #[test]
    fn http_scheme_resolves_to_80() {
        let options = RequestOptions::from(vec![scheme("http")]);
        assert_eq!(options.resolve_port(), 80);
    }

    #[test]
    fn scheme_comparison_ignores_case() {
        let options = RequestOptions::from(vec![scheme("HTTPS")]);
        assert_eq!(options.resolve_port(), 443);
    }

    #[test]
    fn unknown_scheme_falls_back_to_80() {
        let options = RequestOptions::from(vec![scheme("ftp://")]);
        assert_eq!(options.resolve_port(), 80);
    }

    #[test]
    fn explicit_port_wins_after_scheme() {
        let options = RequestOptions::from(vec![scheme("https://"), RequestOption::Port(9090)]);
        assert_eq!(options.resolve_port(), 9090);
    }

    // Regression: an early exit on the first match used to make the result
    // depend on option order.
    #[test]
    fn explicit_port_wins_before_scheme() {
        let options = RequestOptions::from(vec![RequestOption::Port(9090), scheme("https://")]);
        assert_eq!(options.resolve_port(), 9090);
    }

    #[test]
    fn first_scheme_supplies_default() {
        let options = RequestOptions::from(vec![scheme("https"), scheme("http")]);
        assert_eq!(options.resolve_port(), 443);
    }

    #[test]
    fn last_explicit_port_wins() {
        let options = RequestOptions::from(vec![RequestOption::Port(1), RequestOption::Port(2)]);
        assert_eq!(options.resolve_port(), 2);
    }

    #[test]
    fn merge_appends_path_and_method_without_touching_base() {
        let base = RequestOptions::new().with(RequestOption::Port(8080));
        let merged = base.merged("/x", HttpMethod::Post, None);

        assert_eq!(base.len(), 1);
        assert_eq!(
            merged.iter().cloned().collect::<Vec<_>>(),
            vec![
                RequestOption::Port(8080),
                RequestOption::Path("/x".to_string()),
                RequestOption::Method(HttpMethod::Post),
            ]
        );
    }

    #[test]
    fn merge_appends_headers_only_when_supplied() {
        let headers = vec![("X-A".to_string(), "1".to_string())];
        let merged = RequestOptions::new().merged("/", HttpMethod::Get, Some(&headers));
        assert_eq!(merged.iter().last(), Some(&RequestOption::Headers(headers)));
    }

    #[test]
    fn overrides_replace_base_path_and_method() {
        let base = RequestOptions::from(vec![
            scheme("HTTPS://"),
            RequestOption::Host("localhost".to_string()),
            RequestOption::Path("/base".to_string()),
            RequestOption::Method(HttpMethod::Put),
        ]);
        let request = base.merged("/call", HttpMethod::Delete, None).to_request(8443, None);

        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.url(), "https://localhost:8443/call");
    }

    #[test]
    fn header_sets_accumulate_in_order() {
        let base = RequestOptions::new()
            .with(RequestOption::Headers(vec![("A".to_string(), "1".to_string())]));
        let call = vec![("B".to_string(), "2".to_string())];
        let request = base.merged("/", HttpMethod::Get, Some(&call)).to_request(80, None);

        assert_eq!(
            request.headers,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn defaults_fill_missing_options() {
        let request = RequestOptions::new().to_request(80, None);
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url(), "http://127.0.0.1:80/");
        assert!(request.timeout.is_none());
    }

    #[test]
    fn timeout_is_carried_through() {
        let options = RequestOptions::new().with(RequestOption::Timeout(Duration::from_secs(3)));
        assert_eq!(options.to_request(80, None).timeout, Some(Duration::from_secs(3)));
    }
}
