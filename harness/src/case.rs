//! The test-case surface: lifecycle plus request issuing.
//!
//! # Design
//! A `TestCase` owns everything that lives as long as one test-case
//! instance: the router to serve, the base request options, the multipart
//! boundary (generated on first use) and the running server handle. Each
//! request merges a copy of the base options, fetches one snapshot through
//! the transport and runs the checkers against it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use axum::Router;
use tracing::{debug, error};

use crate::check::{run_checks, Checker, Report};
use crate::error::HarnessError;
use crate::form::{encode_multipart, encode_urlencoded, Boundary, Encoding, FieldMap, URLENCODED_CONTENT_TYPE};
use crate::http::{Headers, HttpMethod, HttpRequest};
use crate::options::RequestOptions;
use crate::server::{self, RunningServer};
use crate::transport::{fetch, Transport, UreqTransport};

/// One request: `path` plus method (default GET), headers (default none)
/// and body (default none).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub method: HttpMethod,
    pub headers: Option<Headers>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A form POST: `path` and `fields`, URL-encoded unless `encoding` says
/// otherwise, with optional extra headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRequest {
    pub path: String,
    pub fields: FieldMap,
    pub encoding: Encoding,
    pub headers: Option<Headers>,
}

impl PostRequest {
    pub fn new(path: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            path: path.into(),
            fields,
            ..Self::default()
        }
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }
}

/// One test-case instance: the router under test, the base request options
/// shared by its requests, its multipart boundary and, between `set_up` and
/// `tear_down`, the running server.
pub struct TestCase {
    router: Option<Router>,
    options: RequestOptions,
    transport: Box<dyn Transport>,
    boundary: OnceLock<Boundary>,
    server: Option<RunningServer>,
}

impl Default for TestCase {
    fn default() -> Self {
        Self {
            router: None,
            options: RequestOptions::default(),
            transport: Box::new(UreqTransport),
            boundary: OnceLock::new(),
            server: None,
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("has_router", &self.router.is_some())
            .field("options", &self.options)
            .field("boundary", &self.boundary.get())
            .field("server", &self.server)
            .finish()
    }
}

impl TestCase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_router(router: Router) -> Self {
        Self::new().router(router)
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Base options shared by every request this test case issues.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn request_options(&self) -> &RequestOptions {
        &self.options
    }

    /// Multipart boundary for this instance, generated on first use.
    pub fn boundary(&self) -> &Boundary {
        self.boundary.get_or_init(Boundary::random)
    }

    /// Port of the running server, if one is up.
    pub fn server_port(&self) -> Option<u16> {
        self.server.as_ref().map(RunningServer::port)
    }

    /// Start the server-under-test on the port resolved from the options.
    ///
    /// Any server left from a previous test is stopped first.
    pub fn set_up(&mut self) -> Result<(), HarnessError> {
        self.tear_down();
        let Some(router) = self.router.clone() else {
            error!("set_up called without a router");
            return Err(HarnessError::NoRouter);
        };
        let port = self.options.resolve_port();
        self.server = Some(server::start(port, router)?);
        Ok(())
    }

    /// Stop the server-under-test. Safe to call at any time, any number of times.
    pub fn tear_down(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop();
        }
    }

    /// Run `test` between `set_up` and `tear_down`.
    ///
    /// Teardown happens even when `test` panics; the panic is then resumed.
    /// A setup failure is returned without running `test`.
    pub fn run<F>(&mut self, test: F) -> Result<(), HarnessError>
    where
        F: FnOnce(&TestCase),
    {
        if let Err(err) = self.set_up() {
            self.tear_down();
            return Err(err);
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| test(&*self)));
        self.tear_down();
        if let Err(payload) = outcome {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    /// Issue one request and run `checkers` against its response.
    pub fn issue_request(&self, request: Request, checkers: &[Checker]) -> Report {
        let descriptor = self.descriptor(request);
        self.send(&descriptor, checkers)
    }

    /// Encode `request.fields`, POST them and run `checkers` against the
    /// response. The matching `Content-Type` replaces any supplied one,
    /// whether it came from the base options or from `request.headers`.
    pub fn issue_post_request(
        &self,
        request: PostRequest,
        checkers: &[Checker],
    ) -> Result<Report, HarnessError> {
        let (body, content_type) = match request.encoding {
            Encoding::UrlEncoded => (
                encode_urlencoded(&request.fields)?,
                URLENCODED_CONTENT_TYPE.to_string(),
            ),
            Encoding::Multipart => {
                let boundary = self.boundary();
                (
                    encode_multipart(&request.fields, boundary)?,
                    boundary.content_type(),
                )
            }
        };
        debug!(encoding = ?request.encoding, bytes = body.len(), "encoded form body");

        let mut descriptor = self.descriptor(Request {
            path: request.path,
            method: HttpMethod::Post,
            headers: request.headers,
            body: Some(body.into_bytes()),
        });
        descriptor
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        descriptor
            .headers
            .push(("Content-Type".to_string(), content_type));
        Ok(self.send(&descriptor, checkers))
    }

    /// Merge `request` into the base options, aimed at the running server
    /// or, without one, at the resolved port.
    fn descriptor(&self, request: Request) -> HttpRequest {
        let port = self
            .server_port()
            .unwrap_or_else(|| self.options.resolve_port());
        self.options
            .merged(&request.path, request.method, request.headers.as_ref())
            .to_request(port, request.body)
    }

    fn send(&self, descriptor: &HttpRequest, checkers: &[Checker]) -> Report {
        match fetch(self.transport.as_ref(), descriptor) {
            Ok(snapshot) => run_checks(&snapshot, checkers),
            Err(err) => Report::fetch_failed(err),
        }
    }
}

impl Drop for TestCase {
    fn drop(&mut self) {
        self.tear_down();
    }
}
