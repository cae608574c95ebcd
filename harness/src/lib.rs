//! Test harness for HTTP servers.
//!
//! # Overview
//! A `TestCase` starts an axum router on a port derived from its request
//! options, issues requests against it through a blocking transport, and
//! evaluates each response with a list of `Checker`s.
//!
//! # Design
//! - Lifecycle: `set_up` / `tear_down` (or `run`) bracket one test with one
//!   `RunningServer` handle; no process-global server state.
//! - Requests: base `RequestOptions` are merged with per-call path, method
//!   and headers into an `HttpRequest`; the base is never mutated.
//! - Bodies: form fields are encoded as URL-encoded or multipart bodies by
//!   pure functions; the multipart boundary is owned by the test case.
//! - Responses: the body is drained once into a `ResponseSnapshot` and every
//!   checker runs against it, collecting failures into a `Report`.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use http_test_harness::{check_body_contains, check_status, Request, RequestOption, RequestOptions, TestCase};
//!
//! let router = Router::new().route("/", get(|| async { "Hello world!" }));
//! let mut case = TestCase::with_router(router)
//!     .options(RequestOptions::from(vec![RequestOption::Port(0)]));
//! case.run(|case| {
//!     case.issue_request(Request::get("/"), &[check_status(200), check_body_contains("Hello")])
//!         .assert_passed();
//! })
//! .unwrap();
//! ```

pub mod case;
pub mod check;
pub mod error;
pub mod form;
pub mod http;
pub mod logging;
pub mod options;
pub mod server;
pub mod transport;

pub use case::{PostRequest, Request, TestCase};
pub use check::{
    check_body_contains, check_body_equals, check_header, check_json, check_status, run_checks,
    Checker, Failure, Report,
};
pub use error::{EncodeError, HarnessError, TransportError};
pub use form::{encode_multipart, encode_urlencoded, Boundary, Encoding, FieldMap};
pub use http::{Headers, HttpMethod, HttpRequest, ResponseMeta, ResponseSnapshot, UnknownMethod};
pub use logging::init_test_logging;
pub use options::{RequestOption, RequestOptions};
pub use server::RunningServer;
pub use transport::{fetch, BodyReader, Transport, UreqTransport};
