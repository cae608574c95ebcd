//! The transport seam: performs the actual HTTP round-trip.
//!
//! # Design
//! `Transport::dispatch` returns response metadata plus an unread body
//! stream. `fetch` drains that stream exactly once into a
//! `ResponseSnapshot`; checkers only ever see the snapshot.

use std::io::Read;

use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpRequest, ResponseMeta, ResponseSnapshot};

/// Unread response body.
pub type BodyReader = Box<dyn Read>;

/// Executes one request and hands back the response head and body stream.
pub trait Transport: Send + Sync {
    fn dispatch(&self, request: &HttpRequest) -> Result<(ResponseMeta, BodyReader), TransportError>;
}

/// Dispatch `request` and drain its body into memory.
pub fn fetch(transport: &dyn Transport, request: &HttpRequest) -> Result<ResponseSnapshot, TransportError> {
    debug!(method = %request.method, url = %request.url(), "dispatching request");
    let (meta, mut reader) = transport.dispatch(request)?;
    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;
    debug!(status = meta.status, bytes = body.len(), "response snapshot taken");
    Ok(ResponseSnapshot { meta, body })
}

/// Blocking transport backed by `ureq`.
///
/// 4xx/5xx responses are returned as data rather than errors so checkers
/// can inspect them.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    fn agent(request: &HttpRequest) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(request.timeout)
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn dispatch(&self, request: &HttpRequest) -> Result<(ResponseMeta, BodyReader), TransportError> {
        let agent = Self::agent(request);
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match &request.body {
            Some(body) => agent.run(builder.body(body.clone()).map_err(request_error)?),
            None => agent.run(builder.body(()).map_err(request_error)?),
        }
        .map_err(request_error)?;

        let meta = ResponseMeta {
            status: response.status().as_u16(),
            headers: response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        };
        let reader = response.into_body().into_reader();
        Ok((meta, Box::new(reader)))
    }
}

fn request_error(err: impl std::fmt::Display) -> TransportError {
    TransportError::Request(err.to_string())
}
