//! Error types for the test harness.
//!
//! # Design
//! Only conditions that must abort a test travel as `Err`. A failed fetch or
//! a failing checker is not an error here; it lands in a `Report` so that
//! one request can surface several independent assertion failures.

use thiserror::Error;

/// Errors that stop a test before or while a request is being prepared.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Setup was attempted without a router to serve.
    #[error("no router configured for the test case")]
    NoRouter,

    /// The server-under-test could not bind its listener.
    #[error("could not bind server to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The runtime driving the server-under-test failed to start.
    #[error("server runtime failed: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A Field Map entry that cannot be represented in the chosen body encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Percent-encoding an empty name yields no token.
    #[error("field name is empty")]
    EmptyFieldName,

    /// The name cannot be placed inside a quoted `Content-Disposition` parameter.
    #[error("field name {0:?} cannot be used in a multipart part header")]
    InvalidMultipartName(String),
}

/// Failures raised by a `Transport` while fetching a response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response object was produced.
    #[error("{0}")]
    Request(String),

    /// The response body could not be drained.
    #[error("reading response body: {0}")]
    Io(#[from] std::io::Error),
}
