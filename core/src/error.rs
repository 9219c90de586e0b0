//! Error types for the CS-Cart client.
//!
//! # Design
//! Two kinds only. `Transport` covers everything that went wrong getting bytes
//! back from the server (DNS, connect, timeout, an empty body). `Protocol`
//! covers everything wrong with the bytes we send or receive (unknown method,
//! unencodable body, undecodable JSON). HTTP status codes are never an error.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error while calling the API. Error code and message: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure reported by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} : {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Coarse classification of transport failures, used as the error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    /// The server could not be resolved.
    HostNotFound,
    /// The TCP or TLS connection could not be established.
    ConnectionFailed,
    /// Connect or total timeout elapsed.
    Timeout,
    /// The URL could not be used for a request.
    InvalidUrl,
    /// Reading or writing the socket failed.
    Io,
    /// The server answered with an empty body.
    EmptyResponse,
    Other,
}

impl TransportErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            TransportErrorKind::HostNotFound => "host_not_found",
            TransportErrorKind::ConnectionFailed => "connection_failed",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::InvalidUrl => "invalid_url",
            TransportErrorKind::Io => "io",
            TransportErrorKind::EmptyResponse => "empty_response",
            TransportErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The response body is not valid JSON.
    #[error("JSON Error: {0}")]
    Json(serde_json::Error),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(serde_json::Error),
}
