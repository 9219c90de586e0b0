//! Synchronous client for the CS-Cart REST API.
//!
//! # Overview
//! `ApiClient` turns a `(method, path, body, query)` tuple into an
//! authenticated `HttpRequest`, hands it to a `Transport`, and decodes the
//! response body into a schema-less `serde_json::Value`.
//!
//! # Design
//! - Request building and response parsing are pure and public
//!   (`build_request` / `parse_response`), so a host can still run its own I/O.
//! - The round-trip itself goes through the `Transport` trait. `UreqTransport`
//!   is the bundled blocking implementation (feature `ureq-transport`).
//! - HTTP status codes are not interpreted. Any response with a JSON body is a
//!   success; callers inspect the decoded value themselves.
//! - Configuration is an explicit `ClientConfig` value, replaced only through
//!   `&mut self`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use client::ApiClient;
pub use config::{ClientConfig, TransportOptions, API_VERSION};
pub use error::{ApiError, ProtocolError, Result, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::Transport;

#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
