//! The seam between request building and network I/O.

#[cfg(feature = "ureq-transport")]
mod ureq_impl;

#[cfg(feature = "ureq-transport")]
pub use ureq_impl::UreqTransport;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip, blocking until it completes or times out.
///
/// Implementations send the request exactly as described: method, absolute
/// URL, headers and body. Non-2xx statuses are returned as data, never as an
/// error; only failures to obtain a response at all are `TransportError`s.
///
/// Bring your own implementation to use a different HTTP stack or to stub the
/// network out in tests.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}
