use log::trace;

use super::Transport;
use crate::config::TransportOptions;
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Blocking `Transport` backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with the default 10s connect / 60s total timeouts.
    pub fn new() -> Self {
        Self::with_options(TransportOptions::default())
    }

    pub fn with_options(options: TransportOptions) -> Self {
        Self {
            agent: ureq::Agent::config_builder()
                .timeout_connect(Some(options.connect_timeout))
                .timeout_global(Some(options.timeout))
                // Status codes are data for the caller, not transport failures.
                .http_status_as_error(false)
                .build()
                .new_agent(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().unwrap_or_default();

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), &request.headers).call(),
            HttpMethod::Post => {
                with_headers(self.agent.post(url), &request.headers).send(body.as_bytes())
            }
            HttpMethod::Put => {
                with_headers(self.agent.put(url), &request.headers).send(body.as_bytes())
            }
        };
        let mut response = result.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // No cap on body size; large listings are legitimate.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(map_error)?;
        trace!("{} {url} -> {status} ({} bytes)", request.method, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        // ureq derives Content-Length from the body it sends.
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn map_error(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound => TransportErrorKind::HostNotFound,
        ureq::Error::ConnectionFailed => TransportErrorKind::ConnectionFailed,
        ureq::Error::BadUri(_) => TransportErrorKind::InvalidUrl,
        ureq::Error::Io(_) => TransportErrorKind::Io,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}
