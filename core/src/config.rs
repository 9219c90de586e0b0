//! Client configuration.
//!
//! # Design
//! Credentials and the API root live in `ClientConfig`, built once and handed
//! to `ApiClient`. Transport settings live in `TransportOptions`, whose
//! `Default` is the fixed record every transport starts from. Nothing here is
//! global or mutable behind the caller's back.

use std::time::Duration;

/// Version of this client, reported by `ApiClient::api_version`.
pub const API_VERSION: &str = "0.3";

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = "cscart-api-rust-0.3";

const API_SUFFIX: &str = "/api/";

/// Credentials and API root for one store.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: String,
    user_login: String,
    api_url: String,
}

impl ClientConfig {
    /// Build a configuration for the store at `base_url`.
    ///
    /// `base_url` is the storefront root (`https://shop.example.com`). Leading
    /// and trailing slashes are trimmed and `/api/` is appended, so
    /// `https://shop.example.com///` and `https://shop.example.com` both
    /// resolve to `https://shop.example.com/api/`. Reachability is not checked.
    pub fn new(
        api_key: impl Into<String>,
        user_login: impl Into<String>,
        base_url: &str,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            user_login: user_login.into(),
            api_url: normalize_api_url(base_url),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn user_login(&self) -> &str {
        &self.user_login
    }

    /// The API root, always ending in exactly one `/api/`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

// The API key is a credential; keep it out of debug output.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("user_login", &self.user_login)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn normalize_api_url(base_url: &str) -> String {
    format!("{}{API_SUFFIX}", base_url.trim_matches('/'))
}

/// Timeouts applied by a transport to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Upper bound for establishing the connection.
    pub connect_timeout: Duration,
    /// Upper bound for the whole request, connection included.
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
        }
    }
}
