//! Request builder, transport driver and response decoder for the CS-Cart API.
//!
//! # Design
//! `ApiClient` holds a `ClientConfig` and a `Transport`. Every call follows the
//! same three steps: `build_request` produces an authenticated `HttpRequest`,
//! the transport executes it, and `parse_response` decodes the body into a
//! `serde_json::Value`. The first and last steps are pure and public, so a host
//! that wants to do its own I/O can skip the transport entirely.

use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ClientConfig, API_VERSION, USER_AGENT};
use crate::error::{ApiError, ProtocolError, Result, TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

#[cfg(feature = "ureq-transport")]
use crate::transport::UreqTransport;

const CART_VERSION_PREFIX: &str = "CS-Cart: version ";

/// Synchronous client for one CS-Cart store.
///
/// Each call performs exactly one HTTP round-trip: no retries, no pagination,
/// no status-code interpretation.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    config: ClientConfig,
    transport: T,
}

#[cfg(feature = "ureq-transport")]
impl ApiClient<UreqTransport> {
    /// Client using a `UreqTransport` with the default timeouts.
    pub fn with_ureq(config: ClientConfig) -> Self {
        Self::new(config, UreqTransport::new())
    }
}

impl<T> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace credentials and API root. Takes `&mut self`, so no request can
    /// be in flight on this client while it happens.
    pub fn set_config(&mut self, config: ClientConfig) {
        self.config = config;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Version of this client library. Never touches the network.
    pub fn api_version(&self) -> &'static str {
        API_VERSION
    }

    /// Build the request for `method` on `path` (relative to the API root).
    ///
    /// `query` is form-urlencoded and appended only when non-empty. For POST
    /// and PUT, `body` is serialized to JSON (`null` when absent) and
    /// `Content-Length` is set to its byte length; GET and DELETE ignore it.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<HttpRequest>
    where
        B: Serialize + ?Sized,
    {
        let mut url = format!("{}{path}", self.config.api_url());
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter())
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }

        let mut headers = vec![
            ("Authorization".to_string(), self.authorization()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];

        let body = if method.has_body() {
            let payload = match body {
                Some(body) => serde_json::to_string(body),
                None => serde_json::to_string(&Value::Null),
            }
            .map_err(ProtocolError::Encode)?;
            headers.push(("Content-Length".to_string(), payload.len().to_string()));
            Some(payload)
        } else {
            None
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Decode a response body as JSON. The status code is not consulted.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value> {
        serde_json::from_str(&response.body).map_err(|e| ProtocolError::Json(e).into())
    }

    fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.config.user_login(), self.config.api_key());
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl<T: Transport> ApiClient<T> {
    /// `GET {api_url}{path}?{query}`.
    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let request = self.build_request::<Value>(HttpMethod::Get, path, query, None)?;
        self.execute(&request)
    }

    /// `POST` with `body` as JSON.
    pub fn create<B>(&self, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let request = self.build_request(HttpMethod::Post, path, &[], Some(body))?;
        self.execute(&request)
    }

    /// `PUT` with `body` as JSON.
    pub fn update<B>(&self, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let request = self.build_request(HttpMethod::Put, path, &[], Some(body))?;
        self.execute(&request)
    }

    pub fn delete(&self, path: &str) -> Result<Value> {
        let request = self.build_request::<Value>(HttpMethod::Delete, path, &[], None)?;
        self.execute(&request)
    }

    /// Generic entry point taking the method by name.
    ///
    /// Unknown method names fail with `ProtocolError::UnknownMethod` before
    /// anything is sent.
    pub fn api(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let method: HttpMethod = method.parse()?;
        let request = self.build_request(method, path, query, body)?;
        self.execute(&request)
    }

    /// Version of the store software, e.g. `4.18.1`.
    ///
    /// The store answers `{api_url}?version` with HTML rather than JSON, so the
    /// body is not decoded. Tags and the `CS-Cart: version ` prefix are removed
    /// and the rest is returned trimmed.
    pub fn cart_version(&self) -> Result<String> {
        let mut request = self.build_request::<Value>(HttpMethod::Get, "", &[], None)?;
        request.url.push_str("?version");
        let response = self.send(&request)?;
        Ok(strip_tags(&response.body)
            .replace(CART_VERSION_PREFIX, "")
            .trim()
            .to_string())
    }

    fn execute(&self, request: &HttpRequest) -> Result<Value> {
        let response = self.send(request)?;
        self.parse_response(response)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!("{} {}", request.method, request.url);
        let response = self.transport.execute(request)?;
        // Zero-length only; a body of `0` is valid JSON.
        if response.body.is_empty() {
            return Err(ApiError::Transport(TransportError::new(
                TransportErrorKind::EmptyResponse,
                format!("empty response body (HTTP {})", response.status),
            )));
        }
        Ok(response)
    }
}

/// Drop everything between `<` and `>`, inclusive.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// Records every request and answers each with the same canned result.
    struct RecordingTransport {
        requests: Mutex<Vec<HttpRequest>>,
        reply: std::result::Result<HttpResponse, TransportError>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
            }
        }

        fn failing(kind: TransportErrorKind, message: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Err(TransportError::new(kind, message)),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn execute(
            &self,
            request: &HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("secret", "admin@example.com", "http://localhost:3000/")
    }

    fn client(transport: RecordingTransport) -> ApiClient<RecordingTransport> {
        ApiClient::new(config(), transport)
    }

    #[test]
    fn get_without_query_has_no_question_mark() {
        let client = client(RecordingTransport::replying(200, "{}"));
        client.get("products", &[]).unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "http://localhost:3000/api/products");
        assert!(requests[0].body.is_none());
        assert_eq!(requests[0].header("content-length"), None);
    }

    #[test]
    fn get_with_query_percent_encodes_params() {
        let client = client(RecordingTransport::replying(200, "{}"));
        client
            .get("products", &[("q", "red shoes"), ("pname", "a&b=c")])
            .unwrap();

        let url = &client.transport().requests()[0].url;
        assert_eq!(
            url,
            "http://localhost:3000/api/products?q=red+shoes&pname=a%26b%3Dc"
        );
    }

    #[test]
    fn every_request_carries_auth_and_json_content_type() {
        let client = client(RecordingTransport::replying(200, "{}"));
        client.delete("products/1").unwrap();

        let req = &client.transport().requests()[0];
        // base64("admin@example.com:secret")
        assert_eq!(
            req.header("authorization"),
            Some("Basic YWRtaW5AZXhhbXBsZS5jb206c2VjcmV0")
        );
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("user-agent"), Some(USER_AGENT));
    }

    #[test]
    fn create_and_update_frame_bodies_identically() {
        let body = json!({"product": "Ünïcode tee", "price": 9.5});

        let client = client(RecordingTransport::replying(201, r#"{"product_id":1}"#));
        client.create("products", &body).unwrap();
        client.update("products/1", &body).unwrap();

        let requests = client.transport().requests();
        let (post, put) = (&requests[0], &requests[1]);
        assert_eq!(post.method, HttpMethod::Post);
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(post.body, put.body);

        let payload = post.body.as_deref().unwrap();
        assert_eq!(serde_json::from_str::<Value>(payload).unwrap(), body);
        // Byte length, not char length.
        let expected_len = payload.len().to_string();
        assert_eq!(post.header("content-length"), Some(expected_len.as_str()));
        assert_eq!(put.header("content-length"), Some(expected_len.as_str()));
        assert_ne!(payload.len(), payload.chars().count());
    }

    #[test]
    fn create_accepts_typed_bodies() {
        #[derive(Serialize)]
        struct NewCategory<'a> {
            category: &'a str,
            status: &'a str,
        }

        let client = client(RecordingTransport::replying(201, r#"{"category_id":7}"#));
        let created = client
            .create(
                "categories",
                &NewCategory {
                    category: "Shoes",
                    status: "A",
                },
            )
            .unwrap();
        assert_eq!(created, json!({"category_id": 7}));

        let req = &client.transport().requests()[0];
        assert_eq!(
            req.body.as_deref(),
            Some(r#"{"category":"Shoes","status":"A"}"#)
        );
    }

    #[test]
    fn post_without_body_sends_null() {
        let client = client(RecordingTransport::replying(200, "{}"));
        client.api("POST", "products", None, &[]).unwrap();

        let req = &client.transport().requests()[0];
        assert_eq!(req.body.as_deref(), Some("null"));
        assert_eq!(req.header("content-length"), Some("4"));
    }

    #[test]
    fn get_through_api_ignores_body() {
        let client = client(RecordingTransport::replying(200, "{}"));
        let body = json!({"ignored": true});
        client
            .api("GET", "products", Some(&body), &[("page", "2")])
            .unwrap();

        let req = &client.transport().requests()[0];
        assert_eq!(req.url, "http://localhost:3000/api/products?page=2");
        assert!(req.body.is_none());
    }

    #[test]
    fn unknown_method_fails_before_any_transport_call() {
        let client = client(RecordingTransport::replying(200, "{}"));
        let err = client.api("PATCH", "products/1", None, &[]).unwrap_err();

        assert!(matches!(
            err,
            ApiError::Protocol(ProtocolError::UnknownMethod(ref m)) if m == "PATCH"
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn empty_body_is_a_transport_error() {
        let client = client(RecordingTransport::replying(204, ""));
        let err = client.delete("products/1").unwrap_err();

        match err {
            ApiError::Transport(e) => assert_eq!(e.kind, TransportErrorKind::EmptyResponse),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn zero_body_is_a_json_number_not_an_empty_response() {
        let client = client(RecordingTransport::replying(200, "0"));
        assert_eq!(client.get("products/count", &[]).unwrap(), json!(0));
    }

    #[test]
    fn transport_failure_is_surfaced_unchanged() {
        let client = client(RecordingTransport::failing(
            TransportErrorKind::HostNotFound,
            "dns lookup failed",
        ));
        let err = client.get("products", &[]).unwrap_err();

        match err {
            ApiError::Transport(e) => {
                assert_eq!(e.kind, TransportErrorKind::HostNotFound);
                assert_eq!(e.message, "dns lookup failed");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn non_json_body_is_a_protocol_error() {
        let client = client(RecordingTransport::replying(200, "<html>oops</html>"));
        let err = client.get("products", &[]).unwrap_err();
        assert!(matches!(err, ApiError::Protocol(ProtocolError::Json(_))));
    }

    #[test]
    fn status_code_is_not_inspected() {
        let client = client(RecordingTransport::replying(
            404,
            r#"{"message":"Object not found"}"#,
        ));
        let value = client.get("products/999", &[]).unwrap();
        assert_eq!(value, json!({"message": "Object not found"}));
    }

    #[test]
    fn get_products_decodes_echoed_json() {
        let client = client(RecordingTransport::replying(200, r#"{"ok":true}"#));
        let value = client.get("products", &[]).unwrap();
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(value["ok"], Value::Bool(true));
    }

    #[test]
    fn api_version_makes_no_request() {
        let client = client(RecordingTransport::failing(
            TransportErrorKind::ConnectionFailed,
            "unreachable",
        ));
        assert_eq!(client.api_version(), "0.3");
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn cart_version_strips_markup_and_prefix() {
        let client = client(RecordingTransport::replying(
            200,
            "<p>CS-Cart: version <b>4.18.1</b></p>\n",
        ));
        assert_eq!(client.cart_version().unwrap(), "4.18.1");

        let req = &client.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/?version");
    }

    #[test]
    fn cart_version_propagates_empty_response() {
        let client = client(RecordingTransport::replying(200, ""));
        assert!(matches!(
            client.cart_version().unwrap_err(),
            ApiError::Transport(_)
        ));
    }

    #[test]
    fn set_config_changes_target_and_credentials() {
        let mut client = client(RecordingTransport::replying(200, "{}"));
        client.set_config(ClientConfig::new("other", "ops", "https://shop.example.com"));
        client.get("orders", &[]).unwrap();

        let req = &client.transport().requests()[0];
        assert_eq!(req.url, "https://shop.example.com/api/orders");
        // base64("ops:other")
        assert_eq!(req.header("authorization"), Some("Basic b3BzOm90aGVy"));
    }

    #[test]
    fn strip_tags_removes_nested_markup() {
        assert_eq!(strip_tags("<div><b>4.17</b> SP1</div>"), "4.17 SP1");
        assert_eq!(strip_tags("plain"), "plain");
        assert_eq!(strip_tags("a > b"), "a > b");
    }
}
