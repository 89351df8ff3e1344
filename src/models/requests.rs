//! Request models for the HTTP cache
//!
//! Defines the method, body and per-call options a cached request is built from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::models::HttpResponse;

// == Http Method ==
/// HTTP verbs supported by the cache façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

// == Request Body ==
/// Request payload.
///
/// Structured bodies are kept as JSON values so two bodies compare by content,
/// never by allocation or member order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Bytes(Bytes),
    Json(Value),
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(bytes))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Callback handed a stale cached response while its refresh is in flight.
pub type StaleCallback = Arc<dyn Fn(Arc<HttpResponse>) + Send + Sync>;

// == Request Options ==
/// Optional parts of a cached request.
///
/// Everything except the two stale-notification fields contributes to the
/// request fingerprint.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Absolute URL that overrides base-URL resolution of the path
    pub full_path: Option<String>,
    /// Query parameters
    pub query: Option<BTreeMap<String, String>>,
    /// Request body
    pub body: Option<RequestBody>,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Accept header
    pub accept: Option<String>,
    /// Invoked with the stale entry, if any, while the refresh runs
    pub on_stale_response: Option<StaleCallback>,
    /// How long the refresh gets before the stale entry is announced
    pub stale_response_delay: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_path(mut self, full_path: impl Into<String>) -> Self {
        self.full_path = Some(full_path.into());
        self
    }

    /// Adds one query parameter, creating the query map on first use.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replaces the query map.
    pub fn queries(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Sets the callback that receives a stale cached response while its refresh runs.
    ///
    /// The callback gets the stored response itself. Reading its body counts as
    /// an access, so after a failed refresh the entry stays fresh for another
    /// full timeout. A panic inside the callback is contained and logged.
    pub fn on_stale_response<F>(mut self, callback: F) -> Self
    where
        F: Fn(Arc<HttpResponse>) + Send + Sync + 'static,
    {
        self.on_stale_response = Some(Arc::new(callback));
        self
    }

    /// How long the refresh may run before the stale response is announced.
    pub fn stale_response_delay(mut self, delay: Duration) -> Self {
        self.stale_response_delay = Some(delay);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("full_path", &self.full_path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("content_type", &self.content_type)
            .field("accept", &self.accept)
            .field("on_stale_response", &self.on_stale_response.is_some())
            .field("stale_response_delay", &self.stale_response_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
        assert_eq!(reqwest::Method::from(HttpMethod::Patch), reqwest::Method::PATCH);
    }

    #[test]
    fn test_query_builder_accumulates() {
        let options = RequestOptions::new().query("page", "2").query("limit", "10");
        let query = options.query.unwrap();
        assert_eq!(query.len(), 2);
        assert_eq!(query.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_body_conversions() {
        assert_eq!(RequestBody::from("hi"), RequestBody::Text("hi".to_string()));
        assert_eq!(
            RequestBody::from(vec![1u8, 2]),
            RequestBody::Bytes(Bytes::from_static(&[1, 2]))
        );
        assert_eq!(
            RequestBody::from(json!({"a": 1})),
            RequestBody::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn test_debug_hides_callback() {
        let options = RequestOptions::new().on_stale_response(|_| {});
        let rendered = format!("{:?}", options);
        assert!(rendered.contains("on_stale_response: true"));
    }
}
