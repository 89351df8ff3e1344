//! Request Fingerprint Module
//!
//! Structural identity of a cached request. Two fingerprints built from the
//! same inputs are equal and hash the same no matter how their query maps or
//! JSON bodies were assembled.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde_json::Value;
use tokio::time::Instant;

use crate::cache::memory;
use crate::models::{HttpMethod, RequestBody, RequestOptions};

// == Fingerprint ==
/// Identity of a request: method, resolved URL, query, body, content-type and accept.
///
/// The creation time and the memory estimate ride along but never take part
/// in equality or hashing.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    method: HttpMethod,
    url: String,
    query: Option<BTreeMap<String, String>>,
    body: Option<RequestBody>,
    content_type: Option<String>,
    accept: Option<String>,
    created_at: Instant,
    estimated_size: usize,
}

impl Fingerprint {
    // == Constructor ==
    /// Builds a fingerprint for a fully resolved URL.
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        query: Option<BTreeMap<String, String>>,
        body: Option<RequestBody>,
        content_type: Option<String>,
        accept: Option<String>,
    ) -> Self {
        let url = url.into();
        let estimated_size = memory::fingerprint_cost(
            &url,
            query.as_ref(),
            body.as_ref(),
            content_type.as_deref(),
            accept.as_deref(),
        );

        Self {
            method,
            url,
            query,
            body,
            content_type,
            accept,
            created_at: Instant::now(),
            estimated_size,
        }
    }

    /// Fingerprint of a request with no query, body or negotiation headers.
    pub fn bare(method: HttpMethod, url: impl Into<String>) -> Self {
        Self::new(method, url, None, None, None, None)
    }

    /// Builds a fingerprint from façade options once the URL has been resolved.
    pub fn from_options(method: HttpMethod, url: impl Into<String>, options: &RequestOptions) -> Self {
        Self::new(
            method,
            url,
            options.query.clone(),
            options.body.clone(),
            options.content_type.clone(),
            options.accept.clone(),
        )
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> Option<&BTreeMap<String, String>> {
        self.query.as_ref()
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Approximate bytes this fingerprint occupies as a store key.
    pub fn estimated_size(&self) -> usize {
        self.estimated_size
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.url == other.url
            && self.content_type == other.content_type
            && self.accept == other.accept
            && self.query == other.query
            && self.body == other.body
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.url.hash(state);
        self.query.hash(state);
        self.body.hash(state);
        self.content_type.hash(state);
        self.accept.hash(state);
    }
}

// == Structural Hashing ==
impl Hash for RequestBody {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RequestBody::Text(text) => {
                state.write_u8(0);
                text.hash(state);
            }
            RequestBody::Bytes(bytes) => {
                state.write_u8(1);
                bytes.hash(state);
            }
            RequestBody::Json(value) => {
                state.write_u8(2);
                hash_json(value, state);
            }
        }
    }
}

/// Hashes a JSON value consistently with its `PartialEq`.
///
/// Object members are hashed independently and XORed so member order never
/// changes the result.
pub fn hash_json<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(flag) => {
            state.write_u8(1);
            flag.hash(state);
        }
        Value::Number(number) => {
            state.write_u8(2);
            if let Some(unsigned) = number.as_u64() {
                unsigned.hash(state);
            } else if let Some(signed) = number.as_i64() {
                signed.hash(state);
            } else if let Some(float) = number.as_f64() {
                // 0.0 == -0.0
                let float = if float == 0.0 { 0.0 } else { float };
                float.to_bits().hash(state);
            }
        }
        Value::String(text) => {
            state.write_u8(3);
            text.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items {
                hash_json(item, state);
            }
        }
        Value::Object(members) => {
            state.write_u8(5);
            state.write_usize(members.len());
            let combined = members.iter().fold(0u64, |acc, (key, member)| {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                hash_json(member, &mut hasher);
                acc ^ hasher.finish()
            });
            state.write_u64(combined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::{json, Map};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn post(url: &str, body: Value) -> Fingerprint {
        Fingerprint::new(
            HttpMethod::Post,
            url,
            None,
            Some(RequestBody::Json(body)),
            Some("application/json".to_string()),
            None,
        )
    }

    #[test]
    fn test_equal_inputs_give_equal_fingerprints() {
        let a = Fingerprint::bare(HttpMethod::Get, "https://api.test/items");
        let b = Fingerprint::bare(HttpMethod::Get, "https://api.test/items");

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_json_member_order_is_irrelevant() {
        let mut first = Map::new();
        first.insert("name".to_string(), json!("widget"));
        first.insert("tags".to_string(), json!(["a", "b"]));
        first.insert("nested".to_string(), json!({"x": 1, "y": 2}));

        let mut second = Map::new();
        second.insert("nested".to_string(), json!({"y": 2, "x": 1}));
        second.insert("tags".to_string(), json!(["a", "b"]));
        second.insert("name".to_string(), json!("widget"));

        let a = post("https://api.test/items", Value::Object(first));
        let b = post("https://api.test/items", Value::Object(second));

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_array_order_matters() {
        let a = post("https://api.test/items", json!([1, 2]));
        let b = post("https://api.test/items", json!([2, 1]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_each_identity_field_distinguishes() {
        let base = Fingerprint::bare(HttpMethod::Get, "https://api.test/items");

        assert_ne!(base, Fingerprint::bare(HttpMethod::Head, "https://api.test/items"));
        assert_ne!(base, Fingerprint::bare(HttpMethod::Get, "https://api.test/other"));
        assert_ne!(
            base,
            Fingerprint::new(
                HttpMethod::Get,
                "https://api.test/items",
                None,
                None,
                None,
                Some("application/json".to_string()),
            )
        );
        assert_ne!(
            base,
            Fingerprint::new(
                HttpMethod::Get,
                "https://api.test/items",
                None,
                None,
                Some("text/plain".to_string()),
                None,
            )
        );
    }

    #[test]
    fn test_absent_and_empty_query_differ() {
        let absent = Fingerprint::bare(HttpMethod::Get, "https://api.test/items");
        let empty = Fingerprint::new(
            HttpMethod::Get,
            "https://api.test/items",
            Some(BTreeMap::new()),
            None,
            None,
            None,
        );
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_text_and_bytes_bodies_differ() {
        let text = RequestBody::Text("abc".to_string());
        let bytes = RequestBody::Bytes(Bytes::from_static(b"abc"));
        assert_ne!(text, bytes);
        assert_ne!(hash_of(&text), hash_of(&bytes));
    }

    #[test]
    fn test_signed_zero_hashes_consistently() {
        let positive = json!(0.0);
        let negative = json!(-0.0);
        assert_eq!(positive, negative);

        let mut a = DefaultHasher::new();
        hash_json(&positive, &mut a);
        let mut b = DefaultHasher::new();
        hash_json(&negative, &mut b);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_timestamps_do_not_affect_identity() {
        let a = Fingerprint::bare(HttpMethod::Get, "https://api.test/items");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = Fingerprint::bare(HttpMethod::Get, "https://api.test/items");

        assert_ne!(a.created_at(), b.created_at());
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_options_copies_identity_fields() {
        let options = RequestOptions::new()
            .query("q", "rust")
            .accept("application/json")
            .on_stale_response(|_| {});
        let a = Fingerprint::from_options(HttpMethod::Get, "https://api.test/search", &options);
        let b = Fingerprint::from_options(
            HttpMethod::Get,
            "https://api.test/search",
            &RequestOptions::new().query("q", "rust").accept("application/json"),
        );

        assert_eq!(a, b);
        assert_eq!(a.accept(), Some("application/json"));
    }
}
