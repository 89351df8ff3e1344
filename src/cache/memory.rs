//! Memory Estimator Module
//!
//! Approximate byte costs used to rank and account entries for eviction.
//! The figures are never used to decide whether a lookup matches.

use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::header::HeaderMap;

use crate::models::RequestBody;

/// Fixed cost charged for every fingerprint
pub const FINGERPRINT_OVERHEAD: usize = 96;

/// Fixed cost charged for every response
pub const RESPONSE_OVERHEAD: usize = 128;

/// Per-header bookkeeping cost on top of name and value lengths
pub const HEADER_OVERHEAD: usize = 16;

// == Fingerprint Cost ==
/// Estimates the bytes held by a request fingerprint.
pub fn fingerprint_cost(
    url: &str,
    query: Option<&BTreeMap<String, String>>,
    body: Option<&RequestBody>,
    content_type: Option<&str>,
    accept: Option<&str>,
) -> usize {
    let query_len: usize = query
        .map(|params| params.iter().map(|(k, v)| k.len() + v.len()).sum())
        .unwrap_or(0);

    FINGERPRINT_OVERHEAD
        + url.len()
        + query_len
        + body.map(body_cost).unwrap_or(0)
        + content_type.map(str::len).unwrap_or(0)
        + accept.map(str::len).unwrap_or(0)
}

/// Estimates a request body. JSON values are charged their serialised length.
pub fn body_cost(body: &RequestBody) -> usize {
    match body {
        RequestBody::Text(text) => text.len(),
        RequestBody::Bytes(bytes) => bytes.len(),
        RequestBody::Json(value) => serde_json::to_vec(value).map_or(0, |encoded| encoded.len()),
    }
}

// == Response Cost ==
/// Estimates the bytes held by a response.
pub fn response_cost(headers: &HeaderMap, body: &Bytes, url: Option<&str>) -> usize {
    let header_len: usize = headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + HEADER_OVERHEAD)
        .sum();

    RESPONSE_OVERHEAD + header_len + body.len() + url.map(str::len).unwrap_or(0)
}
