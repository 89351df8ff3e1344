//! Response model for the HTTP cache
//!
//! Defines the response value the executor produces and the cache stores.

use std::borrow::Cow;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use crate::cache::memory;
use crate::error::Result;

// == Http Response ==
/// A complete HTTP response held in memory.
///
/// The response tracks its own last-access time, bumped whenever the body is
/// read, independently of the cache entry that holds it.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Option<String>,
    fetched_at: DateTime<Utc>,
    last_access: Mutex<Instant>,
    estimated_size: usize,
}

impl HttpResponse {
    // == Constructor ==
    /// Creates a response from its parts and stamps it as just accessed.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let estimated_size = memory::response_cost(&headers, &body, None);
        Self {
            status,
            headers,
            body,
            url: None,
            fetched_at: Utc::now(),
            last_access: Mutex::new(Instant::now()),
            estimated_size,
        }
    }

    /// Shorthand for a `200 OK` response without headers.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// Records the final URL the response was served from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.estimated_size = memory::response_cost(&self.headers, &self.body, Some(&url));
        self.url = Some(url);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    // == Body Access ==
    /// Returns the raw body and marks the response as accessed.
    pub fn body(&self) -> &Bytes {
        self.touch();
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(self.body())?)
    }

    // == Access Tracking ==
    /// Marks the response as accessed now.
    pub fn touch(&self) {
        *self.last_access.lock() = Instant::now();
    }

    pub fn last_accessed(&self) -> Instant {
        *self.last_access.lock()
    }

    /// Approximate bytes this response occupies.
    pub fn estimated_size(&self) -> usize {
        self.estimated_size
    }

    /// Returns a serialisable description of the response, without the body.
    pub fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            status: self.status.as_u16(),
            url: self.url.clone(),
            content_type: self.header("content-type").map(str::to_string),
            body_bytes: self.body.len(),
            estimated_size: self.estimated_size,
            fetched_at: self.fetched_at,
        }
    }
}

// == Response Summary ==
/// Serialisable overview of a response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSummary {
    pub status: u16,
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    pub estimated_size: usize,
    pub fetched_at: DateTime<Utc>,
}
