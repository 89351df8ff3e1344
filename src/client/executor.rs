//! Network Executor
//!
//! The seam between the cache and the transport. The cache hands the executor
//! a fingerprint and expects one complete response back, or an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use crate::cache::Fingerprint;
use crate::config::CacheConfig;
use crate::error::{HttpCacheError, Result};
use crate::models::{HttpResponse, RequestBody};

// == Network Executor Trait ==
/// Performs one HTTP round trip.
///
/// Implementations must fail instead of returning a placeholder response when
/// the transport breaks; the cache treats every error as "nothing new to store".
#[async_trait]
pub trait NetworkExecutor: Send + Sync {
    /// Executes the request described by `request`.
    async fn execute(&self, request: &Fingerprint) -> Result<HttpResponse>;
}

// == Reqwest Executor ==
/// Executor backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
    error_for_status: bool,
}

impl ReqwestExecutor {
    // == Constructor ==
    /// Creates an executor with the given request timeout.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Creates an executor using the request timeout from the configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.request_timeout))
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            error_for_status: true,
        }
    }

    /// Chooses whether non-success statuses become `HttpCacheError::Status`.
    ///
    /// Enabled by default so error pages never land in the cache.
    pub fn error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = enabled;
        self
    }
}

#[async_trait]
impl NetworkExecutor for ReqwestExecutor {
    async fn execute(&self, request: &Fingerprint) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method().into(), request.url());

        if let Some(query) = request.query() {
            builder = builder.query(query);
        }
        if let Some(content_type) = request.content_type() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(accept) = request.accept() {
            builder = builder.header(ACCEPT, accept);
        }
        builder = match request.body() {
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            Some(RequestBody::Bytes(bytes)) => builder.body(bytes.clone()),
            Some(RequestBody::Json(value)) => builder.json(value),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        debug!("{} {} -> {}", request.method(), url, status);

        if self.error_for_status && !status.is_success() {
            return Err(HttpCacheError::Status { status, url });
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(HttpResponse::new(status, headers, body).with_url(url))
    }
}
