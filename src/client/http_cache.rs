//! HTTP Cache Façade
//!
//! Per-verb request operations that all funnel through one fingerprint-keyed
//! path: fresh hits are answered from the store, stale hits and misses go to
//! the network executor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStats, CacheStore, Fingerprint, Lookup};
use crate::client::executor::NetworkExecutor;
use crate::client::revalidate::race_stale_notification;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::models::{HttpMethod, HttpResponse, RequestOptions, StaleCallback};

// == Http Cache ==
/// Caching HTTP client.
///
/// Cloning is cheap and every clone shares the same store.
#[derive(Clone)]
pub struct HttpCache {
    inner: Arc<Inner>,
}

struct Inner {
    /// Never held across an await
    store: Mutex<CacheStore>,
    executor: Arc<dyn NetworkExecutor>,
    base_url: Option<Url>,
    verbose: AtomicBool,
}

impl HttpCache {
    // == Constructors ==
    /// Creates a cache with the default configuration.
    pub fn new<E: NetworkExecutor + 'static>(executor: E) -> Self {
        Self::from_config(executor, &CacheConfig::default())
    }

    /// Creates a cache from configuration.
    pub fn from_config<E: NetworkExecutor + 'static>(executor: E, config: &CacheConfig) -> Self {
        Self::with_shared_executor(Arc::new(executor), config)
    }

    /// Creates a cache around an executor that is shared with other owners.
    pub fn with_shared_executor(executor: Arc<dyn NetworkExecutor>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(CacheStore::new(config.max_cache_memory, config.timeout)),
                executor,
                base_url: config.base_url.clone(),
                verbose: AtomicBool::new(config.verbose),
            }),
        }
    }

    // == URL Resolution ==
    /// Resolves a request path to an absolute URL.
    ///
    /// `full_path` wins when given. Otherwise `path` is joined onto the base
    /// URL, or parsed as an absolute URL when no base is configured.
    pub fn resolve_url(&self, path: &str, full_path: Option<&str>) -> Result<String> {
        let url = match (full_path, &self.inner.base_url) {
            (Some(full_path), _) => Url::parse(full_path)?,
            (None, Some(base)) => base.join(path)?,
            (None, None) => Url::parse(path)?,
        };
        Ok(url.into())
    }

    fn fingerprint(&self, method: HttpMethod, path: &str, options: &RequestOptions) -> Result<Fingerprint> {
        let url = self.resolve_url(path, options.full_path.as_deref())?;
        Ok(Fingerprint::from_options(method, url, options))
    }

    // == Request ==
    /// Performs a cached request.
    ///
    /// # Arguments
    /// * `method` - HTTP verb
    /// * `path` - Path relative to the base URL, or an absolute URL
    /// * `options` - Query, body, negotiation headers and stale-notification settings
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<Arc<HttpResponse>> {
        let fingerprint = self.fingerprint(method, path, &options)?;
        self.request_fingerprint(fingerprint, options.on_stale_response, options.stale_response_delay)
            .await
    }

    /// Performs a cached request for an already built fingerprint.
    ///
    /// A fresh entry is returned as is, without suspending. Otherwise the
    /// executor is called; a stale entry is offered to `on_stale_response`
    /// while the refresh runs. A successful refresh replaces the entry, a
    /// failed one leaves the store untouched.
    pub async fn request_fingerprint(
        &self,
        fingerprint: Fingerprint,
        on_stale_response: Option<StaleCallback>,
        stale_response_delay: Option<Duration>,
    ) -> Result<Arc<HttpResponse>> {
        let lookup = self
            .inner
            .store
            .lock()
            .lookup_for_request(&fingerprint, Instant::now());

        let stale = match lookup {
            Lookup::Fresh(response) => {
                self.log_decision("Cache hit", &fingerprint);
                return Ok(response);
            }
            Lookup::Stale(response) => {
                self.log_decision("Stale hit, revalidating", &fingerprint);
                Some(response)
            }
            Lookup::Miss => {
                self.log_decision("Cache miss", &fingerprint);
                None
            }
        };

        let refresh = self.inner.executor.execute(&fingerprint);
        let outcome =
            race_stale_notification(refresh, stale, on_stale_response, stale_response_delay).await;

        match outcome {
            Ok(response) => {
                let response = Arc::new(response);
                self.inner
                    .store
                    .lock()
                    .store_response(fingerprint, Arc::clone(&response), Instant::now());
                Ok(response)
            }
            Err(err) => {
                self.inner.store.lock().record_refresh_failure();
                warn!(
                    "Refresh failed for {} {}: {}",
                    fingerprint.method(),
                    fingerprint.url(),
                    err
                );
                Err(err)
            }
        }
    }

    // == Verbs ==
    /// Cached `GET`.
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Get, path, options).await
    }

    /// Cached `HEAD`.
    pub async fn head(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Head, path, options).await
    }

    /// Cached `OPTIONS`.
    pub async fn options(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Options, path, options).await
    }

    /// Cached `POST`, keyed on the body as well.
    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Post, path, options).await
    }

    /// Cached `PUT`, keyed on the body as well.
    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Put, path, options).await
    }

    /// Cached `PATCH`, keyed on the body as well.
    pub async fn patch(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Patch, path, options).await
    }

    /// Cached `DELETE`.
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<Arc<HttpResponse>> {
        self.request(HttpMethod::Delete, path, options).await
    }

    // == JSON Verbs ==
    /// Performs a cached request and decodes the body as JSON.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(method, path, options).await?.json()
    }

    /// Cached `GET`, decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request_json(HttpMethod::Get, path, options).await
    }

    /// Cached `POST`, decoded as JSON.
    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request_json(HttpMethod::Post, path, options).await
    }

    /// Cached `PUT`, decoded as JSON.
    pub async fn put_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request_json(HttpMethod::Put, path, options).await
    }

    /// Cached `PATCH`, decoded as JSON.
    pub async fn patch_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request_json(HttpMethod::Patch, path, options).await
    }

    /// Cached `DELETE`, decoded as JSON.
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.request_json(HttpMethod::Delete, path, options).await
    }

    // == Cached Lookup ==
    /// Returns the stored response for a request without refreshing it.
    ///
    /// Stale entries are returned as they are and no access time is bumped.
    /// A miss is `Ok(None)`; only an unresolvable URL is an error.
    pub fn get_cached_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Option<Arc<HttpResponse>>> {
        let fingerprint = self.fingerprint(method, path, options)?;
        let store = self.inner.store.lock();
        Ok(store
            .lookup(&fingerprint)
            .map(|entry| Arc::clone(&entry.response)))
    }

    // == Management ==
    /// Removes every entry and returns the bytes freed.
    pub fn clear_cache(&self) -> usize {
        let freed = self.inner.store.lock().clear();
        info!("Cache cleared, {} bytes freed", freed);
        freed
    }

    /// Memory budget in bytes, 0 = unbounded.
    pub fn max_cache_memory(&self) -> usize {
        self.inner.store.lock().max_memory()
    }

    /// Sets the memory budget, evicting immediately if the cache no longer fits.
    pub fn set_max_cache_memory(&self, max_cache_memory: usize) {
        self.inner
            .store
            .lock()
            .set_max_memory(max_cache_memory, Instant::now());
    }

    /// Idle timeout after which entries are refreshed, zero = never.
    pub fn timeout(&self) -> Duration {
        self.inner.store.lock().timeout()
    }

    /// Sets the idle timeout; tiny positive values are raised to the minimum.
    pub fn set_timeout(&self, timeout: Duration) {
        self.inner.store.lock().set_timeout(timeout);
    }

    /// Estimated bytes held by all entries.
    pub fn calculate_cache_used_memory(&self) -> usize {
        self.inner.store.lock().total_memory()
    }

    /// Runs the idle sweep now and returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.inner.store.lock().sweep_expired(Instant::now())
    }

    /// Snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.store.lock().stats()
    }

    /// Whether per-request cache decisions are logged at info level.
    pub fn verbose(&self) -> bool {
        self.inner.verbose.load(Ordering::Relaxed)
    }

    /// Turns info-level logging of per-request cache decisions on or off.
    pub fn set_verbose(&self, verbose: bool) {
        self.inner.verbose.store(verbose, Ordering::Relaxed);
    }

    fn log_decision(&self, decision: &str, fingerprint: &Fingerprint) {
        if self.verbose() {
            info!("{}: {} {}", decision, fingerprint.method(), fingerprint.url());
        } else {
            debug!("{}: {} {}", decision, fingerprint.method(), fingerprint.url());
        }
    }
}
