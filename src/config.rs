//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use url::Url;

use crate::cache::{normalize_budget, normalize_timeout};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Memory budget in bytes, 0 = unbounded
    pub max_cache_memory: usize,
    /// Idle timeout after which entries are revalidated, zero = never
    pub timeout: Duration,
    /// Promotes per-request cache decisions to info-level logs
    pub verbose: bool,
    /// Base URL that relative request paths are joined onto
    pub base_url: Option<Url>,
    /// Background idle-sweep interval in seconds, 0 = no background sweep
    pub sweep_interval: u64,
    /// Network request timeout in seconds
    pub request_timeout: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HTTP_CACHE_MAX_MEMORY` - Memory budget in bytes, <= 0 disables (default: 8 MiB)
    /// - `HTTP_CACHE_TIMEOUT_MS` - Idle timeout in milliseconds, <= 0 disables (default: 300000)
    /// - `HTTP_CACHE_VERBOSE` - `1` or `true` for verbose logging (default: false)
    /// - `HTTP_CACHE_BASE_URL` - Base URL for relative paths (default: none)
    /// - `HTTP_CACHE_SWEEP_INTERVAL` - Background sweep interval in seconds (default: 60)
    /// - `HTTP_CACHE_REQUEST_TIMEOUT` - Request timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_cache_memory = env::var("HTTP_CACHE_MAX_MEMORY")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|bytes| normalize_budget(usize::try_from(bytes).unwrap_or(0)))
            .unwrap_or(defaults.max_cache_memory);

        let timeout = env::var("HTTP_CACHE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|ms| normalize_timeout(Duration::from_millis(u64::try_from(ms).unwrap_or(0))))
            .unwrap_or(defaults.timeout);

        let verbose = env::var("HTTP_CACHE_VERBOSE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.verbose);

        Self {
            max_cache_memory,
            timeout,
            verbose,
            base_url: env::var("HTTP_CACHE_BASE_URL")
                .ok()
                .and_then(|v| Url::parse(v.trim()).ok()),
            sweep_interval: env::var("HTTP_CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
            request_timeout: env::var("HTTP_CACHE_REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_memory: 8 * 1024 * 1024,
            timeout: Duration::from_secs(300),
            verbose: false,
            base_url: None,
            sweep_interval: 60,
            request_timeout: 30,
        }
    }
}
