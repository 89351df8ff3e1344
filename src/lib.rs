//! Mini HTTP Cache - An in-memory caching HTTP client
//!
//! Caches responses by request fingerprint under a memory budget and an idle
//! timeout, and can announce stale responses while a refresh is in flight.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use cache::CacheStats;
pub use client::{HttpCache, NetworkExecutor, ReqwestExecutor};
pub use config::CacheConfig;
pub use error::{HttpCacheError, Result};
pub use models::{HttpMethod, HttpResponse, RequestBody, RequestOptions};
pub use tasks::spawn_sweep_task;
