//! Mini HTTP Cache - demo client
//!
//! Fetches every URL given on the command line twice through the cache and
//! prints what came back along with the cache statistics.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_http_cache::{spawn_sweep_task, CacheConfig, HttpCache, RequestOptions, ReqwestExecutor};

/// Entry point for the demo client.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the reqwest executor and the cache
/// 4. Start the background idle sweep
/// 5. Fetch each URL twice, the second time from the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_http_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_cache_memory={}, timeout={:?}, sweep_interval={}s, request_timeout={}s",
        config.max_cache_memory, config.timeout, config.sweep_interval, config.request_timeout
    );

    let executor = ReqwestExecutor::from_config(&config).context("failed to build HTTP client")?;
    let cache = HttpCache::from_config(executor, &config);
    let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval);

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        info!("No URLs given, usage: mini_http_cache <url>...");
    }

    for url in &urls {
        for attempt in 1..=2 {
            let response = cache
                .get(url, RequestOptions::new())
                .await
                .with_context(|| format!("request to {} failed", url))?;
            println!(
                "#{} {}",
                attempt,
                serde_json::to_string(&response.summary())?
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&cache.stats())?);

    sweep_handle.abort();
    Ok(())
}
