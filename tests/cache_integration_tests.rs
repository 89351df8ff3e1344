//! Integration Tests for the Caching Client
//!
//! Drives `HttpCache` with the reqwest executor against a local axum origin
//! that counts how often it is actually reached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header::ACCEPT, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use mini_http_cache::{CacheConfig, HttpCache, HttpCacheError, HttpMethod, RequestOptions, ReqwestExecutor};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use url::Url;

// == Test Origin ==

#[derive(Clone, Default)]
struct Origin {
    hits: Arc<AtomicUsize>,
}

impl Origin {
    fn hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn items(State(origin): State<Origin>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({ "hit": origin.hit(), "params": params }))
}

async fn echo(State(origin): State<Origin>, body: String) -> String {
    format!("{}:{}", origin.hit(), body)
}

async fn negotiate(State(origin): State<Origin>, headers: HeaderMap) -> String {
    origin.hit();
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn broken(State(origin): State<Origin>) -> (StatusCode, &'static str) {
    origin.hit();
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn slow(State(origin): State<Origin>) -> Json<Value> {
    let hit = origin.hit();
    tokio::time::sleep(Duration::from_millis(300)).await;
    Json(json!({ "hit": hit }))
}

// == Helper Functions ==

async fn spawn_origin() -> (Url, Origin) {
    let origin = Origin::default();
    let app = Router::new()
        .route("/items", get(items))
        .route("/echo", post(echo))
        .route("/negotiate", get(negotiate))
        .route("/broken", get(broken))
        .route("/slow", get(slow))
        .layer(TraceLayer::new_for_http())
        .with_state(origin.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (Url::parse(&format!("http://{}/", addr)).unwrap(), origin)
}

fn cache_for(base_url: &Url, timeout: Duration) -> HttpCache {
    let config = CacheConfig {
        base_url: Some(base_url.clone()),
        timeout,
        request_timeout: 5,
        ..CacheConfig::default()
    };
    let executor = ReqwestExecutor::from_config(&config).unwrap();
    HttpCache::from_config(executor, &config)
}

fn hit_of(value: &Value) -> u64 {
    value["hit"].as_u64().unwrap()
}

// == Caching Tests ==

#[tokio::test]
async fn test_get_is_served_from_cache() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_secs(60));

    let first: Value = cache.get_json("items", RequestOptions::new()).await.unwrap();
    let second: Value = cache.get_json("items", RequestOptions::new()).await.unwrap();

    assert_eq!(origin.hits(), 1);
    assert_eq!(hit_of(&first), 1);
    assert_eq!(hit_of(&second), 1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_entries, 1);
}

#[tokio::test]
async fn test_query_reaches_origin_and_separates_entries() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_secs(60));

    let page_one: Value = cache
        .get_json("items", RequestOptions::new().query("page", "1"))
        .await
        .unwrap();
    let page_two: Value = cache
        .get_json("items", RequestOptions::new().query("page", "2"))
        .await
        .unwrap();
    cache
        .get("items", RequestOptions::new().query("page", "1"))
        .await
        .unwrap();

    assert_eq!(origin.hits(), 2);
    assert_eq!(page_one["params"]["page"], "1");
    assert_eq!(page_two["params"]["page"], "2");
}

#[tokio::test]
async fn test_post_bodies_are_keyed_separately() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_secs(60));

    let first = cache.post("echo", RequestOptions::new().body("alpha")).await.unwrap();
    let repeat = cache.post("echo", RequestOptions::new().body("alpha")).await.unwrap();
    let other = cache.post("echo", RequestOptions::new().body("beta")).await.unwrap();

    assert_eq!(origin.hits(), 2);
    assert_eq!(first.text(), "1:alpha");
    assert!(Arc::ptr_eq(&first, &repeat));
    assert_eq!(other.text(), "2:beta");
}

#[tokio::test]
async fn test_accept_header_is_forwarded_and_keyed() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_secs(60));

    let csv = cache
        .get("negotiate", RequestOptions::new().accept("text/csv"))
        .await
        .unwrap();
    let json = cache
        .get("negotiate", RequestOptions::new().accept("application/json"))
        .await
        .unwrap();

    assert_eq!(csv.text(), "text/csv");
    assert_eq!(json.text(), "application/json");
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn test_error_status_is_not_cached() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_secs(60));

    for _ in 0..2 {
        match cache.get("broken", RequestOptions::new()).await {
            Err(HttpCacheError::Status { status, .. }) => assert_eq!(status.as_u16(), 500),
            other => panic!("Expected status error, got {:?}", other.map(|r| r.status())),
        }
    }

    assert_eq!(origin.hits(), 2);
    assert_eq!(cache.stats().total_entries, 0);
    assert_eq!(cache.stats().refresh_failures, 2);
}

// == Expiration Tests ==

#[tokio::test]
async fn test_idle_entry_is_refreshed_from_origin() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_millis(50));

    let first: Value = cache.get_json("items", RequestOptions::new()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second: Value = cache.get_json("items", RequestOptions::new()).await.unwrap();

    assert_eq!(hit_of(&first), 1);
    assert_eq!(hit_of(&second), 2);
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn test_slow_origin_announces_stale_response() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_millis(50));

    cache.get("slow", RequestOptions::new()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let announced: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&announced);
    let options = RequestOptions::new()
        .stale_response_delay(Duration::from_millis(50))
        .on_stale_response(move |stale| {
            let value: Value = stale.json().unwrap();
            sink.lock().unwrap().push(hit_of(&value));
        });

    let fresh: Value = cache.get_json("slow", options).await.unwrap();

    assert_eq!(*announced.lock().unwrap(), vec![1]);
    assert_eq!(hit_of(&fresh), 2);
    assert_eq!(origin.hits(), 2);

    let cached = cache
        .get_cached_request(HttpMethod::Get, "slow", &RequestOptions::new())
        .unwrap()
        .unwrap();
    assert_eq!(hit_of(&cached.json::<Value>().unwrap()), 2);
}

#[tokio::test]
async fn test_clear_cache_forces_origin_round_trip() {
    let (base_url, origin) = spawn_origin().await;
    let cache = cache_for(&base_url, Duration::from_secs(60));

    cache.get("items", RequestOptions::new()).await.unwrap();
    assert!(cache.clear_cache() > 0);
    cache.get("items", RequestOptions::new()).await.unwrap();

    assert_eq!(origin.hits(), 2);
}
