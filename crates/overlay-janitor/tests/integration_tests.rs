//! Integration tests for the Janitor against real HTTP endpoints

use axum::{
    body::Body,
    http::{header::ACCEPT, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use overlay_domain::{Collection, PeerRecord, RecordId, RecordStore};
use overlay_janitor::probe::MAX_BODY_BYTES;
use overlay_janitor::{HealthProbe, HttpProbe, Janitor, JanitorConfig, ProbeFailure, ProbeOutcome};
use overlay_store::SqliteRecordStore;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// Serve `app` on an ephemeral local port
async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn ok_server() -> SocketAddr {
    spawn_server(Router::new().route(
        "/health",
        get(|headers: HeaderMap| async move {
            // Only answer ok when the caller asked for JSON
            let wants_json = headers
                .get(ACCEPT)
                .and_then(|v| v.to_str().ok())
                .map_or(false, |v| v == "application/json");
            let status = if wants_json { "ok" } else { "wrong-accept" };
            Json(json!({ "status": status }))
        }),
    ))
    .await
}

async fn status_server(body: serde_json::Value) -> SocketAddr {
    spawn_server(Router::new().route(
        "/health",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    ))
    .await
}

async fn error_server() -> SocketAddr {
    spawn_server(Router::new().route(
        "/health",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "ok" }))) }),
    ))
    .await
}

async fn html_server() -> SocketAddr {
    spawn_server(Router::new().route("/health", get(|| async { "<html>ok</html>" }))).await
}

async fn slow_server() -> SocketAddr {
    spawn_server(Router::new().route(
        "/health",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "status": "ok" }))
        }),
    ))
    .await
}

/// A valid `{"status":"ok"}` document padded past the body limit
fn padded_ok_body() -> String {
    json!({ "status": "ok", "padding": "x".repeat(MAX_BODY_BYTES) }).to_string()
}

async fn oversized_server() -> SocketAddr {
    spawn_server(Router::new().route("/health", get(|| async { padded_ok_body() }))).await
}

/// Same body streamed in chunks, without a Content-Length header
async fn chunked_oversized_server() -> SocketAddr {
    spawn_server(Router::new().route(
        "/health",
        get(|| async {
            let body = padded_ok_body();
            let chunks: Vec<Result<String, std::io::Error>> = body
                .as_bytes()
                .chunks(1024)
                .map(|chunk| Ok(String::from_utf8_lossy(chunk).into_owned()))
                .collect();
            Body::from_stream(futures::stream::iter(chunks))
        }),
    ))
    .await
}

fn health(addr: SocketAddr) -> Url {
    Url::parse(&format!("http://{}/health", addr)).unwrap()
}

#[tokio::test]
async fn test_probe_healthy_endpoint() {
    let addr = ok_server().await;
    let probe = HttpProbe::new().unwrap();

    assert_eq!(probe.check(&health(addr)).await, ProbeOutcome::Healthy);
}

#[tokio::test]
async fn test_probe_status_not_ok() {
    let addr = status_server(json!({ "status": "degraded" })).await;
    let probe = HttpProbe::new().unwrap();

    assert!(matches!(
        probe.check(&health(addr)).await,
        ProbeOutcome::Unhealthy(ProbeFailure::StatusNotOk(_))
    ));
}

#[tokio::test]
async fn test_probe_error_status() {
    let addr = error_server().await;
    let probe = HttpProbe::new().unwrap();

    assert_eq!(
        probe.check(&health(addr)).await,
        ProbeOutcome::Unhealthy(ProbeFailure::HttpStatus(503))
    );
}

#[tokio::test]
async fn test_probe_non_json_body() {
    let addr = html_server().await;
    let probe = HttpProbe::new().unwrap();

    assert!(matches!(
        probe.check(&health(addr)).await,
        ProbeOutcome::Unhealthy(ProbeFailure::MalformedBody(_))
    ));
}

#[tokio::test]
async fn test_probe_rejects_oversized_body() {
    let probe = HttpProbe::new().unwrap();

    for addr in [oversized_server().await, chunked_oversized_server().await] {
        assert_eq!(
            probe.check(&health(addr)).await,
            ProbeOutcome::Unhealthy(ProbeFailure::OversizedBody)
        );
    }
}

#[tokio::test]
async fn test_probe_missing_route() {
    let addr = spawn_server(Router::new()).await;
    let probe = HttpProbe::new().unwrap();

    assert_eq!(
        probe.check(&health(addr)).await,
        ProbeOutcome::Unhealthy(ProbeFailure::HttpStatus(404))
    );
}

#[tokio::test]
async fn test_probe_connection_refused() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::new().unwrap();
    assert!(matches!(
        probe.check(&health(addr)).await,
        ProbeOutcome::Unhealthy(ProbeFailure::Network(_))
    ));
}

#[tokio::test]
async fn test_full_sweep_against_live_peers() {
    let healthy = ok_server().await;
    let degraded = status_server(json!({ "status": "degraded" })).await;
    let slow = slow_server().await;

    let store = SqliteRecordStore::open_in_memory().unwrap();
    let recovering = store
        .insert_record(
            Collection::Ship,
            PeerRecord {
                url: Some(format!("http://{}", healthy)),
                down: 2,
                ..Default::default()
            },
        )
        .unwrap();
    let failing = store
        .insert_record(
            Collection::Ship,
            PeerRecord {
                url: Some(format!("http://{}/some/path", degraded)),
                down: 0,
                ..Default::default()
            },
        )
        .unwrap();
    let stalled = store
        .insert_record(
            Collection::Slap,
            PeerRecord {
                service_url: Some(format!("http://{}", slow)),
                down: 2,
                ..Default::default()
            },
        )
        .unwrap();
    let invalid = store
        .insert_record(Collection::Slap, PeerRecord::with_domain("", "not a host"))
        .unwrap();

    let config = JanitorConfig {
        request_timeout_ms: 200,
        ..Default::default()
    };
    let janitor = Janitor::with_http_probe(store, config).unwrap();

    let report = janitor.run().await.unwrap();

    let store = janitor.store();
    let down_of = |collection: Collection, id: &RecordId| {
        store.get_record(collection, id).unwrap().map(|r| r.down)
    };
    assert_eq!(down_of(Collection::Ship, &recovering), Some(1));
    assert_eq!(down_of(Collection::Ship, &failing), Some(1));
    assert_eq!(down_of(Collection::Slap, &stalled), None);
    assert_eq!(down_of(Collection::Slap, &invalid), Some(1));

    let slap = report.collection(Collection::Slap).unwrap();
    assert_eq!(slap.timeouts, 1);
    assert_eq!(slap.invalid, 1);
    assert_eq!(report.total_evicted(), 1);
    assert_eq!(store.fetch_all(Collection::Slap).await.unwrap().len(), 1);
}
