//! InfluxDB recorder against a local stand-in server
//!
//! The server accepts `/write` and `/ping` like InfluxDB 1.x and captures
//! what it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use obd_conv::PacketBuilder;
use obd_storage::{RecorderError, RecorderRegistry};
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    writes: Arc<Mutex<Vec<Write>>>,
}

#[derive(Debug, Clone)]
struct Write {
    query: HashMap<String, String>,
    authorization: Option<String>,
    body: String,
}

async fn write_handler(
    State(captured): State<Captured>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    if query.get("db").map(String::as_str) == Some("missing") {
        return (StatusCode::NOT_FOUND, "database not found: \"missing\"").into_response();
    }
    captured.writes.lock().unwrap().push(Write {
        query,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });
    StatusCode::NO_CONTENT.into_response()
}

async fn ping_handler() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [("X-Influxdb-Version", "1.8.10")],
    )
}

async fn start_server(captured: Captured) -> SocketAddr {
    let app = Router::new()
        .route("/write", post(write_handler))
        .route("/ping", get(ping_handler))
        .with_state(captured);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

fn recorder_config(addr: SocketAddr, database: &str) -> obd_storage::RecorderConfig {
    json!({
        "name": "influxdb",
        "host": addr.ip().to_string(),
        "port": addr.port(),
        "database": database,
        "username": "obd",
        "password": "hunter2"
    })
    .as_object()
    .unwrap()
    .clone()
}

#[tokio::test]
async fn test_record_writes_line_protocol() {
    let captured = Captured::default();
    let addr = start_server(captured.clone()).await;

    let registry = RecorderRegistry::with_builtins();
    let recorder = registry
        .create(None, &recorder_config(addr, "vehicle"))
        .await
        .unwrap();

    let mut builder = PacketBuilder::started("RPM");
    builder.add_timestamp(Some(1_700_000_000.0)).unwrap();
    builder.add_field("value", 3000.0).unwrap();
    recorder.record(&builder.serialize().unwrap()).await.unwrap();

    let writes = captured.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].body, "RPM value=3000 1700000000000000000");
    assert_eq!(writes[0].query["db"], "vehicle");
    assert_eq!(writes[0].query["precision"], "ns");
    // base64("obd:hunter2")
    assert_eq!(
        writes[0].authorization.as_deref(),
        Some("Basic b2JkOmh1bnRlcjI=")
    );

    recorder.close().await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let addr = start_server(Captured::default()).await;

    let registry = RecorderRegistry::with_builtins();
    let recorder = registry
        .create(None, &recorder_config(addr, "missing"))
        .await
        .unwrap();

    let mut builder = PacketBuilder::started("SPEED");
    builder.add_timestamp(Some(1.0)).unwrap();
    builder.add_field("value", 50.0).unwrap();

    match recorder.record(&builder.serialize().unwrap()).await {
        Err(RecorderError::ServerError { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("database not found"));
        }
        other => panic!("Expected ServerError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ping_reports_version() {
    let addr = start_server(Captured::default()).await;

    let registry = RecorderRegistry::with_builtins();
    let recorder = registry
        .create(None, &recorder_config(addr, "vehicle"))
        .await
        .unwrap();

    let description = recorder.ping().await.unwrap();
    assert_eq!(description.as_deref(), Some("InfluxDB 1.8.10"));
}

#[tokio::test]
async fn test_unreachable_server() {
    // Bind then drop to get a port nothing listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let registry = RecorderRegistry::with_builtins();
    let recorder = registry
        .create(None, &recorder_config(addr, "vehicle"))
        .await
        .unwrap();

    assert!(matches!(
        recorder.ping().await,
        Err(RecorderError::HttpError(_))
    ));
}
