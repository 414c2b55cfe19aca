#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pantry::{app, builtin, ensure_tables, Database, Settings};
use serde_json::Value;
use tower::ServiceExt;

pub const ENDPOINT: &str = "/food/ingredient";

pub async fn setup_test_db() -> Database {
    let db = Database::connect_in_memory().await.expect("Failed to open in-memory database");
    ensure_tables(&db, &builtin()).await.expect("Failed to create tables");
    db
}

pub fn setup_test_app(db: Database) -> Router {
    app(&builtin(), db, &Settings::default())
}

/// Send one request; returns status and parsed JSON body (`Null` when empty).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            let payload = serde_json::to_string(&json).unwrap();
            builder
                .header("content-type", "application/json")
                .header("content-length", payload.len())
                .body(Body::from(payload))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Create `count - 1` ingredients named `name_1..`, as the API returns them.
pub async fn make_several(app: &Router, count: usize) -> Vec<Value> {
    let mut data = Vec::new();
    for i in 1..count {
        let (status, body) = send(app, "POST", ENDPOINT, Some(serde_json::json!({ "id": i, "name": format!("name_{}", i) }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "id": i, "name": format!("name_{}", i) }));
        data.push(body);
    }
    data
}
