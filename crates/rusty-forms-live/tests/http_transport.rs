// HttpTransport against a real local server

use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use rusty_forms_live::{
    Field, FormPolicy, FormValidator, HttpTransport, MemoryDocument, NullSink, RemoteRequest,
    RemoteTransport, TransportError, ValidationOutcome, ValidatorConfig,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn check_username(Json(body): Json<Value>) -> Json<Value> {
    if body["value"] == "taken" {
        Json(json!({"isValid": false, "message": "Username taken"}))
    } else {
        Json(json!({"isValid": true, "echo": body}))
    }
}

async fn broken() -> (StatusCode, Json<Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"isValid": true})))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"isValid": true}))
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/check", post(check_username))
        .route("/check-put", put(check_username))
        .route("/broken", post(broken))
        .route("/slow", post(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn request(addr: SocketAddr, path: &str, body: Value) -> RemoteRequest {
    RemoteRequest {
        endpoint: format!("http://{}{}", addr, path),
        method: reqwest::Method::POST,
        body,
    }
}

#[tokio::test]
async fn test_sends_json_body_and_reads_reply() {
    let addr = spawn_server().await;
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

    let response = transport
        .send(request(addr, "/check", json!({"fieldId": "username", "value": "ada"})))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.interpret().unwrap(), ValidationOutcome::valid());
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["echo"]["fieldId"], "username");
}

#[tokio::test]
async fn test_honours_method() {
    let addr = spawn_server().await;
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

    let mut put_request = request(addr, "/check-put", json!({"value": "taken"}));
    put_request.method = reqwest::Method::PUT;
    let response = transport.send(put_request).await.unwrap();
    assert_eq!(
        response.interpret().unwrap(),
        ValidationOutcome::invalid("Username taken")
    );

    // POST-only route
    let response = transport
        .send(request(addr, "/check-put", json!({"value": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status, 405);
    assert!(response.interpret().is_err());
}

#[tokio::test]
async fn test_non_2xx_is_not_an_answer() {
    let addr = spawn_server().await;
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

    let response = transport
        .send(request(addr, "/broken", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert!(response.interpret().is_err());
}

#[tokio::test]
async fn test_timeout() {
    let addr = spawn_server().await;
    let transport = HttpTransport::new(Duration::from_millis(100)).unwrap();

    let err = transport
        .send(request(addr, "/slow", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused() {
    let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
    let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();

    let err = transport
        .send(request(addr, "/check", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Request { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_validator_over_http() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let addr = spawn_server().await;

    let mut config = ValidatorConfig::default();
    config.remote.debounce_ms = 10;

    let doc = MemoryDocument::new();
    doc.insert(Field::new("username").in_form("signup").with_value("taken"));
    doc.insert(Field::new("nickname").in_form("signup").with_value("ada"));

    let transport = HttpTransport::from_config(&config.remote).unwrap();
    let validator = FormValidator::with_parts(
        config,
        Arc::new(doc.clone()),
        Arc::new(transport),
        Arc::new(NullSink),
    );
    validator.register_form("signup", FormPolicy::new());
    validator.add_server_validation(
        "username",
        format!("http://{}/check", addr),
        validator.remote_options(),
    );
    validator.add_server_validation(
        "nickname",
        format!("http://{}/broken", addr),
        validator.remote_options(),
    );

    let report = validator.evaluate_form(&"signup".into()).await;

    assert_eq!(
        report.outcome(&"username".into()),
        Some(&ValidationOutcome::invalid("Username taken"))
    );
    assert_eq!(
        report.outcome(&"nickname".into()),
        Some(&ValidationOutcome::invalid("validation unavailable"))
    );
}
