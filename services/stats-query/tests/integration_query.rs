//! End-to-end tests through the full router: auth, decoding, dispatch
//! against a mocked backend, and the response envelope.

use clap::Parser;
use stats_query::{AppState, Config};
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(backend_url: &str) -> Config {
    Config::parse_from(["stats-query", "--backend-url", backend_url])
}

async fn app(backend_url: &str) -> axum::Router {
    stats_query::routes::router().with_state(AppState::new(config(backend_url)))
}

#[tokio::test]
async fn query_without_org_key_header_is_rejected() {
    let app = app("http://127.0.0.1:1").await;
    let req = axum::http::Request::builder()
        .uri("/v1.0/stats/query?query=%7B%22zone_name%22%3A%22z%22%7D")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn query_runs_end_to_end_and_returns_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"timeseries":[{"data":[[1000.0, 42.0]]}]}"#),
        )
        .mount(&server)
        .await;

    let app = app(&server.uri()).await;
    let body = r#"{"zone_name":"z","timeseries":[{"query_type":"requests"}]}"#;
    let encoded = url::form_urlencoded::byte_serialize(body.as_bytes()).collect::<String>();
    let req = axum::http::Request::builder()
        .uri(format!("/v1.0/stats/query?query={encoded}"))
        .header("X-Turbine-API-Key", "acme")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].is_null());
    assert_eq!(json["payload"]["timeseries"][0]["points"][0]["value"], 42.0);
}

#[tokio::test]
async fn backend_failure_surfaces_as_500_misc() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = app(&server.uri()).await;
    let body = r#"{"zone_name":"z","timeseries":[{"query_type":"requests"}]}"#;
    let encoded = url::form_urlencoded::byte_serialize(body.as_bytes()).collect::<String>();
    let req = axum::http::Request::builder()
        .uri(format!("/v1.0/stats/query?query={encoded}"))
        .header("X-Turbine-API-Key", "acme")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"]["code"], "Misc");
    assert!(json["payload"].is_null());
}

#[tokio::test]
async fn forward_stub_returns_not_implemented() {
    let app = app("http://127.0.0.1:1").await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/v1.0/stats/forward")
        .header("X-Turbine-API-Key", "acme")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn health_check_does_not_require_auth() {
    let app = app("http://127.0.0.1:1").await;
    let req = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}
