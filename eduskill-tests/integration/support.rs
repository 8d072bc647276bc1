//! Shared helpers for driving the router in-process.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use eduskill_core::config::EduskillConfig;
use eduskill_core::delivery::RangePolicy;
use eduskill_core::test_fixtures::TestMediaRoot;
use eduskill_web::{AppState, build_router};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Router over a scratch media root; keep the fixture alive for the test.
pub async fn test_app(policy: RangePolicy) -> (TestMediaRoot, Router) {
    let fixture = TestMediaRoot::new();
    let mut config = EduskillConfig::for_testing(fixture.path());
    config.media.range_policy = policy;

    let state = AppState::from_config(&config).await.unwrap();
    (fixture, build_router(state))
}

/// Send a GET, optionally with a Range header.
pub async fn get(app: &Router, uri: &str, range: Option<&str>) -> Response<Body> {
    let mut request = Request::get(uri);
    if let Some(range) = range {
        request = request.header("range", range);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Send a request with an arbitrary method and no body.
pub async fn send(app: &Router, method: &str, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Header value as text.
pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}
