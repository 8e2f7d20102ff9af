//! Tests for the router builder.

use crate::error::BuildError;
use crate::router::{FlowgateRouter, DEFAULT_API_PREFIX};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use flowgate_core::test_utils::MockCollaborator;
use flowgate_core::{FlowConfig, Orchestrator};
use std::sync::Arc;
use tower::ServiceExt;

fn orchestrator() -> Orchestrator {
    Orchestrator::new(MockCollaborator::new(), FlowConfig::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[test]
fn test_router_builder_type_signature() {
    fn _accepts_owned(_: impl FnOnce(Orchestrator) -> FlowgateRouter) {}
    fn _accepts_arc(_: impl FnOnce(Arc<Orchestrator>) -> FlowgateRouter) {}

    _accepts_owned(FlowgateRouter::new);
    _accepts_arc(FlowgateRouter::from_arc);
}

#[test]
fn test_default_prefix() {
    assert_eq!(DEFAULT_API_PREFIX, "/api");
}

#[test]
fn test_relative_prefix_is_rejected() {
    let result = FlowgateRouter::new(orchestrator()).with_api("api").build();
    assert!(matches!(result, Err(BuildError::InvalidPrefix(p)) if p == "api"));
}

#[test]
fn test_invalid_origin_is_rejected() {
    let result = FlowgateRouter::new(orchestrator())
        .with_cors_origins(["http://localhost:3000", "bad\norigin"])
        .build();
    assert!(matches!(result, Err(BuildError::InvalidOrigin(o)) if o == "bad\norigin"));
}

#[tokio::test]
async fn test_state_served_under_default_prefix() {
    let app = FlowgateRouter::new(orchestrator()).build().unwrap();

    let response = app.oneshot(get("/api/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_custom_prefix_replaces_default() {
    let app = FlowgateRouter::new(orchestrator())
        .with_api("/v1/")
        .build()
        .unwrap();

    let response = app.clone().oneshot(get("/v1/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_root_prefix() {
    let app = FlowgateRouter::new(orchestrator())
        .with_api("/")
        .build()
        .unwrap();

    let response = app.oneshot(get("/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_build_nested() {
    let app = FlowgateRouter::new(orchestrator())
        .build_nested("/flowgate")
        .unwrap();

    let response = app.oneshot(get("/flowgate/api/state")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_headers_for_allowed_origin() {
    let app = FlowgateRouter::new(orchestrator())
        .with_cors_origins(["http://localhost:3000"])
        .build()
        .unwrap();

    let request = Request::builder()
        .uri("/api/state")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_no_cors_headers_by_default() {
    let app = FlowgateRouter::new(orchestrator()).build().unwrap();

    let request = Request::builder()
        .uri("/api/state")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
