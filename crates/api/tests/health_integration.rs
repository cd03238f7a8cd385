//! Integration tests for probes, cross-cutting headers and rate limiting.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    create_test_app, get_request, json_request, parse_response_body, seeded_app, seeded_store,
    test_config_with,
};
use serde_json::json;
use tower::ServiceExt;
use wedding_rsvp_api::middleware::REQUEST_ID_HEADER;

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _store) = seeded_app();

    let response = app.clone().oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["connected"], true);

    let response = app.clone().oneshot(get_request("/api/health/live")).await.unwrap();
    assert_eq!(parse_response_body(response).await["status"], "alive");

    let response = app.oneshot(get_request("/api/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "ready");
}

#[tokio::test]
async fn test_request_id_header() {
    let (app, _store) = seeded_app();

    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_public_routes_are_rate_limited() {
    let app = create_test_app(
        test_config_with(&[("security.rate_limit_per_minute", "2")]),
        seeded_store(),
    );

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/invitations/access",
                json!({"code": "ZZZ999"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/invitations/access",
            json!({"code": "ABC123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Probes are not limited.
    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn access_from(forwarded_for: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/invitations/access")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(json!({"code": "ZZZ999"}).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_trusted_proxy() {
    let app = create_test_app(
        test_config_with(&[("security.rate_limit_per_minute", "1")]),
        seeded_store(),
    );

    let response = app.clone().oneshot(access_from("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for last in 2..20 {
        let response = app
            .clone()
            .oneshot(access_from(&format!("203.0.113.{last}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

#[tokio::test]
async fn test_forwarded_for_keys_clients_behind_trusted_proxy() {
    let app = create_test_app(
        test_config_with(&[
            ("security.rate_limit_per_minute", "1"),
            ("security.trust_forwarded_for", "true"),
        ]),
        seeded_store(),
    );

    for client in ["203.0.113.1", "203.0.113.2"] {
        let response = app.clone().oneshot(access_from(client)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app.oneshot(access_from("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _store) = seeded_app();

    let response = app.oneshot(get_request("/api/v1/nothing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
