//! Admin authentication middleware.
//!
//! The dashboard is protected by a single shared key sent in `X-Admin-Key`.
//! Only its SHA-256 digest is kept in configuration.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::crypto::key_matches_hash;

use crate::app::AppState;

/// Header carrying the admin key.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Middleware for admin-only routes.
///
/// Rejects every request when no key hash is configured.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.admin.api_key_hash.as_str();
    if expected.is_empty() {
        return unauthorized_response("Admin access is disabled");
    }

    let presented = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if key_matches_hash(key, expected) => next.run(req).await,
        Some(_) => {
            tracing::warn!("Rejected admin request with wrong key");
            unauthorized_response("Invalid admin key")
        }
        None => unauthorized_response("Missing admin key"),
    }
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::create_app;
    use crate::config::Config;
    use domain::store::MemoryStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(hash: &str) -> axum::Router {
        let config = Config::load_for_test(&[("admin.api_key_hash", hash)]).unwrap();
        create_app(config, Arc::new(MemoryStore::new()))
    }

    fn stats_request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/admin/stats");
        if let Some(key) = key {
            builder = builder.header(ADMIN_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Test message");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_key_passes() {
        let hash = shared::crypto::sha256_hex("s3cret");
        let response = app(&hash).oneshot(stats_request(Some("s3cret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_or_missing_key_rejected() {
        let hash = shared::crypto::sha256_hex("s3cret");
        let response = app(&hash).oneshot(stats_request(Some("guess"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(&hash).oneshot(stats_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unconfigured_hash_disables_admin() {
        let response = app("").oneshot(stats_request(Some(""))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
