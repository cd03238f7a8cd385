//! Common test utilities for integration tests.
//!
//! Every test runs the full router against a fresh in-memory store.

// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::store::{MemoryStore, INVITATION_CODES, RESPONSES};
use serde_json::{json, Value};
use std::sync::Arc;
use wedding_rsvp_api::{app::create_app, config::Config, middleware::ADMIN_KEY_HEADER};

pub const ADMIN_KEY: &str = "integration-admin-key";

/// Code with two guests, open for RSVP and lodging.
pub const FAMILY_CODE: &str = "ABC123";
/// Code limited to the vin d'honneur.
pub const VIN_CODE: &str = "VIN777";
/// Valid code that is not on the RSVP list.
pub const CLOSED_CODE: &str = "CLO555";

/// Test configuration: in-memory store, no rate limit, a known admin key.
pub fn test_config() -> Config {
    test_config_with(&[])
}

pub fn test_config_with(extra: &[(&str, &str)]) -> Config {
    let hash = shared::crypto::sha256_hex(ADMIN_KEY);
    let mut overrides: Vec<(&str, &str)> = vec![
        ("admin.api_key_hash", hash.as_str()),
        ("invitations.rsvp_codes", "ABC123,VIN777"),
        ("invitations.lodging_codes", "ABC123"),
        ("invitations.vin_honneur_codes", "VIN777"),
    ];
    overrides.extend_from_slice(extra);
    Config::load_for_test(&overrides).expect("Failed to load test config")
}

/// Store seeded with three invitation codes and no responses.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        INVITATION_CODES,
        FAMILY_CODE,
        json!({
            "members": ["Alice", "Bob"],
            "description": "Famille Martin",
            "message": "Nous avons hâte de vous voir !"
        }),
    );
    store.seed(
        INVITATION_CODES,
        VIN_CODE,
        json!({"members": ["Chloé"], "description": "Collègues"}),
    );
    store.seed(
        INVITATION_CODES,
        CLOSED_CODE,
        json!({"members": ["Dan"], "description": "Voisins"}),
    );
    store
}

/// Seeds a response directly, bypassing the API.
pub fn seed_response(store: &MemoryStore, code: &str, guest: &str, status: &str) {
    store.seed(
        RESPONSES,
        &format!("{code}:{guest}"),
        json!({
            "code": code,
            "guest_name": guest,
            "status": status,
            "email": "",
            "comment": "",
            "attendance": {"saturday_wedding": status == "accepted"}
        }),
    );
}

pub fn create_test_app(config: Config, store: MemoryStore) -> Router {
    create_app(config, Arc::new(store))
}

/// App over [`seeded_store`] with the default test config.
pub fn seeded_app() -> (Router, MemoryStore) {
    let store = seeded_store();
    (create_test_app(test_config(), store.clone()), store)
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request carrying the admin key.
pub fn admin_get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(ADMIN_KEY_HEADER, ADMIN_KEY)
        .body(Body::empty())
        .unwrap()
}

pub fn admin_json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ADMIN_KEY_HEADER, ADMIN_KEY)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

pub async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
