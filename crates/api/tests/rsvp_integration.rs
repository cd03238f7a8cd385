//! Integration tests for RSVP submission.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    get_request, json_request, parse_response_body, seeded_app, CLOSED_CODE, FAMILY_CODE,
    VIN_CODE,
};
use domain::store::{DocumentStore, INVITATION_CODES, RESPONSES};
use serde_json::{json, Value};
use tower::ServiceExt;

fn responses_uri(code: &str) -> String {
    format!("/api/v1/invitations/{code}/responses")
}

fn accepted(guest: &str) -> Value {
    json!({
        "guest_name": guest,
        "status": "accepted",
        "email": "guest@example.com",
        "comment": "Avec plaisir",
        "song": "September",
        "attendance": {"saturday_wedding": true, "sunday_brunch": true}
    })
}

// ============================================================================
// Successful submissions
// ============================================================================

#[tokio::test]
async fn test_submit_accepted_response() {
    let (app, store) = seeded_app();

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), accepted("Alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], FAMILY_CODE);
    assert_eq!(body["guest_name"], "Alice");
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["attendance"]["saturday_wedding"], true);
    assert_eq!(body["attendance"]["friday_evening"], false);
    assert!(body["modified_at"].is_string());

    let doc = store
        .get_document(RESPONSES, "ABC123:Alice")
        .await
        .unwrap()
        .expect("response stored");
    assert_eq!(doc.data["email"], "guest@example.com");

    // Worked example: Alice accepted, Bob still pending.
    let guests = parse_response_body(
        app.oneshot(get_request("/api/v1/invitations/ABC123/guests"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(guests[0]["status"], "accepted");
    assert_eq!(guests[1]["status"], "pending");
}

#[tokio::test]
async fn test_submit_touches_invitation_last_used() {
    let (app, store) = seeded_app();

    app.oneshot(json_request(Method::POST, &responses_uri("abc123"), accepted("Bob")))
        .await
        .unwrap();

    let invitation = store
        .get_document(INVITATION_CODES, FAMILY_CODE)
        .await
        .unwrap()
        .unwrap();
    assert!(invitation.data["last_used_at"].is_string());
}

#[tokio::test]
async fn test_resubmission_overwrites() {
    let (app, store) = seeded_app();

    app.clone()
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), accepted("Alice")))
        .await
        .unwrap();
    let response = app
        .oneshot(json_request(
            Method::POST,
            &responses_uri(FAMILY_CODE),
            json!({
                "guest_name": "Alice",
                "status": "declined",
                "comment": "Désolée",
                "attendance": {"saturday_wedding": true}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.len(RESPONSES), 1);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "declined");
    // Declined answers carry no attendance.
    assert_eq!(body["attendance"]["saturday_wedding"], false);
}

#[tokio::test]
async fn test_vin_honneur_only_needs_no_attendance() {
    let (app, _store) = seeded_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            &responses_uri(VIN_CODE),
            json!({
                "guest_name": "Chloé",
                "status": "accepted",
                "song": "Dancing Queen",
                "attendance": {"friday_evening": true}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["attendance"]["friday_evening"], false);
    assert!(body.get("song").is_none());
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_accepted_without_event_is_rejected_before_write() {
    let (app, store) = seeded_app();

    let response = app
        .oneshot(json_request(
            Method::POST,
            &responses_uri(FAMILY_CODE),
            json!({"guest_name": "Alice", "status": "accepted"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty(RESPONSES));
}

#[tokio::test]
async fn test_unknown_guest_is_rejected() {
    let (app, store) = seeded_app();

    let response = app
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), accepted("Mallory")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.is_empty(RESPONSES));
}

#[tokio::test]
async fn test_code_not_open_for_rsvp() {
    let (app, store) = seeded_app();

    let response = app
        .oneshot(json_request(Method::POST, &responses_uri(CLOSED_CODE), accepted("Dan")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.is_empty(RESPONSES));
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let (app, _store) = seeded_app();
    let mut body = accepted("Alice");
    body["email"] = json!("not-an-email");

    let response = app
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "Invalid email format");
}

#[tokio::test]
async fn test_unknown_code_is_not_found() {
    let (app, _store) = seeded_app();

    let response = app
        .oneshot(json_request(Method::POST, &responses_uri("ZZZ999"), accepted("Alice")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Concurrent edits
// ============================================================================

#[tokio::test]
async fn test_stale_expected_modified_at_conflicts() {
    let (app, store) = seeded_app();

    let first = parse_response_body(
        app.clone()
            .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), accepted("Alice")))
            .await
            .unwrap(),
    )
    .await;
    let seen = first["modified_at"].clone();

    // Someone else edits the response meanwhile.
    app.clone()
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), accepted("Alice")))
        .await
        .unwrap();

    let mut stale = accepted("Alice");
    stale["status"] = json!("declined");
    stale["expected_modified_at"] = seen;
    let response = app
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), stale))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let doc = store.get_document(RESPONSES, "ABC123:Alice").await.unwrap().unwrap();
    assert_eq!(doc.data["status"], "accepted");
}

#[tokio::test]
async fn test_current_expected_modified_at_succeeds() {
    let (app, _store) = seeded_app();

    let first = parse_response_body(
        app.clone()
            .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), accepted("Bob")))
            .await
            .unwrap(),
    )
    .await;

    let mut update = accepted("Bob");
    update["comment"] = json!("Finalement végétarien");
    update["expected_modified_at"] = first["modified_at"].clone();
    let response = app
        .oneshot(json_request(Method::POST, &responses_uri(FAMILY_CODE), update))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["comment"], "Finalement végétarien");
    assert_ne!(body["modified_at"], first["modified_at"]);
}
