//! Integration tests for event ingestion and the admin dashboard API
//!
//! Covers:
//! - Health endpoint
//! - Event ingestion: anonymous and signed-in, payload validation
//! - Admin gate: missing/expired sessions and non-admin users
//! - Lead scoring, site/page stats, per-user intent

use axum::http::StatusCode;
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot` method

mod common;
use common::*;

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = setup_app(StubMetadata::new()).await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "arbourne-web");
}

// =============================================================================
// Event ingestion
// =============================================================================

#[tokio::test]
async fn test_anonymous_event_ingestion() {
    let (app, pool) = setup_app(StubMetadata::new()).await;

    let body = json!({
        "eventType": "PAGE_VIEW",
        "path": "/speakers/duet-15",
        "sessionId": "sess-1"
    });
    let response = app.oneshot(post_json("/api/events", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = extract_json(response.into_body()).await;
    assert_eq!(stored["success"], true);

    let user_id: Option<String> = sqlx::query_scalar("SELECT user_id FROM user_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(user_id.is_none());
}

#[tokio::test]
async fn test_signed_in_event_carries_user_id() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "u1", "visitor@example.com", "member").await;
    let token = seed_session(&pool, "u1", 24).await;

    let body = json!({
        "eventType": "PRODUCT_VIEW",
        "eventData": { "productHandle": "duet-15" },
        "path": "/speakers/duet-15",
        "sessionId": "sess-1"
    });
    let response = app
        .oneshot(post_json("/api/events", Some(&token), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user_id: Option<String> = sqlx::query_scalar("SELECT user_id FROM user_events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_unknown_event_type_rejected() {
    let (app, _pool) = setup_app(StubMetadata::new()).await;

    let body = json!({
        "eventType": "MYSTERY_EVENT",
        "path": "/",
        "sessionId": "sess-1"
    });
    let response = app.oneshot(post_json("/api/events", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payload_shape_mismatch_rejected() {
    let (app, _pool) = setup_app(StubMetadata::new()).await;

    // PAGE_VIEW takes no payload fields
    let body = json!({
        "eventType": "PAGE_VIEW",
        "eventData": { "productHandle": "duet-15" },
        "path": "/",
        "sessionId": "sess-1"
    });
    let response = app.oneshot(post_json("/api/events", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_session_id_rejected() {
    let (app, _pool) = setup_app(StubMetadata::new()).await;

    let body = json!({
        "eventType": "PAGE_VIEW",
        "path": "/",
        "sessionId": ""
    });
    let response = app.oneshot(post_json("/api/events", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Admin gate
// =============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_session() {
    let (app, _pool) = setup_app(StubMetadata::new()).await;

    for uri in [
        "/api/admin/leads",
        "/api/admin/stats",
        "/api/admin/pages",
        "/api/admin/users/u1/intent",
    ] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {}", uri);
    }
}

#[tokio::test]
async fn test_admin_endpoints_reject_members() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "u1", "visitor@example.com", "member").await;
    let token = seed_session(&pool, "u1", 24).await;

    let response = app
        .oneshot(get("/api/admin/leads", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_unauthorized() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "a1", "admin@example.com", "admin").await;
    let token = seed_session(&pool, "a1", -1).await;

    let response = app
        .oneshot(get("/api/admin/leads", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_allowlisted_founder_passes_gate() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "f1", "nico@arbourne.audio", "member").await;
    let token = seed_session(&pool, "f1", 24).await;

    let response = app
        .oneshot(get("/api/admin/leads", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Lead scoring
// =============================================================================

#[tokio::test]
async fn test_lead_score_breakdown() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "a1", "admin@example.com", "admin").await;
    seed_user(&pool, "u1", "lead@example.com", "member").await;
    let token = seed_session(&pool, "a1", 24).await;

    // One enquiry submit (10) plus one product revisit (3)
    seed_event(&pool, Some("u1"), "ENQUIRY_SUBMIT", Some(r#"{"formType":"contact"}"#), 1).await;
    seed_event(
        &pool,
        Some("u1"),
        "PRODUCT_REVISIT",
        Some(r#"{"productHandle":"duet-15"}"#),
        2,
    )
    .await;

    let response = app
        .oneshot(get("/api/admin/leads", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let leads = body["leads"].as_array().unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0]["userId"], "u1");
    assert_eq!(leads[0]["totalScore"], 13);
    assert_eq!(leads[0]["topInterests"][0]["productHandle"], "duet-15");
}

#[tokio::test]
async fn test_lead_window_excludes_old_events() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "a1", "admin@example.com", "admin").await;
    seed_user(&pool, "u1", "lead@example.com", "member").await;
    let token = seed_session(&pool, "a1", 24).await;

    // Outside the 7 day window
    seed_event(&pool, Some("u1"), "ENQUIRY_SUBMIT", Some(r#"{"formType":"contact"}"#), 10).await;

    let response = app
        .oneshot(get("/api/admin/leads?range=7d", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["leads"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_invalid_range_rejected() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "a1", "admin@example.com", "admin").await;
    let token = seed_session(&pool, "a1", 24).await;

    let response = app
        .oneshot(get("/api/admin/leads?range=90d", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Stats and intent
// =============================================================================

#[tokio::test]
async fn test_site_stats() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "a1", "admin@example.com", "admin").await;
    let token = seed_session(&pool, "a1", 24).await;

    seed_event(&pool, None, "PAGE_VIEW", None, 1).await;
    seed_event(&pool, None, "PAGE_VIEW", None, 1).await;
    seed_event(
        &pool,
        Some("a1"),
        "BLOG_DEEP_READ",
        Some(r#"{"articleSlug":"room-acoustics","readSeconds":240}"#),
        1,
    )
    .await;

    let response = app
        .oneshot(get("/api/admin/stats", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totalEvents"], 3);
}

#[tokio::test]
async fn test_user_intent_unknown_user_is_404() {
    let (app, pool) = setup_app(StubMetadata::new()).await;
    seed_user(&pool, "a1", "admin@example.com", "admin").await;
    let token = seed_session(&pool, "a1", 24).await;

    let response = app
        .oneshot(get("/api/admin/users/ghost/intent", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
