/// Router tests that never reach the database
///
/// The router runs over a lazily connected pool pointing at a closed port,
/// so these cover middleware, validation, rate limiting and error shapes.

mod common;

use amari_shared::concierge::{ConciergeClient, FALLBACK_REPLY};
use axum::http::{header, Method, StatusCode};
use common::{expect, lazy_app, lazy_state, read_json, request, send};
use serde_json::json;

const WELL_FORMED_TOKEN: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

#[tokio::test]
async fn test_ping() {
    let app = lazy_app();

    let body = expect(&app, request(Method::GET, "/v1/ping", None, None), StatusCode::OK).await;

    assert_eq!(body["ok"], true);
    assert!(body["time"].is_string());
    assert_eq!(body["env"]["has_database_url"], true);
    assert_eq!(body["env"]["has_concierge_key"], false);
    assert_eq!(body["env"]["environment"], "test");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = lazy_app();

    let ok = send(&app, request(Method::GET, "/v1/ping", None, None)).await;
    assert_eq!(ok.headers()["x-content-type-options"], "nosniff");
    assert_eq!(ok.headers()["x-frame-options"], "DENY");
    assert!(ok.headers().get("strict-transport-security").is_none());

    let missing = send(&app, request(Method::GET, "/v1/nope", None, None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_health_degraded_without_database() {
    let app = lazy_app();

    let body = expect(&app, request(Method::GET, "/health", None, None), StatusCode::OK).await;

    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = lazy_app();

    for (method, uri) in [
        (Method::GET, "/v1/auth/me"),
        (Method::POST, "/v1/auth/logout"),
        (Method::GET, "/v1/budget"),
        (Method::GET, "/v1/guests"),
        (Method::GET, "/v1/vendor-applications/mine"),
        (Method::GET, "/v1/admin/stats"),
        (Method::DELETE, "/v1/posts/00000000-0000-0000-0000-000000000000"),
    ] {
        let body = expect(&app, request(method, uri, None, None), StatusCode::UNAUTHORIZED).await;
        assert_eq!(body["error"], "unauthorized", "{}", uri);
    }
}

#[tokio::test]
async fn test_malformed_token_rejected_before_lookup() {
    let app = lazy_app();

    let body = expect(
        &app,
        request(Method::GET, "/v1/budget", None, Some("not-a-session-token")),
        StatusCode::UNAUTHORIZED,
    )
    .await;

    assert_eq!(body["message"], "Invalid or expired session");
}

#[tokio::test]
async fn test_login_rate_limited_after_ten_attempts() {
    let app = lazy_app();

    let attempt = || {
        let mut req = request(
            Method::POST,
            "/v1/auth/login",
            Some(json!({ "email": "not-an-email", "password": "x" })),
            None,
        );
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        req
    };

    for _ in 0..10 {
        let response = send(&app, attempt()).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let response = send(&app, attempt()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=900).contains(&retry_after));

    let body = read_json(response).await;
    assert_eq!(body["error"], "rate_limit_exceeded");

    // a different client is unaffected
    let mut other = request(
        Method::POST,
        "/v1/auth/login",
        Some(json!({ "email": "not-an-email", "password": "x" })),
        None,
    );
    other
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.2".parse().unwrap());
    assert_eq!(
        send(&app, other).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_register_rejects_admin_role() {
    let app = lazy_app();

    let body = expect(
        &app,
        request(
            Method::POST,
            "/v1/auth/register",
            Some(json!({
                "email": "ana@example.com",
                "password": "longenough",
                "first_name": "Ana",
                "last_name": "Silva",
                "user_type": "admin",
            })),
            None,
        ),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "user_type");
}

#[tokio::test]
async fn test_register_enforces_password_policy() {
    let app = lazy_app();

    let body = expect(
        &app,
        request(
            Method::POST,
            "/v1/auth/register",
            Some(json!({
                "email": "ana@example.com",
                "password": "short",
                "first_name": "Ana",
                "last_name": "Silva",
            })),
            None,
        ),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    assert_eq!(body["details"][0]["field"], "password");
    assert_eq!(
        body["details"][0]["message"],
        "Password must be at least 8 characters long"
    );
}

#[tokio::test]
async fn test_reset_password_validation() {
    let app = lazy_app();

    let body = expect(
        &app,
        request(
            Method::POST,
            "/v1/auth/reset-password",
            Some(json!({ "token": "", "new_password": "longenough" })),
            None,
        ),
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(body["message"], "Token and new password are required");

    let body = expect(
        &app,
        request(
            Method::POST,
            "/v1/auth/reset-password",
            Some(json!({ "token": WELL_FORMED_TOKEN, "new_password": "short" })),
            None,
        ),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    assert_eq!(body["details"][0]["field"], "new_password");
}

#[tokio::test]
async fn test_vendor_filter_rejects_unknown_category() {
    let app = lazy_app();

    let body = expect(
        &app,
        request(Method::GET, "/v1/vendors?category=Florist", None, None),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    assert_eq!(body["details"][0]["field"], "category");
}

#[tokio::test]
async fn test_concierge_unconfigured() {
    let app = lazy_app();

    let response = send(
        &app,
        request(
            Method::POST,
            "/v1/concierge/chat",
            Some(json!({ "message": "Best month for a beach wedding?" })),
            None,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["x-ratelimit-limit"], "20");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "19");

    let body = read_json(response).await;
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_concierge_rate_limited() {
    let app = lazy_app();
    let chat = || {
        request(
            Method::POST,
            "/v1/concierge/chat",
            Some(json!({ "message": "hello" })),
            None,
        )
    };

    for _ in 0..20 {
        assert_eq!(
            send(&app, chat()).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    let response = send(&app, chat()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert!(response.headers().get(header::RETRY_AFTER).is_some());
}

#[tokio::test]
async fn test_concierge_upstream_failure_falls_back() {
    let concierge = ConciergeClient::new("test-key", "gemini-2.5-flash")
        .unwrap()
        .with_base_url("http://127.0.0.1:1/v1beta");
    let app = amari_api::app::build_router(lazy_state().with_concierge(concierge));

    let body = expect(
        &app,
        request(
            Method::POST,
            "/v1/concierge/chat",
            Some(json!({ "message": "Is March a good month?", "context": "80 guests" })),
            None,
        ),
        StatusCode::OK,
    )
    .await;

    assert_eq!(body["reply"], FALLBACK_REPLY);
}
