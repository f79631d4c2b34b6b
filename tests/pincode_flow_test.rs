mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

fn set_cookie_values(headers: &axum::http::HeaderMap) -> Vec<String> {
    headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn update_then_resolve_round_trips_through_the_cookie() {
    let app = TestApp::new().await;
    let session = [("x-session-id", "tab-1")];

    let (status, headers, body) = app
        .put("/api/v1/pincode", &session, json!({"pincode": "560001"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "560001");

    let cookies = set_cookie_values(&headers);
    let pincode_cookie = cookies
        .iter()
        .find(|c| c.starts_with("user_pincode=560001"))
        .expect("durable cookie issued");
    assert!(pincode_cookie.contains("Max-Age=2592000"));
    assert!(pincode_cookie.contains("Path=/"));

    // Simulated reload carrying the durable cookie.
    let (status, _, body) = app
        .get(
            "/api/v1/pincode",
            &[("x-session-id", "tab-1"), ("cookie", "user_pincode=560001")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "560001");
    assert_eq!(body["data"]["source"], "cookie");
}

#[tokio::test]
async fn cache_fallback_backfills_the_cookie() {
    let app = TestApp::new().await;
    let session = [("x-session-id", "tab-2")];

    app.put("/api/v1/pincode", &session, json!({"pincode": "110001"}))
        .await;

    // Reload that lost the cookie: only the fast cache has the value.
    let (status, headers, body) = app.get("/api/v1/pincode", &session).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "110001");
    assert_eq!(body["data"]["source"], "cache");

    // Write-through: the durable cookie is re-issued so the stores converge.
    let cookies = set_cookie_values(&headers);
    assert!(cookies.iter().any(|c| c.starts_with("user_pincode=110001")));
}

#[tokio::test]
async fn equal_update_is_a_no_op() {
    let app = TestApp::new().await;

    let (status, headers, _) = app
        .put(
            "/api/v1/pincode",
            &[("x-session-id", "tab-3"), ("cookie", "user_pincode=560001")],
            json!({"pincode": "560001"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(set_cookie_values(&headers).is_empty());
}

#[tokio::test]
async fn resolve_with_no_selection_is_empty_not_an_error() {
    let app = TestApp::new().await;

    let (status, headers, body) = app
        .get("/api/v1/pincode", &[("x-session-id", "fresh")])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "");
    assert_eq!(body["data"]["source"], "none");
    assert!(set_cookie_values(&headers).is_empty());
}

#[tokio::test]
async fn resolver_accepts_malformed_values_verbatim() {
    // Format validation is the serviceability gate's job, not the
    // resolver's.
    let app = TestApp::new().await;
    let session = [("x-session-id", "tab-4")];

    let (status, _, body) = app
        .put("/api/v1/pincode", &session, json!({"pincode": "5600"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], "5600");

    // The gate then reports it unserviceable.
    let (status, _, body) = app.get("/api/v1/serviceability/5600", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["serviceable"], false);
}
