mod common;

use axum::http::StatusCode;
use common::{TestApp, ADMIN_COOKIE};
use serde_json::json;

#[tokio::test]
async fn unauthenticated_admin_requests_redirect_to_login() {
    let app = TestApp::new().await;

    let (status, headers, _) = app.get("/admin/pincodes", &[]).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get("location").and_then(|v| v.to_str().ok()),
        Some("/admin/login?redirect=%2Fadmin%2Fpincodes")
    );
}

#[tokio::test]
async fn login_issues_the_session_cookie() {
    let app = TestApp::new().await;
    let token = app.state.config.admin_token.clone();

    let (status, _, _) = app
        .post("/admin/login", &[], json!({"token": "wrong"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, headers, _) = app
        .post("/admin/login", &[], json!({"token": token}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("session cookie issued");
    assert!(cookie.starts_with("admin_session=1"));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn logout_expires_the_session_cookie() {
    let app = TestApp::new().await;

    let (status, headers, _) = app
        .post("/admin/logout", &[ADMIN_COOKIE], json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("admin_session="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn add_list_remove_round_trip() {
    let app = TestApp::new().await;

    let (status, _, body) = app
        .post("/admin/pincodes", &[ADMIN_COOKIE], json!({"pincode": "400001"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pincodes"], json!(["400001"]));

    let (status, _, body) = app.get("/admin/pincodes", &[ADMIN_COOKIE]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pincodes"], json!(["400001"]));

    let (status, _, body) = app
        .delete("/admin/pincodes?pincode=400001", &[ADMIN_COOKIE])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pincodes"], json!([]));
}

#[tokio::test]
async fn appending_twice_keeps_set_semantics() {
    let app = TestApp::new().await;

    for _ in 0..2 {
        let (status, _, _) = app
            .post("/admin/pincodes", &[ADMIN_COOKIE], json!({"pincode": "400001"}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, _, body) = app.get("/admin/pincodes", &[ADMIN_COOKIE]).await;
    assert_eq!(body["data"]["pincodes"], json!(["400001"]));
}

#[tokio::test]
async fn invalid_pincodes_are_rejected_and_the_list_is_unchanged() {
    let app = TestApp::new().await;
    app.post("/admin/pincodes", &[ADMIN_COOKIE], json!({"pincode": "400001"}))
        .await;

    for bad in ["40001", "4000011", "40000a", ""] {
        let (status, _, _) = app
            .post("/admin/pincodes", &[ADMIN_COOKIE], json!({"pincode": bad}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "pincode {bad:?}");
    }

    let (status, _, _) = app
        .delete("/admin/pincodes?pincode=40001", &[ADMIN_COOKIE])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, body) = app.get("/admin/pincodes", &[ADMIN_COOKIE]).await;
    assert_eq!(body["data"]["pincodes"], json!(["400001"]));
}

#[tokio::test]
async fn the_list_is_sorted_and_mirrored_publicly() {
    let app = TestApp::new().await;
    for pincode in ["560001", "110001", "400001"] {
        app.post("/admin/pincodes", &[ADMIN_COOKIE], json!({"pincode": pincode}))
            .await;
    }

    let (_, _, body) = app.get("/admin/pincodes", &[ADMIN_COOKIE]).await;
    assert_eq!(
        body["data"]["pincodes"],
        json!(["110001", "400001", "560001"])
    );

    // The storefront picker reads the same list without a session.
    let (status, _, body) = app.get("/api/v1/pincodes", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["pincodes"],
        json!(["110001", "400001", "560001"])
    );
}

#[tokio::test]
async fn vendor_management_round_trip() {
    let app = TestApp::new().await;

    let (status, _, body) = app
        .post(
            "/admin/vendors",
            &[ADMIN_COOKIE],
            json!({
                "name": "Fresh Basket",
                "pincodes": ["560001"],
                "delivery_message": "Delivery in 20 minutes"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "active");
    let vendor_id = body["data"]["id"].as_str().unwrap().to_string();

    // The new vendor immediately answers serviceability.
    let (_, _, body) = app.get("/api/v1/serviceability/560001", &[]).await;
    assert_eq!(body["data"]["serviceable"], true);

    // Deactivate and the pincode drops off.
    let (status, _, _) = app
        .put(
            &format!("/admin/vendors/{vendor_id}/status"),
            &[ADMIN_COOKIE],
            json!({"status": "inactive"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = app.get("/api/v1/serviceability/560001", &[]).await;
    assert_eq!(body["data"]["serviceable"], false);
}

#[tokio::test]
async fn vendor_with_invalid_pincode_is_rejected() {
    let app = TestApp::new().await;

    let (status, _, _) = app
        .post(
            "/admin/vendors",
            &[ADMIN_COOKIE],
            json!({
                "name": "Broken",
                "pincodes": ["56001"],
                "delivery_message": ""
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
