use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::handlers::common::cookie_value;

/// Cookie whose presence grants access to the admin console.
pub const ADMIN_SESSION_COOKIE: &str = "admin_session";

const ADMIN_PREFIX: &str = "/admin";
const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Gate every `/admin/*` route except login behind the session cookie.
/// Unauthenticated requests are redirected to the login page with the
/// original path carried in the `redirect` query parameter.
pub async fn admin_session_gate(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path();

    let is_admin = path == ADMIN_PREFIX || path.starts_with("/admin/");
    if !is_admin || path == ADMIN_LOGIN_PATH {
        return next.run(request).await;
    }

    if cookie_value(request.headers(), ADMIN_SESSION_COOKIE).is_some() {
        return next.run(request).await;
    }

    debug!(path, "unauthenticated admin request, redirecting to login");
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    Redirect::to(&format!("{ADMIN_LOGIN_PATH}?redirect={encoded}")).into_response()
}
