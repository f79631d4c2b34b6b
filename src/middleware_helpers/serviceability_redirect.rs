use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::handlers::common::cookie_value;
use crate::services::pincode::PINCODE_COOKIE;
use crate::services::serviceability::decide_redirect;
use crate::AppState;

/// Paths where serviceability is mandatory. Cart mutation is deliberately
/// not gated; only checkout navigation is.
fn is_mandatory(path: &str) -> bool {
    path == "/api/v1/checkout/initiate"
}

/// Redirect checkout navigation away when the resolved pincode is
/// unserviceable. Exempt paths and the degraded `Unknown` outcome never
/// redirect.
pub async fn serviceability_redirect(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_mandatory(&path) {
        return next.run(request).await;
    }

    let pincode = cookie_value(request.headers(), PINCODE_COOKIE).unwrap_or_default();
    let serviceability = state.services.serviceability.check(&pincode).await;

    let decision = decide_redirect(
        &path,
        &state.config.exempt_path_prefixes(),
        &state.config.location_picker_path,
        &serviceability,
    );

    match decision {
        Some(target) => {
            debug!(%path, %pincode, "unserviceable pincode, redirecting");
            Redirect::to(&target).into_response()
        }
        None => next.run(request).await,
    }
}
