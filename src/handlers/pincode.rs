use axum::{
    extract::{Json, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::handlers::common::{cookie_value, pincode_set_cookie, session_id};
use crate::services::pincode::{PincodeSelection, PINCODE_COOKIE};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePincodeRequest {
    /// The selected pincode. Stored as supplied; format validation
    /// happens at the serviceability gate.
    #[schema(example = "560001")]
    pub pincode: String,
}

/// Resolve the current pincode selection
#[utoipa::path(
    get,
    path = "/api/v1/pincode",
    responses(
        (status = 200, description = "Current selection (empty when none)", body = crate::ApiResponse<PincodeSelection>)
    ),
    tag = "Pincode"
)]
pub async fn resolve_pincode(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let session = session_id(&headers);
    let cookie = cookie_value(&headers, PINCODE_COOKIE);

    let resolved = state
        .services
        .pincode
        .resolve(&session, cookie.as_deref())
        .await?;

    let mut response =
        Json(ApiResponse::success(resolved.selection.clone())).into_response();
    if resolved.backfill_cookie {
        // Only the fast cache had the value; converge the durable store.
        response.headers_mut().append(
            header::SET_COOKIE,
            pincode_set_cookie(&resolved.selection.value)?,
        );
    }
    Ok(response)
}

/// Update the pincode selection
#[utoipa::path(
    put,
    path = "/api/v1/pincode",
    request_body = UpdatePincodeRequest,
    responses(
        (status = 200, description = "Selection after the update", body = crate::ApiResponse<PincodeSelection>)
    ),
    tag = "Pincode"
)]
pub async fn update_pincode(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePincodeRequest>,
) -> Result<Response, ServiceError> {
    let session = session_id(&headers);
    let cookie = cookie_value(&headers, PINCODE_COOKIE);

    // Build the cookie header first so an unrepresentable value fails
    // before the cache is touched and the pair stays consistent.
    let set_cookie = pincode_set_cookie(&payload.pincode)?;

    let updated = state
        .services
        .pincode
        .update(&session, cookie.as_deref(), &payload.pincode)
        .await?;

    let mut response = Json(ApiResponse::success(updated.selection.clone())).into_response();
    if updated.changed {
        response
            .headers_mut()
            .append(header::SET_COOKIE, set_cookie);
    }
    Ok(response)
}
