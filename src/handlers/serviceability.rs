use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::handlers::admin::load_pincode_list;
use crate::services::serviceability::Serviceability;
use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceabilityResponse {
    #[schema(example = "560001")]
    pub pincode: String,
    pub serviceable: bool,
    #[schema(example = "serviceable")]
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Delivery in 20 minutes")]
    pub delivery_message: Option<String>,
}

/// Check whether any active vendor delivers to a pincode
#[utoipa::path(
    get,
    path = "/api/v1/serviceability/{pincode}",
    params(("pincode" = String, Path, description = "6-digit pincode")),
    responses(
        (status = 200, description = "Serviceability result", body = crate::ApiResponse<ServiceabilityResponse>)
    ),
    tag = "Serviceability"
)]
pub async fn check_serviceability(
    State(state): State<AppState>,
    Path(pincode): Path<String>,
) -> Result<Json<ApiResponse<ServiceabilityResponse>>, ServiceError> {
    let result = state.services.serviceability.check(&pincode).await;

    let response = match result {
        Serviceability::Serviceable { delivery_message } => ServiceabilityResponse {
            pincode,
            serviceable: true,
            status: "serviceable",
            delivery_message: Some(delivery_message),
        },
        Serviceability::Unserviceable => ServiceabilityResponse {
            pincode,
            serviceable: false,
            status: "unserviceable",
            delivery_message: None,
        },
        Serviceability::Unknown => ServiceabilityResponse {
            pincode,
            serviceable: false,
            status: "unknown",
            delivery_message: None,
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

/// List all serviceable pincodes (storefront location picker)
#[utoipa::path(
    get,
    path = "/api/v1/pincodes",
    responses(
        (status = 200, description = "Master pincode list", body = crate::ApiResponse<crate::handlers::admin::PincodeListResponse>)
    ),
    tag = "Serviceability"
)]
pub async fn list_pincodes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<crate::handlers::admin::PincodeListResponse>>, ServiceError> {
    let pincodes = load_pincode_list(&state).await?;
    Ok(Json(ApiResponse::success(
        crate::handlers::admin::PincodeListResponse { pincodes },
    )))
}
