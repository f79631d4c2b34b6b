use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::vendor::{self, VendorStatus};
use crate::entities::{service_pincode, ServicePincode, Vendor};
use crate::errors::ServiceError;
use crate::handlers::common::{expire_cookie, session_set_cookie, validate_input};
use crate::middleware_helpers::admin_session::ADMIN_SESSION_COOKIE;
use crate::services::pincode::is_valid_pincode;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminLoginRequest {
    /// Deployment admin token
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPincodeRequest {
    #[schema(example = "400001")]
    pub pincode: String,
}

#[derive(Debug, Deserialize)]
pub struct DeletePincodeQuery {
    pub pincode: String,
}

/// Full pincode list, returned by every admin pincode operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct PincodeListResponse {
    pub pincodes: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVendorRequest {
    #[validate(length(min = 1))]
    pub name: String,
    /// "active" or "inactive"; defaults to active
    pub status: Option<String>,
    pub pincodes: Vec<String>,
    #[serde(default)]
    pub delivery_message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVendorStatusRequest {
    #[schema(example = "inactive")]
    pub status: String,
}

fn parse_vendor_status(value: &str) -> Result<VendorStatus, ServiceError> {
    match value {
        "active" => Ok(VendorStatus::Active),
        "inactive" => Ok(VendorStatus::Inactive),
        other => Err(ServiceError::ValidationError(format!(
            "invalid vendor status: {other}"
        ))),
    }
}

/// The master pincode list in ascending order.
pub(crate) async fn load_pincode_list(state: &AppState) -> Result<Vec<String>, ServiceError> {
    let rows = ServicePincode::find()
        .order_by_asc(service_pincode::Column::Pincode)
        .all(&*state.db)
        .await?;
    Ok(rows.into_iter().map(|row| row.pincode).collect())
}

/// Admin login: exchanges the deployment token for the session cookie
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session cookie issued"),
        (status = 401, description = "Wrong token", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;

    if payload.token != state.config.admin_token {
        return Err(ServiceError::Unauthorized("invalid admin token".to_string()));
    }

    let mut response = Json(ApiResponse::success(serde_json::json!({
        "message": "logged in"
    })))
    .into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        session_set_cookie(ADMIN_SESSION_COOKIE, "1"),
    );
    Ok(response)
}

/// Admin logout: expires the session cookie
#[utoipa::path(
    post,
    path = "/admin/logout",
    responses((status = 200, description = "Session cookie cleared")),
    tag = "Admin"
)]
pub async fn logout() -> Response {
    let mut response = Json(ApiResponse::success(serde_json::json!({
        "message": "logged out"
    })))
    .into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, expire_cookie(ADMIN_SESSION_COOKIE));
    response
}

/// List serviceable pincodes
#[utoipa::path(
    get,
    path = "/admin/pincodes",
    responses(
        (status = 200, description = "Master pincode list", body = crate::ApiResponse<PincodeListResponse>)
    ),
    tag = "Admin"
)]
pub async fn list_pincodes(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PincodeListResponse>>, ServiceError> {
    let pincodes = load_pincode_list(&state).await?;
    Ok(Json(ApiResponse::success(PincodeListResponse { pincodes })))
}

/// Append a pincode to the master list
///
/// Appending an existing pincode is a no-op; the list keeps set
/// semantics. Returns the refreshed full list.
#[utoipa::path(
    post,
    path = "/admin/pincodes",
    request_body = AddPincodeRequest,
    responses(
        (status = 200, description = "Refreshed list", body = crate::ApiResponse<PincodeListResponse>),
        (status = 400, description = "Not a 6-digit pincode", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn add_pincode(
    State(state): State<AppState>,
    Json(payload): Json<AddPincodeRequest>,
) -> Result<Json<ApiResponse<PincodeListResponse>>, ServiceError> {
    if !is_valid_pincode(&payload.pincode) {
        return Err(ServiceError::ValidationError(
            "pincode must be exactly 6 digits".to_string(),
        ));
    }

    let exists = ServicePincode::find_by_id(payload.pincode.as_str())
        .one(&*state.db)
        .await?
        .is_some();
    if !exists {
        service_pincode::ActiveModel {
            pincode: Set(payload.pincode.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&*state.db)
        .await?;
        info!(pincode = %payload.pincode, "pincode added");
    }

    let pincodes = load_pincode_list(&state).await?;
    Ok(Json(ApiResponse::success(PincodeListResponse { pincodes })))
}

/// Remove a pincode from the master list
#[utoipa::path(
    delete,
    path = "/admin/pincodes",
    params(("pincode" = String, Query, description = "Pincode to remove")),
    responses(
        (status = 200, description = "Refreshed list", body = crate::ApiResponse<PincodeListResponse>),
        (status = 400, description = "Not a 6-digit pincode", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn remove_pincode(
    State(state): State<AppState>,
    Query(query): Query<DeletePincodeQuery>,
) -> Result<Json<ApiResponse<PincodeListResponse>>, ServiceError> {
    if !is_valid_pincode(&query.pincode) {
        return Err(ServiceError::ValidationError(
            "pincode must be exactly 6 digits".to_string(),
        ));
    }

    ServicePincode::delete_by_id(query.pincode.as_str())
        .exec(&*state.db)
        .await?;
    info!(pincode = %query.pincode, "pincode removed");

    let pincodes = load_pincode_list(&state).await?;
    Ok(Json(ApiResponse::success(PincodeListResponse { pincodes })))
}

/// List vendors
#[utoipa::path(
    get,
    path = "/admin/vendors",
    responses(
        (status = 200, description = "All vendors", body = crate::ApiResponse<Vec<vendor::Model>>)
    ),
    tag = "Admin"
)]
pub async fn list_vendors(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<vendor::Model>>>, ServiceError> {
    let vendors = Vendor::find()
        .order_by_asc(vendor::Column::Name)
        .all(&*state.db)
        .await?;
    Ok(Json(ApiResponse::success(vendors)))
}

/// Create a vendor
#[utoipa::path(
    post,
    path = "/admin/vendors",
    request_body = CreateVendorRequest,
    responses(
        (status = 201, description = "Vendor created", body = crate::ApiResponse<vendor::Model>),
        (status = 400, description = "Invalid status or pincode", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    Json(payload): Json<CreateVendorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<vendor::Model>>), ServiceError> {
    validate_input(&payload)?;

    let status = parse_vendor_status(payload.status.as_deref().unwrap_or("active"))?;
    if let Some(bad) = payload.pincodes.iter().find(|p| !is_valid_pincode(p)) {
        return Err(ServiceError::ValidationError(format!(
            "invalid pincode in delivery area: {bad}"
        )));
    }

    let now = Utc::now();
    let created = vendor::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        status: Set(status),
        pincodes: Set(serde_json::json!(payload.pincodes)),
        delivery_message: Set(payload.delivery_message),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&*state.db)
    .await?;

    info!(vendor_id = %created.id, "vendor created");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Change a vendor's status
#[utoipa::path(
    put,
    path = "/admin/vendors/{id}/status",
    params(("id" = Uuid, Path, description = "Vendor id")),
    request_body = UpdateVendorStatusRequest,
    responses(
        (status = 200, description = "Vendor updated", body = crate::ApiResponse<vendor::Model>),
        (status = 404, description = "Unknown vendor", body = crate::errors::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn update_vendor_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVendorStatusRequest>,
) -> Result<Json<ApiResponse<vendor::Model>>, ServiceError> {
    let status = parse_vendor_status(&payload.status)?;

    let existing = Vendor::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("vendor {id} not found")))?;

    let mut active: vendor::ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&*state.db).await?;

    Ok(Json(ApiResponse::success(updated)))
}
