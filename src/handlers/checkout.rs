use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::common::{session_id, validate_input};
use crate::services::payments::{InitiateOutcome, InitiatePaymentInput, PaymentStatus};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "customer_id": "cust_42",
    "mobile": "9876543210",
    "email": "customer@example.com"
}))]
pub struct InitiateCheckoutRequest {
    #[validate(length(min = 1))]
    pub customer_id: String,
    #[validate(length(min = 10))]
    pub mobile: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentStatusResponse {
    #[schema(example = "ORD1756467912345000042")]
    pub order_id: String,
    pub status: PaymentStatus,
}

/// Initiate a payment for the session's cart
///
/// The transaction amount is the cart aggregator's current total; the
/// request never carries its own amount.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/initiate",
    request_body = InitiateCheckoutRequest,
    responses(
        (status = 201, description = "Transaction created at the gateway", body = crate::ApiResponse<InitiateOutcome>),
        (status = 200, description = "Gateway declined the transaction", body = crate::ApiResponse<InitiateOutcome>),
        (status = 400, description = "Empty cart or invalid customer details", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn initiate_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InitiateCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InitiateOutcome>>), ServiceError> {
    validate_input(&payload)?;
    let session = session_id(&headers);

    if state.services.cart.lines(&session).is_empty() {
        return Err(ServiceError::ValidationError(
            "cart is empty".to_string(),
        ));
    }
    let totals = state.services.cart.totals(&session);

    let outcome = state
        .services
        .payments
        .initiate(InitiatePaymentInput {
            amount: totals.total,
            customer_id: payload.customer_id,
            mobile: payload.mobile,
            email: payload.email,
        })
        .await?;

    match outcome {
        InitiateOutcome::Initiated { .. } => {
            Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
        }
        InitiateOutcome::Declined { ref message, .. } => {
            // Gateway-declared rejection: an expected business outcome,
            // surfaced with the gateway's message.
            let message = message.clone();
            Ok((
                StatusCode::OK,
                Json(ApiResponse {
                    success: false,
                    data: Some(outcome),
                    message: Some(message),
                    errors: None,
                }),
            ))
        }
    }
}

/// Gateway callback with the transaction result
#[utoipa::path(
    post,
    path = "/api/v1/checkout/callback",
    responses(
        (status = 200, description = "Callback reconciled", body = crate::ApiResponse<PaymentStatusResponse>),
        (status = 401, description = "Checksum verification failed", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(params): Json<BTreeMap<String, String>>,
) -> Result<Json<ApiResponse<PaymentStatusResponse>>, ServiceError> {
    let (order_id, status) = state.services.payments.handle_callback(params).await?;
    Ok(Json(ApiResponse::success(PaymentStatusResponse {
        order_id,
        status,
    })))
}

/// Poll the gateway for a transaction's status
///
/// Idempotent; works even when the order is unknown locally (e.g. after
/// a restart), since the gateway is the source of truth.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/status/{order_id}",
    params(("order_id" = String, Path, description = "Order id returned by initiation")),
    responses(
        (status = 200, description = "Mapped gateway status", body = crate::ApiResponse<PaymentStatusResponse>),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn check_payment_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<PaymentStatusResponse>>, ServiceError> {
    let status = state.services.payments.check_status(&order_id).await?;
    Ok(Json(ApiResponse::success(PaymentStatusResponse {
        order_id,
        status,
    })))
}
