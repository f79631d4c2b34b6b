use axum::{
    extract::{Json, Path, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::common::{session_id, validate_input};
use crate::services::cart::{CartLine, CartTotals, ProductRef};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "product_id": "prod_123",
    "name": "Organic Bananas 500g",
    "unit_price": "45",
    "image_ref": "images/bananas.jpg"
}))]
pub struct AddItemRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    /// Unit price; must not be negative
    pub unit_price: Decimal,
    pub image_ref: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateQuantityRequest {
    /// New quantity; 0 removes the line
    #[validate(range(min = 0))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

fn cart_response(state: &AppState, session: &str, lines: Vec<CartLine>) -> CartResponse {
    CartResponse {
        totals: state.services.cart.totals(session),
        lines,
    }
}

/// Add a product to the cart
#[utoipa::path(
    post,
    path = "/api/v1/carts/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Cart after the insert", body = crate::ApiResponse<CartResponse>),
        (status = 400, description = "Invalid product or product already in cart", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    validate_input(&payload)?;
    let session = session_id(&headers);

    let lines = state
        .services
        .cart
        .add_item(
            &session,
            ProductRef {
                product_id: payload.product_id,
                name: payload.name,
                unit_price: payload.unit_price,
                image_ref: payload.image_ref,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(cart_response(
        &state, &session, lines,
    ))))
}

/// Set a line's quantity (0 removes the line)
#[utoipa::path(
    put,
    path = "/api/v1/carts/items/{product_id}",
    params(("product_id" = String, Path, description = "Product id of the line")),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Cart after the update", body = crate::ApiResponse<CartResponse>),
        (status = 400, description = "Negative quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Line not present", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    validate_input(&payload)?;
    let session = session_id(&headers);

    let lines = state
        .services
        .cart
        .set_quantity(&session, &product_id, payload.quantity)
        .await?;

    Ok(Json(ApiResponse::success(cart_response(
        &state, &session, lines,
    ))))
}

/// Current cart contents and totals
#[utoipa::path(
    get,
    path = "/api/v1/carts",
    responses(
        (status = 200, description = "Cart contents", body = crate::ApiResponse<CartResponse>)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let session = session_id(&headers);
    let lines = state.services.cart.lines(&session);
    Ok(Json(ApiResponse::success(cart_response(
        &state, &session, lines,
    ))))
}

/// Derived totals only
#[utoipa::path(
    get,
    path = "/api/v1/carts/totals",
    responses(
        (status = 200, description = "Derived totals", body = crate::ApiResponse<CartTotals>)
    ),
    tag = "Cart"
)]
pub async fn get_totals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CartTotals>>, ServiceError> {
    let session = session_id(&headers);
    Ok(Json(ApiResponse::success(
        state.services.cart.totals(&session),
    )))
}

/// Clear the cart
#[utoipa::path(
    delete,
    path = "/api/v1/carts",
    responses(
        (status = 200, description = "Cart cleared", body = crate::ApiResponse<CartResponse>)
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CartResponse>>, ServiceError> {
    let session = session_id(&headers);
    state.services.cart.clear(&session).await;
    Ok(Json(ApiResponse::success(cart_response(
        &state,
        &session,
        Vec::new(),
    ))))
}
