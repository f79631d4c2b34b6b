//! QuickMart storefront API
//!
//! Pincode-gated serviceability, session carts, and gateway checkout for
//! a quick-commerce storefront, plus the admin console API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub events: events::EventBus,
    pub services: handlers::AppServices,
}

/// Common response wrapper.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Storefront API under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Pincode resolver
        .route(
            "/pincode",
            get(handlers::pincode::resolve_pincode).put(handlers::pincode::update_pincode),
        )
        // Serviceability gate
        .route(
            "/serviceability/:pincode",
            get(handlers::serviceability::check_serviceability),
        )
        .route("/pincodes", get(handlers::serviceability::list_pincodes))
        // Cart aggregator
        .route(
            "/carts",
            get(handlers::carts::get_cart).delete(handlers::carts::clear_cart),
        )
        .route("/carts/items", post(handlers::carts::add_item))
        .route(
            "/carts/items/:product_id",
            put(handlers::carts::update_quantity),
        )
        .route("/carts/totals", get(handlers::carts::get_totals))
        // Checkout / payment request builder
        .route(
            "/checkout/initiate",
            post(handlers::checkout::initiate_checkout),
        )
        .route(
            "/checkout/callback",
            post(handlers::checkout::payment_callback),
        )
        .route(
            "/checkout/status/:order_id",
            get(handlers::checkout::check_payment_status),
        )
}

/// Admin console API. Every route except login sits behind the
/// `admin_session` cookie gate applied in [`build_router`].
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(handlers::admin::login))
        .route("/admin/logout", post(handlers::admin::logout))
        .route(
            "/admin/pincodes",
            get(handlers::admin::list_pincodes)
                .post(handlers::admin::add_pincode)
                .delete(handlers::admin::remove_pincode),
        )
        .route(
            "/admin/vendors",
            get(handlers::admin::list_vendors).post(handlers::admin::create_vendor),
        )
        .route(
            "/admin/vendors/:id/status",
            put(handlers::admin::update_vendor_status),
        )
}

/// Compose the full application router. CORS and environment-specific
/// layers are added by the binary on top of this.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "quickmart-api up" }))
        .nest("/api/v1", api_v1_routes())
        .merge(admin_routes())
        .merge(openapi::swagger_ui())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_helpers::serviceability_redirect::serviceability_redirect,
        ))
        .layer(middleware::from_fn(
            middleware_helpers::admin_session::admin_session_gate,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "quickmart-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(health_data)))
}
