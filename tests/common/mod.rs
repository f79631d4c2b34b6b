#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use quickmart_api::{
    build_router,
    config::AppConfig,
    db,
    entities::vendor::{self, VendorStatus},
    events::{self, EventBus},
    handlers::AppServices,
    AppState,
};

/// Test harness: the full application router over an in-memory SQLite
/// database, driven through `tower::ServiceExt::oneshot`.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct the app, letting the caller adjust the configuration
    /// (e.g. to point the payment gateway at a mock server).
    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18_080, "test");
        // A single pooled connection keeps the in-memory database alive
        // and shared for the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let db_arc = Arc::new(pool);

        let (events, fallback_rx) = EventBus::new(cfg.event_channel_capacity);
        let event_task = tokio::spawn(events::process_events(fallback_rx));

        let services = AppServices::new(db_arc.clone(), &cfg, events.clone());
        let state = AppState {
            db: db_arc,
            config: cfg,
            events,
            services,
        };

        Self {
            router: build_router(state.clone()),
            state,
            _event_task: event_task,
        }
    }

    /// Issue a request and return (status, headers, parsed JSON body).
    /// Non-JSON bodies parse as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("valid request"),
            None => builder.body(Body::empty()).expect("valid request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request handled");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body readable")
            .to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, headers, json)
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, HeaderMap, Value) {
        self.request(Method::GET, uri, headers, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, HeaderMap, Value) {
        self.request(Method::POST, uri, headers, Some(body)).await
    }

    pub async fn put(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, HeaderMap, Value) {
        self.request(Method::PUT, uri, headers, Some(body)).await
    }

    pub async fn delete(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> (StatusCode, HeaderMap, Value) {
        self.request(Method::DELETE, uri, headers, None).await
    }

    /// Seed a vendor with the given delivery area.
    pub async fn seed_vendor(
        &self,
        name: &str,
        status: VendorStatus,
        pincodes: &[&str],
        delivery_message: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        vendor::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            status: Set(status),
            pincodes: Set(serde_json::json!(pincodes)),
            delivery_message: Set(delivery_message.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("vendor seeded");
        id
    }
}

/// Cookie header for an authenticated admin request.
pub const ADMIN_COOKIE: (&str, &str) = ("cookie", "admin_session=1");
