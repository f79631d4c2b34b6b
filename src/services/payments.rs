use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::GatewayConfig;
use crate::entities::payment_order::{self, PaymentOrderStatus};
use crate::entities::PaymentOrder;
use crate::errors::ServiceError;
use crate::events::{Event, EventBus};

/// Gateway transaction status as exposed to callers of the status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
}

impl PaymentStatus {
    fn as_order_status(self) -> PaymentOrderStatus {
        match self {
            PaymentStatus::Success => PaymentOrderStatus::Success,
            PaymentStatus::Pending => PaymentOrderStatus::Pending,
            PaymentStatus::Failed => PaymentOrderStatus::Failed,
        }
    }
}

/// Map the gateway's enumerated status codes. Unrecognized codes stay
/// pending so the poll remains retryable instead of finalizing early.
pub fn map_gateway_status(code: &str) -> PaymentStatus {
    match code {
        "TXN_SUCCESS" => PaymentStatus::Success,
        "TXN_FAILURE" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

/// Deterministic signature over `key=value` pairs in the given order,
/// with the merchant secret appended, hex-encoded.
///
/// The pair order must match the gateway's canonical ordering for the
/// request being signed; the gateway rejects any byte-level mismatch.
pub fn build_checksum(params: &[(&str, &str)], secret: &str) -> String {
    let payload = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a checksum over a flat field map (inbound callbacks). The
/// digest is recomputed over all fields in ascending key order.
pub fn verify_checksum(params: &BTreeMap<String, String>, secret: &str, provided: &str) -> bool {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    constant_time_eq(&build_checksum(&pairs, secret), provided)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Fresh order id: millisecond timestamp plus a random 6-digit suffix,
/// unique within the deployment's lifetime.
pub fn generate_order_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD{millis}{suffix:06}")
}

/// Amount as the gateway's 2-decimal string form.
fn format_txn_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount.to_string()
}

/// Input for a payment initiation.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentInput {
    pub amount: Decimal,
    pub customer_id: String,
    pub mobile: String,
    pub email: String,
}

/// Outcome of an initiation. A gateway-declared rejection is an expected
/// business outcome carried in `Declined`, not an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InitiateOutcome {
    Initiated { order_id: String, txn_token: String },
    Declined { code: String, message: String },
}

/// Durable keyed store for payment orders. The in-process map in front of
/// an implementation is a cache only; the gateway stays the source of
/// truth for transaction outcomes.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: &str) -> Result<Option<payment_order::Model>, ServiceError>;
    async fn put(&self, order: payment_order::Model) -> Result<(), ServiceError>;
    async fn delete(&self, order_id: &str) -> Result<(), ServiceError>;
}

/// Volatile order store for tests and single-node development.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<String, payment_order::Model>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: &str) -> Result<Option<payment_order::Model>, ServiceError> {
        Ok(self.orders.get(order_id).map(|o| o.clone()))
    }

    async fn put(&self, order: payment_order::Model) -> Result<(), ServiceError> {
        self.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    async fn delete(&self, order_id: &str) -> Result<(), ServiceError> {
        self.orders.remove(order_id);
        Ok(())
    }
}

/// Database-backed order store.
pub struct SqlOrderStore {
    db: Arc<DatabaseConnection>,
}

impl SqlOrderStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_active(order: &payment_order::Model) -> payment_order::ActiveModel {
        payment_order::ActiveModel {
            order_id: Set(order.order_id.clone()),
            amount: Set(order.amount),
            customer_id: Set(order.customer_id.clone()),
            mobile: Set(order.mobile.clone()),
            email: Set(order.email.clone()),
            status: Set(order.status),
            txn_id: Set(order.txn_id.clone()),
            created_at: Set(order.created_at),
            updated_at: Set(order.updated_at),
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for SqlOrderStore {
    async fn get(&self, order_id: &str) -> Result<Option<payment_order::Model>, ServiceError> {
        Ok(PaymentOrder::find_by_id(order_id).one(&*self.db).await?)
    }

    async fn put(&self, order: payment_order::Model) -> Result<(), ServiceError> {
        let exists = PaymentOrder::find_by_id(order.order_id.as_str())
            .one(&*self.db)
            .await?
            .is_some();

        let active = Self::to_active(&order);
        if exists {
            active.update(&*self.db).await?;
        } else {
            active.insert(&*self.db).await?;
        }
        Ok(())
    }

    async fn delete(&self, order_id: &str) -> Result<(), ServiceError> {
        PaymentOrder::delete_by_id(order_id).exec(&*self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GatewayHead {
    #[serde(rename = "responseCode")]
    response_code: String,
    #[serde(rename = "responseMessage", default)]
    response_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InitiateBody {
    #[serde(rename = "txnToken", default)]
    txn_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    #[serde(rename = "HEAD")]
    head: GatewayHead,
    #[serde(rename = "BODY", default)]
    body: InitiateBody,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(rename = "STATUS")]
    status: String,
    #[serde(rename = "TXNID", default)]
    txn_id: Option<String>,
    #[serde(rename = "TXNAMOUNT", default)]
    #[allow(dead_code)]
    txn_amount: Option<String>,
    #[serde(rename = "BANKTXNID", default)]
    #[allow(dead_code)]
    bank_txn_id: Option<String>,
    #[serde(rename = "CURRENCY", default)]
    #[allow(dead_code)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "BODY")]
    body: StatusBody,
}

/// Builds signed gateway requests, reconciles asynchronous results, and
/// keeps payment-order bookkeeping behind [`OrderStore`].
pub struct PaymentService {
    gateway: GatewayConfig,
    http: reqwest::Client,
    store: Arc<dyn OrderStore>,
    local: DashMap<String, payment_order::Model>,
    events: EventBus,
}

impl PaymentService {
    pub fn new(gateway: GatewayConfig, store: Arc<dyn OrderStore>, events: EventBus) -> Self {
        Self {
            gateway,
            http: reqwest::Client::new(),
            store,
            local: DashMap::new(),
            events,
        }
    }

    /// Initiate a transaction with the gateway.
    ///
    /// Returns `Initiated` with the gateway-issued token on success and
    /// `Declined` for gateway-declared rejections; only transport-level
    /// faults (unreachable gateway, malformed response body) surface as
    /// errors.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn initiate(
        &self,
        input: InitiatePaymentInput,
    ) -> Result<InitiateOutcome, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be positive".to_string(),
            ));
        }
        for (field, value) in [
            ("customer_id", &input.customer_id),
            ("mobile", &input.mobile),
            ("email", &input.email),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "{field} is required"
                )));
            }
        }

        let order_id = generate_order_id();
        let txn_amount = format_txn_amount(input.amount);

        // Canonical initiation field order; the checksum is computed over
        // exactly these pairs.
        let params: Vec<(&str, &str)> = vec![
            ("MID", self.gateway.mid.as_str()),
            ("WEBSITE", self.gateway.website.as_str()),
            ("INDUSTRY_TYPE_ID", self.gateway.industry_type_id.as_str()),
            ("CHANNEL_ID", self.gateway.channel_id.as_str()),
            ("ORDER_ID", order_id.as_str()),
            ("CUST_ID", input.customer_id.as_str()),
            ("MOBILE_NO", input.mobile.as_str()),
            ("EMAIL", input.email.as_str()),
            ("TXN_AMOUNT", txn_amount.as_str()),
            ("CALLBACK_URL", self.gateway.callback_url.as_str()),
        ];
        let checksum = build_checksum(&params, &self.gateway.merchant_key);

        let mut body = serde_json::Map::new();
        for (key, value) in &params {
            body.insert((*key).to_string(), serde_json::Value::from(*value));
        }
        body.insert("CHECKSUMHASH".to_string(), serde_json::Value::from(checksum));

        let url = format!("{}/transactions/initiate", self.gateway.base_url);
        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "gateway returned {}",
                response.status()
            )));
        }
        let parsed: InitiateResponse = response.json().await?;

        if parsed.head.response_code != "OK" {
            let message = parsed
                .head
                .response_message
                .unwrap_or_else(|| "transaction declined by gateway".to_string());
            info!(%order_id, code = %parsed.head.response_code, "gateway declined initiation");
            return Ok(InitiateOutcome::Declined {
                code: parsed.head.response_code,
                message,
            });
        }

        let txn_token = parsed.body.txn_token.ok_or_else(|| {
            ServiceError::ExternalServiceError(
                "gateway accepted the transaction but returned no token".to_string(),
            )
        })?;

        let now = Utc::now();
        let order = payment_order::Model {
            order_id: order_id.clone(),
            amount: input.amount,
            customer_id: input.customer_id,
            mobile: input.mobile,
            email: input.email,
            status: PaymentOrderStatus::Initiated,
            txn_id: None,
            created_at: now,
            updated_at: now,
        };
        self.store.put(order.clone()).await?;
        self.local.insert(order_id.clone(), order);

        self.events
            .publish_or_log(Event::PaymentInitiated {
                order_id: order_id.clone(),
            })
            .await;

        info!(%order_id, "payment initiated");
        Ok(InitiateOutcome::Initiated {
            order_id,
            txn_token,
        })
    }

    /// Poll the gateway for a transaction's status. Safe to call
    /// repeatedly; an order id unknown locally is still queried remotely,
    /// since local state is a cache rather than the source of truth.
    #[instrument(skip(self))]
    pub async fn check_status(&self, order_id: &str) -> Result<PaymentStatus, ServiceError> {
        if order_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "order_id is required".to_string(),
            ));
        }

        // Status queries sign a different canonical field set than
        // initiation.
        let params: Vec<(&str, &str)> = vec![
            ("MID", self.gateway.mid.as_str()),
            ("ORDERID", order_id),
        ];
        let checksum = build_checksum(&params, &self.gateway.merchant_key);

        let body = serde_json::json!({
            "MID": self.gateway.mid,
            "ORDERID": order_id,
            "CHECKSUMHASH": checksum,
        });

        let url = format!("{}/transactions/status", self.gateway.base_url);
        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "gateway returned {}",
                response.status()
            )));
        }
        let parsed: StatusResponse = response.json().await?;

        let status = map_gateway_status(&parsed.body.status);
        self.record_status(order_id, status, parsed.body.txn_id).await?;
        Ok(status)
    }

    /// Reconcile a gateway callback. The checksum is verified over every
    /// field except `CHECKSUMHASH` before any state is touched.
    #[instrument(skip(self, params))]
    pub async fn handle_callback(
        &self,
        mut params: BTreeMap<String, String>,
    ) -> Result<(String, PaymentStatus), ServiceError> {
        let provided = params.remove("CHECKSUMHASH").ok_or_else(|| {
            ServiceError::ValidationError("CHECKSUMHASH is required".to_string())
        })?;

        if !verify_checksum(&params, &self.gateway.merchant_key, &provided) {
            warn!("callback checksum verification failed");
            return Err(ServiceError::Unauthorized(
                "invalid callback checksum".to_string(),
            ));
        }

        let order_id = params
            .get("ORDERID")
            .cloned()
            .ok_or_else(|| ServiceError::ValidationError("ORDERID is required".to_string()))?;
        let status = map_gateway_status(params.get("STATUS").map(String::as_str).unwrap_or(""));
        let txn_id = params.get("TXNID").cloned();

        self.record_status(&order_id, status, txn_id).await?;
        Ok((order_id, status))
    }

    /// Local bookkeeping for an order, if any survives. A miss is normal
    /// after a process restart.
    pub async fn get_order(
        &self,
        order_id: &str,
    ) -> Result<Option<payment_order::Model>, ServiceError> {
        if let Some(order) = self.local.get(order_id) {
            return Ok(Some(order.clone()));
        }
        let order = self.store.get(order_id).await?;
        if let Some(order) = &order {
            self.local.insert(order_id.to_string(), order.clone());
        }
        Ok(order)
    }

    async fn record_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
        txn_id: Option<String>,
    ) -> Result<(), ServiceError> {
        if let Some(mut order) = self.get_order(order_id).await? {
            order.status = status.as_order_status();
            if txn_id.is_some() {
                order.txn_id = txn_id;
            }
            order.updated_at = Utc::now();
            self.store.put(order.clone()).await?;
            self.local.insert(order_id.to_string(), order);
        }

        self.events
            .publish_or_log(Event::PaymentStatusChanged {
                order_id: order_id.to_string(),
                status,
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const SECRET: &str = "test_merchant_key";

    fn sample_params() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MID", "QUICKMART"),
            ("ORDER_ID", "ORD17"),
            ("TXN_AMOUNT", "290.00"),
        ]
    }

    #[test]
    fn checksum_is_deterministic() {
        let a = build_checksum(&sample_params(), SECRET);
        let b = build_checksum(&sample_params(), SECRET);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn changing_any_field_changes_the_digest() {
        let base = build_checksum(&sample_params(), SECRET);
        for i in 0..sample_params().len() {
            let mut params = sample_params();
            params[i].1 = "mutated";
            assert_ne!(build_checksum(&params, SECRET), base, "field {i}");
        }
    }

    #[test]
    fn changing_the_secret_changes_the_digest() {
        let a = build_checksum(&sample_params(), SECRET);
        let b = build_checksum(&sample_params(), "another_key");
        assert_ne!(a, b);
    }

    #[test]
    fn parameter_order_matters() {
        let mut reversed = sample_params();
        reversed.reverse();
        assert_ne!(
            build_checksum(&sample_params(), SECRET),
            build_checksum(&reversed, SECRET)
        );
    }

    #[test]
    fn verify_accepts_own_digest_and_rejects_tampering() {
        let mut params = BTreeMap::new();
        params.insert("ORDERID".to_string(), "ORD17".to_string());
        params.insert("STATUS".to_string(), "TXN_SUCCESS".to_string());

        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let digest = build_checksum(&pairs, SECRET);

        assert!(verify_checksum(&params, SECRET, &digest));

        params.insert("STATUS".to_string(), "TXN_FAILURE".to_string());
        assert!(!verify_checksum(&params, SECRET, &digest));
    }

    #[test]
    fn gateway_status_codes_map_to_three_outcomes() {
        assert_eq!(map_gateway_status("TXN_SUCCESS"), PaymentStatus::Success);
        assert_eq!(map_gateway_status("TXN_FAILURE"), PaymentStatus::Failed);
        assert_eq!(map_gateway_status("PENDING"), PaymentStatus::Pending);
        assert_eq!(map_gateway_status("SOMETHING_NEW"), PaymentStatus::Pending);
    }

    #[test]
    fn order_ids_carry_the_prefix_and_do_not_collide() {
        let a = generate_order_id();
        let b = generate_order_id();
        assert!(a.starts_with("ORD"));
        assert!(a[3..].chars().all(|c| c.is_ascii_digit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn in_memory_order_store_round_trips() {
        let store = InMemoryOrderStore::new();
        let now = Utc::now();
        let order = payment_order::Model {
            order_id: "ORD1".to_string(),
            amount: dec!(290),
            customer_id: "c1".to_string(),
            mobile: "9876543210".to_string(),
            email: "c@example.com".to_string(),
            status: PaymentOrderStatus::Initiated,
            txn_id: None,
            created_at: now,
            updated_at: now,
        };

        store.put(order.clone()).await.unwrap();
        assert_eq!(store.get("ORD1").await.unwrap(), Some(order));
        assert_eq!(store.get("ORD2").await.unwrap(), None);

        store.delete("ORD1").await.unwrap();
        assert_eq!(store.get("ORD1").await.unwrap(), None);
    }

    #[test]
    fn txn_amount_always_has_two_decimals() {
        assert_eq!(format_txn_amount(dec!(290)), "290.00");
        assert_eq!(format_txn_amount(dec!(19.9)), "19.90");
        assert_eq!(format_txn_amount(dec!(19.999)), "20.00");
    }

    proptest! {
        #[test]
        fn checksum_determinism_holds_for_arbitrary_values(
            order_id in "[A-Z0-9]{1,20}",
            amount in "[0-9]{1,6}\\.[0-9]{2}",
        ) {
            let params = vec![
                ("ORDER_ID", order_id.as_str()),
                ("TXN_AMOUNT", amount.as_str()),
            ];
            prop_assert_eq!(
                build_checksum(&params, SECRET),
                build_checksum(&params, SECRET)
            );
        }

        #[test]
        fn mutating_the_order_id_always_changes_the_digest(
            order_id in "[A-Z0-9]{1,20}",
        ) {
            let mutated = format!("{order_id}X");
            let base = vec![("ORDER_ID", order_id.as_str())];
            let changed = vec![("ORDER_ID", mutated.as_str())];
            prop_assert_ne!(
                build_checksum(&base, SECRET),
                build_checksum(&changed, SECRET)
            );
        }
    }
}
