use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::errors::ServiceError;
use crate::events::{Event, EventBus};

/// Product details supplied when a line is first added.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRef {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub image_ref: Option<String>,
}

/// One product+quantity entry in a cart. Lines are keyed by product id;
/// a line never persists with quantity 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub image_ref: Option<String>,
}

/// Derived totals, recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// In-process cart state, one line map per logical session.
///
/// All mutations originate from a single logical session; concurrent
/// sessions never contend on the same key, so the sharded map is the only
/// synchronization. Cross-view copies reconcile opportunistically through
/// `CartUpdated` events, not transactionally.
pub struct CartService {
    carts: DashMap<String, BTreeMap<String, CartLine>>,
    delivery_fee: Decimal,
    events: EventBus,
}

impl CartService {
    pub fn new(delivery_fee: Decimal, events: EventBus) -> Self {
        Self {
            carts: DashMap::new(),
            delivery_fee,
            events,
        }
    }

    /// Insert a new line with quantity 1. Re-adding an existing product
    /// is an invalid operation; incrementing goes through
    /// [`CartService::set_quantity`].
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_item(
        &self,
        session_id: &str,
        product: ProductRef,
    ) -> Result<Vec<CartLine>, ServiceError> {
        if product.product_id.is_empty() {
            return Err(ServiceError::ValidationError(
                "product_id must not be empty".to_string(),
            ));
        }
        if product.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "unit_price must not be negative".to_string(),
            ));
        }

        let lines = {
            let mut cart = self.carts.entry(session_id.to_string()).or_default();
            if cart.contains_key(&product.product_id) {
                return Err(ServiceError::InvalidOperation(format!(
                    "product {} is already in the cart; use set_quantity",
                    product.product_id
                )));
            }
            cart.insert(
                product.product_id.clone(),
                CartLine {
                    product_id: product.product_id,
                    name: product.name,
                    unit_price: product.unit_price,
                    quantity: 1,
                    image_ref: product.image_ref,
                },
            );
            cart.values().cloned().collect()
        };

        self.events
            .publish_or_log(Event::CartUpdated {
                session_id: session_id.to_string(),
            })
            .await;

        Ok(lines)
    }

    /// Set a line's quantity. Negative quantities are rejected, quantity 0
    /// removes the line entirely, and a positive quantity updates the
    /// existing line.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        session_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> Result<Vec<CartLine>, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity must not be negative".to_string(),
            ));
        }

        let lines = {
            let mut cart = self.carts.entry(session_id.to_string()).or_default();
            if quantity == 0 {
                cart.remove(product_id);
            } else {
                let line = cart.get_mut(product_id).ok_or_else(|| {
                    ServiceError::NotFound(format!("product {product_id} is not in the cart"))
                })?;
                line.quantity = quantity;
            }
            cart.values().cloned().collect::<Vec<_>>()
        };

        if lines.is_empty() {
            self.carts.remove(session_id);
        }

        self.events
            .publish_or_log(Event::CartUpdated {
                session_id: session_id.to_string(),
            })
            .await;

        Ok(lines)
    }

    /// Current lines for a session, in product-id order.
    pub fn lines(&self, session_id: &str) -> Vec<CartLine> {
        self.carts
            .get(session_id)
            .map(|cart| cart.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Derived totals. The delivery fee is a deployment constant and is
    /// applied unconditionally, so `total == subtotal + delivery_fee`
    /// holds for every cart including an empty one.
    pub fn totals(&self, session_id: &str) -> CartTotals {
        let subtotal: Decimal = self
            .carts
            .get(session_id)
            .map(|cart| {
                cart.values()
                    .map(|line| line.unit_price * Decimal::from(line.quantity))
                    .sum()
            })
            .unwrap_or(Decimal::ZERO);

        CartTotals {
            subtotal,
            delivery_fee: self.delivery_fee,
            total: subtotal + self.delivery_fee,
        }
    }

    /// Drop every line for a session.
    #[instrument(skip(self))]
    pub async fn clear(&self, session_id: &str) {
        self.carts.remove(session_id);
        info!(session_id, "cart cleared");
        self.events
            .publish_or_log(Event::CartUpdated {
                session_id: session_id.to_string(),
            })
            .await;
    }
}
