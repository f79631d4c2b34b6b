pub mod admin;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod pincode;
pub mod serviceability;

use std::sync::Arc;

use crate::cache::InMemoryCache;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventBus;
use crate::services::payments::SqlOrderStore;
use crate::services::{CartService, PaymentService, PincodeResolver, ServiceabilityGate};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer behind the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub pincode: Arc<PincodeResolver>,
    pub serviceability: Arc<ServiceabilityGate>,
    pub cart: Arc<CartService>,
    pub payments: Arc<PaymentService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, config: &AppConfig, events: EventBus) -> Self {
        let cache = Arc::new(InMemoryCache::new());
        let order_store = Arc::new(SqlOrderStore::new(db.clone()));

        let pincode = Arc::new(PincodeResolver::new(
            cache,
            events.clone(),
            config
                .pincode_cache_ttl_secs
                .map(std::time::Duration::from_secs),
        ));
        let serviceability = Arc::new(ServiceabilityGate::new(db));
        let cart = Arc::new(CartService::new(config.delivery_fee(), events.clone()));
        let payments = Arc::new(PaymentService::new(
            config.gateway.clone(),
            order_store,
            events,
        ));

        Self {
            pincode,
            serviceability,
            cart,
            payments,
        }
    }
}
