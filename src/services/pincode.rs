use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use utoipa::ToSchema;

use crate::cache::CacheBackend;
use crate::errors::ServiceError;
use crate::events::{Event, EventBus};

/// Durable cookie holding the selected pincode.
pub const PINCODE_COOKIE: &str = "user_pincode";
/// Fast-cache key prefix mirroring the cookie.
pub const PINCODE_CACHE_KEY: &str = "pincode";
/// Cookie lifetime: 30 days.
pub const PINCODE_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

static PINCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("pincode regex is valid"));

/// Whether `value` is exactly 6 ASCII digits.
pub fn is_valid_pincode(value: &str) -> bool {
    PINCODE_RE.is_match(value)
}

/// Where a selection was restored from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Cookie,
    Cache,
    None,
}

/// The resolved pincode selection. `value` is either empty or exactly
/// 6 ASCII digits once it has passed the serviceability gate; the
/// resolver itself stores whatever the caller supplied (validation
/// happens at the gate boundary, not here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PincodeSelection {
    pub value: String,
    pub source: SelectionSource,
}

impl PincodeSelection {
    pub fn empty() -> Self {
        Self {
            value: String::new(),
            source: SelectionSource::None,
        }
    }

    /// Usable selections are exactly 6 digits.
    pub fn is_usable(&self) -> bool {
        is_valid_pincode(&self.value)
    }
}

/// Outcome of [`PincodeResolver::resolve`]. When `backfill_cookie` is
/// set, only the fast cache held the value and the caller must re-issue
/// the durable cookie so the two stores converge.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub selection: PincodeSelection,
    pub backfill_cookie: bool,
}

/// Outcome of [`PincodeResolver::update`]. The cache has already been
/// written when `changed` is set; the caller must apply the matching
/// Set-Cookie header from the same response so the pair is never
/// half-written.
#[derive(Debug, Clone)]
pub struct Updated {
    pub changed: bool,
    pub selection: PincodeSelection,
}

/// Resolves and persists the user's pincode selection across a durable
/// cookie and a fast in-process cache, and broadcasts changes so other
/// live views of the same session converge without a reload.
pub struct PincodeResolver {
    cache: Arc<dyn CacheBackend>,
    events: EventBus,
    cache_ttl: Option<Duration>,
}

impl PincodeResolver {
    pub fn new(cache: Arc<dyn CacheBackend>, events: EventBus, cache_ttl: Option<Duration>) -> Self {
        Self {
            cache,
            events,
            cache_ttl,
        }
    }

    fn cache_key(session_id: &str) -> String {
        format!("{PINCODE_CACHE_KEY}:{session_id}")
    }

    /// Resolve the current selection: durable cookie first, fast cache as
    /// fallback. Neither store having a value is not an error.
    #[instrument(skip(self, cookie_value))]
    pub async fn resolve(
        &self,
        session_id: &str,
        cookie_value: Option<&str>,
    ) -> Result<Resolved, ServiceError> {
        if let Some(value) = cookie_value.filter(|v| !v.is_empty()) {
            return Ok(Resolved {
                selection: PincodeSelection {
                    value: value.to_string(),
                    source: SelectionSource::Cookie,
                },
                backfill_cookie: false,
            });
        }

        if let Some(value) = self.cache.get(&Self::cache_key(session_id)).await? {
            return Ok(Resolved {
                selection: PincodeSelection {
                    value,
                    source: SelectionSource::Cache,
                },
                backfill_cookie: true,
            });
        }

        Ok(Resolved {
            selection: PincodeSelection::empty(),
            backfill_cookie: false,
        })
    }

    /// Update the selection. Equal values are a no-op; otherwise the cache
    /// is written, the caller is told to re-issue the cookie, and a
    /// `PincodeChanged` notification is broadcast carrying the old and new
    /// value.
    #[instrument(skip(self, cookie_value))]
    pub async fn update(
        &self,
        session_id: &str,
        cookie_value: Option<&str>,
        new_value: &str,
    ) -> Result<Updated, ServiceError> {
        let current = self.resolve(session_id, cookie_value).await?.selection;

        if current.value == new_value {
            return Ok(Updated {
                changed: false,
                selection: current,
            });
        }

        self.cache
            .set(&Self::cache_key(session_id), new_value, self.cache_ttl)
            .await?;

        let old_value = (!current.value.is_empty()).then(|| current.value.clone());
        self.events
            .publish_or_log(Event::PincodeChanged {
                session_id: session_id.to_string(),
                new_value: new_value.to_string(),
                old_value,
            })
            .await;

        Ok(Updated {
            changed: true,
            selection: PincodeSelection {
                value: new_value.to_string(),
                source: SelectionSource::Cookie,
            },
        })
    }
}
