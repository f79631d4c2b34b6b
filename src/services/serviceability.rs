use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::entities::vendor::{self, VendorStatus};
use crate::entities::Vendor;
use crate::services::pincode::is_valid_pincode;

/// Result of a serviceability check. `Unknown` is the degraded outcome
/// when the vendor query fails; it is non-blocking and never surfaces as
/// an error to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Serviceability {
    Serviceable { delivery_message: String },
    Unserviceable,
    Unknown,
}

impl Serviceability {
    pub fn is_serviceable(&self) -> bool {
        matches!(self, Serviceability::Serviceable { .. })
    }
}

/// Decides whether any active vendor delivers to a pincode.
#[derive(Clone)]
pub struct ServiceabilityGate {
    db: Arc<DatabaseConnection>,
}

impl ServiceabilityGate {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check a pincode against every active vendor's delivery area.
    ///
    /// The first matching vendor in retrieval order supplies the delivery
    /// message; the order among equally-matching vendors is unspecified.
    /// Missing or malformed pincodes are unserviceable, and query
    /// failures degrade to `Unknown` rather than propagating.
    #[instrument(skip(self))]
    pub async fn check(&self, pincode: &str) -> Serviceability {
        if !is_valid_pincode(pincode) {
            return Serviceability::Unserviceable;
        }

        let vendors = match Vendor::find()
            .filter(vendor::Column::Status.eq(VendorStatus::Active))
            .all(&*self.db)
            .await
        {
            Ok(vendors) => vendors,
            Err(e) => {
                warn!(pincode, error = %e, "vendor query failed, degrading to unknown");
                return Serviceability::Unknown;
            }
        };

        vendors
            .into_iter()
            .find(|v| v.serves(pincode))
            .map(|v| Serviceability::Serviceable {
                delivery_message: v.delivery_message,
            })
            .unwrap_or(Serviceability::Unserviceable)
    }
}

/// Pure redirect decision for pages where serviceability is mandatory.
///
/// Returns the redirect target, or `None` when the caller should stay
/// put. Exempt path prefixes never redirect regardless of
/// serviceability, and `Unknown` is treated as non-blocking.
pub fn decide_redirect(
    path: &str,
    exempt_prefixes: &[String],
    picker_path: &str,
    serviceability: &Serviceability,
) -> Option<String> {
    if !matches!(serviceability, Serviceability::Unserviceable) {
        return None;
    }
    if is_exempt(path, exempt_prefixes) {
        return None;
    }
    Some(picker_path.to_string())
}

fn is_exempt(path: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .any(|p| path == p || path.starts_with(&format!("{p}/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exempt() -> Vec<String> {
        vec!["/about".to_string(), "/set-location".to_string()]
    }

    #[test]
    fn unserviceable_mandatory_path_redirects_to_picker() {
        let decision = decide_redirect(
            "/checkout",
            &exempt(),
            "/set-location",
            &Serviceability::Unserviceable,
        );
        assert_eq!(decision.as_deref(), Some("/set-location"));
    }

    #[test]
    fn exempt_paths_never_redirect() {
        for path in ["/about", "/about/team", "/set-location"] {
            let decision = decide_redirect(
                path,
                &exempt(),
                "/set-location",
                &Serviceability::Unserviceable,
            );
            assert_eq!(decision, None, "path {path} must not redirect");
        }
    }

    #[test]
    fn serviceable_never_redirects() {
        let decision = decide_redirect(
            "/checkout",
            &exempt(),
            "/set-location",
            &Serviceability::Serviceable {
                delivery_message: "20 minutes".to_string(),
            },
        );
        assert_eq!(decision, None);
    }

    #[test]
    fn unknown_is_non_blocking() {
        let decision = decide_redirect(
            "/checkout",
            &exempt(),
            "/set-location",
            &Serviceability::Unknown,
        );
        assert_eq!(decision, None);
    }

    #[test]
    fn prefix_matching_respects_path_boundaries() {
        let prefixes = vec!["/about".to_string()];
        assert!(is_exempt("/about", &prefixes));
        assert!(is_exempt("/about/team", &prefixes));
        assert!(!is_exempt("/aboutus", &prefixes));
    }
}
