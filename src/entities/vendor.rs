use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Vendor record. Owned by the catalog backend; the serviceability flow
/// only reads it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub status: VendorStatus,
    /// JSON array of the 6-digit pincodes this vendor delivers to
    #[sea_orm(column_type = "Json")]
    pub pincodes: Json,
    pub delivery_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this vendor's delivery area covers `pincode`.
    pub fn serves(&self, pincode: &str) -> bool {
        self.pincodes
            .as_array()
            .map(|codes| codes.iter().any(|code| code.as_str() == Some(pincode)))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(pincodes: serde_json::Value) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Fresh Basket".to_string(),
            status: VendorStatus::Active,
            pincodes,
            delivery_message: "Delivery in 20 minutes".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn serves_matches_membership() {
        let v = vendor(serde_json::json!(["560001", "560002"]));
        assert!(v.serves("560001"));
        assert!(!v.serves("999999"));
    }

    #[test]
    fn malformed_pincode_payload_serves_nothing() {
        let v = vendor(serde_json::json!({"not": "an array"}));
        assert!(!v.serves("560001"));
    }
}
