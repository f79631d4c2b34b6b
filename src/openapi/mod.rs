use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuickMart API",
        version = "1.0.0",
        description = r#"
# QuickMart Storefront API

Backend for a pincode-gated quick-commerce storefront.

## Features

- **Pincode Resolver**: durable cookie + fast cache selection with
  cross-view change notifications
- **Serviceability**: active-vendor delivery-area checks
- **Cart**: session carts with derived totals and a flat delivery fee
- **Checkout**: signed payment-gateway initiation, callback
  reconciliation, and idempotent status polling
- **Admin console**: serviceable-pincode and vendor management behind
  the admin session cookie

## Sessions

Storefront requests carry an `X-Session-Id` header identifying the
logical session; requests without one share the anonymous session.

## Error Handling

Failures use a consistent error body:

```json
{
  "error": "Bad Request",
  "message": "pincode must be exactly 6 digits",
  "timestamp": "2026-08-06T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Pincode", description = "Pincode selection endpoints"),
        (name = "Serviceability", description = "Delivery-area checks"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Checkout", description = "Payment gateway integration"),
        (name = "Admin", description = "Admin console endpoints")
    ),
    paths(
        // Pincode
        crate::handlers::pincode::resolve_pincode,
        crate::handlers::pincode::update_pincode,

        // Serviceability
        crate::handlers::serviceability::check_serviceability,
        crate::handlers::serviceability::list_pincodes,

        // Cart
        crate::handlers::carts::add_item,
        crate::handlers::carts::update_quantity,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::get_totals,
        crate::handlers::carts::clear_cart,

        // Checkout
        crate::handlers::checkout::initiate_checkout,
        crate::handlers::checkout::payment_callback,
        crate::handlers::checkout::check_payment_status,

        // Admin
        crate::handlers::admin::login,
        crate::handlers::admin::logout,
        crate::handlers::admin::list_pincodes,
        crate::handlers::admin::add_pincode,
        crate::handlers::admin::remove_pincode,
        crate::handlers::admin::list_vendors,
        crate::handlers::admin::create_vendor,
        crate::handlers::admin::update_vendor_status,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            crate::services::pincode::PincodeSelection,
            crate::services::pincode::SelectionSource,
            crate::handlers::pincode::UpdatePincodeRequest,

            crate::handlers::serviceability::ServiceabilityResponse,

            crate::services::cart::CartLine,
            crate::services::cart::CartTotals,
            crate::handlers::carts::AddItemRequest,
            crate::handlers::carts::UpdateQuantityRequest,
            crate::handlers::carts::CartResponse,

            crate::services::payments::PaymentStatus,
            crate::services::payments::InitiateOutcome,
            crate::handlers::checkout::InitiateCheckoutRequest,
            crate::handlers::checkout::PaymentStatusResponse,

            crate::entities::vendor::Model,
            crate::entities::vendor::VendorStatus,

            crate::handlers::admin::AdminLoginRequest,
            crate::handlers::admin::AddPincodeRequest,
            crate::handlers::admin::PincodeListResponse,
            crate::handlers::admin::CreateVendorRequest,
            crate::handlers::admin::UpdateVendorStatusRequest,
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).expect("openapi serializes");
        assert!(json.contains("QuickMart API"));
        assert!(json.contains("/api/v1/pincode"));
        assert!(json.contains("/admin/pincodes"));
    }
}
