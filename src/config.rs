use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use tracing_subscriber::EnvFilter;
use validator::{Validate, ValidationError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_DELIVERY_FEE: f64 = 40.0;
const DEFAULT_PINCODE_CACHE_TTL_SECS: u64 = 86_400;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;
const DEFAULT_LOCATION_PICKER_PATH: &str = "/set-location";
const DEFAULT_EXEMPT_PATHS: &str = "/about,/contact,/privacy,/terms,/set-location";
const DEV_DEFAULT_ADMIN_TOKEN: &str = "development_admin_token_do_not_use_in_production";

/// Payment gateway merchant settings.
///
/// Field names follow the gateway's merchant dashboard; every initiation
/// request is signed with `merchant_key` (see `services::payments`).
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Merchant id issued by the gateway
    pub mid: String,

    /// Website code registered with the gateway
    #[serde(default = "default_gateway_website")]
    pub website: String,

    /// Industry type registered with the gateway
    #[serde(default = "default_gateway_industry")]
    pub industry_type_id: String,

    /// Channel id (WEB/WAP)
    #[serde(default = "default_gateway_channel")]
    pub channel_id: String,

    /// Merchant secret used to sign every request
    #[validate(length(min = 8))]
    pub merchant_key: String,

    /// Base URL of the gateway API
    pub base_url: String,

    /// URL the gateway posts the transaction result back to
    pub callback_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mid: "QUICKMART_DEV".to_string(),
            website: default_gateway_website(),
            industry_type_id: default_gateway_industry(),
            channel_id: default_gateway_channel(),
            merchant_key: "dev_merchant_key_not_a_secret".to_string(),
            base_url: "https://securegw-stage.example.com".to_string(),
            callback_url: "http://localhost:8080/api/v1/checkout/callback".to_string(),
        }
    }
}

fn default_gateway_website() -> String {
    "WEBSTAGING".to_string()
}

fn default_gateway_industry() -> String {
    "Retail".to_string()
}

fn default_gateway_channel() -> String {
    "WEB".to_string()
}

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Flat delivery fee added to every cart total. A deployment
    /// constant, not a per-order decision.
    #[serde(default = "default_delivery_fee")]
    #[validate(custom = "validate_delivery_fee")]
    pub delivery_fee: f64,

    /// TTL for the fast pincode cache entries (seconds); None = no expiry
    #[serde(default = "default_pincode_cache_ttl_secs")]
    pub pincode_cache_ttl_secs: Option<u64>,

    /// Comma-separated path prefixes that never trigger the
    /// serviceability redirect
    #[serde(default = "default_exempt_paths")]
    pub serviceability_exempt_paths: String,

    /// Path the storefront redirects to when a pincode is unserviceable
    #[serde(default = "default_location_picker_path")]
    pub location_picker_path: String,

    /// Shared token checked by the admin login endpoint
    #[serde(default = "default_admin_token")]
    #[validate(length(min = 16))]
    pub admin_token: String,

    /// Event channel capacity for the fallback notification channel
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Payment gateway merchant settings
    #[serde(default)]
    #[validate]
    pub gateway: GatewayConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_delivery_fee() -> f64 {
    DEFAULT_DELIVERY_FEE
}

fn default_pincode_cache_ttl_secs() -> Option<u64> {
    Some(DEFAULT_PINCODE_CACHE_TTL_SECS)
}

fn default_exempt_paths() -> String {
    DEFAULT_EXEMPT_PATHS.to_string()
}

fn default_location_picker_path() -> String {
    DEFAULT_LOCATION_PICKER_PATH.to_string()
}

fn default_admin_token() -> String {
    DEV_DEFAULT_ADMIN_TOKEN.to_string()
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn validate_delivery_fee(fee: f64) -> Result<(), ValidationError> {
    if !fee.is_finite() || fee < 0.0 {
        return Err(ValidationError::new("delivery_fee_negative"));
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if !(16..=65_536).contains(&capacity) {
        return Err(ValidationError::new("event_channel_capacity_out_of_range"));
    }
    Ok(())
}

impl AppConfig {
    /// Minimal constructor used by tests and tooling; everything not
    /// passed in takes its deployment default.
    pub fn new(
        database_url: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            delivery_fee: default_delivery_fee(),
            pincode_cache_ttl_secs: default_pincode_cache_ttl_secs(),
            serviceability_exempt_paths: default_exempt_paths(),
            location_picker_path: default_location_picker_path(),
            admin_token: default_admin_token(),
            event_channel_capacity: default_event_channel_capacity(),
            gateway: GatewayConfig::default(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Delivery fee as an exact decimal amount.
    pub fn delivery_fee(&self) -> Decimal {
        Decimal::from_f64_retain(self.delivery_fee).unwrap_or(Decimal::ZERO)
    }

    /// Path prefixes exempt from the serviceability redirect. The
    /// location picker itself is always exempt.
    pub fn exempt_path_prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self
            .serviceability_exempt_paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if !prefixes.iter().any(|p| p == &self.location_picker_path) {
            prefixes.push(self.location_picker_path.clone());
        }
        prefixes
    }
}

/// Load configuration from `config/default.toml`, an environment-specific
/// overlay, and `APP__*` environment variables (in increasing priority).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg = Config::builder()
        .set_default("database_url", "sqlite://quickmart.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("environment", environment.clone())?
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{environment}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;

    app_config.validate().map_err(|e| {
        ConfigError::Message(format!("configuration validation failed: {e}"))
    })?;

    Ok(app_config)
}

/// Initialize the global tracing subscriber. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_config() -> AppConfig {
        AppConfig::new("sqlite::memory:", "127.0.0.1", 18_080, "test")
    }

    #[test]
    fn defaults_validate() {
        test_config().validate().expect("defaults should validate");
    }

    #[test]
    fn delivery_fee_converts_to_decimal() {
        let mut cfg = test_config();
        cfg.delivery_fee = 40.0;
        assert_eq!(cfg.delivery_fee(), dec!(40));
    }

    #[test]
    fn negative_delivery_fee_is_rejected() {
        let mut cfg = test_config();
        cfg.delivery_fee = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn short_admin_token_is_rejected() {
        let mut cfg = test_config();
        cfg.admin_token = "short".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn exempt_prefixes_always_include_picker() {
        let mut cfg = test_config();
        cfg.serviceability_exempt_paths = "/about".to_string();
        let prefixes = cfg.exempt_path_prefixes();
        assert!(prefixes.contains(&"/about".to_string()));
        assert!(prefixes.contains(&"/set-location".to_string()));
    }

    #[test]
    fn permissive_cors_only_in_development_by_default() {
        let mut cfg = test_config();
        assert!(cfg.should_allow_permissive_cors());
        cfg.environment = "production".to_string();
        assert!(!cfg.should_allow_permissive_cors());
        cfg.cors_allow_any_origin = true;
        assert!(cfg.should_allow_permissive_cors());
    }
}
