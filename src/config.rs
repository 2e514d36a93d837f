use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_JWT_EXPIRATION_SECS: u64 = 3600;
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Object storage settings for book cover uploads.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct StorageConfig {
    /// Base URL of the S3-compatible endpoint, e.g. "https://s3.example.com"
    pub endpoint: String,
    /// Bucket name objects are stored under
    pub bucket: String,
    /// Bearer credential sent with upload/delete requests
    #[serde(default)]
    pub access_token: Option<String>,
    /// Public base URL returned to clients; falls back to endpoint/bucket
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket: "librera".to_string(),
            access_token: None,
            public_base_url: None,
        }
    }
}

/// Application configuration, layered from `config/default.toml`, an
/// optional `config/{run_mode}.toml` and `LIBRERA_`-prefixed environment
/// variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing filter directive, e.g. "info" or "librera_api=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub log_json: bool,

    /// Run schema migrations at startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// HMAC secret for signing access tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,

    /// VAT rate applied to every order subtotal (fraction, e.g. 0.21)
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,

    /// Flat fee charged for carrier delivery; pickup ships free
    #[serde(default = "default_shipping_fee")]
    pub shipping_fee: Decimal,

    /// Shared secret for verifying payment provider callbacks. Unset means
    /// signature verification is skipped (development only).
    #[serde(default)]
    pub payment_webhook_secret: Option<String>,

    /// Maximum accepted age of a signed webhook timestamp
    #[serde(default = "default_webhook_tolerance")]
    pub payment_webhook_tolerance_secs: u64,

    #[serde(default)]
    #[validate]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_jwt_expiration() -> u64 {
    DEFAULT_JWT_EXPIRATION_SECS
}

fn default_tax_rate() -> Decimal {
    // 21% VAT
    Decimal::new(21, 2)
}

fn default_shipping_fee() -> Decimal {
    Decimal::new(500, 2)
}

fn default_webhook_tolerance() -> u64 {
    DEFAULT_WEBHOOK_TOLERANCE_SECS
}

/// Loads configuration from files and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder();

    let default_path = Path::new(CONFIG_DIR).join("default.toml");
    if default_path.exists() {
        builder = builder.add_source(File::from(default_path));
    }

    let mode_path = Path::new(CONFIG_DIR).join(format!("{run_mode}.toml"));
    if mode_path.exists() {
        builder = builder.add_source(File::from(mode_path));
    }

    let cfg: AppConfig = builder
        .add_source(Environment::with_prefix("LIBRERA").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(run_mode = %run_mode, "configuration loaded");
    Ok(cfg)
}

/// Initializes the global tracing subscriber.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_sane() {
        assert_eq!(default_tax_rate(), dec!(0.21));
        assert_eq!(default_shipping_fee(), dec!(5.00));
        assert_eq!(default_port(), 8080);
    }
}
