use brassline_catalog::{VatError, VatService};
use brassline_order::{PricingRules, TransitionPolicy};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    pub uploads: UploadConfig,
    pub cron: CronConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "production".into()
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_connect_attempts() -> u32 { 5 }
fn default_backoff_base_ms() -> u64 { 250 }

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Exchanged for an admin token at `/api/auth/admin`. Empty disables it.
    #[serde(default)]
    pub admin_api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_vat_rate")]
    pub vat_rate_percent: f64,
    #[serde(default)]
    pub shipping_fee_pence: i64,
    pub free_shipping_threshold_pence: Option<i64>,
    #[serde(default)]
    pub strict_order_transitions: bool,
}

fn default_vat_rate() -> f64 { 20.0 }

impl BusinessRules {
    pub fn pricing_rules(&self) -> Result<PricingRules, VatError> {
        Ok(PricingRules {
            vat: VatService::from_percent_f64(self.vat_rate_percent)?,
            shipping_fee_pence: self.shipping_fee_pence,
            free_shipping_threshold_pence: self.free_shipping_threshold_pence,
        })
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        TransitionPolicy::from_strict_flag(self.strict_order_transitions)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
    /// Empty keeps uploads in memory
    #[serde(default)]
    pub cdn_base_url: String,
    #[serde(default)]
    pub cdn_api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CronConfig {
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    pub queue_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `BRASSLINE_DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("BRASSLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
