//! Shared domain types and application configuration for the café delivery
//! pricing backend.

pub mod app_config;
pub mod config;
pub mod orders;
pub mod pricing;
pub mod zones;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::{Location, OrderLineItem};
pub use pricing::{PriceLines, PricingBreakdown, PricingConfig, PRICING_CONFIG_ID};
pub use zones::{load_zones, validate_zone_seed, ModifierType, ZoneRule, ZoneSeed, ZonesFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read zones file {path}: {source}")]
    ZonesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse zones file: {0}")]
    ZonesFileParse(#[source] serde_yaml::Error),

    #[error("zones validation failed: {0}")]
    Validation(String),
}
