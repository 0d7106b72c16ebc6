//! Delivery pricing for café orders.
//!
//! Combines item subtotal, a distance-based delivery fee, an optional zone
//! modifier, and GST into a [`PricingBreakdown`]. Rates come from a cached
//! [`ConfigProvider`]; zones from a [`ZoneStore`]. Both stores are traits so
//! the engine runs the same against Postgres or the in-memory stores in
//! [`memory`].

pub mod config_cache;
pub mod engine;
pub mod error;
pub mod geo;
pub mod memory;
pub mod validate;
pub mod zones;

pub use cafe_core::{Location, OrderLineItem, PriceLines, PricingBreakdown, PricingConfig};
pub use config_cache::{Clock, ConfigProvider, ConfigStore, SystemClock, TtlCache, CONFIG_CACHE_TTL};
pub use engine::{price_order, PricingEngine};
pub use error::{PricingError, StoreError};
pub use geo::{distance_km, is_within_radius};
pub use validate::{validate_location, validate_order, validate_pricing_config};
pub use zones::{select_zone, ZoneMatcher, ZoneStore};
