//! Postgres-backed stores for the pricing engine.

use cafe_core::{PricingConfig, ZoneRule};
use cafe_pricing::{ConfigStore, StoreError, ZoneStore};
use sqlx::PgPool;

use crate::{get_pricing_config, insert_default_pricing_config, list_active_zones};

/// Serves both pricing config and zone rules from one pool.
#[derive(Debug, Clone)]
pub struct PgPricingStore {
    pool: PgPool,
}

impl PgPricingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ConfigStore for PgPricingStore {
    async fn fetch_config(&self) -> Result<Option<PricingConfig>, StoreError> {
        Ok(get_pricing_config(&self.pool).await?)
    }

    async fn create_default_config(&self, defaults: &PricingConfig) -> Result<bool, StoreError> {
        Ok(insert_default_pricing_config(&self.pool, defaults).await?)
    }
}

impl ZoneStore for PgPricingStore {
    async fn list_active_zones(&self) -> Result<Vec<ZoneRule>, StoreError> {
        Ok(list_active_zones(&self.pool).await?)
    }
}
