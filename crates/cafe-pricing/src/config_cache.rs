//! Time-bound cache in front of the pricing config store.
//!
//! A fetched [`PricingConfig`] is served for [`CONFIG_CACHE_TTL`] from the
//! moment it was fetched; after that the next read goes back to the store.
//! An admin update made through another process becomes visible only once
//! the cached copy expires. Updates made through this process call
//! [`ConfigProvider::invalidate`].

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use cafe_core::PricingConfig;
use chrono::{DateTime, Duration, Utc};

use crate::error::{PricingError, StoreError};

/// Default lifetime of a cached config.
pub const CONFIG_CACHE_TTL: Duration = Duration::minutes(5);

/// Persistence for the single pricing config record.
pub trait ConfigStore: Send + Sync {
    /// The stored record, or `None` if it has never been created.
    fn fetch_config(
        &self,
    ) -> impl Future<Output = Result<Option<PricingConfig>, StoreError>> + Send;

    /// Insert `defaults` under the fixed config id unless a record already exists.
    ///
    /// Returns `true` if this call created the record. A concurrent creator
    /// having won the race is not an error; it returns `false`.
    fn create_default_config(
        &self,
        defaults: &PricingConfig,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<T: ConfigStore> ConfigStore for Arc<T> {
    fn fetch_config(
        &self,
    ) -> impl Future<Output = Result<Option<PricingConfig>, StoreError>> + Send {
        (**self).fetch_config()
    }

    fn create_default_config(
        &self,
        defaults: &PricingConfig,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).create_default_config(defaults)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CachedValue<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

/// A single cached value with a fixed time-to-live.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<CachedValue<T>>>,
}

impl<T: Clone> TtlCache<T> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it was stored less than `ttl` before `now`.
    pub fn get(&self, now: DateTime<Utc>) -> Option<T> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| now - cached.fetched_at < self.ttl)
            .map(|cached| cached.value.clone())
    }

    pub fn put(&self, value: T, now: DateTime<Utc>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedValue {
            value,
            fetched_at: now,
        });
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

/// Serves the current [`PricingConfig`], creating it with defaults on first use.
#[derive(Debug)]
pub struct ConfigProvider<S, C = SystemClock> {
    store: S,
    clock: C,
    cache: TtlCache<PricingConfig>,
}

impl<S: ConfigStore> ConfigProvider<S, SystemClock> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self::with_clock(store, SystemClock, ttl)
    }
}

impl<S: ConfigStore, C: Clock> ConfigProvider<S, C> {
    pub fn with_clock(store: S, clock: C, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current config, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::ConfigUnavailable`] if the store cannot be read
    /// or the record cannot be created.
    pub async fn get_config(&self) -> Result<PricingConfig, PricingError> {
        let now = self.clock.now();
        if let Some(config) = self.cache.get(now) {
            return Ok(config);
        }

        let config = self.load_or_create().await?;
        self.cache.put(config.clone(), now);
        Ok(config)
    }

    /// Drop the cached config so the next read goes to the store.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    async fn load_or_create(&self) -> Result<PricingConfig, PricingError> {
        if let Some(config) = self
            .store
            .fetch_config()
            .await
            .map_err(PricingError::ConfigUnavailable)?
        {
            return Ok(config);
        }

        let defaults = PricingConfig::default();
        let created = self
            .store
            .create_default_config(&defaults)
            .await
            .map_err(PricingError::ConfigUnavailable)?;

        if created {
            tracing::info!("pricing config not found; created with defaults");
            return Ok(defaults);
        }

        // Another caller created it between our read and insert.
        self.store
            .fetch_config()
            .await
            .map_err(PricingError::ConfigUnavailable)?
            .ok_or_else(|| {
                PricingError::ConfigUnavailable("pricing config vanished after create".into())
            })
    }
}

#[cfg(test)]
#[path = "config_cache_test.rs"]
mod tests;
