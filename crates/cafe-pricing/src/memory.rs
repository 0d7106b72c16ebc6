//! In-process stores and a hand-driven clock.
//!
//! Used by tests and by callers that price against a fixed, local ruleset.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use cafe_core::{PricingConfig, ZoneRule};
use chrono::{DateTime, Duration, Utc};

use crate::config_cache::{Clock, ConfigStore};
use crate::error::StoreError;
use crate::zones::ZoneStore;

#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    record: Mutex<Option<PricingConfig>>,
    fetches: AtomicUsize,
    creates: AtomicUsize,
}

impl InMemoryConfigStore {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: PricingConfig) -> Self {
        Self {
            record: Mutex::new(Some(config)),
            ..Self::default()
        }
    }

    /// Replace the stored record, as an admin update would.
    pub fn set(&self, config: PricingConfig) {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(config);
    }

    #[must_use]
    pub fn current(&self) -> Option<PricingConfig> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `fetch_config` calls served so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of records actually created by `create_default_config`.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

impl ConfigStore for InMemoryConfigStore {
    async fn fetch_config(&self) -> Result<Option<PricingConfig>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.current())
    }

    async fn create_default_config(&self, defaults: &PricingConfig) -> Result<bool, StoreError> {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        if record.is_some() {
            return Ok(false);
        }
        *record = Some(defaults.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryZoneStore {
    zones: Mutex<Vec<ZoneRule>>,
}

impl InMemoryZoneStore {
    #[must_use]
    pub fn new(zones: Vec<ZoneRule>) -> Self {
        Self {
            zones: Mutex::new(zones),
        }
    }

    pub fn push(&self, zone: ZoneRule) {
        self.zones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(zone);
    }
}

impl ZoneStore for InMemoryZoneStore {
    async fn list_active_zones(&self) -> Result<Vec<ZoneRule>, StoreError> {
        let zones = self.zones.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(zones.iter().filter(|z| z.active).cloned().collect())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
