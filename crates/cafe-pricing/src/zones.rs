//! Zone selection for a delivery point.

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;

use cafe_core::ZoneRule;

use crate::error::{PricingError, StoreError};
use crate::geo::is_within_radius;

/// Source of the zone rules the matcher chooses from.
pub trait ZoneStore: Send + Sync {
    /// Every zone with `active = true`. Order is not relied upon.
    fn list_active_zones(&self) -> impl Future<Output = Result<Vec<ZoneRule>, StoreError>> + Send;
}

impl<T: ZoneStore> ZoneStore for Arc<T> {
    fn list_active_zones(&self) -> impl Future<Output = Result<Vec<ZoneRule>, StoreError>> + Send {
        (**self).list_active_zones()
    }
}

/// Precedence among zones covering the same point: higher priority first,
/// then the most recently created, then `zone_id` ascending.
fn precedence(a: &ZoneRule, b: &ZoneRule) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.zone_id.cmp(&b.zone_id))
}

/// Pick the zone that applies to `(lat, lng)` from an already-loaded list.
///
/// Inactive zones are skipped. The result does not depend on the order of
/// `zones`.
#[must_use]
pub fn select_zone(zones: &[ZoneRule], lat: f64, lng: f64) -> Option<&ZoneRule> {
    zones
        .iter()
        .filter(|zone| zone.active)
        .filter(|zone| is_within_radius(lat, lng, zone.center_lat, zone.center_lng, zone.radius_km))
        .min_by(|a, b| precedence(a, b))
}

/// Looks up the applicable zone against a [`ZoneStore`].
#[derive(Debug, Clone)]
pub struct ZoneMatcher<Z> {
    store: Z,
}

impl<Z: ZoneStore> ZoneMatcher<Z> {
    pub fn new(store: Z) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Z {
        &self.store
    }

    /// The highest-precedence active zone containing the point, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::ZonesUnavailable`] if the store cannot be read.
    pub async fn find_applicable_zone(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Option<ZoneRule>, PricingError> {
        let zones = self
            .store
            .list_active_zones()
            .await
            .map_err(PricingError::ZonesUnavailable)?;

        let zone = select_zone(&zones, lat, lng).cloned();
        tracing::debug!(
            lat,
            lng,
            candidates = zones.len(),
            zone_id = zone.as_ref().map(|z| z.zone_id.as_str()),
            "zone lookup"
        );
        Ok(zone)
    }
}
