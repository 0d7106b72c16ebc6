//! Order pricing: subtotal, delivery fee, zone modifier, GST.

use cafe_core::{
    Location, ModifierType, OrderLineItem, PriceLines, PricingBreakdown, PricingConfig, ZoneRule,
};

use crate::config_cache::{Clock, ConfigProvider, ConfigStore, SystemClock};
use crate::error::PricingError;
use crate::geo::distance_km;
use crate::zones::{select_zone, ZoneMatcher, ZoneStore};

/// Round to two decimals, with exact halves going toward positive infinity.
///
/// Historical order totals were produced with this rule, so it must not be
/// swapped for `f64::round` (which rounds halves away from zero).
pub(crate) fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    };
    rounded / 100.0
}

fn subtotal(items: &[OrderLineItem]) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + item.line_total())
}

fn ensure_deliverable(distance_km: f64, config: &PricingConfig) -> Result<(), PricingError> {
    if distance_km > config.max_delivery_distance_km {
        return Err(PricingError::DistanceExceeded {
            distance_km,
            max_distance_km: config.max_delivery_distance_km,
        });
    }
    Ok(())
}

fn distance_fee(distance_km: f64, subtotal: f64, config: &PricingConfig) -> f64 {
    if subtotal >= config.free_delivery_threshold || distance_km <= 0.0 {
        return 0.0;
    }
    config.base_delivery_fee + config.per_km_rate * distance_km
}

fn zone_modifier(base_amount: f64, zone: Option<&ZoneRule>) -> f64 {
    match zone {
        None => 0.0,
        Some(zone) => match zone.modifier_type {
            ModifierType::Percent => base_amount * zone.value / 100.0,
            ModifierType::Fixed => zone.value,
        },
    }
}

/// Assemble the breakdown once subtotal, distance and zone are known.
fn compose(
    subtotal: f64,
    distance_km: f64,
    config: &PricingConfig,
    zone: Option<&ZoneRule>,
) -> PricingBreakdown {
    let distance_fee = distance_fee(distance_km, subtotal, config);
    let base_amount = subtotal + distance_fee;
    let zone_modifier = zone_modifier(base_amount, zone);
    let taxable_amount = base_amount + zone_modifier;
    let gst_amount = taxable_amount * config.gst_rate;
    let final_price = taxable_amount + gst_amount;

    PricingBreakdown {
        subtotal: round2(subtotal),
        distance_km: round2(distance_km),
        distance_fee: round2(distance_fee),
        zone_modifier: round2(zone_modifier),
        zone_name: zone.map(|z| z.name.clone()),
        zone_id: zone.map(|z| z.zone_id.clone()),
        gst_amount: round2(gst_amount),
        gst_rate: config.gst_rate,
        final_price: round2(final_price),
        free_delivery: subtotal >= config.free_delivery_threshold,
        breakdown: PriceLines {
            items_total: subtotal,
            delivery_fee: distance_fee,
            zone_charge: zone_modifier,
            tax: gst_amount,
            total: final_price,
        },
    }
}

/// Price an order against an already-loaded config and zone list.
///
/// # Errors
///
/// Returns [`PricingError::DistanceExceeded`] when the delivery point is
/// farther from the outlet than `config.max_delivery_distance_km`.
pub fn price_order(
    items: &[OrderLineItem],
    outlet: Location,
    delivery: Location,
    config: &PricingConfig,
    zones: &[ZoneRule],
) -> Result<PricingBreakdown, PricingError> {
    let subtotal = subtotal(items);
    let distance = distance_km(outlet.lat, outlet.lng, delivery.lat, delivery.lng);
    ensure_deliverable(distance, config)?;

    let zone = select_zone(zones, delivery.lat, delivery.lng);
    Ok(compose(subtotal, distance, config, zone))
}

/// Prices orders using the live config and zone stores.
#[derive(Debug)]
pub struct PricingEngine<C, Z, K = SystemClock> {
    config: ConfigProvider<C, K>,
    zones: ZoneMatcher<Z>,
}

impl<C, Z, K> PricingEngine<C, Z, K>
where
    C: ConfigStore,
    Z: ZoneStore,
    K: Clock,
{
    pub fn new(config: ConfigProvider<C, K>, zones: ZoneMatcher<Z>) -> Self {
        Self { config, zones }
    }

    pub fn config_provider(&self) -> &ConfigProvider<C, K> {
        &self.config
    }

    pub fn zone_matcher(&self) -> &ZoneMatcher<Z> {
        &self.zones
    }

    /// Price an order delivered from `outlet` to `delivery`.
    ///
    /// Inputs are trusted; run them through [`crate::validate::validate_order`]
    /// at the boundary first.
    ///
    /// # Errors
    ///
    /// - [`PricingError::DistanceExceeded`] when the delivery point is out of range.
    /// - [`PricingError::ConfigUnavailable`] / [`PricingError::ZonesUnavailable`]
    ///   when a store cannot be read.
    pub async fn calculate_order_pricing(
        &self,
        items: &[OrderLineItem],
        outlet: Location,
        delivery: Location,
    ) -> Result<PricingBreakdown, PricingError> {
        let config = self.config.get_config().await?;

        let subtotal = subtotal(items);
        let distance = distance_km(outlet.lat, outlet.lng, delivery.lat, delivery.lng);
        if let Err(err) = ensure_deliverable(distance, &config) {
            tracing::warn!(
                distance_km = distance,
                max_distance_km = config.max_delivery_distance_km,
                "delivery outside range"
            );
            return Err(err);
        }

        let zone = self
            .zones
            .find_applicable_zone(delivery.lat, delivery.lng)
            .await?;

        let breakdown = compose(subtotal, distance, &config, zone.as_ref());
        tracing::debug!(
            items = items.len(),
            subtotal = breakdown.subtotal,
            distance_km = breakdown.distance_km,
            zone_id = breakdown.zone_id.as_deref(),
            final_price = breakdown.final_price,
            "order priced"
        );
        Ok(breakdown)
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
