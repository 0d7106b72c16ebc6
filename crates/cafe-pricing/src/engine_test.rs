use chrono::{TimeZone, Utc};

use super::*;
use crate::config_cache::CONFIG_CACHE_TTL;
use crate::memory::{InMemoryConfigStore, InMemoryZoneStore};

const OUTLET: Location = Location {
    lat: 16.3067,
    lng: 80.4365,
};

/// A point `km` kilometres due north of `origin`.
fn north_of(origin: Location, km: f64) -> Location {
    Location {
        lat: origin.lat + (km / 6371.0).to_degrees(),
        lng: origin.lng,
    }
}

fn items(lines: &[(f64, u32)]) -> Vec<OrderLineItem> {
    lines
        .iter()
        .enumerate()
        .map(|(i, &(price, quantity))| OrderLineItem {
            menu_item_id: format!("item-{i}"),
            quantity,
            price,
        })
        .collect()
}

fn zone_at(center: Location, modifier_type: ModifierType, value: f64) -> ZoneRule {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    ZoneRule {
        zone_id: "GNT002".to_string(),
        name: "Guntur North".to_string(),
        description: None,
        center_lat: center.lat,
        center_lng: center.lng,
        radius_km: 1.0,
        modifier_type,
        value,
        active: true,
        priority: 8,
        created_at: created,
        updated_at: created,
    }
}

fn assert_money(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn engine(
    zones: Vec<ZoneRule>,
) -> PricingEngine<InMemoryConfigStore, InMemoryZoneStore, SystemClock> {
    PricingEngine::new(
        ConfigProvider::new(
            InMemoryConfigStore::with_config(PricingConfig::default()),
            CONFIG_CACHE_TTL,
        ),
        ZoneMatcher::new(InMemoryZoneStore::new(zones)),
    )
}

#[test]
fn round2_sends_halves_toward_positive_infinity() {
    assert_money(round2(2.345), 2.35);
    assert_money(round2(-2.345), -2.35);
    assert_money(round2(0.125), 0.13);
    assert_money(round2(-0.125), -0.12);
    assert_money(round2(18.5), 18.5);
    assert_money(round2(1.004), 1.0);
    assert_money(round2(0.0), 0.0);
}

#[test]
fn no_zone_example() {
    let delivery = north_of(OUTLET, 5.0);
    let b = price_order(
        &items(&[(150.0, 2)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &[],
    )
    .unwrap();

    assert_money(b.subtotal, 300.0);
    assert_money(b.distance_km, 5.0);
    assert_money(b.distance_fee, 70.0);
    assert_money(b.zone_modifier, 0.0);
    assert_money(b.gst_amount, 18.5);
    assert_money(b.final_price, 388.5);
    assert!(!b.free_delivery);
    assert!(b.zone_id.is_none());
    assert!(b.zone_name.is_none());
}

#[test]
fn fixed_zone_example() {
    let delivery = north_of(OUTLET, 5.0);
    let zones = [zone_at(delivery, ModifierType::Fixed, 25.0)];
    let b = price_order(
        &items(&[(150.0, 2)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &zones,
    )
    .unwrap();

    assert_money(b.zone_modifier, 25.0);
    assert_money(b.gst_amount, 19.75);
    assert_money(b.final_price, 414.75);
    assert_eq!(b.zone_id.as_deref(), Some("GNT002"));
    assert_eq!(b.zone_name.as_deref(), Some("Guntur North"));
}

#[test]
fn percent_zone_example() {
    let delivery = north_of(OUTLET, 5.0);
    let zones = [zone_at(delivery, ModifierType::Percent, 10.0)];
    let b = price_order(
        &items(&[(100.0, 3)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &zones,
    )
    .unwrap();

    assert_money(b.zone_modifier, 37.0);
    assert_money(b.gst_amount, 20.35);
    assert_money(b.final_price, 427.35);
}

#[test]
fn negative_percent_zone_is_a_discount() {
    let delivery = north_of(OUTLET, 5.0);
    let zones = [zone_at(delivery, ModifierType::Percent, -10.0)];
    let b = price_order(
        &items(&[(300.0, 1)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &zones,
    )
    .unwrap();

    assert_money(b.zone_modifier, -37.0);
    assert_money(b.gst_amount, 16.65);
    assert_money(b.final_price, 349.65);
}

#[test]
fn subtotal_equal_to_threshold_gets_free_delivery() {
    let delivery = north_of(OUTLET, 5.0);
    let b = price_order(
        &items(&[(250.0, 2)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &[],
    )
    .unwrap();

    assert_money(b.distance_fee, 0.0);
    assert!(b.free_delivery);
    assert_money(b.final_price, 525.0);
}

#[test]
fn subtotal_above_threshold_waives_fee_at_any_allowed_distance() {
    let delivery = north_of(OUTLET, 14.0);
    let b = price_order(
        &items(&[(600.0, 1)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &[],
    )
    .unwrap();

    assert_money(b.distance_km, 14.0);
    assert_money(b.distance_fee, 0.0);
    assert!(b.free_delivery);
    assert_money(b.gst_amount, 30.0);
    assert_money(b.final_price, 630.0);
}

#[test]
fn threshold_uses_raw_subtotal_not_zone_adjusted_amount() {
    let delivery = north_of(OUTLET, 2.0);
    let zones = [zone_at(delivery, ModifierType::Fixed, 100.0)];
    let b = price_order(
        &items(&[(450.0, 1)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &zones,
    )
    .unwrap();

    assert!(!b.free_delivery);
    assert_money(b.distance_fee, 40.0);
}

#[test]
fn distance_beyond_max_is_rejected() {
    let delivery = north_of(OUTLET, 15.01);
    let err = price_order(
        &items(&[(100.0, 1)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &[],
    )
    .unwrap_err();

    match err {
        PricingError::DistanceExceeded {
            distance_km,
            max_distance_km,
        } => {
            assert_money(distance_km, 15.01);
            assert_money(max_distance_km, 15.0);
        }
        other => panic!("expected DistanceExceeded, got {other:?}"),
    }
}

#[test]
fn distance_exactly_at_max_is_allowed() {
    let delivery = north_of(OUTLET, 15.0);
    let b = price_order(
        &items(&[(100.0, 1)]),
        OUTLET,
        delivery,
        &PricingConfig::default(),
        &[],
    )
    .unwrap();
    assert_money(b.distance_km, 15.0);
    assert_money(b.distance_fee, 170.0);
}

#[test]
fn empty_order_still_pays_delivery() {
    let delivery = north_of(OUTLET, 5.0);
    let b = price_order(&[], OUTLET, delivery, &PricingConfig::default(), &[]).unwrap();

    assert_money(b.subtotal, 0.0);
    assert_money(b.distance_fee, 70.0);
    assert_money(b.final_price, 73.5);
    assert!(b.subtotal.is_sign_positive());
    assert!(b.breakdown.items_total.is_sign_positive());
}

#[test]
fn delivery_at_the_outlet_has_no_distance_fee() {
    let b = price_order(
        &items(&[(100.0, 1)]),
        OUTLET,
        OUTLET,
        &PricingConfig::default(),
        &[],
    )
    .unwrap();

    assert_money(b.distance_km, 0.0);
    assert_money(b.distance_fee, 0.0);
    assert!(!b.free_delivery);
}

#[test]
fn fields_are_rounded_independently() {
    let config = PricingConfig {
        gst_rate: 0.5,
        ..PricingConfig::default()
    };
    let b = price_order(&items(&[(10.004, 1)]), OUTLET, OUTLET, &config, &[]).unwrap();

    assert_money(b.subtotal, 10.0);
    assert_money(b.gst_amount, 5.0);
    // Rounded from the unrounded total (15.006), not from the rounded parts.
    assert_money(b.final_price, 15.01);
    assert_money(b.breakdown.items_total, 10.004);
    assert_money(b.breakdown.total, 15.006);
}

#[test]
fn gst_rate_is_snapshotted() {
    let config = PricingConfig {
        gst_rate: 0.18,
        ..PricingConfig::default()
    };
    let b = price_order(&items(&[(100.0, 1)]), OUTLET, OUTLET, &config, &[]).unwrap();
    assert_money(b.gst_rate, 0.18);
    assert_money(b.gst_amount, 18.0);
}

#[tokio::test]
async fn engine_matches_pure_pricing() {
    let delivery = north_of(OUTLET, 5.0);
    let zones = vec![zone_at(delivery, ModifierType::Fixed, 25.0)];
    let order = items(&[(150.0, 2)]);

    let expected =
        price_order(&order, OUTLET, delivery, &PricingConfig::default(), &zones).unwrap();
    let actual = engine(zones)
        .calculate_order_pricing(&order, OUTLET, delivery)
        .await
        .unwrap();

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn engine_rejects_out_of_range_delivery() {
    let delivery = north_of(OUTLET, 20.0);
    let err = engine(vec![])
        .calculate_order_pricing(&items(&[(100.0, 1)]), OUTLET, delivery)
        .await
        .unwrap_err();
    assert!(matches!(err, PricingError::DistanceExceeded { .. }), "got {err:?}");
}

#[tokio::test]
async fn engine_ignores_inactive_zone() {
    let delivery = north_of(OUTLET, 5.0);
    let mut zone = zone_at(delivery, ModifierType::Fixed, 25.0);
    zone.active = false;

    let b = engine(vec![zone])
        .calculate_order_pricing(&items(&[(150.0, 2)]), OUTLET, delivery)
        .await
        .unwrap();

    assert!(b.zone_id.is_none());
    assert_money(b.final_price, 388.5);
}

#[tokio::test]
async fn engine_creates_config_on_first_use() {
    let engine = PricingEngine::new(
        ConfigProvider::new(InMemoryConfigStore::empty(), CONFIG_CACHE_TTL),
        ZoneMatcher::new(InMemoryZoneStore::default()),
    );
    let delivery = north_of(OUTLET, 5.0);

    let b = engine
        .calculate_order_pricing(&items(&[(150.0, 2)]), OUTLET, delivery)
        .await
        .unwrap();

    assert_money(b.final_price, 388.5);
    assert_eq!(engine.config_provider().store().create_count(), 1);
}

struct BrokenZoneStore;

impl ZoneStore for BrokenZoneStore {
    async fn list_active_zones(&self) -> Result<Vec<ZoneRule>, crate::error::StoreError> {
        Err("zone table locked".into())
    }
}

#[tokio::test]
async fn zone_store_failure_surfaces_zones_unavailable() {
    let engine = PricingEngine::new(
        ConfigProvider::new(
            InMemoryConfigStore::with_config(PricingConfig::default()),
            CONFIG_CACHE_TTL,
        ),
        ZoneMatcher::new(BrokenZoneStore),
    );

    let err = engine
        .calculate_order_pricing(&items(&[(100.0, 1)]), OUTLET, north_of(OUTLET, 2.0))
        .await
        .unwrap_err();

    assert!(matches!(err, PricingError::ZonesUnavailable(_)), "got {err:?}");
    assert!(!err.is_permanent());
}
