//! `quote` and `config show`: run the pricing engine against the database.

use cafe_core::{AppConfig, Location, OrderLineItem, PricingBreakdown};
use cafe_db::PgPricingStore;
use cafe_pricing::{validate_order, ConfigProvider, PricingEngine, ZoneMatcher};

/// One `--item PRICE:QTY` argument.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuoteItem {
    pub price: f64,
    pub quantity: u32,
}

/// Parse `LAT,LNG` into a [`Location`].
pub(crate) fn parse_location(raw: &str) -> Result<Location, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{raw}'"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;
    Ok(Location::new(lat, lng))
}

/// Parse `PRICE:QTY` into a [`QuoteItem`].
pub(crate) fn parse_item(raw: &str) -> Result<QuoteItem, String> {
    let (price, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected PRICE:QTY, got '{raw}'"))?;
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid price '{price}': {e}"))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
    Ok(QuoteItem { price, quantity })
}

pub(crate) fn build_engine(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<PricingEngine<PgPricingStore, PgPricingStore>> {
    let ttl = chrono::Duration::seconds(i64::try_from(config.pricing_config_ttl_secs)?);
    let store = PgPricingStore::new(pool.clone());
    Ok(PricingEngine::new(
        ConfigProvider::new(store.clone(), ttl),
        ZoneMatcher::new(store),
    ))
}

fn order_lines(items: &[QuoteItem]) -> Vec<OrderLineItem> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| OrderLineItem {
            menu_item_id: format!("cli-item-{}", i + 1),
            quantity: item.quantity,
            price: item.price,
        })
        .collect()
}

fn render_table(b: &PricingBreakdown) -> String {
    let zone = match (&b.zone_id, &b.zone_name) {
        (Some(id), Some(name)) => format!("{name} ({id})"),
        _ => "none".to_string(),
    };
    let delivery = if b.free_delivery {
        format!("{:>10.2}  (free delivery)", b.distance_fee)
    } else {
        format!("{:>10.2}", b.distance_fee)
    };

    [
        format!("{:<16}{:>10.2}", "subtotal", b.subtotal),
        format!("{:<16}{:>10.2}", "distance (km)", b.distance_km),
        format!("{:<16}{delivery}", "delivery fee"),
        format!("{:<16}{:>10.2}  zone: {zone}", "zone modifier", b.zone_modifier),
        format!("{:<16}{:>10.2}  at {}%", "gst", b.gst_amount, b.gst_rate * 100.0),
        format!("{:<16}{:>10.2}", "total", b.final_price),
    ]
    .join("\n")
}

pub(crate) async fn run_quote(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    outlet: Location,
    delivery: Location,
    items: &[QuoteItem],
    json: bool,
) -> anyhow::Result<()> {
    let lines = order_lines(items);
    validate_order(&lines, &outlet, &delivery)?;

    let engine = build_engine(pool, config)?;
    let breakdown = engine
        .calculate_order_pricing(&lines, outlet, delivery)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        println!("{}", render_table(&breakdown));
    }
    Ok(())
}
