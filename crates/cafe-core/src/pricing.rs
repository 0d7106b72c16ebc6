use serde::{Deserialize, Serialize};

/// Fixed identifier of the single pricing configuration record.
pub const PRICING_CONFIG_ID: &str = "system-config";

/// Chain-wide delivery pricing settings.
///
/// There is exactly one live instance, stored under [`PRICING_CONFIG_ID`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// GST as a fraction, e.g. `0.05` for 5%.
    pub gst_rate: f64,
    pub base_delivery_fee: f64,
    pub per_km_rate: f64,
    /// Subtotal at or above which the distance fee is waived.
    pub free_delivery_threshold: f64,
    pub max_delivery_distance_km: f64,
    pub currency: String,
    pub currency_symbol: String,
    /// `HH:MM`, local time of the chain.
    pub operating_hours_start: String,
    pub operating_hours_end: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            gst_rate: 0.05,
            base_delivery_fee: 20.0,
            per_km_rate: 10.0,
            free_delivery_threshold: 500.0,
            max_delivery_distance_km: 15.0,
            currency: "INR".to_string(),
            currency_symbol: "₹".to_string(),
            operating_hours_start: "09:00".to_string(),
            operating_hours_end: "23:00".to_string(),
        }
    }
}

/// Result of pricing one order.
///
/// Money and distance fields are each rounded to two decimals on their own;
/// `breakdown` keeps the unrounded figures for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: f64,
    pub distance_km: f64,
    pub distance_fee: f64,
    pub zone_modifier: f64,
    pub zone_name: Option<String>,
    pub zone_id: Option<String>,
    pub gst_amount: f64,
    pub gst_rate: f64,
    pub final_price: f64,
    pub free_delivery: bool,
    pub breakdown: PriceLines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLines {
    pub items_total: f64,
    pub delivery_fee: f64,
    pub zone_charge: f64,
    pub tax: f64,
    pub total: f64,
}
