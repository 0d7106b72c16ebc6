//! Boundary checks for pricing inputs.
//!
//! The engine itself trusts its inputs. Anything arriving from a request or
//! the command line goes through these first.

use cafe_core::{Location, OrderLineItem, PricingConfig};
use chrono::NaiveTime;

use crate::error::PricingError;

fn invalid(message: impl Into<String>) -> PricingError {
    PricingError::InvalidInput(message.into())
}

/// Reject coordinates that are non-finite or outside the valid degree ranges.
///
/// # Errors
///
/// Returns [`PricingError::InvalidInput`] naming `field`.
pub fn validate_location(field: &str, location: &Location) -> Result<(), PricingError> {
    if !location.lat.is_finite() || !(-90.0..=90.0).contains(&location.lat) {
        return Err(invalid(format!(
            "{field}.lat must be between -90 and 90, got {}",
            location.lat
        )));
    }
    if !location.lng.is_finite() || !(-180.0..=180.0).contains(&location.lng) {
        return Err(invalid(format!(
            "{field}.lng must be between -180 and 180, got {}",
            location.lng
        )));
    }
    Ok(())
}

/// Check an order before it is priced.
///
/// # Errors
///
/// Returns [`PricingError::InvalidInput`] for an empty order, a zero
/// quantity, a negative or non-finite unit price, or a bad coordinate.
pub fn validate_order(
    items: &[OrderLineItem],
    outlet: &Location,
    delivery: &Location,
) -> Result<(), PricingError> {
    if items.is_empty() {
        return Err(invalid("order must contain at least one item"));
    }

    for (index, item) in items.iter().enumerate() {
        if item.menu_item_id.trim().is_empty() {
            return Err(invalid(format!("items[{index}].menu_item_id must be non-empty")));
        }
        if item.quantity == 0 {
            return Err(invalid(format!("items[{index}].quantity must be at least 1")));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(invalid(format!(
                "items[{index}].price must be a non-negative number, got {}",
                item.price
            )));
        }
    }

    validate_location("outlet_location", outlet)?;
    validate_location("delivery_location", delivery)
}

fn non_negative(field: &str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be >= 0, got {value}")))
    }
}

/// Money columns hold two decimals and `gst_rate` four; anything finer
/// would be silently rounded on write.
fn at_most_decimals(field: &str, value: f64, places: i32) -> Result<(), PricingError> {
    let scaled = value * 10f64.powi(places);
    if (scaled - scaled.round()).abs() < 1e-6 {
        Ok(())
    } else {
        Err(invalid(format!("{field} allows at most {places} decimal places, got {value}")))
    }
}

fn parse_hhmm(field: &str, value: &str) -> Result<NaiveTime, PricingError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| invalid(format!("{field} must be HH:MM, got '{value}'")))
}

/// Check a pricing config before it is stored.
///
/// # Errors
///
/// Returns [`PricingError::InvalidInput`] naming the first offending field.
pub fn validate_pricing_config(config: &PricingConfig) -> Result<(), PricingError> {
    if !(config.gst_rate.is_finite() && (0.0..=1.0).contains(&config.gst_rate)) {
        return Err(invalid(format!(
            "gst_rate must be a fraction between 0 and 1, got {}",
            config.gst_rate
        )));
    }
    at_most_decimals("gst_rate", config.gst_rate, 4)?;
    for (field, value) in [
        ("base_delivery_fee", config.base_delivery_fee),
        ("per_km_rate", config.per_km_rate),
        ("free_delivery_threshold", config.free_delivery_threshold),
    ] {
        non_negative(field, value)?;
        at_most_decimals(field, value, 2)?;
    }

    if !(config.max_delivery_distance_km.is_finite() && config.max_delivery_distance_km > 0.0) {
        return Err(invalid(format!(
            "max_delivery_distance_km must be > 0, got {}",
            config.max_delivery_distance_km
        )));
    }
    if config.currency.trim().is_empty() {
        return Err(invalid("currency must be non-empty"));
    }

    parse_hhmm("operating_hours_start", &config.operating_hours_start)?;
    parse_hhmm("operating_hours_end", &config.operating_hours_end)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            menu_item_id: "latte".to_string(),
            quantity,
            price,
        }
    }

    const OUTLET: Location = Location {
        lat: 16.3067,
        lng: 80.4365,
    };

    #[test]
    fn accepts_a_normal_order() {
        validate_order(&[item(150.0, 2)], &OUTLET, &OUTLET).unwrap();
    }

    #[test]
    fn free_items_are_allowed() {
        validate_order(&[item(0.0, 1)], &OUTLET, &OUTLET).unwrap();
    }

    #[test]
    fn rejects_empty_order() {
        let err = validate_order(&[], &OUTLET, &OUTLET).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(ref m) if m.contains("at least one")));
    }

    #[test]
    fn rejects_zero_quantity() {
        let err = validate_order(&[item(10.0, 0)], &OUTLET, &OUTLET).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(ref m) if m.contains("items[0].quantity")));
    }

    #[test]
    fn rejects_negative_and_nan_prices() {
        assert!(validate_order(&[item(-1.0, 1)], &OUTLET, &OUTLET).is_err());
        assert!(validate_order(&[item(f64::NAN, 1)], &OUTLET, &OUTLET).is_err());
    }

    #[test]
    fn rejects_out_of_range_delivery_coordinates() {
        let bad = Location::new(91.0, 80.0);
        let err = validate_order(&[item(10.0, 1)], &OUTLET, &bad).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(ref m) if m.contains("delivery_location.lat")));

        let bad_lng = Location::new(16.0, -180.5);
        assert!(validate_location("outlet_location", &bad_lng).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        validate_pricing_config(&PricingConfig::default()).unwrap();
    }

    #[test]
    fn rejects_gst_expressed_as_percentage() {
        let config = PricingConfig {
            gst_rate: 5.0,
            ..PricingConfig::default()
        };
        let err = validate_pricing_config(&config).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(ref m) if m.contains("gst_rate")));
    }

    #[test]
    fn rejects_zero_max_distance() {
        let config = PricingConfig {
            max_delivery_distance_km: 0.0,
            ..PricingConfig::default()
        };
        assert!(validate_pricing_config(&config).is_err());
    }

    #[test]
    fn rejects_money_finer_than_cents() {
        let config = PricingConfig {
            per_km_rate: 7.555,
            ..PricingConfig::default()
        };
        let err = validate_pricing_config(&config).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(ref m) if m.contains("per_km_rate")));

        let cents = PricingConfig {
            per_km_rate: 7.55,
            free_delivery_threshold: 499.99,
            ..PricingConfig::default()
        };
        validate_pricing_config(&cents).unwrap();
    }

    #[test]
    fn gst_rate_allows_four_decimals() {
        let fine = PricingConfig {
            gst_rate: 0.1825,
            ..PricingConfig::default()
        };
        validate_pricing_config(&fine).unwrap();

        let too_fine = PricingConfig {
            gst_rate: 0.18255,
            ..PricingConfig::default()
        };
        assert!(validate_pricing_config(&too_fine).is_err());
    }

    #[test]
    fn rejects_malformed_operating_hours() {
        let config = PricingConfig {
            operating_hours_end: "11pm".to_string(),
            ..PricingConfig::default()
        };
        let err = validate_pricing_config(&config).unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(ref m) if m.contains("operating_hours_end")));
    }
}
