use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How a zone adjusts the price of orders delivered inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierType {
    /// `value` is a percentage of subtotal plus distance fee.
    #[default]
    Percent,
    /// `value` is a flat currency amount.
    Fixed,
}

impl std::fmt::Display for ModifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModifierType::Percent => write!(f, "percent"),
            ModifierType::Fixed => write!(f, "fixed"),
        }
    }
}

impl std::str::FromStr for ModifierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(ModifierType::Percent),
            "fixed" => Ok(ModifierType::Fixed),
            other => Err(format!(
                "modifier type must be 'percent' or 'fixed', got '{other}'"
            )),
        }
    }
}

/// A circular delivery zone carrying a price modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub zone_id: String,
    pub name: String,
    pub description: Option<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_km: f64,
    pub modifier_type: ModifierType,
    /// Signed; negative values are discounts.
    pub value: f64,
    pub active: bool,
    /// Higher wins when zones overlap.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A zone as declared in the seed file, before it has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSeed {
    pub zone_id: String,
    pub name: String,
    pub description: Option<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_km: f64,
    #[serde(default)]
    pub modifier_type: ModifierType,
    pub value: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ZonesFile {
    pub zones: Vec<ZoneSeed>,
}

/// Load and validate zone definitions from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_zones(path: &Path) -> Result<ZonesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ZonesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_zones(&content)
}

fn parse_zones(content: &str) -> Result<ZonesFile, ConfigError> {
    let zones_file: ZonesFile =
        serde_yaml::from_str(content).map_err(ConfigError::ZonesFileParse)?;

    validate_zones(&zones_file)?;

    Ok(zones_file)
}

fn validate_zones(zones_file: &ZonesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for zone in &zones_file.zones {
        validate_zone_seed(zone)?;

        if !seen_ids.insert(zone.zone_id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate zone_id: '{}'",
                zone.zone_id
            )));
        }
    }

    Ok(())
}

/// Check a single zone definition, whether it comes from the seed file or
/// an admin request.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] naming the first offending field.
pub fn validate_zone_seed(zone: &ZoneSeed) -> Result<(), ConfigError> {
    if zone.zone_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "zone_id must be non-empty".to_string(),
        ));
    }

    if zone.name.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "zone '{}' must have a non-empty name",
            zone.zone_id
        )));
    }

    if !(zone.radius_km.is_finite() && zone.radius_km > 0.0) {
        return Err(ConfigError::Validation(format!(
            "zone '{}' has invalid radius {}; must be greater than 0",
            zone.zone_id, zone.radius_km
        )));
    }

    if !(-90.0..=90.0).contains(&zone.center_lat) || !(-180.0..=180.0).contains(&zone.center_lng)
    {
        return Err(ConfigError::Validation(format!(
            "zone '{}' has an out-of-range center ({}, {})",
            zone.zone_id, zone.center_lat, zone.center_lng
        )));
    }

    if !zone.value.is_finite() {
        return Err(ConfigError::Validation(format!(
            "zone '{}' has a non-numeric modifier value",
            zone.zone_id
        )));
    }

    Ok(())
}
