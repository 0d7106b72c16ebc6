//! Database operations for the single-row `pricing_config` table.

use cafe_core::{PricingConfig, PRICING_CONFIG_ID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::numeric::{to_decimal, to_f64};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `pricing_config` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PricingConfigRow {
    pub id: String,
    pub gst_rate: Decimal,
    pub base_delivery_fee: Decimal,
    pub per_km_rate: Decimal,
    pub free_delivery_threshold: Decimal,
    pub max_delivery_distance_km: f64,
    pub currency: String,
    pub currency_symbol: String,
    pub operating_hours_start: String,
    pub operating_hours_end: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PricingConfigRow> for PricingConfig {
    type Error = DbError;

    fn try_from(row: PricingConfigRow) -> Result<Self, Self::Error> {
        Ok(PricingConfig {
            gst_rate: to_f64("gst_rate", row.gst_rate)?,
            base_delivery_fee: to_f64("base_delivery_fee", row.base_delivery_fee)?,
            per_km_rate: to_f64("per_km_rate", row.per_km_rate)?,
            free_delivery_threshold: to_f64(
                "free_delivery_threshold",
                row.free_delivery_threshold,
            )?,
            max_delivery_distance_km: row.max_delivery_distance_km,
            currency: row.currency,
            currency_symbol: row.currency_symbol,
            operating_hours_start: row.operating_hours_start,
            operating_hours_end: row.operating_hours_end,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, gst_rate, base_delivery_fee, per_km_rate, \
        free_delivery_threshold, max_delivery_distance_km, currency, currency_symbol, \
        operating_hours_start, operating_hours_end, created_at, updated_at \
     FROM pricing_config";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the stored pricing config, or `None` if it has never been created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidValue`]
/// if a stored number cannot be converted.
pub async fn get_pricing_config(pool: &PgPool) -> Result<Option<PricingConfig>, DbError> {
    let row = sqlx::query_as::<_, PricingConfigRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
        .bind(PRICING_CONFIG_ID)
        .fetch_optional(pool)
        .await?;

    row.map(PricingConfig::try_from).transpose()
}

/// Insert `defaults` as the pricing config unless one already exists.
///
/// Returns `true` if this call created the row. Concurrent callers race on
/// the primary key; the loser gets `false`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_default_pricing_config(
    pool: &PgPool,
    defaults: &PricingConfig,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO pricing_config \
             (id, gst_rate, base_delivery_fee, per_km_rate, free_delivery_threshold, \
              max_delivery_distance_km, currency, currency_symbol, \
              operating_hours_start, operating_hours_end) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(PRICING_CONFIG_ID)
    .bind(to_decimal("gst_rate", defaults.gst_rate)?)
    .bind(to_decimal("base_delivery_fee", defaults.base_delivery_fee)?)
    .bind(to_decimal("per_km_rate", defaults.per_km_rate)?)
    .bind(to_decimal("free_delivery_threshold", defaults.free_delivery_threshold)?)
    .bind(defaults.max_delivery_distance_km)
    .bind(&defaults.currency)
    .bind(&defaults.currency_symbol)
    .bind(&defaults.operating_hours_start)
    .bind(&defaults.operating_hours_end)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Write `config` as the pricing config, creating the row if needed.
///
/// Returns the config as stored, so `NUMERIC` scale rounding is visible to
/// the caller.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails or violates a column check.
pub async fn save_pricing_config(
    pool: &PgPool,
    config: &PricingConfig,
) -> Result<PricingConfig, DbError> {
    let row = sqlx::query_as::<_, PricingConfigRow>(
        "INSERT INTO pricing_config \
             (id, gst_rate, base_delivery_fee, per_km_rate, free_delivery_threshold, \
              max_delivery_distance_km, currency, currency_symbol, \
              operating_hours_start, operating_hours_end) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (id) DO UPDATE SET \
             gst_rate = EXCLUDED.gst_rate, \
             base_delivery_fee = EXCLUDED.base_delivery_fee, \
             per_km_rate = EXCLUDED.per_km_rate, \
             free_delivery_threshold = EXCLUDED.free_delivery_threshold, \
             max_delivery_distance_km = EXCLUDED.max_delivery_distance_km, \
             currency = EXCLUDED.currency, \
             currency_symbol = EXCLUDED.currency_symbol, \
             operating_hours_start = EXCLUDED.operating_hours_start, \
             operating_hours_end = EXCLUDED.operating_hours_end, \
             updated_at = NOW() \
         RETURNING id, gst_rate, base_delivery_fee, per_km_rate, free_delivery_threshold, \
                   max_delivery_distance_km, currency, currency_symbol, \
                   operating_hours_start, operating_hours_end, created_at, updated_at",
    )
    .bind(PRICING_CONFIG_ID)
    .bind(to_decimal("gst_rate", config.gst_rate)?)
    .bind(to_decimal("base_delivery_fee", config.base_delivery_fee)?)
    .bind(to_decimal("per_km_rate", config.per_km_rate)?)
    .bind(to_decimal("free_delivery_threshold", config.free_delivery_threshold)?)
    .bind(config.max_delivery_distance_km)
    .bind(&config.currency)
    .bind(&config.currency_symbol)
    .bind(&config.operating_hours_start)
    .bind(&config.operating_hours_end)
    .fetch_one(pool)
    .await?;

    tracing::info!(gst_rate = config.gst_rate, "pricing config saved");
    PricingConfig::try_from(row)
}
