//! Database operations for the `zone_pricing_rules` table.

use cafe_core::{ModifierType, ZoneRule, ZoneSeed};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::numeric::{to_decimal, to_f64};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `zone_pricing_rules` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ZoneRow {
    pub zone_id: String,
    pub name: String,
    pub description: Option<String>,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_km: f64,
    pub modifier_type: String,
    pub value: Decimal,
    pub active: bool,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ZoneRow> for ZoneRule {
    type Error = DbError;

    fn try_from(row: ZoneRow) -> Result<Self, Self::Error> {
        let modifier_type = row
            .modifier_type
            .parse::<ModifierType>()
            .map_err(|reason| DbError::InvalidValue {
                field: "modifier_type",
                reason,
            })?;

        Ok(ZoneRule {
            zone_id: row.zone_id,
            name: row.name,
            description: row.description,
            center_lat: row.center_lat,
            center_lng: row.center_lng,
            radius_km: row.radius_km,
            modifier_type,
            value: to_f64("value", row.value)?,
            active: row.active,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "zone_id, name, description, center_lat, center_lng, radius_km, \
                       modifier_type, value, active, priority, created_at, updated_at";

// Precedence order; the matcher re-sorts, but listings should agree with it.
const PRECEDENCE_ORDER: &str = "ORDER BY priority DESC, created_at DESC, zone_id ASC";

fn into_rules(rows: Vec<ZoneRow>) -> Result<Vec<ZoneRule>, DbError> {
    rows.into_iter().map(ZoneRule::try_from).collect()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every active zone in precedence order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_zones(pool: &PgPool) -> Result<Vec<ZoneRule>, DbError> {
    let rows = sqlx::query_as::<_, ZoneRow>(&format!(
        "SELECT {COLUMNS} FROM zone_pricing_rules WHERE active = true {PRECEDENCE_ORDER}"
    ))
    .fetch_all(pool)
    .await?;

    into_rules(rows)
}

/// Returns one page of zones, optionally filtered by `active`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_zones(
    pool: &PgPool,
    active: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ZoneRule>, DbError> {
    let rows = sqlx::query_as::<_, ZoneRow>(&format!(
        "SELECT {COLUMNS} FROM zone_pricing_rules \
         WHERE ($1::BOOLEAN IS NULL OR active = $1) \
         {PRECEDENCE_ORDER} \
         LIMIT $2 OFFSET $3"
    ))
    .bind(active)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    into_rules(rows)
}

/// Counts zones matching the same filter as [`list_zones`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_zones(pool: &PgPool, active: Option<bool>) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM zone_pricing_rules WHERE ($1::BOOLEAN IS NULL OR active = $1)",
    )
    .bind(active)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Returns a zone by its `zone_id`, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_zone(pool: &PgPool, zone_id: &str) -> Result<Option<ZoneRule>, DbError> {
    let row = sqlx::query_as::<_, ZoneRow>(&format!(
        "SELECT {COLUMNS} FROM zone_pricing_rules WHERE zone_id = $1"
    ))
    .bind(zone_id)
    .fetch_optional(pool)
    .await?;

    row.map(ZoneRule::try_from).transpose()
}

/// Insert a new zone and return it as stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate `zone_id`
/// reports [`DbError::is_unique_violation`].
pub async fn create_zone(pool: &PgPool, zone: &ZoneSeed) -> Result<ZoneRule, DbError> {
    let row = sqlx::query_as::<_, ZoneRow>(&format!(
        "INSERT INTO zone_pricing_rules \
             (zone_id, name, description, center_lat, center_lng, radius_km, \
              modifier_type, value, active, priority) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {COLUMNS}"
    ))
    .bind(&zone.zone_id)
    .bind(&zone.name)
    .bind(&zone.description)
    .bind(zone.center_lat)
    .bind(zone.center_lng)
    .bind(zone.radius_km)
    .bind(zone.modifier_type.to_string())
    .bind(to_decimal("value", zone.value)?)
    .bind(zone.active)
    .bind(zone.priority)
    .fetch_one(pool)
    .await?;

    ZoneRule::try_from(row)
}

/// Overwrite every mutable column of an existing zone.
///
/// `zone.zone_id` selects the row; it is never changed. Returns `None` if
/// no zone has that id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn replace_zone(pool: &PgPool, zone: &ZoneSeed) -> Result<Option<ZoneRule>, DbError> {
    let row = sqlx::query_as::<_, ZoneRow>(&format!(
        "UPDATE zone_pricing_rules SET \
             name = $2, description = $3, center_lat = $4, center_lng = $5, \
             radius_km = $6, modifier_type = $7, value = $8, active = $9, \
             priority = $10, updated_at = NOW() \
         WHERE zone_id = $1 \
         RETURNING {COLUMNS}"
    ))
    .bind(&zone.zone_id)
    .bind(&zone.name)
    .bind(&zone.description)
    .bind(zone.center_lat)
    .bind(zone.center_lng)
    .bind(zone.radius_km)
    .bind(zone.modifier_type.to_string())
    .bind(to_decimal("value", zone.value)?)
    .bind(zone.active)
    .bind(zone.priority)
    .fetch_optional(pool)
    .await?;

    row.map(ZoneRule::try_from).transpose()
}

/// Delete a zone. Returns `false` if it did not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_zone(pool: &PgPool, zone_id: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM zone_pricing_rules WHERE zone_id = $1")
        .bind(zone_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Flip a zone's `active` flag and return the updated zone.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn toggle_zone(pool: &PgPool, zone_id: &str) -> Result<Option<ZoneRule>, DbError> {
    let row = sqlx::query_as::<_, ZoneRow>(&format!(
        "UPDATE zone_pricing_rules \
         SET active = NOT active, updated_at = NOW() \
         WHERE zone_id = $1 \
         RETURNING {COLUMNS}"
    ))
    .bind(zone_id)
    .fetch_optional(pool)
    .await?;

    row.map(ZoneRule::try_from).transpose()
}

/// Upsert zones from the seed file, keyed by `zone_id`.
///
/// Returns the number of zones processed. All upserts run inside a single
/// transaction; if any fails the whole batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn upsert_zones(pool: &PgPool, zones: &[ZoneSeed]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for zone in zones {
        sqlx::query(
            "INSERT INTO zone_pricing_rules \
                 (zone_id, name, description, center_lat, center_lng, radius_km, \
                  modifier_type, value, active, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (zone_id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 description = EXCLUDED.description, \
                 center_lat = EXCLUDED.center_lat, \
                 center_lng = EXCLUDED.center_lng, \
                 radius_km = EXCLUDED.radius_km, \
                 modifier_type = EXCLUDED.modifier_type, \
                 value = EXCLUDED.value, \
                 active = EXCLUDED.active, \
                 priority = EXCLUDED.priority, \
                 updated_at = NOW()",
        )
        .bind(&zone.zone_id)
        .bind(&zone.name)
        .bind(&zone.description)
        .bind(zone.center_lat)
        .bind(zone.center_lng)
        .bind(zone.radius_km)
        .bind(zone.modifier_type.to_string())
        .bind(to_decimal("value", zone.value)?)
        .bind(zone.active)
        .bind(zone.priority)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::info!(count, "zones upserted");
    Ok(count)
}
