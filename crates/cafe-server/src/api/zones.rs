//! Admin CRUD for zone pricing rules.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cafe_core::{validate_zone_seed, ModifierType, ZoneRule, ZoneSeed};
use serde::{Deserialize, Deserializer, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, normalize_page, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ZoneListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub active: Option<bool>,
}

// Outer None = "not in request" (keep current), Some(None) = "clear".
#[allow(clippy::option_option)]
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct UpdateZoneRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    pub center_lat: Option<f64>,
    pub center_lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub modifier_type: Option<ModifierType>,
    pub value: Option<f64>,
    pub active: Option<bool>,
    pub priority: Option<i32>,
}

// A bare `Option<Option<T>>` reads an explicit null as "absent".
#[allow(clippy::option_option)]
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateZoneRequest {
    fn apply_to(self, zone: ZoneRule) -> ZoneSeed {
        ZoneSeed {
            zone_id: zone.zone_id,
            name: self.name.unwrap_or(zone.name),
            description: self.description.unwrap_or(zone.description),
            center_lat: self.center_lat.unwrap_or(zone.center_lat),
            center_lng: self.center_lng.unwrap_or(zone.center_lng),
            radius_km: self.radius_km.unwrap_or(zone.radius_km),
            modifier_type: self.modifier_type.unwrap_or(zone.modifier_type),
            value: self.value.unwrap_or(zone.value),
            active: self.active.unwrap_or(zone.active),
            priority: self.priority.unwrap_or(zone.priority),
        }
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl Pagination {
    fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            limit,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ZoneListData {
    pub zones: Vec<ZoneRule>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn trim_seed(mut zone: ZoneSeed) -> ZoneSeed {
    zone.zone_id = zone.zone_id.trim().to_owned();
    zone.name = zone.name.trim().to_owned();
    zone
}

fn validate(req_id: &str, zone: &ZoneSeed) -> Result<(), ApiError> {
    validate_zone_seed(zone).map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))
}

fn zone_not_found(req_id: &str, zone_id: &str) -> ApiError {
    ApiError::new(req_id, "not_found", format!("zone '{zone_id}' not found"))
}

async fn resolve_zone(state: &AppState, zone_id: &str, req_id: &str) -> Result<ZoneRule, ApiError> {
    cafe_db::get_zone(&state.pool, zone_id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .ok_or_else(|| zone_not_found(req_id, zone_id))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/zones: paginated list in precedence order.
pub(super) async fn list_zones(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ZoneListQuery>,
) -> Result<Json<ApiResponse<ZoneListData>>, ApiError> {
    let rid = &req_id.0;
    let page = normalize_page(query.page);
    let limit = normalize_limit(query.limit);
    let offset = (page - 1).saturating_mul(limit);

    let zones = cafe_db::list_zones(&state.pool, query.active, limit, offset)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let total = cafe_db::count_zones(&state.pool, query.active)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        ZoneListData {
            zones,
            pagination: Pagination::new(total, page, limit),
        },
        req_id.0,
    )))
}

/// POST /api/v1/admin/zones: create a zone.
pub(super) async fn create_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ZoneSeed>,
) -> Result<(StatusCode, Json<ApiResponse<ZoneRule>>), ApiError> {
    let rid = &req_id.0;
    let seed = trim_seed(body);
    validate(rid, &seed)?;

    let zone = cafe_db::create_zone(&state.pool, &seed)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(
                    rid,
                    "conflict",
                    format!("a zone with id '{}' already exists", seed.zone_id),
                )
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    tracing::info!(zone_id = %zone.zone_id, "zone created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(zone, req_id.0))))
}

/// GET /api/v1/admin/zones/{zone_id}
pub(super) async fn get_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone_id): Path<String>,
) -> Result<Json<ApiResponse<ZoneRule>>, ApiError> {
    let zone = resolve_zone(&state, &zone_id, &req_id.0).await?;
    Ok(Json(ApiResponse::new(zone, req_id.0)))
}

/// PUT /api/v1/admin/zones/{zone_id}: update the given fields.
pub(super) async fn update_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone_id): Path<String>,
    Json(body): Json<UpdateZoneRequest>,
) -> Result<Json<ApiResponse<ZoneRule>>, ApiError> {
    let rid = &req_id.0;
    let current = resolve_zone(&state, &zone_id, rid).await?;

    let seed = trim_seed(body.apply_to(current));
    validate(rid, &seed)?;

    let zone = cafe_db::replace_zone(&state.pool, &seed)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| zone_not_found(rid, &zone_id))?;

    tracing::info!(zone_id = %zone.zone_id, "zone updated");
    Ok(Json(ApiResponse::new(zone, req_id.0)))
}

/// DELETE /api/v1/admin/zones/{zone_id}
pub(super) async fn delete_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = cafe_db::delete_zone(&state.pool, &zone_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(zone_not_found(rid, &zone_id));
    }

    tracing::info!(zone_id = %zone_id, "zone deleted");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}

/// PATCH /api/v1/admin/zones/{zone_id}/toggle: flip `active`.
pub(super) async fn toggle_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(zone_id): Path<String>,
) -> Result<Json<ApiResponse<ZoneRule>>, ApiError> {
    let rid = &req_id.0;
    let zone = cafe_db::toggle_zone(&state.pool, &zone_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| zone_not_found(rid, &zone_id))?;

    tracing::info!(zone_id = %zone.zone_id, active = zone.active, "zone toggled");
    Ok(Json(ApiResponse::new(zone, req_id.0)))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::super::test_support::{app_with_pool, offline_app, send};
    use super::*;

    fn stored_zone() -> ZoneRule {
        let ts = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        ZoneRule {
            zone_id: "GNT005".to_string(),
            name: "Guntur West".to_string(),
            description: Some("Western areas".to_string()),
            center_lat: 16.3,
            center_lng: 80.42,
            radius_km: 2.0,
            modifier_type: ModifierType::Fixed,
            value: 10.0,
            active: true,
            priority: 9,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(0, 1, 10).pages, 0);
        assert_eq!(Pagination::new(10, 1, 10).pages, 1);
        assert_eq!(Pagination::new(11, 2, 10).pages, 2);
    }

    #[test]
    fn partial_update_keeps_other_fields_and_id() {
        let update: UpdateZoneRequest =
            serde_json::from_value(json!({ "value": 12.5, "description": null })).unwrap();

        let seed = update.apply_to(stored_zone());

        assert_eq!(seed.zone_id, "GNT005");
        assert_eq!(seed.name, "Guntur West");
        assert!((seed.value - 12.5).abs() < f64::EPSILON);
        assert_eq!(seed.description, None);
        assert_eq!(seed.priority, 9);
    }

    #[test]
    fn absent_description_is_left_alone() {
        let update: UpdateZoneRequest = serde_json::from_value(json!({ "priority": 1 })).unwrap();
        let seed = update.apply_to(stored_zone());
        assert_eq!(seed.description.as_deref(), Some("Western areas"));
    }

    #[test]
    fn zone_id_cannot_be_changed_by_update() {
        let parsed = serde_json::from_value::<UpdateZoneRequest>(json!({ "zone_id": "X" }));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn invalid_zone_is_rejected_before_insert() {
        let body = json!({
            "zone_id": "GNT009",
            "name": "Nowhere",
            "center_lat": 16.3,
            "center_lng": 80.4,
            "radius_km": 0,
            "value": 5
        });

        let (status, json) = send(offline_app(), "POST", "/api/v1/admin/zones", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("radius")));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a live Postgres via DATABASE_URL"]
    async fn zone_admin_lifecycle(pool: sqlx::PgPool) {
        let app = app_with_pool(pool);
        let body = json!({
            "zone_id": "GNT002",
            "name": "Guntur North",
            "center_lat": 16.325,
            "center_lng": 80.435,
            "radius_km": 3,
            "modifier_type": "fixed",
            "value": 15,
            "priority": 8
        });

        let (status, _) = send(
            app.clone(),
            "POST",
            "/api/v1/admin/zones",
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = send(app.clone(), "POST", "/api/v1/admin/zones", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "conflict");

        let (status, json) = send(
            app.clone(),
            "PUT",
            "/api/v1/admin/zones/GNT002",
            Some(json!({ "value": 18 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["value"].as_f64(), Some(18.0));

        let (status, json) = send(
            app.clone(),
            "PATCH",
            "/api/v1/admin/zones/GNT002/toggle",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["active"], false);

        let (_, json) = send(app.clone(), "GET", "/api/v1/admin/zones?active=false", None).await;
        assert_eq!(json["data"]["pagination"]["total"], 1);

        let (status, _) = send(app.clone(), "DELETE", "/api/v1/admin/zones/GNT002", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(app, "GET", "/api/v1/admin/zones/GNT002", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }
}
