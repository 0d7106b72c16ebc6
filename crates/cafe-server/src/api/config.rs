//! Admin read/update of the chain-wide pricing config.

use axum::{extract::State, Extension, Json};
use cafe_pricing::{validate_pricing_config, PricingConfig};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, map_pricing_error, ApiError, ApiResponse, AppState};

/// Sparse update: absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct UpdateConfigRequest {
    pub gst_rate: Option<f64>,
    pub base_delivery_fee: Option<f64>,
    pub per_km_rate: Option<f64>,
    pub free_delivery_threshold: Option<f64>,
    pub max_delivery_distance_km: Option<f64>,
    pub currency: Option<String>,
    pub currency_symbol: Option<String>,
    pub operating_hours_start: Option<String>,
    pub operating_hours_end: Option<String>,
}

impl UpdateConfigRequest {
    fn apply_to(self, mut config: PricingConfig) -> PricingConfig {
        if let Some(v) = self.gst_rate {
            config.gst_rate = v;
        }
        if let Some(v) = self.base_delivery_fee {
            config.base_delivery_fee = v;
        }
        if let Some(v) = self.per_km_rate {
            config.per_km_rate = v;
        }
        if let Some(v) = self.free_delivery_threshold {
            config.free_delivery_threshold = v;
        }
        if let Some(v) = self.max_delivery_distance_km {
            config.max_delivery_distance_km = v;
        }
        if let Some(v) = self.currency {
            config.currency = v;
        }
        if let Some(v) = self.currency_symbol {
            config.currency_symbol = v;
        }
        if let Some(v) = self.operating_hours_start {
            config.operating_hours_start = v;
        }
        if let Some(v) = self.operating_hours_end {
            config.operating_hours_end = v;
        }
        config
    }
}

/// GET /api/v1/admin/config: current pricing config, created with defaults if absent.
pub(super) async fn get_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PricingConfig>>, ApiError> {
    let config = state
        .engine
        .config_provider()
        .get_config()
        .await
        .map_err(|e| map_pricing_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(config, req_id.0)))
}

/// PUT /api/v1/admin/config: merge the given fields into the stored config.
///
/// The merged result is validated as a whole before it is written. This
/// process's cached copy is dropped on success; other processes pick the
/// change up when their cache expires.
pub(super) async fn update_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UpdateConfigRequest>,
) -> Result<Json<ApiResponse<PricingConfig>>, ApiError> {
    let rid = &req_id.0;

    let current = cafe_db::get_pricing_config(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .unwrap_or_default();

    let merged = body.apply_to(current);
    validate_pricing_config(&merged).map_err(|e| map_pricing_error(rid.clone(), &e))?;

    let saved = cafe_db::save_pricing_config(&state.pool, &merged)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    state.engine.config_provider().invalidate();

    Ok(Json(ApiResponse::new(saved, req_id.0)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::test_support::{app_with_pool, send};
    use super::*;

    #[test]
    fn sparse_update_keeps_unmentioned_fields() {
        let update = UpdateConfigRequest {
            per_km_rate: Some(12.0),
            operating_hours_end: Some("22:00".to_string()),
            ..UpdateConfigRequest::default()
        };

        let merged = update.apply_to(PricingConfig::default());

        assert!((merged.per_km_rate - 12.0).abs() < f64::EPSILON);
        assert_eq!(merged.operating_hours_end, "22:00");
        assert!((merged.gst_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(merged.currency, "INR");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_value::<UpdateConfigRequest>(json!({ "gst": 0.1 }));
        assert!(parsed.is_err());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a live Postgres via DATABASE_URL"]
    async fn update_is_visible_to_the_next_read(pool: sqlx::PgPool) {
        let app = app_with_pool(pool);

        let (status, json) = send(app.clone(), "GET", "/api/v1/admin/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["gst_rate"].as_f64(), Some(0.05));

        let (status, _) = send(
            app.clone(),
            "PUT",
            "/api/v1/admin/config",
            Some(json!({ "gst_rate": 0.12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = send(app, "GET", "/api/v1/admin/config", None).await;
        assert_eq!(json["data"]["gst_rate"].as_f64(), Some(0.12));
        assert_eq!(json["data"]["per_km_rate"].as_f64(), Some(10.0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires a live Postgres via DATABASE_URL"]
    async fn invalid_merged_config_is_rejected(pool: sqlx::PgPool) {
        let (status, json) = send(
            app_with_pool(pool),
            "PUT",
            "/api/v1/admin/config",
            Some(json!({ "operating_hours_start": "nine" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }
}
