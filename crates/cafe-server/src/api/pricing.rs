use axum::{extract::State, Extension, Json};
use cafe_pricing::{validate_order, Location, OrderLineItem, PricingBreakdown};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_pricing_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PricingPreviewRequest {
    pub items: Vec<OrderLineItem>,
    pub outlet_location: Location,
    pub delivery_location: Location,
}

/// POST /api/v1/pricing/preview: price a cart without placing an order.
pub(super) async fn preview_pricing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PricingPreviewRequest>,
) -> Result<Json<ApiResponse<PricingBreakdown>>, ApiError> {
    let rid = &req_id.0;

    validate_order(&body.items, &body.outlet_location, &body.delivery_location)
        .map_err(|e| map_pricing_error(rid.clone(), &e))?;

    let breakdown = state
        .engine
        .calculate_order_pricing(&body.items, body.outlet_location, body.delivery_location)
        .await
        .map_err(|e| map_pricing_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(breakdown, req_id.0)))
}
