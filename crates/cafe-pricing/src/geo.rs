//! Great-circle distance on a spherical Earth.

use crate::engine::round2;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two decimal-degree coordinates,
/// rounded to two decimals.
///
/// Inputs are not range-checked; callers validate coordinates at the boundary.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    round2(EARTH_RADIUS_KM * c)
}

/// `true` when the point lies inside or exactly on the circle.
#[must_use]
pub fn is_within_radius(
    point_lat: f64,
    point_lng: f64,
    center_lat: f64,
    center_lng: f64,
    radius_km: f64,
) -> bool {
    distance_km(point_lat, point_lng, center_lat, center_lng) <= radius_km
}
