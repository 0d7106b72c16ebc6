use thiserror::Error;

/// Error type returned by the backing config and zone stores.
pub type StoreError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error(
        "delivery distance ({distance_km} km) exceeds maximum allowed distance ({max_distance_km} km)"
    )]
    DistanceExceeded {
        distance_km: f64,
        max_distance_km: f64,
    },

    #[error("pricing config unavailable: {0}")]
    ConfigUnavailable(#[source] StoreError),

    #[error("zone rules unavailable: {0}")]
    ZonesUnavailable(#[source] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PricingError {
    /// `true` when the same request can never succeed, so retrying is pointless.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            PricingError::DistanceExceeded { .. } | PricingError::InvalidInput(_)
        )
    }
}
