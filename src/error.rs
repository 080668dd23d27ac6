//! Configuration errors.
//!
//! The simulation itself never fails at runtime; missing contacts simply mean
//! "airborne". Misconfiguration, however, is a fatal precondition and is
//! reported when a controller is first initialised.

use thiserror::Error;

/// Reasons a controller cannot be simulated.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The entity has a controller but no stats component.
    #[error("controller has no stats assigned; insert a `ControllerStats` component")]
    MissingStats,

    /// A rate or distance field is negative.
    #[error("`{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    /// A field is NaN or infinite.
    #[error("`{field}` must be finite (got {value})")]
    NonFinite { field: &'static str, value: f32 },

    /// The grounding force pushes upward.
    #[error("`grounding_force` must be zero or negative (got {0})")]
    PositiveGroundingForce(f32),

    /// A stats file could not be parsed.
    #[error("failed to parse stats: {0}")]
    Parse(#[from] serde_json::Error),
}
