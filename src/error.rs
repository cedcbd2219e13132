//! Error types for Growth Insights

use thiserror::Error;

/// Errors that can occur while computing insights
#[derive(Debug, Error)]
pub enum InsightsError {
    /// A metric was scored with an unusable value, or the reference curve
    /// produced an unusable median for it.
    #[error("Invalid metric input: {0}")]
    InvalidMetricInput(String),

    #[error("Invalid reference curve: {0}")]
    InvalidReferenceCurve(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse rows: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),
}
