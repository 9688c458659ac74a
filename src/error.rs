//! Error taxonomy for the load planner.
//!
//! Only [`OptimizeError`] aborts a run. Every other error is recovered
//! locally and reported as a diagnostic on the resulting plan.

use serde::Serialize;
use thiserror::Error;

/// A raw order record that cannot be turned into a plannable order.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("field `{0}` must be a finite number")]
    NotFinite(&'static str),
    #[error("malformed delivery window: {0}")]
    MalformedDeliveryWindow(String),
    #[error("field `{field}` is not a timestamp: `{value}`")]
    MalformedTimestamp { field: &'static str, value: String },
    #[error("unknown priority `{0}`")]
    UnknownPriority(String),
    #[error("duplicate order id `{0}`")]
    DuplicateId(String),
}

impl ValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::NonPositive { field, .. } => field,
            ValidationError::NotFinite(field) => field,
            ValidationError::MalformedDeliveryWindow(_) => "delivery_window",
            ValidationError::MalformedTimestamp { field, .. } => field,
            ValidationError::UnknownPriority(_) => "priority",
            ValidationError::DuplicateId(_) => "id",
        }
    }
}

/// Why an order could not be placed on any truck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum UnplannableReason {
    #[error("exceeds max capacity")]
    #[serde(rename = "exceeds max capacity")]
    ExceedsMaxCapacity,
    #[error("no eligible truck type")]
    #[serde(rename = "no eligible truck type")]
    NoEligibleTruckType,
}

impl UnplannableReason {
    /// Stable reason code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            UnplannableReason::ExceedsMaxCapacity => "exceeds max capacity",
            UnplannableReason::NoEligibleTruckType => "no eligible truck type",
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("store rejected `{id}`: {message}")]
    Rejected { id: String, message: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("malformed geocoder response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Infrastructure failures that abort a whole run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[source] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_field() {
        assert_eq!(ValidationError::MissingField("weight_lbs").field(), "weight_lbs");
        assert_eq!(
            ValidationError::NonPositive { field: "volume_cuft", value: 0.0 }.field(),
            "volume_cuft"
        );
        assert_eq!(
            ValidationError::MalformedDeliveryWindow("end before start".into()).field(),
            "delivery_window"
        );
    }

    #[test]
    fn test_unplannable_code_matches_display() {
        for reason in [UnplannableReason::ExceedsMaxCapacity, UnplannableReason::NoEligibleTruckType] {
            assert_eq!(reason.to_string(), reason.code());
        }
    }
}
