//! Field-level validation errors shared by the domain models.

use thiserror::Error;

/// A record failed validation before reaching the database.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Round a currency amount to cents.
pub(crate) fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
