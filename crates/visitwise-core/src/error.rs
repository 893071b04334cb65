//! Error types

use chrono::NaiveDate;
use thiserror::Error;

use crate::validation::ValidationResult;

/// Errors surfaced by the core crate.
///
/// Allocation and aggregation never fail; everything here comes from
/// validation, lookups, parsing or persistence around them.
#[derive(Debug, Error)]
pub enum VisitwiseError {
    /// Form input rejected, one entry per offending field
    #[error("Validation failed: {0}")]
    Validation(ValidationResult),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Patient {patient_id} already has a visit on {date}")]
    DuplicateVisit { patient_id: String, date: NaiveDate },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Unknown payment method '{0}'")]
    InvalidPaymentMethod(String),

    /// A storage/backend round-trip failed
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisitwiseError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        VisitwiseError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether a manual retry could succeed (backend failures only)
    pub fn is_retryable(&self) -> bool {
        matches!(self, VisitwiseError::Backend(_) | VisitwiseError::Io(_))
    }
}
