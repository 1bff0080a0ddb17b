use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type CreditResult<T> = Result<T, CreditError>;

/// Error kinds of the decisioning core.
///
/// `ValidationError` and `Conflict` are caller-visible and never retried.
/// Degraded collaborators (bureau, store, cache) are absorbed into the
/// fallback chain and recorded on the regulation snapshot; only a failure of
/// both primary and fallback surfaces as `DependencyUnavailable`.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum CreditError {
    // Applicant-related errors
    #[error("Applicant not found: {0}")]
    ApplicantNotFound(Uuid),

    #[error("Applicant {applicant_id} has not granted bureau consent")]
    BureauConsentMissing { applicant_id: Uuid },

    // Application-related errors
    #[error("Application not found: {0}")]
    ApplicationNotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Application {application_id} was suspended on {suspended_at}")]
    ApplicationSuspended {
        application_id: Uuid,
        suspended_at: DateTime<Utc>,
    },

    // Parameter store errors
    #[error("Regulation parameter not found: {0}")]
    ParamNotFound(String),

    #[error("Two-person rule violation: approver {actor} equals creator")]
    TwoPersonRuleViolation { actor: String },

    // Validation errors
    #[error("Validation error in {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Invalid enum value: {value} for field {field}")]
    InvalidEnumValue { value: String, field: String },

    // Uniqueness / idempotency
    #[error("Conflict on {resource}: {details}")]
    Conflict { resource: String, details: String },

    // Dependency failures where primary and fallback are both unusable
    #[error("Dependency unavailable: {dependency} ({details})")]
    DependencyUnavailable { dependency: String, details: String },

    // Internal errors: fail closed, never persist partial state
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for CreditError {
    fn from(err: anyhow::Error) -> Self {
        CreditError::Internal(err.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for CreditError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CreditError::Internal("Database row not found".to_string()),
            sqlx::Error::Database(ref db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    CreditError::Conflict {
                        resource: constraint.to_string(),
                        details: db_err.message().to_string(),
                    }
                } else {
                    CreditError::Internal(format!("Database error: {}", db_err.message()))
                }
            }
            _ => CreditError::Internal(format!("Database error: {err}")),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CreditError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CreditError::Internal(err.to_string())
    }
}
