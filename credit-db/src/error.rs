use thiserror::Error;

/// Storage-layer error shared by every repository implementation, whether
/// backed by SQL or process memory.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation on {constraint}: {details}")]
    Conflict { constraint: String, details: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row".to_string()),
            sqlx::Error::Database(ref db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    RepositoryError::Conflict {
                        constraint: constraint.to_string(),
                        details: db_err.message().to_string(),
                    }
                } else {
                    RepositoryError::Storage(db_err.message().to_string())
                }
            }
            _ => RepositoryError::Storage(err.to_string()),
        }
    }
}

/// Context-free conversion for plumbing errors. Repository `NotFound` only
/// degrades to `Internal` here; services that hold the entity id translate
/// it into the typed `*NotFound` variant at the call site instead of going
/// through this impl.
impl From<RepositoryError> for credit_api::CreditError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => {
                credit_api::CreditError::Internal(format!("missing row: {what}"))
            }
            RepositoryError::Conflict { constraint, details } => credit_api::CreditError::Conflict {
                resource: constraint,
                details,
            },
            RepositoryError::Storage(details) => credit_api::CreditError::Internal(details),
        }
    }
}
