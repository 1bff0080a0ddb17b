use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{CreditScoreModel, VintageRow};

#[async_trait]
pub trait CreditScoreRepository: Send + Sync {
    /// Write-once insert. Duplicate `(application_id, scored_at)` is a
    /// `Conflict`; the first committed result wins.
    async fn create(&self, score: &CreditScoreModel)
        -> Result<CreditScoreModel, RepositoryError>;

    /// Latest result for an application by `scored_at`
    async fn find_latest_by_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<CreditScoreModel>, RepositoryError>;

    /// Rows scored inside [from, to), optionally filtered by model version
    async fn list_scored_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        model_version: Option<&str>,
    ) -> Result<Vec<CreditScoreModel>, RepositoryError>;

    /// Rows with a realised outcome scored on or after `from`
    async fn list_outcomes_since(
        &self,
        from: DateTime<Utc>,
        model_version: Option<&str>,
    ) -> Result<Vec<CreditScoreModel>, RepositoryError>;

    /// Attach the realised default flag once loan performance is observed
    async fn record_outcome(
        &self,
        score_id: Uuid,
        actual_default: bool,
        observed_at: DateTime<Utc>,
    ) -> Result<CreditScoreModel, RepositoryError>;

    /// Vintage input rows: cohort month, seasoning at `as_of`, outcome
    async fn vintage_rows(&self, as_of: DateTime<Utc>) -> Result<Vec<VintageRow>, RepositoryError>;
}
