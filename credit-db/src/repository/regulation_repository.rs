use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::RegulationParamModel;

#[async_trait]
pub trait RegulationParamRepository: Send + Sync {
    /// Insert one row. Duplicate `(param_key, effective_from)` is a
    /// `Conflict` so history stays unambiguous.
    async fn insert(
        &self,
        param: &RegulationParamModel,
    ) -> Result<RegulationParamModel, RepositoryError>;

    async fn find_by_id(&self, id: Uuid)
        -> Result<Option<RegulationParamModel>, RepositoryError>;

    /// Active rows for the key whose effective window contains the instant
    /// (both ends inclusive), ordered by `effective_from` descending. The
    /// caller applies condition matching on top.
    async fn find_candidates(
        &self,
        param_key: &str,
        effective_at: DateTime<Utc>,
    ) -> Result<Vec<RegulationParamModel>, RepositoryError>;

    async fn list(
        &self,
        category: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Vec<RegulationParamModel>, RepositoryError>;

    /// Row-level update used only for deactivation stamps; values are never
    /// rewritten
    async fn update(
        &self,
        param: &RegulationParamModel,
    ) -> Result<RegulationParamModel, RepositoryError>;
}
