use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::AuditLogModel;

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append-only insert; audit rows are never updated or deleted
    async fn create(&self, entry: &AuditLogModel) -> Result<AuditLogModel, RepositoryError>;

    async fn find_by_entity(
        &self,
        entity_kind: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogModel>, RepositoryError>;
}
