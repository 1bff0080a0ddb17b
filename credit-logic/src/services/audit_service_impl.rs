use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use credit_api::domain::{AuditEntityKind, AuditRecord};
use credit_api::service::AuditService;
use credit_api::{CreditError, CreditResult};
use credit_db::repository::AuditLogRepository;

use crate::mappers::AuditMapper;

/// Append-only audit trail over the audit repository
pub struct AuditServiceImpl<A: AuditLogRepository> {
    repository: Arc<A>,
}

impl<A: AuditLogRepository> AuditServiceImpl<A> {
    pub fn new(repository: Arc<A>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<A: AuditLogRepository> AuditService for AuditServiceImpl<A> {
    async fn record(&self, entry: AuditRecord) -> CreditResult<AuditRecord> {
        self.repository
            .create(&AuditMapper::to_model(&entry))
            .await
            .map_err(CreditError::from)?;
        Ok(entry)
    }

    async fn find_by_entity(
        &self,
        entity_kind: AuditEntityKind,
        entity_id: Uuid,
    ) -> CreditResult<Vec<AuditRecord>> {
        let models = self
            .repository
            .find_by_entity(entity_kind.code(), entity_id)
            .await
            .map_err(CreditError::from)?;
        models.iter().map(AuditMapper::from_model).collect()
    }
}
