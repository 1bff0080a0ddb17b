use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    CreditResult,
    domain::{AuditEntityKind, AuditRecord},
};

/// Append-only audit trail (5-year retention)
#[async_trait]
pub trait AuditService: Send + Sync {
    async fn record(&self, entry: AuditRecord) -> CreditResult<AuditRecord>;

    async fn find_by_entity(
        &self,
        entity_kind: AuditEntityKind,
        entity_id: Uuid,
    ) -> CreditResult<Vec<AuditRecord>>;
}
