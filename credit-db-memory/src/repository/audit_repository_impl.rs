use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use credit_db::models::AuditLogModel;
use credit_db::repository::AuditLogRepository;
use credit_db::RepositoryError;

use super::{poisoned_read, poisoned_write};

/// Append-only in-memory audit log
#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    entries: RwLock<Vec<AuditLogModel>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn create(&self, entry: &AuditLogModel) -> Result<AuditLogModel, RepositoryError> {
        let mut entries = self.entries.write().map_err(poisoned_write)?;
        entries.push(entry.clone());
        Ok(entry.clone())
    }

    async fn find_by_entity(
        &self,
        entity_kind: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogModel>, RepositoryError> {
        let entries = self.entries.read().map_err(poisoned_read)?;
        Ok(entries
            .iter()
            .filter(|e| e.entity_kind == entity_kind && e.entity_id == Some(entity_id))
            .cloned()
            .collect())
    }
}
