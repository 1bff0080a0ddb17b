use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use credit_db::models::{EqGradeMasterModel, IrgMasterModel};
use credit_db::repository::{EqGradeMasterRepository, IrgMasterRepository};
use credit_db::RepositoryError;

use super::{poisoned_read, poisoned_write};

#[derive(Default)]
pub struct InMemoryEqGradeMasterRepository {
    by_id: RwLock<HashMap<uuid::Uuid, EqGradeMasterModel>>,
}

impl InMemoryEqGradeMasterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EqGradeMasterRepository for InMemoryEqGradeMasterRepository {
    async fn find_by_registration_token(
        &self,
        token: &str,
    ) -> Result<Option<EqGradeMasterModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store
            .values()
            .find(|e| {
                e.is_active
                    && e.employer_registration_token
                        .as_deref()
                        .map(|t| t == token)
                        .unwrap_or(false)
            })
            .cloned())
    }

    async fn find_by_mou_code(
        &self,
        mou_code: &str,
    ) -> Result<Option<EqGradeMasterModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store
            .values()
            .find(|e| e.is_active && e.mou_code.as_deref().map(|c| c == mou_code).unwrap_or(false))
            .cloned())
    }

    async fn upsert(
        &self,
        entry: &EqGradeMasterModel,
    ) -> Result<EqGradeMasterModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        store.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }
}

#[derive(Default)]
pub struct InMemoryIrgMasterRepository {
    by_id: RwLock<HashMap<uuid::Uuid, IrgMasterModel>>,
}

impl InMemoryIrgMasterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IrgMasterRepository for InMemoryIrgMasterRepository {
    async fn find_by_ksic(
        &self,
        ksic_code: &str,
    ) -> Result<Option<IrgMasterModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store
            .values()
            .find(|e| e.is_active && e.ksic_code == ksic_code)
            .cloned())
    }

    async fn upsert(&self, entry: &IrgMasterModel) -> Result<IrgMasterModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if let Some(existing) = store
            .values()
            .find(|e| e.ksic_code == entry.ksic_code && e.id != entry.id)
        {
            return Err(RepositoryError::Conflict {
                constraint: "uq_irg_ksic_code".to_string(),
                details: existing.ksic_code.clone(),
            });
        }
        store.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }
}
