use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use credit_db::models::RegulationParamModel;
use credit_db::repository::RegulationParamRepository;
use credit_db::RepositoryError;

use super::{poisoned_read, poisoned_write};

/// In-memory parameter store.
///
/// Rejects duplicate `(param_key, effective_from)` pairs so tie-breaking on
/// `effective_from` stays deterministic.
#[derive(Default)]
pub struct InMemoryRegulationParamRepository {
    by_id: RwLock<HashMap<Uuid, RegulationParamModel>>,
}

impl InMemoryRegulationParamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegulationParamRepository for InMemoryRegulationParamRepository {
    async fn insert(
        &self,
        param: &RegulationParamModel,
    ) -> Result<RegulationParamModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if store.contains_key(&param.id) {
            return Err(RepositoryError::Conflict {
                constraint: "regulation_params_pkey".to_string(),
                details: param.id.to_string(),
            });
        }
        if store
            .values()
            .any(|p| p.param_key == param.param_key && p.effective_from == param.effective_from)
        {
            return Err(RepositoryError::Conflict {
                constraint: "uq_param_key_effective_from".to_string(),
                details: format!("{} @ {}", param.param_key, param.effective_from),
            });
        }
        store.insert(param.id, param.clone());
        Ok(param.clone())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<RegulationParamModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store.get(&id).cloned())
    }

    async fn find_candidates(
        &self,
        param_key: &str,
        effective_at: DateTime<Utc>,
    ) -> Result<Vec<RegulationParamModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        let mut rows: Vec<_> = store
            .values()
            .filter(|p| p.param_key == param_key && p.is_active)
            .filter(|p| p.effective_from <= effective_at)
            .filter(|p| p.effective_to.map(|to| to >= effective_at).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));
        Ok(rows)
    }

    async fn list(
        &self,
        category: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Vec<RegulationParamModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        let mut rows: Vec<_> = store
            .values()
            .filter(|p| category.map(|c| p.category == c).unwrap_or(true))
            .filter(|p| is_active.map(|a| p.is_active == a).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.param_key
                .cmp(&b.param_key)
                .then(a.effective_from.cmp(&b.effective_from))
        });
        Ok(rows)
    }

    async fn update(
        &self,
        param: &RegulationParamModel,
    ) -> Result<RegulationParamModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if !store.contains_key(&param.id) {
            return Err(RepositoryError::NotFound(format!("param {}", param.id)));
        }
        store.insert(param.id, param.clone());
        Ok(param.clone())
    }
}
