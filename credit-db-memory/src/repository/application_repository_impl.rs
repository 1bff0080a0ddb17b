use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use credit_db::models::LoanApplicationModel;
use credit_db::repository::LoanApplicationRepository;
use credit_db::RepositoryError;

use super::{poisoned_read, poisoned_write};

#[derive(Default)]
pub struct InMemoryLoanApplicationRepository {
    by_id: RwLock<HashMap<Uuid, LoanApplicationModel>>,
}

impl InMemoryLoanApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanApplicationRepository for InMemoryLoanApplicationRepository {
    async fn create(
        &self,
        application: &LoanApplicationModel,
    ) -> Result<LoanApplicationModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if store.contains_key(&application.id) {
            return Err(RepositoryError::Conflict {
                constraint: "loan_applications_pkey".to_string(),
                details: application.id.to_string(),
            });
        }
        store.insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<LoanApplicationModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store.get(&id).cloned())
    }

    async fn find_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<LoanApplicationModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        let mut rows: Vec<_> = store
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }

    async fn update(
        &self,
        application: &LoanApplicationModel,
    ) -> Result<LoanApplicationModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if !store.contains_key(&application.id) {
            return Err(RepositoryError::NotFound(format!(
                "application {}",
                application.id
            )));
        }
        store.insert(application.id, application.clone());
        Ok(application.clone())
    }
}
