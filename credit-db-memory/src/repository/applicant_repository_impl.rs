use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use credit_db::models::ApplicantModel;
use credit_db::repository::ApplicantRepository;
use credit_db::RepositoryError;

use super::{poisoned_read, poisoned_write};

/// In-memory applicant store with a unique identity-token index
#[derive(Default)]
pub struct InMemoryApplicantRepository {
    by_id: RwLock<HashMap<Uuid, ApplicantModel>>,
}

impl InMemoryApplicantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicantRepository for InMemoryApplicantRepository {
    async fn create(&self, applicant: &ApplicantModel) -> Result<ApplicantModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if store.contains_key(&applicant.id) {
            return Err(RepositoryError::Conflict {
                constraint: "applicants_pkey".to_string(),
                details: applicant.id.to_string(),
            });
        }
        if store
            .values()
            .any(|a| a.identity_token == applicant.identity_token)
        {
            return Err(RepositoryError::Conflict {
                constraint: "uq_applicants_identity_token".to_string(),
                details: "identity token already registered".to_string(),
            });
        }
        store.insert(applicant.id, applicant.clone());
        Ok(applicant.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApplicantModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store.get(&id).cloned())
    }

    async fn find_by_identity_token(
        &self,
        identity_token: &str,
    ) -> Result<Option<ApplicantModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store
            .values()
            .find(|a| a.identity_token == identity_token)
            .cloned())
    }

    async fn update(&self, applicant: &ApplicantModel) -> Result<ApplicantModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if !store.contains_key(&applicant.id) {
            return Err(RepositoryError::NotFound(format!(
                "applicant {}",
                applicant.id
            )));
        }
        store.insert(applicant.id, applicant.clone());
        Ok(applicant.clone())
    }
}
