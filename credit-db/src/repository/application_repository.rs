use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::LoanApplicationModel;

#[async_trait]
pub trait LoanApplicationRepository: Send + Sync {
    async fn create(
        &self,
        application: &LoanApplicationModel,
    ) -> Result<LoanApplicationModel, RepositoryError>;

    async fn find_by_id(&self, id: Uuid)
        -> Result<Option<LoanApplicationModel>, RepositoryError>;

    async fn find_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<LoanApplicationModel>, RepositoryError>;

    /// Full-row update (status, step, snapshot); `updated_at` is stamped by
    /// the caller
    async fn update(
        &self,
        application: &LoanApplicationModel,
    ) -> Result<LoanApplicationModel, RepositoryError>;
}
