use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::ApplicantModel;

#[async_trait]
pub trait ApplicantRepository: Send + Sync {
    /// Insert a new applicant; `identity_token` is unique
    async fn create(&self, applicant: &ApplicantModel) -> Result<ApplicantModel, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApplicantModel>, RepositoryError>;

    /// Lookup by the keyed registration hash (duplicate detection,
    /// repeat-applicant recognition)
    async fn find_by_identity_token(
        &self,
        identity_token: &str,
    ) -> Result<Option<ApplicantModel>, RepositoryError>;

    async fn update(&self, applicant: &ApplicantModel) -> Result<ApplicantModel, RepositoryError>;
}
