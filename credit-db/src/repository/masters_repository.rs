use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::models::{EqGradeMasterModel, IrgMasterModel};

#[async_trait]
pub trait EqGradeMasterRepository: Send + Sync {
    async fn find_by_registration_token(
        &self,
        token: &str,
    ) -> Result<Option<EqGradeMasterModel>, RepositoryError>;

    /// MOU agreement lookup for SEG-MOU-{code} segments
    async fn find_by_mou_code(
        &self,
        mou_code: &str,
    ) -> Result<Option<EqGradeMasterModel>, RepositoryError>;

    async fn upsert(
        &self,
        entry: &EqGradeMasterModel,
    ) -> Result<EqGradeMasterModel, RepositoryError>;
}

#[async_trait]
pub trait IrgMasterRepository: Send + Sync {
    async fn find_by_ksic(&self, ksic_code: &str)
        -> Result<Option<IrgMasterModel>, RepositoryError>;

    async fn upsert(&self, entry: &IrgMasterModel) -> Result<IrgMasterModel, RepositoryError>;
}
