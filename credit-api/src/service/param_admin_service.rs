use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    CreditResult,
    domain::{CreateParamRequest, ParamCategory, RegulationParam},
};

/// Regulation Parameter Administration
///
/// Every write goes through the two-person rule (approver must differ from
/// creator) and emits an audit record carrying the affected key. Rows are
/// never mutated: deactivation stamps `effective_to` and clears
/// `is_active`, preserving history.
#[async_trait]
pub trait ParamAdminService: Send + Sync {
    async fn list_params(
        &self,
        category: Option<ParamCategory>,
        is_active: Option<bool>,
    ) -> CreditResult<Vec<RegulationParam>>;

    /// Insert a new effective row. Rejects duplicate
    /// `(param_key, effective_from)` pairs with `Conflict` and
    /// approver == creator with `TwoPersonRuleViolation`.
    async fn create_param(&self, request: CreateParamRequest) -> CreditResult<RegulationParam>;

    /// Deactivate a row: `is_active = false`, `effective_to = now`
    async fn deactivate_param(
        &self,
        param_id: Uuid,
        reason: &str,
        actor: &str,
    ) -> CreditResult<RegulationParam>;
}
