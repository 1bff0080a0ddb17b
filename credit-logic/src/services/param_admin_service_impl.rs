use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use heapless::String as HeaplessString;
use uuid::Uuid;
use validator::Validate;

use credit_api::domain::{
    ActorKind, AuditAction, AuditEntityKind, AuditRecord, CreateParamRequest, ParamCategory,
    RegulationParam,
};
use credit_api::service::{ParamAdminService, PolicyService};
use credit_api::{CreditError, CreditResult};
use credit_db::repository::{AuditLogRepository, RegulationParamRepository};
use credit_db::RepositoryError;

use crate::mappers::{AuditMapper, RegulationMapper};

/// Implementation of the ParamAdminService trait.
///
/// Writes run under the two-person rule, stamp server-side approval times,
/// emit audit records keyed to the affected parameter, and invalidate the
/// policy cache so evaluations see the change on their next resolution.
pub struct ParamAdminServiceImpl<R: RegulationParamRepository, A: AuditLogRepository> {
    params: Arc<R>,
    audit: Arc<A>,
    policy: Arc<dyn PolicyService>,
}

impl<R: RegulationParamRepository, A: AuditLogRepository> ParamAdminServiceImpl<R, A> {
    pub fn new(params: Arc<R>, audit: Arc<A>, policy: Arc<dyn PolicyService>) -> Self {
        Self {
            params,
            audit,
            policy,
        }
    }

    async fn emit_audit(
        &self,
        param: &RegulationParam,
        action: AuditAction,
        actor: &str,
        changes: serde_json::Value,
    ) {
        let record = AuditRecord {
            id: Uuid::new_v4(),
            entity_kind: AuditEntityKind::RegulationParam,
            entity_id: Some(param.id),
            action,
            actor: HeaplessString::try_from(actor).unwrap_or_default(),
            actor_kind: ActorKind::User,
            changes: Some(changes),
            regulation_ref: HeaplessString::try_from(param.param_key.as_str()).ok(),
            timestamp: Utc::now(),
        };
        if let Err(err) = self.audit.create(&AuditMapper::to_model(&record)).await {
            tracing::error!(%err, param_key = param.param_key.as_str(), "audit write failed");
        }
    }
}

#[async_trait]
impl<R: RegulationParamRepository, A: AuditLogRepository> ParamAdminService
    for ParamAdminServiceImpl<R, A>
{
    async fn list_params(
        &self,
        category: Option<ParamCategory>,
        is_active: Option<bool>,
    ) -> CreditResult<Vec<RegulationParam>> {
        let models = self
            .params
            .list(category.map(|c| c.code()), is_active)
            .await
            .map_err(CreditError::from)?;
        models.iter().map(RegulationMapper::from_model).collect()
    }

    async fn create_param(&self, request: CreateParamRequest) -> CreditResult<RegulationParam> {
        request
            .validate()
            .map_err(|e| CreditError::ValidationError {
                field: "create_param".to_string(),
                message: e.to_string(),
            })?;
        if request.approved_by == request.created_by {
            return Err(CreditError::TwoPersonRuleViolation {
                actor: request.created_by,
            });
        }
        if let Some(to) = request.effective_to {
            if to < request.effective_from {
                return Err(CreditError::ValidationError {
                    field: "effective_to".to_string(),
                    message: "must not precede effective_from".to_string(),
                });
            }
        }

        let now = Utc::now();
        let param = RegulationParam {
            id: Uuid::new_v4(),
            param_key: HeaplessString::try_from(request.param_key.as_str()).map_err(|_| {
                CreditError::ValidationError {
                    field: "param_key".to_string(),
                    message: "key exceeds 100 chars".to_string(),
                }
            })?,
            category: request.category,
            phase_label: request
                .phase_label
                .as_deref()
                .and_then(|p| HeaplessString::try_from(p).ok()),
            value: request.value,
            condition: request.condition,
            effective_from: request.effective_from,
            effective_to: request.effective_to,
            is_active: true,
            legal_basis: request.legal_basis,
            description: Some(request.description),
            created_by: HeaplessString::try_from(request.created_by.as_str())
                .unwrap_or_default(),
            approved_by: HeaplessString::try_from(request.approved_by.as_str())
                .unwrap_or_default(),
            // approval time is server-assigned, never caller-supplied
            approved_at: Some(now),
            change_reason: Some(request.change_reason),
            created_at: now,
            updated_at: now,
        };

        self.params
            .insert(&RegulationMapper::to_model(&param))
            .await
            .map_err(CreditError::from)?;

        self.emit_audit(
            &param,
            AuditAction::ParamCreated,
            param.created_by.as_str(),
            serde_json::json!({
                "param_key": param.param_key.as_str(),
                "effective_from": param.effective_from,
                "approved_by": param.approved_by.as_str(),
            }),
        )
        .await;
        self.policy.invalidate(Some(param.param_key.as_str())).await;

        tracing::info!(param_key = param.param_key.as_str(), "regulation parameter created");
        Ok(param)
    }

    async fn deactivate_param(
        &self,
        param_id: Uuid,
        reason: &str,
        actor: &str,
    ) -> CreditResult<RegulationParam> {
        if reason.trim().is_empty() {
            return Err(CreditError::ValidationError {
                field: "reason".to_string(),
                message: "deactivation requires a non-empty reason".to_string(),
            });
        }

        let model = self
            .params
            .find_by_id(param_id)
            .await
            .map_err(CreditError::from)?
            .ok_or_else(|| CreditError::ParamNotFound(param_id.to_string()))?;
        let mut param = RegulationMapper::from_model(&model)?;

        // history is preserved: the row stays, stamped closed
        let now = Utc::now();
        param.is_active = false;
        param.effective_to = Some(now);
        param.change_reason = Some(reason.to_string());
        param.updated_at = now;

        self.params
            .update(&RegulationMapper::to_model(&param))
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound(_) => CreditError::ParamNotFound(param_id.to_string()),
                other => other.into(),
            })?;

        self.emit_audit(
            &param,
            AuditAction::ParamDeactivated,
            actor,
            serde_json::json!({ "reason": reason }),
        )
        .await;
        self.policy.invalidate(Some(param.param_key.as_str())).await;

        tracing::info!(param_key = param.param_key.as_str(), "regulation parameter deactivated");
        Ok(param)
    }
}
