use heapless::String as HeaplessString;

use credit_api::domain::{ActorKind, AuditAction, AuditEntityKind, AuditRecord};
use credit_api::CreditResult;
use credit_db::models::AuditLogModel;

use super::parse_enum;

pub struct AuditMapper;

impl AuditMapper {
    pub fn to_model(record: &AuditRecord) -> AuditLogModel {
        AuditLogModel {
            id: record.id,
            entity_kind: record.entity_kind.code().to_string(),
            entity_id: record.entity_id,
            action: record.action.code().to_string(),
            actor: record.actor.to_string(),
            actor_kind: record.actor_kind.code().to_string(),
            changes: record.changes.clone(),
            regulation_ref: record.regulation_ref.as_ref().map(|r| r.to_string()),
            timestamp: record.timestamp,
        }
    }

    pub fn from_model(model: &AuditLogModel) -> CreditResult<AuditRecord> {
        Ok(AuditRecord {
            id: model.id,
            entity_kind: parse_enum(&model.entity_kind, "entity_kind", AuditEntityKind::parse)?,
            entity_id: model.entity_id,
            action: parse_enum(&model.action, "action", AuditAction::parse)?,
            actor: HeaplessString::try_from(model.actor.as_str()).unwrap_or_default(),
            actor_kind: parse_enum(&model.actor_kind, "actor_kind", ActorKind::parse)?,
            changes: model.changes.clone(),
            regulation_ref: model
                .regulation_ref
                .as_deref()
                .and_then(|r| HeaplessString::try_from(r).ok()),
            timestamp: model.timestamp,
        })
    }
}
