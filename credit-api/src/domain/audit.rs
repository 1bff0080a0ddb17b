use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit entry. Retention is five years minimum; records are
/// never updated or deleted inside that window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub entity_kind: AuditEntityKind,
    pub entity_id: Option<Uuid>,
    pub action: AuditAction,
    /// Already-authorised actor identity supplied by the transport layer
    pub actor: HeaplessString<100>,
    pub actor_kind: ActorKind,
    /// Before/after payload
    pub changes: Option<serde_json::Value>,
    /// Affected regulation key or statute reference
    pub regulation_ref: Option<HeaplessString<100>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditEntityKind {
    Applicant,
    Application,
    CreditScore,
    RegulationParam,
    ModelVersion,
}

impl AuditEntityKind {
    pub fn code(&self) -> &'static str {
        match self {
            AuditEntityKind::Applicant => "applicant",
            AuditEntityKind::Application => "application",
            AuditEntityKind::CreditScore => "credit_score",
            AuditEntityKind::RegulationParam => "regulation_param",
            AuditEntityKind::ModelVersion => "model_version",
        }
    }

    pub fn parse(code: &str) -> Option<AuditEntityKind> {
        match code {
            "applicant" => Some(AuditEntityKind::Applicant),
            "application" => Some(AuditEntityKind::Application),
            "credit_score" => Some(AuditEntityKind::CreditScore),
            "regulation_param" => Some(AuditEntityKind::RegulationParam),
            "model_version" => Some(AuditEntityKind::ModelVersion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditAction {
    ScoreCreated,
    ApplicationApproved,
    ApplicationRejected,
    ApplicationSuspended,
    ParamCreated,
    ParamDeactivated,
    ModelReloaded,
    DataAccessed,
}

impl AuditAction {
    pub fn code(&self) -> &'static str {
        match self {
            AuditAction::ScoreCreated => "score_created",
            AuditAction::ApplicationApproved => "application_approved",
            AuditAction::ApplicationRejected => "application_rejected",
            AuditAction::ApplicationSuspended => "application_suspended",
            AuditAction::ParamCreated => "param_created",
            AuditAction::ParamDeactivated => "param_deactivated",
            AuditAction::ModelReloaded => "model_reloaded",
            AuditAction::DataAccessed => "data_accessed",
        }
    }

    pub fn parse(code: &str) -> Option<AuditAction> {
        match code {
            "score_created" => Some(AuditAction::ScoreCreated),
            "application_approved" => Some(AuditAction::ApplicationApproved),
            "application_rejected" => Some(AuditAction::ApplicationRejected),
            "application_suspended" => Some(AuditAction::ApplicationSuspended),
            "param_created" => Some(AuditAction::ParamCreated),
            "param_deactivated" => Some(AuditAction::ParamDeactivated),
            "model_reloaded" => Some(AuditAction::ModelReloaded),
            "data_accessed" => Some(AuditAction::DataAccessed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActorKind {
    User,
    Api,
    System,
    Batch,
}

impl ActorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ActorKind::User => "user",
            ActorKind::Api => "api",
            ActorKind::System => "system",
            ActorKind::Batch => "batch",
        }
    }

    pub fn parse(code: &str) -> Option<ActorKind> {
        match code {
            "user" => Some(ActorKind::User),
            "api" => Some(ActorKind::Api),
            "system" => Some(ActorKind::System),
            "batch" => Some(ActorKind::Batch),
            _ => None,
        }
    }
}

/// Audit retention floor mandated by the credit-information statute
pub const AUDIT_RETENTION_YEARS: u32 = 5;
