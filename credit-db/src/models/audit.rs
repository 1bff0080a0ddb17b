use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database model for the append-only audit_logs table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLogModel {
    pub id: Uuid,
    /// applicant | application | credit_score | regulation_param | model_version
    pub entity_kind: String,
    pub entity_id: Option<Uuid>,
    /// score_created | application_approved | application_rejected | ...
    pub action: String,
    pub actor: String,
    /// user | api | system | batch
    pub actor_kind: String,
    pub changes: Option<serde_json::Value>,
    pub regulation_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
}
