use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database model for the regulation_params table.
///
/// `(param_key, effective_from)` is unique; supersession is a new row, not
/// an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RegulationParamModel {
    pub id: Uuid,
    pub param_key: String,
    /// dsr | ltv | rate | limit | eq_grade | irg | segment | ccf | policy
    pub category: String,
    pub phase_label: Option<String>,
    /// Serialized ParamValue tagged variant
    pub value: serde_json::Value,
    /// Serialized condition match-map
    pub condition: Option<serde_json::Value>,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub legal_basis: Option<String>,
    pub description: Option<String>,
    pub created_by: String,
    pub approved_by: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the eq_grade_master reference table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct EqGradeMasterModel {
    pub id: Uuid,
    pub employer_name: String,
    pub employer_registration_token: Option<String>,
    /// EQ-S .. EQ-E
    pub eq_grade: String,
    pub limit_multiplier: f64,
    pub rate_adjustment_pp: f64,
    pub mou_code: Option<String>,
    pub mou_start_date: Option<DateTime<Utc>>,
    pub mou_end_date: Option<DateTime<Utc>>,
    pub mou_special_rate_pp: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the irg_master reference table (unique ksic_code)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IrgMasterModel {
    pub id: Uuid,
    pub ksic_code: String,
    pub industry_name: String,
    /// L | M | H | VH
    pub irg_grade: String,
    pub pd_adjustment: f64,
    pub limit_cap: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
