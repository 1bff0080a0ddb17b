use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::EqGrade;

/// Employer credit-quality master row: employer to EQ grade, limit
/// multiplier and rate adjustment, with optional MOU agreement terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqGradeMasterEntry {
    pub id: Uuid,
    pub employer_name: HeaplessString<100>,
    /// Keyed hash of the business registration number
    pub employer_registration_token: Option<HeaplessString<64>>,
    pub eq_grade: EqGrade,
    pub limit_multiplier: f64,
    pub rate_adjustment_pp: f64,
    pub mou_code: Option<HeaplessString<20>>,
    pub mou_start_date: Option<DateTime<Utc>>,
    pub mou_end_date: Option<DateTime<Utc>>,
    /// Negotiated discount replacing the default MOU segment discount
    pub mou_special_rate_pp: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Industry risk master row keyed by the standard industry classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrgMasterEntry {
    pub id: Uuid,
    pub ksic_code: HeaplessString<10>,
    pub industry_name: HeaplessString<100>,
    pub irg_grade: crate::domain::IrgGrade,
    /// Multiplicative PD adjustment ratio
    pub pd_adjustment: f64,
    /// Optional cap on the limit multiplier for high-risk industries
    pub limit_cap: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
