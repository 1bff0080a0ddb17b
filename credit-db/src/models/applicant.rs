use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database model for the applicants table.
///
/// Enum-typed domain fields are stored as their wire codes; the mappers in
/// credit-logic own the conversion both ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ApplicantModel {
    pub id: Uuid,
    /// individual | sole_proprietor
    pub applicant_kind: String,
    /// HMAC-SHA256 hex digest, unique
    pub identity_token: String,
    pub age: i32,
    /// employed | self_employed | unemployed | retired | student
    pub employment_kind: String,
    pub annual_income: Decimal,
    pub income_verified: bool,
    /// EQ-S .. EQ-E, nullable
    pub employer_eq_grade: Option<String>,
    /// L | M | H | VH, nullable
    pub industry_risk_grade: Option<String>,
    /// SEG-DR | SEG-JD | SEG-ART | SEG-YTH | SEG-MIL | SEG-MOU-{code}
    pub segment_code: Option<String>,
    pub bureau_consent: bool,
    pub alt_data_consent: bool,
    pub open_banking_consent: bool,
    pub art_fund_registered: bool,

    // Sole-proprietor block, populated together or not at all
    pub business_duration_months: Option<i32>,
    pub annual_revenue: Option<Decimal>,
    pub operating_income: Option<Decimal>,
    pub tax_filings_3y: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
