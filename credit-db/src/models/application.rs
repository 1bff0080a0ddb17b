use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database model for the loan_applications table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LoanApplicationModel {
    pub id: Uuid,
    pub applicant_id: Uuid,
    /// credit | mortgage | micro | credit_soho
    pub product: String,
    pub requested_amount: Decimal,
    pub requested_term_months: i32,
    /// identity_verify | consent | basic_info | financial_info |
    /// product_select | review | submit
    pub step: String,
    /// pending | under_review | approved | rejected | manual_review | suspended
    pub status: String,

    // Mortgage-only block
    pub collateral_value: Option<Decimal>,
    pub is_regulated_area: Option<bool>,
    pub is_speculation_area: Option<bool>,
    pub owned_property_count: Option<i32>,

    // Debt-service inputs
    pub existing_monthly_payment: Decimal,
    pub existing_credit_line: Decimal,
    pub existing_credit_balance: Decimal,

    /// metropolitan | non_metropolitan
    pub stress_dsr_region: String,
    /// variable | mixed_short | mixed_long | fixed
    pub rate_type: String,

    /// Serialized RegulationSnapshot captured at the last evaluation
    pub regulation_snapshot: Option<serde_json::Value>,

    /// digital | branch | phone
    pub channel: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
