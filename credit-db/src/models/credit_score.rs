use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database model for the credit_scores table.
///
/// Write-once per evaluation; `(application_id, scored_at)` is unique.
/// `actual_default` arrives months later from loan-performance feeds and
/// powers the calibration and vintage monitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditScoreModel {
    pub id: Uuid,
    pub application_id: Uuid,

    /// 300..=900
    pub score: i32,
    /// AAA..D
    pub grade: String,
    /// application | behavioral | collection
    pub scorecard_kind: String,
    pub model_version: String,

    // Basel IRB quantities
    pub raw_probability: f64,
    pub pd_final: f64,
    pub lgd: f64,
    pub ead: Decimal,
    pub ccf_applied: Option<f64>,
    pub risk_weight: f64,
    pub economic_capital: Decimal,

    // Decision
    /// approved | rejected | manual_review
    pub decision: String,
    pub approved_amount: Decimal,
    pub approved_term_months: i32,

    /// Serialized RateBreakdown (rates stored at four decimals)
    pub rate_breakdown: serde_json::Value,
    pub hurdle_rate_satisfied: bool,

    // Regulatory ratios, percent
    pub dsr: f64,
    pub stress_dsr: f64,
    pub ltv: Option<f64>,
    pub dsr_limit_breached: bool,
    pub ltv_limit_breached: bool,

    // Adverse-action disclosure
    pub rejection_reasons: serde_json::Value,
    pub top_positive_factors: serde_json::Value,
    pub top_negative_factors: serde_json::Value,
    pub appeal_deadline: Option<DateTime<Utc>>,

    // Realised outcome (loan performance feed)
    pub actual_default: Option<bool>,
    pub outcome_observed_at: Option<DateTime<Utc>>,

    pub scored_at: DateTime<Utc>,
}

/// One row of the vintage analysis input: cohort month, seasoning and
/// realised outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VintageRow {
    /// YYYY-MM of origination
    pub cohort_month: String,
    pub months_on_book: u32,
    pub is_bad: bool,
}
