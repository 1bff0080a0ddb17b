use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Regulatory credit grade on the 300-900 score scale.
///
/// Bands are closed intervals with no gaps; 600 is the top of B and the
/// scale anchor (base PD 7.2%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreditGrade {
    Aaa,
    Aa,
    A,
    Bbb,
    Bb,
    B,
    Ccc,
    Cc,
    C,
    D,
}

impl CreditGrade {
    pub fn code(&self) -> &'static str {
        match self {
            CreditGrade::Aaa => "AAA",
            CreditGrade::Aa => "AA",
            CreditGrade::A => "A",
            CreditGrade::Bbb => "BBB",
            CreditGrade::Bb => "BB",
            CreditGrade::B => "B",
            CreditGrade::Ccc => "CCC",
            CreditGrade::Cc => "CC",
            CreditGrade::C => "C",
            CreditGrade::D => "D",
        }
    }

    pub fn parse(code: &str) -> Option<CreditGrade> {
        match code {
            "AAA" => Some(CreditGrade::Aaa),
            "AA" => Some(CreditGrade::Aa),
            "A" => Some(CreditGrade::A),
            "BBB" => Some(CreditGrade::Bbb),
            "BB" => Some(CreditGrade::Bb),
            "B" => Some(CreditGrade::B),
            "CCC" => Some(CreditGrade::Ccc),
            "CC" => Some(CreditGrade::Cc),
            "C" => Some(CreditGrade::C),
            "D" => Some(CreditGrade::D),
            _ => None,
        }
    }
}

impl std::fmt::Display for CreditGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
    ManualReview,
}

impl Decision {
    pub fn code(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
            Decision::ManualReview => "manual_review",
        }
    }

    pub fn parse(code: &str) -> Option<Decision> {
        match code {
            "approved" => Some(Decision::Approved),
            "rejected" => Some(Decision::Rejected),
            "manual_review" => Some(Decision::ManualReview),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScorecardKind {
    Application,
    Behavioral,
    Collection,
}

impl ScorecardKind {
    pub fn code(&self) -> &'static str {
        match self {
            ScorecardKind::Application => "application",
            ScorecardKind::Behavioral => "behavioral",
            ScorecardKind::Collection => "collection",
        }
    }

    pub fn parse(code: &str) -> Option<ScorecardKind> {
        match code {
            "application" => Some(ScorecardKind::Application),
            "behavioral" => Some(ScorecardKind::Behavioral),
            "collection" => Some(ScorecardKind::Collection),
            _ => None,
        }
    }
}

/// RAROC-based decomposition of the offered annual rate.
///
/// All components are percentage points, rounded to four decimals at the
/// storage boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBreakdown {
    pub base_rate: f64,
    /// round(PD x LGD x 100 x 2.5, 4)
    pub credit_spread: f64,
    pub funding_cost: f64,
    pub operating_cost: f64,
    pub eq_adjustment: f64,
    pub segment_discount: f64,
    pub relationship_discount: f64,
    pub final_rate: f64,
    /// Pre-clamp value exceeded the statutory cap
    pub rate_capped: bool,
    pub raroc_at_final_rate: f64,
    /// RAROC >= 0.15; informational, never rejects on its own
    pub hurdle_rate_satisfied: bool,
}

impl RateBreakdown {
    /// Rate shown to the borrower, two decimals
    pub fn display_rate(&self) -> f64 {
        (self.final_rate * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FactorImpact {
    Low,
    Medium,
    High,
}

/// One structured explanation item shown to the borrower
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationFactor {
    pub factor: String,
    pub detail: String,
    pub impact: FactorImpact,
}

/// Immutable outcome of one evaluation. Write-once; re-evaluations create
/// new rows and readers select the latest by `scored_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub id: Uuid,
    pub application_id: Uuid,

    // Score and grade
    /// 300-900, scale anchor 600 = PD 7.2%, PDO 40
    pub score: i32,
    pub grade: CreditGrade,
    /// Model output before the IRG adjustment
    pub raw_probability: f64,
    /// Final PD after the multiplicative IRG adjustment
    pub pd_final: f64,
    pub lgd: f64,
    /// Exposure at default in KRW
    pub ead: Decimal,
    pub risk_weight: f64,
    /// EAD x RW x 8%, KRW
    pub economic_capital: Decimal,

    // Decision
    pub decision: Decision,
    pub approved_amount: Decimal,
    pub approved_term_months: u32,

    // Pricing
    pub rate_breakdown: RateBreakdown,

    // Regulatory ratios, percent
    pub dsr: f64,
    pub stress_dsr: f64,
    /// Absent for products without collateral
    pub ltv: Option<f64>,
    pub dsr_limit_breached: bool,
    pub ltv_limit_breached: bool,

    // Adverse-action disclosure
    pub rejection_reasons: Vec<String>,
    pub top_positive_factors: Vec<ExplanationFactor>,
    pub top_negative_factors: Vec<ExplanationFactor>,
    /// scored_at + 30 days when rejected or sent to manual review
    pub appeal_deadline: Option<DateTime<Utc>>,

    // Model metadata
    pub model_version: HeaplessString<30>,
    pub scorecard_kind: ScorecardKind,
    pub scored_at: DateTime<Utc>,
}

impl ScoringResult {
    /// Cross-field invariants enforced before persistence
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(300..=900).contains(&self.score) {
            errors.push(format!("score {} outside [300, 900]", self.score));
        }
        if !(0.0..=1.0).contains(&self.pd_final) {
            errors.push(format!("pd_final {} outside (0, 1)", self.pd_final));
        }
        match self.decision {
            Decision::Rejected => {
                if self.rejection_reasons.is_empty() || self.rejection_reasons.len() > 3 {
                    errors.push(format!(
                        "rejected result carries {} reasons, expected 1-3",
                        self.rejection_reasons.len()
                    ));
                }
                if self.appeal_deadline.is_none() {
                    errors.push("rejected result missing appeal deadline".to_string());
                }
            }
            Decision::Approved => {
                if self.approved_amount <= Decimal::ZERO {
                    errors.push("approved result requires a positive amount".to_string());
                }
                if !self.rejection_reasons.is_empty() {
                    errors.push("approved result carries rejection reasons".to_string());
                }
            }
            Decision::ManualReview => {}
        }
        if self.top_positive_factors.len() > 3 || self.top_negative_factors.len() > 3 {
            errors.push("explanation factors limited to three per sign".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_result(decision: Decision) -> ScoringResult {
        ScoringResult {
            id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            score: 700,
            grade: CreditGrade::Bb,
            raw_probability: 0.03,
            pd_final: 0.03,
            lgd: 0.45,
            ead: Decimal::from(30_000_000i64),
            risk_weight: 0.75,
            economic_capital: Decimal::from(1_800_000i64),
            decision,
            approved_amount: Decimal::from(30_000_000i64),
            approved_term_months: 36,
            rate_breakdown: RateBreakdown {
                base_rate: 3.5,
                credit_spread: 3.375,
                funding_cost: 1.2,
                operating_cost: 0.8,
                eq_adjustment: -0.2,
                segment_discount: 0.0,
                relationship_discount: 0.0,
                final_rate: 8.675,
                rate_capped: false,
                raroc_at_final_rate: 1.22,
                hurdle_rate_satisfied: true,
            },
            dsr: 13.5,
            stress_dsr: 14.2,
            ltv: None,
            dsr_limit_breached: false,
            ltv_limit_breached: false,
            rejection_reasons: Vec::new(),
            top_positive_factors: Vec::new(),
            top_negative_factors: Vec::new(),
            appeal_deadline: None,
            model_version: HeaplessString::try_from("stat-v1.0").unwrap(),
            scorecard_kind: ScorecardKind::Application,
            scored_at: Utc::now(),
        }
    }

    #[test]
    fn test_approved_result_must_have_positive_amount() {
        let mut result = base_result(Decision::Approved);
        assert!(result.validate().is_ok());
        result.approved_amount = Decimal::ZERO;
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_rejected_result_needs_reason_and_deadline() {
        let mut result = base_result(Decision::Rejected);
        result.approved_amount = Decimal::ZERO;
        assert!(result.validate().is_err());

        result.rejection_reasons = vec!["score below cutoff".to_string()];
        result.appeal_deadline = Some(Utc::now() + chrono::Duration::days(30));
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_display_rate_rounds_to_two_decimals() {
        let result = base_result(Decision::Approved);
        assert!((result.rate_breakdown.display_rate() - 8.68).abs() < 1e-9);
    }
}
