use heapless::String as HeaplessString;

use credit_api::domain::{
    CreditGrade, Decision, ExplanationFactor, RateBreakdown, ScorecardKind, ScoringResult,
};
use credit_api::{CreditError, CreditResult};
use credit_db::models::CreditScoreModel;

use super::parse_enum;
use crate::scoring::primitives::round_probability;

pub struct CreditScoreMapper;

impl CreditScoreMapper {
    /// Storage-boundary rounding happens here: probabilities to six
    /// decimals, rates already carried at four by the composer.
    pub fn to_model(result: &ScoringResult, ccf_applied: Option<f64>) -> CreditScoreModel {
        CreditScoreModel {
            id: result.id,
            application_id: result.application_id,
            score: result.score,
            grade: result.grade.code().to_string(),
            scorecard_kind: result.scorecard_kind.code().to_string(),
            model_version: result.model_version.to_string(),
            raw_probability: round_probability(result.raw_probability),
            pd_final: round_probability(result.pd_final),
            lgd: result.lgd,
            ead: result.ead,
            ccf_applied,
            risk_weight: result.risk_weight,
            economic_capital: result.economic_capital,
            decision: result.decision.code().to_string(),
            approved_amount: result.approved_amount,
            approved_term_months: result.approved_term_months as i32,
            rate_breakdown: serde_json::to_value(&result.rate_breakdown)
                .unwrap_or(serde_json::Value::Null),
            hurdle_rate_satisfied: result.rate_breakdown.hurdle_rate_satisfied,
            dsr: result.dsr,
            stress_dsr: result.stress_dsr,
            ltv: result.ltv,
            dsr_limit_breached: result.dsr_limit_breached,
            ltv_limit_breached: result.ltv_limit_breached,
            rejection_reasons: serde_json::to_value(&result.rejection_reasons)
                .unwrap_or(serde_json::Value::Null),
            top_positive_factors: serde_json::to_value(&result.top_positive_factors)
                .unwrap_or(serde_json::Value::Null),
            top_negative_factors: serde_json::to_value(&result.top_negative_factors)
                .unwrap_or(serde_json::Value::Null),
            appeal_deadline: result.appeal_deadline,
            actual_default: None,
            outcome_observed_at: None,
            scored_at: result.scored_at,
        }
    }

    pub fn from_model(model: &CreditScoreModel) -> CreditResult<ScoringResult> {
        let grade = parse_enum(&model.grade, "grade", CreditGrade::parse)?;
        let decision = parse_enum(&model.decision, "decision", Decision::parse)?;
        let scorecard_kind =
            parse_enum(&model.scorecard_kind, "scorecard_kind", ScorecardKind::parse)?;

        let rate_breakdown: RateBreakdown = serde_json::from_value(model.rate_breakdown.clone())
            .map_err(|e| CreditError::Internal(format!("corrupt rate breakdown: {e}")))?;
        let rejection_reasons: Vec<String> =
            serde_json::from_value(model.rejection_reasons.clone()).unwrap_or_default();
        let top_positive_factors: Vec<ExplanationFactor> =
            serde_json::from_value(model.top_positive_factors.clone()).unwrap_or_default();
        let top_negative_factors: Vec<ExplanationFactor> =
            serde_json::from_value(model.top_negative_factors.clone()).unwrap_or_default();

        Ok(ScoringResult {
            id: model.id,
            application_id: model.application_id,
            score: model.score,
            grade,
            raw_probability: model.raw_probability,
            pd_final: model.pd_final,
            lgd: model.lgd,
            ead: model.ead,
            risk_weight: model.risk_weight,
            economic_capital: model.economic_capital,
            decision,
            approved_amount: model.approved_amount,
            approved_term_months: model.approved_term_months.max(0) as u32,
            rate_breakdown,
            dsr: model.dsr,
            stress_dsr: model.stress_dsr,
            ltv: model.ltv,
            dsr_limit_breached: model.dsr_limit_breached,
            ltv_limit_breached: model.ltv_limit_breached,
            rejection_reasons,
            top_positive_factors,
            top_negative_factors,
            appeal_deadline: model.appeal_deadline,
            model_version: HeaplessString::try_from(model.model_version.as_str())
                .unwrap_or_default(),
            scorecard_kind,
            scored_at: model.scored_at,
        })
    }
}
