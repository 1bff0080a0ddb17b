use async_trait::async_trait;
use chrono::{Duration, Utc};
use heapless::String as HeaplessString;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use credit_api::domain::{
    Applicant, ApplicationStatus, AreaType, AuditAction, AuditEntityKind, BureauReport,
    BureauSource, Decision, Degradation, EqGrade, ExplanationFactor, FactorImpact,
    LoanApplication, ParamValue, ProductKind, RegulationSnapshot, ScorecardKind, ScoringResult,
    SegmentBenefit, SegmentCode,
};
use credit_api::service::{
    BureauService, DecisionService, ParamSource, PolicyService, Resolved,
};
use credit_api::{CreditError, CreditResult};
use credit_db::repository::{
    ApplicantRepository, AuditLogRepository, CreditScoreRepository, EqGradeMasterRepository,
    LoanApplicationRepository,
};
use credit_db::RepositoryError;

use crate::constants::{
    APPEAL_WINDOW_DAYS, CUTOFF_MANUAL, CUTOFF_REJECT, DSR_REFERENCE_RATE_PCT,
    MICRO_LOAN_MAX_KRW, MIN_ANNUAL_INCOME_KRW, PD_FINAL_CEIL, PD_FINAL_FLOOR,
};
use crate::context::ScoringContext;
use crate::mappers::{ApplicantMapper, ApplicationMapper, AuditMapper, CreditScoreMapper};
use crate::scoring::{
    compose_rate, dsr_pct, ead_for_product, economic_capital, lgd_for_product, ltv_pct,
    monthly_payment, pd_to_score, risk_weight_for_product, score_to_grade, FeatureContribution,
    FeatureVector, PdProvider, RateInputs,
};

/// Implementation of the DecisionService trait.
///
/// Orchestrates parameter resolution, bureau lookup, PD scoring, gate
/// evaluation, amount and rate computation, disclosure building and
/// persistence into one deterministic pipeline.
pub struct DecisionEngine {
    ctx: ScoringContext,
}

/// Regulatory inputs resolved for one evaluation, before scoring starts
struct RegulatoryInputs {
    dsr_limit: f64,
    ltv_limit: f64,
    stress_rate: f64,
    statutory_cap: f64,
    irg_adjustment: f64,
    eq_grade_applied: EqGrade,
    eq_limit_multiplier: f64,
    eq_rate_adjustment: f64,
    segment_benefit: Option<SegmentBenefit>,
    segment_applies: bool,
    segment_discount: f64,
    income_multiplier: f64,
    stress_is_hard_gate: bool,
    degradations: Vec<Degradation>,
}

impl DecisionEngine {
    pub fn new(ctx: ScoringContext) -> Self {
        Self { ctx }
    }

    fn note_degradation(
        degradations: &mut Vec<Degradation>,
        dependency: &str,
        detail: impl Into<String>,
    ) {
        degradations.push(Degradation {
            dependency: HeaplessString::try_from(dependency).unwrap_or_default(),
            detail: detail.into(),
        });
    }

    fn track<T: Copy>(
        resolved: &Resolved<T>,
        key: &str,
        degradations: &mut Vec<Degradation>,
    ) -> T {
        if resolved.degraded() {
            Self::note_degradation(degradations, "parameter_store", key);
        }
        resolved.value
    }

    fn validate_inputs(
        applicant: &Applicant,
        application: &LoanApplication,
    ) -> CreditResult<()> {
        if let Err(errors) = applicant.validate() {
            return Err(CreditError::ValidationError {
                field: "applicant".to_string(),
                message: errors.join("; "),
            });
        }
        if !applicant.consent.bureau_inquiry {
            return Err(CreditError::BureauConsentMissing {
                applicant_id: applicant.id,
            });
        }
        if application.requested_amount <= Decimal::ZERO {
            return Err(CreditError::ValidationError {
                field: "requested_amount".to_string(),
                message: "must be positive at review".to_string(),
            });
        }
        if application.requested_term_months == 0 {
            return Err(CreditError::ValidationError {
                field: "requested_term_months".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if application.product == ProductKind::Mortgage {
            let collateral_ok = application
                .mortgage
                .as_ref()
                .map(|m| m.collateral_value > Decimal::ZERO)
                .unwrap_or(false);
            if !collateral_ok {
                return Err(CreditError::ValidationError {
                    field: "collateral_value".to_string(),
                    message: "mortgage requires positive collateral".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn resolve_regulatory_inputs(
        &self,
        applicant: &Applicant,
        application: &LoanApplication,
        effective_at: chrono::DateTime<Utc>,
    ) -> CreditResult<RegulatoryInputs> {
        let mut degradations = Vec::new();
        let policy = &self.ctx.policy;

        let dsr_limit = Self::track(
            &policy.dsr_limit(application.product, effective_at).await?,
            "dsr.max_ratio",
            &mut degradations,
        );

        let ltv_limit = match (&application.product, &application.mortgage) {
            (ProductKind::Mortgage, Some(mortgage)) => {
                let area =
                    AreaType::classify(mortgage.is_regulated_area, mortgage.is_speculation_area);
                Self::track(
                    &policy
                        .ltv_limit(area, mortgage.owned_property_count, effective_at)
                        .await?,
                    "ltv",
                    &mut degradations,
                )
            }
            // collateral-free products are not LTV-bound
            _ => 100.0,
        };

        let stress_rate = Self::track(
            &policy
                .stress_dsr_rate(
                    application.stress_dsr_region,
                    application.rate_type,
                    effective_at,
                )
                .await?,
            "stress_dsr",
            &mut degradations,
        );

        let statutory_cap = Self::track(
            &policy.max_interest_rate(effective_at).await?,
            "rate.max_interest",
            &mut degradations,
        );

        let irg_grade = applicant.effective_irg_grade();
        let irg_adjustment = Self::track(
            &policy.irg_pd_adjustment(irg_grade, effective_at).await?,
            "irg.pd_adjustment",
            &mut degradations,
        );

        // segment resolution and the minimum-EQ guarantee. The applicant
        // record is never mutated; the upgrade lives only in this
        // evaluation's snapshot.
        let mut segment_benefit = None;
        let mut segment_applies = false;
        let mut eq_grade_applied = applicant.effective_eq_grade();
        if let Some(segment) = &applicant.segment_code {
            let benefit = policy.segment_benefit(segment, effective_at).await?;
            if benefit.source == ParamSource::CompiledDefault {
                Self::note_degradation(&mut degradations, "parameter_store", "segment.benefit");
            }
            let benefit = benefit.value;
            segment_applies = benefit.age_min.map(|m| applicant.age >= m).unwrap_or(true)
                && benefit.age_max.map(|m| applicant.age <= m).unwrap_or(true);
            if segment_applies {
                if let Some(guaranteed) = benefit.guaranteed_eq_grade {
                    if guaranteed.is_stronger_than(&eq_grade_applied) {
                        eq_grade_applied = guaranteed;
                    }
                }
            }
            segment_benefit = Some(benefit);
        }

        let eq_benefit = Self::track(
            &policy.eq_grade_benefit(eq_grade_applied, effective_at).await?,
            "eq_grade.benefit",
            &mut degradations,
        );

        let segment_for_limits = if segment_applies {
            applicant.segment_code.as_ref()
        } else {
            None
        };
        let income_multiplier = Self::track(
            &policy
                .income_multiplier(applicant.employment_kind, segment_for_limits, effective_at)
                .await?,
            "credit_loan.income_multiplier",
            &mut degradations,
        );

        // default discount, possibly replaced by a negotiated MOU rate
        let mut segment_discount = if segment_applies {
            segment_benefit
                .as_ref()
                .map(|b| b.rate_discount_pp)
                .unwrap_or(0.0)
        } else {
            0.0
        };
        if segment_applies {
            if let Some(SegmentCode::Mou(code)) = &applicant.segment_code {
                match self.ctx.eq_master.find_by_mou_code(code.as_str()).await {
                    Ok(Some(entry)) => {
                        if let Some(special) = entry.mou_special_rate_pp {
                            segment_discount = special;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        Self::note_degradation(
                            &mut degradations,
                            "eq_grade_master",
                            err.to_string(),
                        );
                    }
                }
            }
        }

        // optional policy switch; absent means the stress ratio stays
        // informational
        let stress_is_hard_gate = match self
            .ctx
            .policy
            .resolve("policy.stress_dsr_is_hard_gate", effective_at, None)
            .await?
        {
            Some(Resolved {
                value: ParamValue::Raw(map),
                ..
            }) => map.get("enabled").copied().unwrap_or(0.0) >= 1.0,
            _ => false,
        };

        Ok(RegulatoryInputs {
            dsr_limit,
            ltv_limit,
            stress_rate,
            statutory_cap,
            irg_adjustment,
            eq_grade_applied,
            eq_limit_multiplier: eq_benefit.limit_multiplier,
            eq_rate_adjustment: eq_benefit.rate_adjustment_pp,
            segment_benefit,
            segment_applies,
            segment_discount,
            income_multiplier,
            stress_is_hard_gate,
            degradations,
        })
    }

    fn build_features(
        applicant: &Applicant,
        application: &LoanApplication,
        bureau: &BureauReport,
    ) -> FeatureVector {
        FeatureVector {
            cb_score: bureau.cb_score as f64,
            delinquency_count_12m: bureau.delinquency_count_12m as f64,
            worst_delinquency_status: bureau.worst_delinquency_status as f64,
            open_loan_count: bureau.open_loan_count as f64,
            total_loan_balance: bureau.total_loan_balance.to_f64().unwrap_or(0.0),
            inquiry_count_3m: bureau.inquiry_count_3m as f64,
            annual_income: applicant.annual_income.to_f64().unwrap_or(0.0),
            requested_amount: application.requested_amount.to_f64().unwrap_or(0.0),
            requested_term_months: application.requested_term_months,
            existing_monthly_payment: application
                .debt_profile
                .existing_monthly_payment
                .to_f64()
                .unwrap_or(0.0),
            age: applicant.age as f64,
            employment_kind: applicant.employment_kind,
            applicant_kind: applicant.applicant_kind,
            telecom_no_delinquency: bureau.telecom_no_delinquency,
            health_insurance_paid_months_12m: bureau.health_insurance_paid_months_12m as f64,
            business_duration_months: applicant
                .sole_proprietor
                .as_ref()
                .map(|p| p.business_duration_months as f64)
                .unwrap_or(0.0),
            tax_filings_3y: applicant
                .sole_proprietor
                .as_ref()
                .map(|p| p.tax_filings_3y as f64)
                .unwrap_or(0.0),
        }
    }

    fn approved_amount(
        applicant: &Applicant,
        application: &LoanApplication,
        inputs: &RegulatoryInputs,
    ) -> Decimal {
        let requested = application.requested_amount;
        match application.product {
            ProductKind::Credit | ProductKind::CreditSoho => {
                let income = applicant.annual_income.to_f64().unwrap_or(0.0);
                let cap = income * inputs.income_multiplier * inputs.eq_limit_multiplier;
                requested.min(krw(cap))
            }
            ProductKind::Mortgage => {
                let collateral = application
                    .mortgage
                    .as_ref()
                    .map(|m| m.collateral_value.to_f64().unwrap_or(0.0))
                    .unwrap_or(0.0);
                let cap = collateral * inputs.ltv_limit / 100.0;
                requested.min(krw(cap))
            }
            ProductKind::Micro => requested.min(Decimal::from(MICRO_LOAN_MAX_KRW)),
        }
    }

    /// Adverse-action sentences per the consumer-protection statute: up to
    /// three, priority-ordered, each citing the computed value and the
    /// limit applied. Identical input yields identical strings.
    fn rejection_reasons(
        bureau: &BureauReport,
        applicant: &Applicant,
        score: i32,
        dsr: f64,
        dsr_limit: f64,
        ltv: Option<f64>,
        ltv_limit: f64,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        if bureau.worst_delinquency_status >= 1 {
            reasons.push("현재 연체 기록이 있어 대출이 불가합니다.".to_string());
        }
        if score < CUTOFF_REJECT {
            reasons.push(format!(
                "신용평가 점수({score}점)가 최저 기준({CUTOFF_REJECT}점)에 미달합니다."
            ));
        }
        if dsr > dsr_limit {
            reasons.push(format!(
                "총부채원리금상환비율(DSR)이 {dsr:.1}%로 한도({dsr_limit:.0}%)를 초과합니다."
            ));
        }
        if let Some(ltv) = ltv {
            if ltv > ltv_limit {
                reasons.push(format!(
                    "담보인정비율(LTV)이 {ltv:.1}%로 한도({ltv_limit:.0}%)를 초과합니다."
                ));
            }
        }
        if applicant.annual_income < Decimal::from(MIN_ANNUAL_INCOME_KRW) {
            reasons.push("연소득이 최저 기준(1,200만원)에 미달합니다.".to_string());
        }

        reasons.truncate(3);
        reasons
    }

    /// Top-3 factors per sign from model contributions when the scorer
    /// exposes them, else the documented heuristic
    fn explanation_factors(
        contributions: Option<Vec<FeatureContribution>>,
        applicant: &Applicant,
        bureau: &BureauReport,
        dsr: f64,
    ) -> (Vec<ExplanationFactor>, Vec<ExplanationFactor>) {
        if let Some(mut contribs) = contributions {
            contribs.sort_by(|a, b| {
                b.contribution
                    .abs()
                    .partial_cmp(&a.contribution.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let impact_of = |c: f64| {
                if c.abs() >= 0.5 {
                    FactorImpact::High
                } else if c.abs() >= 0.2 {
                    FactorImpact::Medium
                } else {
                    FactorImpact::Low
                }
            };
            // negative log-odds contributions lower the PD, i.e. help
            let positive: Vec<_> = contribs
                .iter()
                .filter(|c| c.contribution < 0.0)
                .take(3)
                .map(|c| ExplanationFactor {
                    factor: c.feature.clone(),
                    detail: format!("모형 기여도 {:+.3}", c.contribution),
                    impact: impact_of(c.contribution),
                })
                .collect();
            let negative: Vec<_> = contribs
                .iter()
                .filter(|c| c.contribution > 0.0)
                .take(3)
                .map(|c| ExplanationFactor {
                    factor: c.feature.clone(),
                    detail: format!("모형 기여도 {:+.3}", c.contribution),
                    impact: impact_of(c.contribution),
                })
                .collect();
            return (positive, negative);
        }

        let mut positive = Vec::new();
        let mut negative = Vec::new();

        if bureau.cb_score >= 750 {
            positive.push(ExplanationFactor {
                factor: "신용점수 우수".to_string(),
                detail: format!("CB 점수 {}점 (상위권)", bureau.cb_score),
                impact: FactorImpact::High,
            });
        }
        if bureau.delinquency_count_12m == 0 {
            positive.push(ExplanationFactor {
                factor: "최근 연체 없음".to_string(),
                detail: "최근 12개월 연체 기록 없음".to_string(),
                impact: FactorImpact::Medium,
            });
        }
        if applicant.income_verified {
            positive.push(ExplanationFactor {
                factor: "소득 검증 완료".to_string(),
                detail: "건강보험 납부로 소득 확인됨".to_string(),
                impact: FactorImpact::Medium,
            });
        }
        if bureau.telecom_no_delinquency {
            positive.push(ExplanationFactor {
                factor: "통신료 성실 납부".to_string(),
                detail: "통신료 납부 이력 양호".to_string(),
                impact: FactorImpact::Low,
            });
        }
        if matches!(
            applicant.segment_code,
            Some(SegmentCode::Doctor) | Some(SegmentCode::Judicial) | Some(SegmentCode::Military)
        ) {
            positive.push(ExplanationFactor {
                factor: "전문직/안정직종".to_string(),
                detail: format!(
                    "세그먼트 {} 해당",
                    applicant.segment_code.as_ref().map(|s| s.code()).unwrap_or_default()
                ),
                impact: FactorImpact::High,
            });
        }

        if dsr > 30.0 {
            negative.push(ExplanationFactor {
                factor: "DSR 비율 높음".to_string(),
                detail: format!("원리금상환비율 {dsr:.0}%"),
                impact: FactorImpact::High,
            });
        }
        if bureau.inquiry_count_3m >= 3 {
            negative.push(ExplanationFactor {
                factor: "최근 조회 많음".to_string(),
                detail: format!("최근 3개월 {}회 조회", bureau.inquiry_count_3m),
                impact: FactorImpact::Medium,
            });
        }
        if bureau.open_loan_count >= 4 {
            negative.push(ExplanationFactor {
                factor: "보유 대출 많음".to_string(),
                detail: format!("현재 {}건 대출 보유", bureau.open_loan_count),
                impact: FactorImpact::Medium,
            });
        }
        if let Some(profile) = &applicant.sole_proprietor {
            if profile.business_duration_months < 24 {
                negative.push(ExplanationFactor {
                    factor: "사업기간 짧음".to_string(),
                    detail: format!("사업 영위 {}개월", profile.business_duration_months),
                    impact: FactorImpact::Medium,
                });
            }
        }

        positive.truncate(3);
        negative.truncate(3);
        (positive, negative)
    }

    async fn emit_audit(
        &self,
        entity_kind: AuditEntityKind,
        entity_id: Uuid,
        action: AuditAction,
        actor: &str,
        changes: serde_json::Value,
        regulation_ref: Option<&str>,
    ) {
        let record = credit_api::domain::AuditRecord {
            id: Uuid::new_v4(),
            entity_kind,
            entity_id: Some(entity_id),
            action,
            actor: HeaplessString::try_from(actor).unwrap_or_default(),
            actor_kind: credit_api::domain::ActorKind::System,
            changes: Some(changes),
            regulation_ref: regulation_ref.and_then(|r| HeaplessString::try_from(r).ok()),
            timestamp: Utc::now(),
        };
        if let Err(err) = self.ctx.audit.create(&AuditMapper::to_model(&record)).await {
            // the audit trail failing must not fail the decision, but it
            // must never fail silently either
            tracing::error!(%err, action = record.action.code(), "audit write failed");
        }
    }
}

/// Round a computed KRW amount to whole won for storage
fn krw(amount: f64) -> Decimal {
    if !amount.is_finite() || amount <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from(amount.round() as i64)
}

#[async_trait]
impl DecisionService for DecisionEngine {
    async fn evaluate(&self, application_id: Uuid) -> CreditResult<ScoringResult> {
        // ── load and validate ────────────────────────────────────────────
        let application_model = self
            .ctx
            .applications
            .find_by_id(application_id)
            .await
            .map_err(CreditError::from)?
            .ok_or(CreditError::ApplicationNotFound(application_id))?;
        let mut application = ApplicationMapper::from_model(&application_model)?;

        if application.status == ApplicationStatus::Suspended {
            return Err(CreditError::ApplicationSuspended {
                application_id,
                suspended_at: application.updated_at,
            });
        }

        let applicant_model = self
            .ctx
            .applicants
            .find_by_id(application.applicant_id)
            .await
            .map_err(CreditError::from)?
            .ok_or(CreditError::ApplicantNotFound(application.applicant_id))?;
        let applicant = ApplicantMapper::from_model(&applicant_model)?;

        Self::validate_inputs(&applicant, &application)?;

        if application.status == ApplicationStatus::Pending {
            application.status = ApplicationStatus::UnderReview;
        }

        // ── step 1: one consistent effective instant ─────────────────────
        let effective_at = Utc::now();

        // ── step 2-3: regulatory inputs and the EQ guarantee ─────────────
        let mut inputs = self
            .resolve_regulatory_inputs(&applicant, &application, effective_at)
            .await?;

        // ── step 4: bureau report through the fallback chain ─────────────
        let bureau = self
            .ctx
            .bureau
            .fetch_report(applicant.identity_token.as_str())
            .await?;
        if bureau.source != BureauSource::Nice {
            Self::note_degradation(
                &mut inputs.degradations,
                "credit_bureau",
                format!("served from {}", bureau.source),
            );
        }

        // ── step 5-6: PD, score, grade ───────────────────────────────────
        let model = self.ctx.model.current();
        let features = Self::build_features(&applicant, &application, &bureau);
        let raw_probability = model.raw_probability(&features);
        let pd_final =
            (raw_probability * (1.0 + inputs.irg_adjustment)).clamp(PD_FINAL_FLOOR, PD_FINAL_CEIL);
        let score = pd_to_score(pd_final);
        let grade = score_to_grade(score);

        // ── step 7: IRB quantities ───────────────────────────────────────
        let requested = application.requested_amount.to_f64().unwrap_or(0.0);
        let lgd = lgd_for_product(application.product);
        let ead = ead_for_product(application.product, requested);
        let risk_weight = risk_weight_for_product(application.product);
        let capital = economic_capital(ead, risk_weight);

        // ── step 8: regulatory ratios ────────────────────────────────────
        let monthly_income = applicant.annual_income.to_f64().unwrap_or(0.0) / 12.0;
        let existing_monthly = application
            .debt_profile
            .existing_monthly_payment
            .to_f64()
            .unwrap_or(0.0);
        let new_monthly = monthly_payment(
            requested,
            DSR_REFERENCE_RATE_PCT,
            application.requested_term_months,
        );
        let stressed_monthly = monthly_payment(
            requested,
            DSR_REFERENCE_RATE_PCT + inputs.stress_rate,
            application.requested_term_months,
        );
        let dsr = dsr_pct(monthly_income, new_monthly, existing_monthly);
        let stress_dsr = dsr_pct(monthly_income, stressed_monthly, existing_monthly);
        let ltv = application
            .mortgage
            .as_ref()
            .and_then(|m| ltv_pct(requested, m.collateral_value.to_f64().unwrap_or(0.0)));

        let dsr_limit_breached = dsr > inputs.dsr_limit;
        let stress_breached = stress_dsr > inputs.dsr_limit;
        let ltv_limit_breached = ltv.map(|l| l > inputs.ltv_limit).unwrap_or(false);

        // ── step 9-10: gates and decision ────────────────────────────────
        let hard_reject = bureau.worst_delinquency_status >= 2
            || score < CUTOFF_REJECT
            || dsr_limit_breached
            || (inputs.stress_is_hard_gate && stress_breached)
            || (application.product == ProductKind::Mortgage && ltv_limit_breached)
            || applicant.annual_income < Decimal::from(MIN_ANNUAL_INCOME_KRW);

        let (decision, approved_amount) = if hard_reject {
            (Decision::Rejected, Decimal::ZERO)
        } else if score < CUTOFF_MANUAL {
            (Decision::ManualReview, application.requested_amount)
        } else {
            (
                Decision::Approved,
                Self::approved_amount(&applicant, &application, &inputs),
            )
        };

        // ── step 11: rate decomposition ──────────────────────────────────
        let rate_breakdown = compose_rate(&RateInputs {
            pd: pd_final,
            lgd,
            ead,
            economic_capital: capital,
            base_rate: self.ctx.settings.base_rate,
            statutory_cap: inputs.statutory_cap,
            eq_rate_adjustment: inputs.eq_rate_adjustment,
            segment_discount: inputs.segment_discount,
            relationship_discount: 0.0,
        });

        // ── step 12: disclosures ─────────────────────────────────────────
        let rejection_reasons = if decision == Decision::Rejected {
            Self::rejection_reasons(
                &bureau,
                &applicant,
                score,
                dsr,
                inputs.dsr_limit,
                ltv,
                inputs.ltv_limit,
            )
        } else {
            Vec::new()
        };
        let (top_positive_factors, top_negative_factors) = Self::explanation_factors(
            model.contributions(&features),
            &applicant,
            &bureau,
            dsr,
        );

        // ── step 13: appeal window ───────────────────────────────────────
        let appeal_deadline = match decision {
            Decision::Rejected | Decision::ManualReview => {
                Some(effective_at + Duration::days(APPEAL_WINDOW_DAYS))
            }
            Decision::Approved => None,
        };

        let result = ScoringResult {
            id: Uuid::new_v4(),
            application_id,
            score,
            grade,
            raw_probability,
            pd_final,
            lgd,
            ead: krw(ead),
            risk_weight,
            economic_capital: krw(capital),
            decision,
            approved_amount,
            approved_term_months: application.requested_term_months,
            rate_breakdown,
            dsr,
            stress_dsr,
            ltv,
            dsr_limit_breached,
            ltv_limit_breached,
            rejection_reasons,
            top_positive_factors,
            top_negative_factors,
            appeal_deadline,
            model_version: HeaplessString::try_from(model.model_version()).unwrap_or_default(),
            scorecard_kind: ScorecardKind::Application,
            scored_at: effective_at,
        };

        // fail closed on any cross-field invariant breach: no partial
        // state reaches storage
        if let Err(errors) = result.validate() {
            self.emit_audit(
                AuditEntityKind::Application,
                application_id,
                AuditAction::ScoreCreated,
                "decision_engine",
                serde_json::json!({ "status": "invariant_breach", "errors": errors }),
                None,
            )
            .await;
            return Err(CreditError::Internal(format!(
                "scoring invariant breach: {}",
                errors.join("; ")
            )));
        }

        // ── step 14: persist result, snapshot, status, audit ─────────────
        let snapshot = RegulationSnapshot {
            effective_at,
            dsr_limit: inputs.dsr_limit,
            ltv_limit: inputs.ltv_limit,
            stress_dsr_rate: inputs.stress_rate,
            stress_dsr_region: application.stress_dsr_region,
            rate_type: application.rate_type,
            max_interest_rate: inputs.statutory_cap,
            base_rate: self.ctx.settings.base_rate,
            eq_grade_applied: inputs.eq_grade_applied,
            eq_limit_multiplier: inputs.eq_limit_multiplier,
            eq_rate_adjustment: inputs.eq_rate_adjustment,
            irg_grade: applicant.effective_irg_grade(),
            irg_pd_adjustment: inputs.irg_adjustment,
            segment_code: applicant
                .segment_code
                .as_ref()
                .and_then(|s| HeaplessString::try_from(s.code().as_str()).ok()),
            segment_benefit: if inputs.segment_applies {
                inputs.segment_benefit.clone()
            } else {
                None
            },
            income_multiplier: inputs.income_multiplier,
            bureau_source: HeaplessString::try_from(bureau.source.code()).unwrap_or_default(),
            bureau_score: bureau.cb_score,
            bureau_is_fallback: bureau.is_fallback,
            degradations: inputs.degradations.clone(),
        };

        self.ctx
            .credit_scores
            .create(&CreditScoreMapper::to_model(&result, None))
            .await
            .map_err(CreditError::from)?;

        let target_status = match decision {
            Decision::Approved => ApplicationStatus::Approved,
            Decision::Rejected => ApplicationStatus::Rejected,
            Decision::ManualReview => ApplicationStatus::ManualReview,
        };
        if application.status != target_status
            && application.status.can_transition_to(target_status)
        {
            application.status = target_status;
        }
        application.regulation_snapshot = Some(snapshot);
        application.updated_at = Utc::now();
        self.ctx
            .applications
            .update(&ApplicationMapper::to_model(&application))
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound(_) => CreditError::ApplicationNotFound(application_id),
                other => other.into(),
            })?;

        self.emit_audit(
            AuditEntityKind::CreditScore,
            result.id,
            AuditAction::ScoreCreated,
            "decision_engine",
            serde_json::json!({
                "application_id": application_id,
                "score": score,
                "grade": grade.code(),
                "decision": decision.code(),
                "model_version": result.model_version.as_str(),
            }),
            None,
        )
        .await;
        match decision {
            Decision::Approved => {
                self.emit_audit(
                    AuditEntityKind::Application,
                    application_id,
                    AuditAction::ApplicationApproved,
                    "decision_engine",
                    serde_json::json!({ "approved_amount": result.approved_amount }),
                    None,
                )
                .await;
            }
            Decision::Rejected => {
                self.emit_audit(
                    AuditEntityKind::Application,
                    application_id,
                    AuditAction::ApplicationRejected,
                    "decision_engine",
                    serde_json::json!({ "rejection_reasons": result.rejection_reasons }),
                    Some("금융소비자보호법 §19"),
                )
                .await;
            }
            Decision::ManualReview => {}
        }

        tracing::info!(
            %application_id,
            score,
            grade = grade.code(),
            decision = decision.code(),
            "evaluation complete"
        );
        Ok(result)
    }

    async fn latest_result(&self, application_id: Uuid) -> CreditResult<Option<ScoringResult>> {
        let model = self
            .ctx
            .credit_scores
            .find_latest_by_application(application_id)
            .await
            .map_err(CreditError::from)?;
        model.as_ref().map(CreditScoreMapper::from_model).transpose()
    }

    async fn suspend(&self, application_id: Uuid, reason: &str, actor: &str) -> CreditResult<()> {
        let model = self
            .ctx
            .applications
            .find_by_id(application_id)
            .await
            .map_err(CreditError::from)?
            .ok_or(CreditError::ApplicationNotFound(application_id))?;
        let mut application = ApplicationMapper::from_model(&model)?;

        if !application
            .status
            .can_transition_to(ApplicationStatus::Suspended)
        {
            return Err(CreditError::InvalidStatusTransition {
                from: application.status.to_string(),
                to: ApplicationStatus::Suspended.to_string(),
            });
        }

        application.status = ApplicationStatus::Suspended;
        application.updated_at = Utc::now();
        self.ctx
            .applications
            .update(&ApplicationMapper::to_model(&application))
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound(_) => CreditError::ApplicationNotFound(application_id),
                other => other.into(),
            })?;

        self.emit_audit(
            AuditEntityKind::Application,
            application_id,
            AuditAction::ApplicationSuspended,
            actor,
            serde_json::json!({ "reason": reason }),
            None,
        )
        .await;
        tracing::warn!(%application_id, reason, "application suspended by early warning");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use credit_api::domain::{
        ApplicantKind, ApplicationStep, Channel, ConsentFlags, DebtProfile, EmploymentKind,
        RateType, StressDsrRegion,
    };

    fn applicant(income: i64) -> Applicant {
        Applicant {
            id: Uuid::new_v4(),
            applicant_kind: ApplicantKind::Individual,
            identity_token: HeaplessString::try_from("d".repeat(64).as_str()).unwrap(),
            age: 35,
            employment_kind: EmploymentKind::Employed,
            annual_income: Decimal::from(income),
            income_verified: true,
            employer_eq_grade: None,
            industry_risk_grade: None,
            segment_code: None,
            consent: ConsentFlags {
                bureau_inquiry: true,
                alt_data: false,
                open_banking: false,
            },
            art_fund_registered: false,
            sole_proprietor: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn application(product: ProductKind, amount: i64) -> LoanApplication {
        LoanApplication {
            id: Uuid::new_v4(),
            applicant_id: Uuid::new_v4(),
            product,
            requested_amount: Decimal::from(amount),
            requested_term_months: 36,
            step: ApplicationStep::Submit,
            status: ApplicationStatus::UnderReview,
            mortgage: None,
            debt_profile: DebtProfile::default(),
            stress_dsr_region: StressDsrRegion::Metropolitan,
            rate_type: RateType::Variable,
            regulation_snapshot: None,
            channel: Channel::Digital,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn inputs() -> RegulatoryInputs {
        RegulatoryInputs {
            dsr_limit: 40.0,
            ltv_limit: 100.0,
            stress_rate: 1.5,
            statutory_cap: 20.0,
            irg_adjustment: 0.0,
            eq_grade_applied: EqGrade::C,
            eq_limit_multiplier: 1.2,
            eq_rate_adjustment: 0.0,
            segment_benefit: None,
            segment_applies: false,
            segment_discount: 0.0,
            income_multiplier: 1.5,
            stress_is_hard_gate: false,
            degradations: Vec::new(),
        }
    }

    #[test]
    fn test_income_cap_binds_unsecured_amounts() {
        // cap = 40M x 1.5 x 1.2 = 72M < requested 100M
        let capped = DecisionEngine::approved_amount(
            &applicant(40_000_000),
            &application(ProductKind::Credit, 100_000_000),
            &inputs(),
        );
        assert_eq!(capped, Decimal::from(72_000_000i64));

        let uncapped = DecisionEngine::approved_amount(
            &applicant(40_000_000),
            &application(ProductKind::Credit, 50_000_000),
            &inputs(),
        );
        assert_eq!(uncapped, Decimal::from(50_000_000i64));
    }

    #[test]
    fn test_micro_absolute_cap() {
        let amount = DecisionEngine::approved_amount(
            &applicant(60_000_000),
            &application(ProductKind::Micro, 50_000_000),
            &inputs(),
        );
        assert_eq!(amount, Decimal::from(MICRO_LOAN_MAX_KRW));
    }

    #[test]
    fn test_rejection_reasons_are_deterministic_and_capped_at_three() {
        let mut report = BureauReport::conservative(Utc::now(), "test");
        report.worst_delinquency_status = 1;
        let low_income = applicant(10_000_000);

        let build = || {
            DecisionEngine::rejection_reasons(
                &report,
                &low_income,
                420,
                45.0,
                40.0,
                Some(55.0),
                40.0,
            )
        };
        let first = build();
        assert_eq!(first.len(), 3, "priority order keeps only the first three");
        assert!(first[0].contains("연체"));
        assert!(first[1].contains("420"));
        assert!(first[2].contains("45.0"));
        assert_eq!(first, build());
    }

    #[test]
    fn test_model_contributions_take_precedence_over_heuristic() {
        let contributions = vec![
            FeatureContribution {
                feature: "cb_score".to_string(),
                contribution: -0.9,
            },
            FeatureContribution {
                feature: "inquiry_count_3m".to_string(),
                contribution: 0.4,
            },
            FeatureContribution {
                feature: "telecom_no_delinquency".to_string(),
                contribution: -0.1,
            },
        ];
        let report = BureauReport::conservative(Utc::now(), "test");
        let (positive, negative) = DecisionEngine::explanation_factors(
            Some(contributions),
            &applicant(50_000_000),
            &report,
            15.0,
        );
        assert_eq!(positive.len(), 2);
        assert_eq!(positive[0].factor, "cb_score");
        assert_eq!(positive[0].impact, FactorImpact::High);
        assert_eq!(negative.len(), 1);
        assert_eq!(negative[0].factor, "inquiry_count_3m");

        // without contributions the documented heuristic applies
        let (positive, _) = DecisionEngine::explanation_factors(
            None,
            &applicant(50_000_000),
            &report,
            15.0,
        );
        assert!(positive.iter().any(|f| f.factor == "최근 연체 없음"));
    }
}
