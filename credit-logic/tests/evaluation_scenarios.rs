//! End-to-end evaluation scenarios over in-memory stores and a scripted
//! bureau stub.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use uuid::Uuid;

use credit_api::domain::{
    Applicant, ApplicantKind, ApplicationStatus, ApplicationStep, BureauReport, Channel,
    ConsentFlags, CreditGrade, DebtProfile, Decision, EmploymentKind, EqGrade, IdentityHasher,
    IrgGrade, LoanApplication, MortgageDetails, ProductKind, RateType, SegmentCode,
    StressDsrRegion,
};
use credit_api::service::{BureauService, DecisionService};
use credit_api::CreditResult;
use credit_db::repository::{
    ApplicantRepository, AuditLogRepository, CreditScoreRepository, LoanApplicationRepository,
    RegulationParamRepository,
};
use credit_db_memory::{
    InMemoryApplicantRepository, InMemoryAuditLogRepository, InMemoryCreditScoreRepository,
    InMemoryEqGradeMasterRepository, InMemoryLoanApplicationRepository,
    InMemoryRegulationParamRepository,
};
use credit_logic::mappers::{ApplicantMapper, ApplicationMapper};
use credit_logic::scoring::PdModelHandle;
use credit_logic::services::{seed_default_params, DecisionEngine, PolicyEngine};
use credit_logic::settings::EngineSettings;
use credit_logic::ScoringContext;

struct StubBureau {
    report: BureauReport,
}

#[async_trait]
impl BureauService for StubBureau {
    async fn fetch_report(&self, _identity_token: &str) -> CreditResult<BureauReport> {
        Ok(self.report.clone())
    }
}

fn clean_bureau_report(cb_score: i32) -> BureauReport {
    BureauReport {
        source: credit_api::domain::BureauSource::Nice,
        cb_score,
        credit_grade: HeaplessString::try_from("BB").unwrap(),
        delinquency_count_12m: 0,
        worst_delinquency_status: 0,
        open_loan_count: 1,
        total_loan_balance: Decimal::ZERO,
        inquiry_count_3m: 0,
        inquiry_count_6m: 0,
        telecom_no_delinquency: true,
        health_insurance_paid_months_12m: 12,
        queried_at: Utc::now(),
        is_fallback: false,
        error_message: None,
    }
}

struct Harness {
    engine: DecisionEngine,
    applications: Arc<InMemoryLoanApplicationRepository>,
    credit_scores: Arc<InMemoryCreditScoreRepository>,
    audit: Arc<InMemoryAuditLogRepository>,
}

fn applicant(age: u8, income: i64, eq: Option<EqGrade>, segment: Option<SegmentCode>) -> Applicant {
    let hasher = IdentityHasher::new(b"test-identity-key");
    let registration = format!("900101-{:07}", age as u32 * 31 + income as u32 % 1_000_000);
    Applicant {
        id: Uuid::new_v4(),
        applicant_kind: ApplicantKind::Individual,
        identity_token: HeaplessString::try_from(hasher.identity_token(&registration).as_str())
            .unwrap(),
        age,
        employment_kind: EmploymentKind::Employed,
        annual_income: Decimal::from(income),
        income_verified: true,
        employer_eq_grade: eq,
        industry_risk_grade: Some(IrgGrade::Medium),
        segment_code: segment,
        consent: ConsentFlags {
            bureau_inquiry: true,
            alt_data: true,
            open_banking: false,
        },
        art_fund_registered: false,
        sole_proprietor: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn credit_application(applicant_id: Uuid, amount: i64, term: u32) -> LoanApplication {
    LoanApplication {
        id: Uuid::new_v4(),
        applicant_id,
        product: ProductKind::Credit,
        requested_amount: Decimal::from(amount),
        requested_term_months: term,
        step: ApplicationStep::Submit,
        status: ApplicationStatus::Pending,
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

struct Fixture {
    harness: Harness,
    application_id: Uuid,
}

async fn fixture(
    report: BureauReport,
    applicant_row: Applicant,
    mut application_row: LoanApplication,
) -> Fixture {
    let settings = EngineSettings::default();
    let params = Arc::new(InMemoryRegulationParamRepository::new());
    seed_default_params(params.as_ref()).await.unwrap();

    let applicants = Arc::new(InMemoryApplicantRepository::new());
    let applications = Arc::new(InMemoryLoanApplicationRepository::new());
    let credit_scores = Arc::new(InMemoryCreditScoreRepository::new());
    let audit = Arc::new(InMemoryAuditLogRepository::new());

    application_row.applicant_id = applicant_row.id;
    applicants
        .create(&ApplicantMapper::to_model(&applicant_row))
        .await
        .unwrap();
    applications
        .create(&ApplicationMapper::to_model(&application_row))
        .await
        .unwrap();

    let ctx = ScoringContext {
        policy: Arc::new(PolicyEngine::new(params.clone(), &settings)),
        bureau: Arc::new(StubBureau { report }),
        model: Arc::new(PdModelHandle::statistical()),
        applicants,
        applications: applications.clone(),
        credit_scores: credit_scores.clone(),
        eq_master: Arc::new(InMemoryEqGradeMasterRepository::new()),
        audit: audit.clone(),
        settings,
    };
    Fixture {
        harness: Harness {
            engine: DecisionEngine::new(ctx),
            applications,
            credit_scores,
            audit,
        },
        application_id: application_row.id,
    }
}

#[tokio::test]
async fn scenario_prime_employed_borrower_is_approved() {
    let applicant_row = applicant(38, 80_000_000, Some(EqGrade::B), None);
    let application_row = credit_application(applicant_row.id, 30_000_000, 36);
    let fx = fixture(clean_bureau_report(850), applicant_row, application_row).await;

    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();

    assert_eq!(result.decision, Decision::Approved);
    assert!(result.score >= 805, "prime profile scored {}", result.score);
    assert!(
        matches!(result.grade, CreditGrade::Aaa | CreditGrade::Aa | CreditGrade::A),
        "grade {}",
        result.grade
    );
    assert_eq!(result.approved_amount, Decimal::from(30_000_000i64));
    let rate = result.rate_breakdown.final_rate;
    assert!((3.5..=6.0).contains(&rate), "final rate {rate}");
    assert!(result.dsr < 40.0);
    assert!(result.appeal_deadline.is_none());
    assert!(result.rejection_reasons.is_empty());
    assert!(!result.top_positive_factors.is_empty());

    // status advanced and the snapshot was captured
    let stored = fx
        .harness
        .applications
        .find_by_id(fx.application_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "approved");
    let snapshot = stored.regulation_snapshot.unwrap();
    assert_eq!(snapshot["dsr_limit"], 40.0);
    assert_eq!(snapshot["bureau_source"], "nice");

    // audit trail: score_created + application_approved
    let actions: Vec<String> = fx
        .harness
        .audit
        .find_by_entity("application", fx.application_id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.action.clone())
        .collect();
    assert!(actions.contains(&"application_approved".to_string()));
}

#[tokio::test]
async fn scenario_speculation_area_mortgage_rejected_on_ltv() {
    let applicant_row = applicant(45, 80_000_000, Some(EqGrade::C), None);
    let mut application_row = credit_application(applicant_row.id, 500_000_000, 360);
    application_row.product = ProductKind::Mortgage;
    application_row.mortgage = Some(MortgageDetails {
        collateral_value: Decimal::from(1_000_000_000i64),
        is_regulated_area: false,
        is_speculation_area: true,
        owned_property_count: 0,
    });
    let fx = fixture(clean_bureau_report(800), applicant_row, application_row).await;

    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();

    let ltv = result.ltv.unwrap();
    assert!((ltv - 50.0).abs() < 1e-9, "ltv {ltv}");
    assert!(result.ltv_limit_breached);
    assert_eq!(result.decision, Decision::Rejected);
    assert!(
        result.rejection_reasons.iter().any(|r| r.contains("LTV")),
        "reasons: {:?}",
        result.rejection_reasons
    );
    assert!(!result.rejection_reasons.is_empty() && result.rejection_reasons.len() <= 3);

    let deadline = result.appeal_deadline.unwrap();
    let expected = result.scored_at + chrono::Duration::days(30);
    assert_eq!(deadline, expected);

    let snapshot_ltv_limit = fx
        .harness
        .applications
        .find_by_id(fx.application_id)
        .await
        .unwrap()
        .unwrap()
        .regulation_snapshot
        .unwrap()["ltv_limit"]
        .as_f64()
        .unwrap();
    assert!((snapshot_ltv_limit - 40.0).abs() < 1e-9);
}

#[tokio::test]
async fn scenario_phase3_stress_dsr_is_informational() {
    // evaluation date (now) is past 2025-07-01, so phase 3 applies
    let applicant_row = applicant(38, 80_000_000, Some(EqGrade::B), None);
    let mut application_row = credit_application(applicant_row.id, 30_000_000, 36);
    application_row.stress_dsr_region = StressDsrRegion::NonMetropolitan;
    application_row.rate_type = RateType::Variable;
    let fx = fixture(clean_bureau_report(850), applicant_row, application_row).await;

    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();

    let snapshot = fx
        .harness
        .applications
        .find_by_id(fx.application_id)
        .await
        .unwrap()
        .unwrap()
        .regulation_snapshot
        .unwrap();
    let stress_rate = snapshot["stress_dsr_rate"].as_f64().unwrap();
    assert!((stress_rate - 3.00).abs() < 1e-9, "phase 3 add-on, got {stress_rate}");

    assert!(result.stress_dsr > result.dsr);
    assert!(result.dsr <= 40.0);
    // stress breach alone never rejects under the default policy
    assert_eq!(result.decision, Decision::Approved);
}

#[tokio::test]
async fn scenario_active_delinquency_hard_rejects_first() {
    let applicant_row = applicant(40, 36_000_000, None, None);
    let application_row = credit_application(applicant_row.id, 10_000_000, 24);
    let mut report = clean_bureau_report(480);
    report.worst_delinquency_status = 3;
    report.delinquency_count_12m = 2;
    report.telecom_no_delinquency = false;
    let fx = fixture(report, applicant_row, application_row).await;

    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();

    assert_eq!(result.decision, Decision::Rejected);
    // the delinquency reason leads regardless of how low the score fell
    assert_eq!(
        result.rejection_reasons[0],
        "현재 연체 기록이 있어 대출이 불가합니다."
    );
    assert!(result.rejection_reasons.len() <= 3);
    assert!(result.score < 450);
    assert!(result.appeal_deadline.is_some());

    let stored = fx
        .harness
        .applications
        .find_by_id(fx.application_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "rejected");
}

#[tokio::test]
async fn scenario_youth_segment_discount_is_half_a_point() {
    let base_applicant = applicant(25, 50_000_000, None, None);
    let base_application = credit_application(base_applicant.id, 20_000_000, 36);
    let base_fx = fixture(clean_bureau_report(650), base_applicant, base_application).await;
    let base = base_fx.harness.engine.evaluate(base_fx.application_id).await.unwrap();

    let youth_applicant = applicant(25, 50_000_000, None, Some(SegmentCode::Youth));
    let youth_application = credit_application(youth_applicant.id, 20_000_000, 36);
    let youth_fx = fixture(clean_bureau_report(650), youth_applicant, youth_application).await;
    let youth = youth_fx.harness.engine.evaluate(youth_fx.application_id).await.unwrap();

    assert_eq!(base.decision, Decision::Approved);
    assert_eq!(youth.decision, Decision::Approved);
    let discount = base.rate_breakdown.final_rate - youth.rate_breakdown.final_rate;
    assert!((discount - 0.5).abs() < 1e-3, "youth discount {discount}");
}

#[tokio::test]
async fn youth_discount_requires_the_age_window() {
    // same segment code, too old for the window: no discount applies
    let aged_applicant = applicant(40, 50_000_000, None, Some(SegmentCode::Youth));
    let aged_application = credit_application(aged_applicant.id, 20_000_000, 36);
    let aged_fx = fixture(clean_bureau_report(650), aged_applicant, aged_application).await;
    let aged = aged_fx.harness.engine.evaluate(aged_fx.application_id).await.unwrap();

    let base_applicant = applicant(40, 50_000_000, None, None);
    let base_application = credit_application(base_applicant.id, 20_000_000, 36);
    let base_fx = fixture(clean_bureau_report(650), base_applicant, base_application).await;
    let base = base_fx.harness.engine.evaluate(base_fx.application_id).await.unwrap();

    assert!(
        (aged.rate_breakdown.final_rate - base.rate_breakdown.final_rate).abs() < 1e-9,
        "out-of-window youth code must price like no segment"
    );
}

#[tokio::test]
async fn re_evaluation_with_stable_parameters_is_deterministic() {
    let applicant_row = applicant(38, 80_000_000, Some(EqGrade::B), None);
    let application_row = credit_application(applicant_row.id, 30_000_000, 36);
    let fx = fixture(clean_bureau_report(850), applicant_row, application_row).await;

    let first = fx.harness.engine.evaluate(fx.application_id).await.unwrap();
    let second = fx.harness.engine.evaluate(fx.application_id).await.unwrap();

    assert_eq!(first.score, second.score);
    assert_eq!(first.grade, second.grade);
    assert_eq!(first.decision, second.decision);
    assert_eq!(first.approved_amount, second.approved_amount);
    assert!(
        (first.rate_breakdown.final_rate - second.rate_breakdown.final_rate).abs() < 1e-12
    );

    // both runs persisted; the reader picks the latest by scored_at
    let latest = fx
        .harness
        .engine
        .latest_result(fx.application_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, second.id);
}

#[tokio::test]
async fn duplicate_evaluation_key_conflicts() {
    let fx = fixture(
        clean_bureau_report(850),
        applicant(38, 80_000_000, None, None),
        credit_application(Uuid::new_v4(), 10_000_000, 12),
    )
    .await;
    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();

    // replaying the identical (application_id, scored_at) pair loses
    let stored = fx
        .harness
        .credit_scores
        .find_latest_by_application(fx.application_id)
        .await
        .unwrap()
        .unwrap();
    let mut replay = stored.clone();
    replay.id = Uuid::new_v4();
    let err = fx.harness.credit_scores.create(&replay).await.unwrap_err();
    assert!(matches!(err, credit_db::RepositoryError::Conflict { .. }));
    assert_eq!(stored.scored_at, result.scored_at);
}

#[tokio::test]
async fn suspended_application_refuses_evaluation() {
    let fx = fixture(
        clean_bureau_report(850),
        applicant(38, 80_000_000, None, None),
        credit_application(Uuid::new_v4(), 10_000_000, 12),
    )
    .await;

    fx.harness
        .engine
        .suspend(fx.application_id, "cross-bank delinquency alert", "ews_consumer")
        .await
        .unwrap();

    let err = fx.harness.engine.evaluate(fx.application_id).await.unwrap_err();
    assert!(matches!(
        err,
        credit_api::CreditError::ApplicationSuspended { .. }
    ));

    // terminal: a second suspension is refused
    let err = fx
        .harness
        .engine
        .suspend(fx.application_id, "again", "ews_consumer")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        credit_api::CreditError::InvalidStatusTransition { .. }
    ));
}

#[tokio::test]
async fn income_floor_rejects_with_quantified_reason() {
    let fx = fixture(
        clean_bureau_report(720),
        applicant(30, 10_000_000, None, None),
        credit_application(Uuid::new_v4(), 5_000_000, 12),
    )
    .await;

    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();
    assert_eq!(result.decision, Decision::Rejected);
    assert!(result
        .rejection_reasons
        .iter()
        .any(|r| r.contains("연소득")));
}

#[tokio::test]
async fn bureau_fallback_report_is_recorded_as_degradation() {
    let report = BureauReport::conservative(Utc::now(), "both bureaux down");
    let fx = fixture(
        report,
        applicant(38, 80_000_000, None, None),
        credit_application(Uuid::new_v4(), 10_000_000, 12),
    )
    .await;

    let result = fx.harness.engine.evaluate(fx.application_id).await.unwrap();
    // the conservative profile neither waves through nor hard-rejects
    assert_ne!(result.decision, Decision::Rejected);

    let snapshot = fx
        .harness
        .applications
        .find_by_id(fx.application_id)
        .await
        .unwrap()
        .unwrap()
        .regulation_snapshot
        .unwrap();
    assert_eq!(snapshot["bureau_source"], "fallback");
    assert_eq!(snapshot["bureau_is_fallback"], true);
    let degradations = snapshot["degradations"].as_array().unwrap();
    assert!(degradations
        .iter()
        .any(|d| d["dependency"] == "credit_bureau"));
}
