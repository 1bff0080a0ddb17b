//! Parameter-store resolution contract: time windows, condition matching,
//! tie-breaking, the two-person rule and the compiled-default fallback.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use indexmap::IndexMap;

use credit_api::domain::{
    AreaType, CreateParamRequest, EmploymentKind, EqGrade, IrgGrade, ParamCategory, ParamValue,
    ProductKind, RateType, SegmentCode, StressDsrRegion,
};
use credit_api::service::{ParamAdminService, ParamSource, PolicyService};
use credit_api::CreditError;
use credit_db_memory::{InMemoryAuditLogRepository, InMemoryRegulationParamRepository};
use credit_logic::services::{
    phase2_start, phase3_start, seed_default_params, ParamAdminServiceImpl, PolicyEngine,
};
use credit_logic::settings::EngineSettings;

fn engine_over(
    params: Arc<InMemoryRegulationParamRepository>,
) -> PolicyEngine<InMemoryRegulationParamRepository> {
    PolicyEngine::new(params, &EngineSettings::default())
}

async fn seeded_engine() -> (
    PolicyEngine<InMemoryRegulationParamRepository>,
    Arc<InMemoryRegulationParamRepository>,
) {
    let params = Arc::new(InMemoryRegulationParamRepository::new());
    seed_default_params(params.as_ref()).await.unwrap();
    (engine_over(params.clone()), params)
}

#[tokio::test]
async fn stress_rate_resolves_per_phase_window() {
    let (engine, _) = seeded_engine().await;

    let in_phase2 = phase2_start() + Duration::days(30);
    let in_phase3 = phase3_start() + Duration::days(30);

    let p2 = engine
        .stress_dsr_rate(StressDsrRegion::Metropolitan, RateType::Variable, in_phase2)
        .await
        .unwrap();
    assert!((p2.value - 0.75).abs() < 1e-9);
    assert_eq!(p2.source, ParamSource::Store);

    let p3 = engine
        .stress_dsr_rate(StressDsrRegion::Metropolitan, RateType::Variable, in_phase3)
        .await
        .unwrap();
    assert!((p3.value - 1.50).abs() < 1e-9);

    let fixed = engine
        .stress_dsr_rate(StressDsrRegion::Metropolitan, RateType::Fixed, in_phase3)
        .await
        .unwrap();
    assert_eq!(fixed.value, 0.0);

    let mixed_long = engine
        .stress_dsr_rate(StressDsrRegion::Metropolitan, RateType::MixedLong, in_phase3)
        .await
        .unwrap();
    assert!((mixed_long.value - 0.45).abs() < 1e-9, "0.3 x 1.50, got {}", mixed_long.value);
}

#[tokio::test]
async fn empty_store_degrades_to_identical_compiled_values() {
    let (seeded, _) = seeded_engine().await;
    let empty = engine_over(Arc::new(InMemoryRegulationParamRepository::new()));

    let at = phase3_start() + Duration::days(10);
    let from_store = seeded
        .stress_dsr_rate(StressDsrRegion::NonMetropolitan, RateType::Variable, at)
        .await
        .unwrap();
    let from_default = empty
        .stress_dsr_rate(StressDsrRegion::NonMetropolitan, RateType::Variable, at)
        .await
        .unwrap();

    assert_eq!(from_store.value, from_default.value);
    assert_eq!(from_store.source, ParamSource::Store);
    assert_eq!(from_default.source, ParamSource::CompiledDefault);

    // every typed getter keeps answering without a store
    assert!((empty.dsr_limit(ProductKind::Credit, at).await.unwrap().value - 40.0).abs() < 1e-9);
    assert!((empty.max_interest_rate(at).await.unwrap().value - 20.0).abs() < 1e-9);
    assert!(
        (empty
            .irg_pd_adjustment(IrgGrade::VeryHigh, at)
            .await
            .unwrap()
            .value
            - 0.30)
            .abs()
            < 1e-9
    );
    let eq = empty.eq_grade_benefit(EqGrade::S, at).await.unwrap().value;
    assert!((eq.limit_multiplier - 2.0).abs() < 1e-9);
    assert!((eq.rate_adjustment_pp + 0.5).abs() < 1e-9);
    assert!((empty.revolving_ccf(at).await.unwrap().value - 0.50).abs() < 1e-9);
    assert!((seeded.revolving_ccf(at).await.unwrap().value - 0.50).abs() < 1e-9);
}

#[tokio::test]
async fn ltv_limit_applies_multi_owner_penalty() {
    let (engine, _) = seeded_engine().await;
    let at = Utc::now();

    let single = engine
        .ltv_limit(AreaType::SpeculationArea, 1, at)
        .await
        .unwrap();
    assert!((single.value - 40.0).abs() < 1e-9);

    let multi = engine
        .ltv_limit(AreaType::SpeculationArea, 2, at)
        .await
        .unwrap();
    assert!((multi.value - 30.0).abs() < 1e-9);

    // the penalty is only configured for the speculation zone
    let general_multi = engine.ltv_limit(AreaType::General, 3, at).await.unwrap();
    assert!((general_multi.value - 70.0).abs() < 1e-9);
}

#[tokio::test]
async fn income_multiplier_scales_with_segment() {
    let (engine, _) = seeded_engine().await;
    let at = Utc::now();

    let plain = engine
        .income_multiplier(EmploymentKind::Employed, None, at)
        .await
        .unwrap();
    assert!((plain.value - 1.5).abs() < 1e-9);

    let doctor = engine
        .income_multiplier(EmploymentKind::Employed, Some(&SegmentCode::Doctor), at)
        .await
        .unwrap();
    assert!((doctor.value - 4.5).abs() < 1e-9, "1.5 x 3.0, got {}", doctor.value);

    let soho = engine
        .income_multiplier(EmploymentKind::SelfEmployed, None, at)
        .await
        .unwrap();
    assert!((soho.value - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn segment_benefit_collapses_mou_codes() {
    let (engine, _) = seeded_engine().await;
    let at = Utc::now();

    let mou = SegmentCode::parse("SEG-MOU-HD023").unwrap();
    let benefit = engine.segment_benefit(&mou, at).await.unwrap().value;
    assert!((benefit.rate_discount_pp + 0.3).abs() < 1e-9);
    assert_eq!(benefit.limit_multiplier, Some(1.5));
}

#[tokio::test]
async fn resolution_is_deterministic_for_fixed_inputs() {
    let (engine, _) = seeded_engine().await;
    let at = Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap();

    let mut condition = IndexMap::new();
    condition.insert("region".to_string(), "metropolitan".to_string());
    condition.insert("rate_type".to_string(), "variable".to_string());

    let first = engine
        .resolve("stress_dsr.metropolitan.variable", at, Some(&condition))
        .await
        .unwrap()
        .unwrap();
    for _ in 0..5 {
        let again = engine
            .resolve("stress_dsr.metropolitan.variable", at, Some(&condition))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.value, first.value);
    }
    // repeat lookups inside the TTL come from the cache
    let cached = engine
        .resolve("stress_dsr.metropolitan.variable", at, Some(&condition))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.source, ParamSource::Cache);
}

#[tokio::test]
async fn unknown_key_resolves_to_absent() {
    let (engine, _) = seeded_engine().await;
    let resolved = engine
        .resolve("policy.stress_dsr_is_hard_gate", Utc::now(), None)
        .await
        .unwrap();
    assert!(resolved.is_none());
}

fn create_request(
    key: &str,
    value: ParamValue,
    created_by: &str,
    approved_by: &str,
    effective_from: chrono::DateTime<Utc>,
) -> CreateParamRequest {
    CreateParamRequest {
        param_key: key.to_string(),
        category: ParamCategory::Dsr,
        phase_label: None,
        value,
        condition: None,
        effective_from,
        effective_to: None,
        legal_basis: Some("은행업감독규정 §35의5".to_string()),
        description: "tightened household DSR ceiling".to_string(),
        created_by: created_by.to_string(),
        approved_by: approved_by.to_string(),
        change_reason: "supervisory directive".to_string(),
    }
}

#[tokio::test]
async fn two_person_rule_blocks_self_approval() {
    let (_, params) = seeded_engine().await;
    let audit = Arc::new(InMemoryAuditLogRepository::new());
    let policy: Arc<dyn PolicyService> = Arc::new(engine_over(params.clone()));
    let admin = ParamAdminServiceImpl::new(params, audit, policy);

    let err = admin
        .create_param(create_request(
            "dsr.max_ratio",
            ParamValue::Ratio {
                max_ratio_pct: 35.0,
                multi_owner_deduction_pp: None,
            },
            "ops.kim",
            "ops.kim",
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, CreditError::TwoPersonRuleViolation { .. }));
}

#[tokio::test]
async fn parameter_write_supersedes_and_invalidates() {
    let (_, params) = seeded_engine().await;
    let audit = Arc::new(InMemoryAuditLogRepository::new());
    let policy = Arc::new(engine_over(params.clone()));
    let admin = ParamAdminServiceImpl::new(params.clone(), audit.clone(), policy.clone());

    let before = policy
        .dsr_limit(ProductKind::Credit, Utc::now())
        .await
        .unwrap();
    assert!((before.value - 40.0).abs() < 1e-9);

    let effective_from = Utc::now() - Duration::minutes(5);
    let created = admin
        .create_param(create_request(
            "dsr.max_ratio",
            ParamValue::Ratio {
                max_ratio_pct: 35.0,
                multi_owner_deduction_pp: None,
            },
            "ops.kim",
            "risk.lee",
            effective_from,
        ))
        .await
        .unwrap();
    assert!(created.approved_at.is_some(), "approval time is server-assigned");

    // the later effective_from wins, and the write flushed the cache
    let after = policy
        .dsr_limit(ProductKind::Credit, Utc::now())
        .await
        .unwrap();
    assert!((after.value - 35.0).abs() < 1e-9, "got {}", after.value);

    // duplicate (param_key, effective_from) is refused
    let err = admin
        .create_param(create_request(
            "dsr.max_ratio",
            ParamValue::Ratio {
                max_ratio_pct: 30.0,
                multi_owner_deduction_pp: None,
            },
            "ops.kim",
            "risk.lee",
            effective_from,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, CreditError::Conflict { .. }));

    assert!(audit.len() >= 1, "parameter writes must leave audit entries");
}

#[tokio::test]
async fn deactivation_preserves_history_and_restores_default() {
    let (_, params) = seeded_engine().await;
    let audit = Arc::new(InMemoryAuditLogRepository::new());
    let policy = Arc::new(engine_over(params.clone()));
    let admin = ParamAdminServiceImpl::new(params.clone(), audit, policy.clone());

    let created = admin
        .create_param(create_request(
            "dsr.max_ratio",
            ParamValue::Ratio {
                max_ratio_pct: 35.0,
                multi_owner_deduction_pp: None,
            },
            "ops.kim",
            "risk.lee",
            Utc::now() - Duration::minutes(5),
        ))
        .await
        .unwrap();
    let tightened = policy
        .dsr_limit(ProductKind::Credit, Utc::now())
        .await
        .unwrap();
    assert!((tightened.value - 35.0).abs() < 1e-9);

    let deactivated = admin
        .deactivate_param(created.id, "directive withdrawn", "risk.lee")
        .await
        .unwrap();
    assert!(!deactivated.is_active);
    assert!(deactivated.effective_to.is_some());

    // the historical row survives, inactive
    let listed = admin.list_params(Some(ParamCategory::Dsr), None).await.unwrap();
    assert!(listed.iter().any(|p| p.id == created.id && !p.is_active));

    // resolution reverts to the still-active seeded row
    let reverted = policy
        .dsr_limit(ProductKind::Credit, Utc::now())
        .await
        .unwrap();
    assert!((reverted.value - 40.0).abs() < 1e-9, "got {}", reverted.value);

    let err = admin
        .deactivate_param(created.id, "   ", "risk.lee")
        .await
        .unwrap_err();
    assert!(matches!(err, CreditError::ValidationError { .. }));
}

#[tokio::test]
async fn every_active_row_satisfies_write_invariants() {
    let (_, params) = seeded_engine().await;
    let audit = Arc::new(InMemoryAuditLogRepository::new());
    let policy: Arc<dyn PolicyService> = Arc::new(engine_over(params.clone()));
    let admin = ParamAdminServiceImpl::new(params, audit, policy);

    for param in admin.list_params(None, Some(true)).await.unwrap() {
        assert_ne!(param.created_by.as_str(), param.approved_by.as_str());
        assert!(param
            .change_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty()));
    }
}
