//! Compiled regulatory default table.
//!
//! The authoritative fallback when the parameter store is unreachable, and
//! the initial seed for a fresh store. Values carry their effective
//! windows, so phase-staged rules resolve correctly even offline.

use chrono::{DateTime, TimeZone, Utc};
use heapless::String as HeaplessString;
use indexmap::IndexMap;
use uuid::Uuid;

use credit_api::domain::{
    EqGrade, ParamCategory, ParamValue, RegulationParam, SegmentBenefit,
};
use credit_db::repository::RegulationParamRepository;
use credit_db::RepositoryError;

use crate::mappers::RegulationMapper;

/// Start of the legacy regime for open-ended supervisory rules
pub fn regulation_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

/// Stress-DSR phase 2 effective date
pub fn phase2_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 26, 0, 0, 0).unwrap()
}

/// Stress-DSR phase 3 effective date
pub fn phase3_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
}

const SEED_ACTOR_CREATED: &str = "system_seed";
const SEED_ACTOR_APPROVED: &str = "system_seed_reviewer";

struct SeedRow {
    key: &'static str,
    category: ParamCategory,
    phase: Option<&'static str>,
    value: ParamValue,
    condition: Vec<(&'static str, &'static str)>,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
    legal_basis: Option<&'static str>,
    description: &'static str,
}

impl SeedRow {
    fn into_param(self) -> RegulationParam {
        let condition = if self.condition.is_empty() {
            None
        } else {
            Some(
                self.condition
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<IndexMap<_, _>>(),
            )
        };
        RegulationParam {
            id: Uuid::new_v4(),
            param_key: HeaplessString::try_from(self.key).unwrap_or_default(),
            category: self.category,
            phase_label: self
                .phase
                .and_then(|p| HeaplessString::try_from(p).ok()),
            value: self.value,
            condition,
            effective_from: self.from,
            effective_to: self.to,
            is_active: true,
            legal_basis: self.legal_basis.map(|s| s.to_string()),
            description: Some(self.description.to_string()),
            created_by: HeaplessString::try_from(SEED_ACTOR_CREATED).unwrap_or_default(),
            approved_by: HeaplessString::try_from(SEED_ACTOR_APPROVED).unwrap_or_default(),
            approved_at: Some(self.from),
            change_reason: Some("initial regulatory seed".to_string()),
            created_at: self.from,
            updated_at: self.from,
        }
    }
}

fn stress_rows() -> Vec<SeedRow> {
    let p2 = phase2_start();
    let p3 = phase3_start();
    // (region, base rate phase2, base rate phase3)
    let regions = [("metropolitan", 0.75, 1.50), ("non_metropolitan", 1.50, 3.00)];
    // (rate_type, share of the variable add-on actually applied)
    let rate_types = [("variable", 1.0), ("mixed_short", 0.6), ("mixed_long", 0.3)];

    let mut rows = Vec::new();
    for (region, p2_rate, p3_rate) in regions {
        for (rate_type, apply_ratio) in rate_types {
            let key: &'static str = match (region, rate_type) {
                ("metropolitan", "variable") => "stress_dsr.metropolitan.variable",
                ("metropolitan", "mixed_short") => "stress_dsr.metropolitan.mixed_short",
                ("metropolitan", "mixed_long") => "stress_dsr.metropolitan.mixed_long",
                ("non_metropolitan", "variable") => "stress_dsr.non_metropolitan.variable",
                ("non_metropolitan", "mixed_short") => "stress_dsr.non_metropolitan.mixed_short",
                (_, _) => "stress_dsr.non_metropolitan.mixed_long",
            };
            rows.push(SeedRow {
                key,
                category: ParamCategory::Dsr,
                phase: Some("phase2"),
                value: ParamValue::Rate {
                    rate_pp: p2_rate,
                    apply_ratio,
                },
                condition: vec![("region", region), ("rate_type", rate_type)],
                from: p2,
                to: Some(p3),
                legal_basis: Some("금감원 행정지도 2024-02"),
                description: "Stress DSR add-on, phase 2",
            });
            rows.push(SeedRow {
                key,
                category: ParamCategory::Dsr,
                phase: Some("phase3"),
                value: ParamValue::Rate {
                    rate_pp: p3_rate,
                    apply_ratio,
                },
                condition: vec![("region", region), ("rate_type", rate_type)],
                from: p3,
                to: None,
                legal_basis: Some("금감원 행정지도 2025-07"),
                description: "Stress DSR add-on, phase 3",
            });
        }
    }
    rows
}

/// The full default table in domain form
pub fn compiled_default_params() -> Vec<RegulationParam> {
    let epoch = regulation_epoch();
    let mut rows = stress_rows();

    // LTV ceilings
    rows.push(SeedRow {
        key: "ltv.general",
        category: ParamCategory::Ltv,
        phase: None,
        value: ParamValue::Ratio {
            max_ratio_pct: 70.0,
            multi_owner_deduction_pp: None,
        },
        condition: vec![("area_type", "general")],
        from: epoch,
        to: None,
        legal_basis: Some("은행업감독규정 §35의5"),
        description: "LTV ceiling, general area",
    });
    rows.push(SeedRow {
        key: "ltv.regulated",
        category: ParamCategory::Ltv,
        phase: None,
        value: ParamValue::Ratio {
            max_ratio_pct: 60.0,
            multi_owner_deduction_pp: None,
        },
        condition: vec![("area_type", "regulated")],
        from: epoch,
        to: None,
        legal_basis: Some("은행업감독규정 §35의5"),
        description: "LTV ceiling, adjustment-target area",
    });
    rows.push(SeedRow {
        key: "ltv.speculation_area",
        category: ParamCategory::Ltv,
        phase: None,
        value: ParamValue::Ratio {
            max_ratio_pct: 40.0,
            multi_owner_deduction_pp: Some(10.0),
        },
        condition: vec![("area_type", "speculation_area")],
        from: epoch,
        to: None,
        legal_basis: Some("은행업감독규정 §35의5"),
        description: "LTV ceiling, speculation zone (multi-owner -10pp)",
    });

    // DSR ceiling
    rows.push(SeedRow {
        key: "dsr.max_ratio",
        category: ParamCategory::Dsr,
        phase: None,
        value: ParamValue::Ratio {
            max_ratio_pct: 40.0,
            multi_owner_deduction_pp: None,
        },
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: Some("은행업감독규정 §35의5"),
        description: "Household DSR ceiling",
    });

    // Statutory rate cap
    rows.push(SeedRow {
        key: "rate.max_interest",
        category: ParamCategory::Rate,
        phase: None,
        value: ParamValue::Ratio {
            max_ratio_pct: 20.0,
            multi_owner_deduction_pp: None,
        },
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: Some("대부업법 §11"),
        description: "Statutory maximum interest rate",
    });

    // Unsecured income multipliers
    rows.push(SeedRow {
        key: "credit_loan.income_multiplier.employed",
        category: ParamCategory::Limit,
        phase: None,
        value: ParamValue::Multiplier { times: 1.5 },
        condition: vec![("employment_kind", "employed")],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Unsecured income multiplier, salaried",
    });
    rows.push(SeedRow {
        key: "credit_loan.income_multiplier.self_employed",
        category: ParamCategory::Limit,
        phase: None,
        value: ParamValue::Multiplier { times: 1.0 },
        condition: vec![("employment_kind", "self_employed")],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Unsecured income multiplier, self-employed",
    });

    // EQ-grade benefits
    let eq_benefits = [
        ("eq_grade.benefit.EQ-S", 2.0, -0.5, "EQ-S (public institutions, financials)"),
        ("eq_grade.benefit.EQ-A", 1.8, -0.3, "EQ-A (large listed corporates)"),
        ("eq_grade.benefit.EQ-B", 1.5, -0.2, "EQ-B (sound mid-caps)"),
        ("eq_grade.benefit.EQ-C", 1.2, 0.0, "EQ-C (general SMEs)"),
        ("eq_grade.benefit.EQ-D", 1.0, 0.2, "EQ-D (fragile SMEs)"),
        ("eq_grade.benefit.EQ-E", 0.7, 0.5, "EQ-E (distress-risk employers)"),
    ];
    for (key, multiplier, adjustment, description) in eq_benefits {
        rows.push(SeedRow {
            key,
            category: ParamCategory::EqGrade,
            phase: None,
            value: ParamValue::EqBenefit {
                limit_multiplier: multiplier,
                rate_adjustment_pp: adjustment,
            },
            condition: vec![],
            from: epoch,
            to: None,
            legal_basis: None,
            description,
        });
    }

    // IRG PD adjustments
    let irg_adjustments = [
        ("irg.pd_adjustment.L", -0.10, "IRG Low: PD relief 10%"),
        ("irg.pd_adjustment.M", 0.0, "IRG Medium: no adjustment"),
        ("irg.pd_adjustment.H", 0.15, "IRG High: PD surcharge 15%"),
        ("irg.pd_adjustment.VH", 0.30, "IRG Very High: PD surcharge 30%"),
    ];
    for (key, adjustment, description) in irg_adjustments {
        rows.push(SeedRow {
            key,
            category: ParamCategory::Irg,
            phase: None,
            value: ParamValue::PdAdjustment { adjustment },
            condition: vec![],
            from: epoch,
            to: None,
            legal_basis: None,
            description,
        });
    }

    // Segment benefits
    rows.push(SeedRow {
        key: "segment.benefit.SEG-DR",
        category: ParamCategory::Segment,
        phase: None,
        value: ParamValue::Segment(SegmentBenefit {
            guaranteed_eq_grade: Some(EqGrade::B),
            limit_multiplier: Some(3.0),
            rate_discount_pp: -0.3,
            income_smoothing_months: None,
            guarantee_link: false,
            age_min: None,
            age_max: None,
        }),
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Medical professionals",
    });
    rows.push(SeedRow {
        key: "segment.benefit.SEG-JD",
        category: ParamCategory::Segment,
        phase: None,
        value: ParamValue::Segment(SegmentBenefit {
            guaranteed_eq_grade: Some(EqGrade::B),
            limit_multiplier: Some(2.5),
            rate_discount_pp: -0.2,
            income_smoothing_months: None,
            guarantee_link: false,
            age_min: None,
            age_max: None,
        }),
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Legal and accounting professionals",
    });
    rows.push(SeedRow {
        key: "segment.benefit.SEG-ART",
        category: ParamCategory::Segment,
        phase: None,
        value: ParamValue::Segment(SegmentBenefit {
            guaranteed_eq_grade: None,
            limit_multiplier: None,
            rate_discount_pp: 0.0,
            income_smoothing_months: Some(12),
            guarantee_link: true,
            age_min: None,
            age_max: None,
        }),
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: Some("예술인복지법"),
        description: "Registered artists (income smoothing, guarantee link)",
    });
    rows.push(SeedRow {
        key: "segment.benefit.SEG-YTH",
        category: ParamCategory::Segment,
        phase: None,
        value: ParamValue::Segment(SegmentBenefit {
            guaranteed_eq_grade: None,
            limit_multiplier: Some(1.0),
            rate_discount_pp: -0.5,
            income_smoothing_months: None,
            guarantee_link: false,
            age_min: Some(19),
            age_max: Some(34),
        }),
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Youth aged 19-34",
    });
    rows.push(SeedRow {
        key: "segment.benefit.SEG-MIL",
        category: ParamCategory::Segment,
        phase: None,
        value: ParamValue::Segment(SegmentBenefit {
            guaranteed_eq_grade: Some(EqGrade::S),
            limit_multiplier: Some(2.0),
            rate_discount_pp: -0.5,
            income_smoothing_months: None,
            guarantee_link: false,
            age_min: None,
            age_max: None,
        }),
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Military and public officials",
    });
    rows.push(SeedRow {
        key: "segment.benefit.SEG-MOU",
        category: ParamCategory::Segment,
        phase: None,
        value: ParamValue::Segment(SegmentBenefit {
            guaranteed_eq_grade: None,
            limit_multiplier: Some(1.5),
            rate_discount_pp: -0.3,
            income_smoothing_months: None,
            guarantee_link: false,
            age_min: None,
            age_max: None,
        }),
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: None,
        description: "Partner-agreement employees (per-MOU overrides apply)",
    });

    // Revolving CCF
    rows.push(SeedRow {
        key: "ccf.revolving.default",
        category: ParamCategory::Ccf,
        phase: None,
        value: ParamValue::Ccf { ratio: 0.50 },
        condition: vec![],
        from: epoch,
        to: None,
        legal_basis: Some("바젤III §90"),
        description: "Default CCF for revolving facilities",
    });

    rows.into_iter().map(SeedRow::into_param).collect()
}

/// Deterministic resolution over a set of rows, shared by the store path
/// and the compiled-default path: active rows whose window covers the
/// instant, condition-subset match, latest `effective_from` wins.
pub fn resolve_from_rows<'a>(
    rows: &'a [RegulationParam],
    param_key: &str,
    effective_at: DateTime<Utc>,
    condition: Option<&IndexMap<String, String>>,
) -> Option<&'a RegulationParam> {
    rows.iter()
        .filter(|row| row.param_key.as_str() == param_key && row.is_active)
        .filter(|row| row.covers(effective_at))
        .filter(|row| row.condition_matches(condition))
        .max_by_key(|row| row.effective_from)
}

/// Seed the store with the compiled defaults. Idempotent: existing
/// `(param_key, effective_from)` pairs are skipped.
pub async fn seed_default_params<R: RegulationParamRepository>(
    repo: &R,
) -> Result<usize, RepositoryError> {
    let mut inserted = 0;
    for param in compiled_default_params() {
        let model = RegulationMapper::to_model(&param);
        match repo.insert(&model).await {
            Ok(_) => inserted += 1,
            Err(RepositoryError::Conflict { .. }) => continue,
            Err(other) => return Err(other),
        }
    }
    tracing::info!(inserted, "regulation parameter seed complete");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_spec_key() {
        let rows = compiled_default_params();
        let keys: Vec<&str> = rows.iter().map(|r| r.param_key.as_str()).collect();
        for expected in [
            "dsr.max_ratio",
            "ltv.general",
            "ltv.regulated",
            "ltv.speculation_area",
            "rate.max_interest",
            "stress_dsr.metropolitan.variable",
            "stress_dsr.non_metropolitan.variable",
            "credit_loan.income_multiplier.employed",
            "eq_grade.benefit.EQ-S",
            "irg.pd_adjustment.VH",
            "segment.benefit.SEG-YTH",
            "ccf.revolving.default",
        ] {
            assert!(keys.contains(&expected), "missing {expected}");
        }
    }

    #[test]
    fn test_ltv_ordering_invariant() {
        let rows = compiled_default_params();
        let at = phase3_start();
        let ltv = |area: &str| {
            let mut cond = IndexMap::new();
            cond.insert("area_type".to_string(), area.to_string());
            resolve_from_rows(&rows, &format!("ltv.{area}"), at, Some(&cond))
                .and_then(|r| r.value.as_max_ratio_pct())
                .unwrap()
        };
        assert!(ltv("speculation_area") < ltv("regulated"));
        assert!(ltv("regulated") < ltv("general"));
    }

    #[test]
    fn test_phase_windows_resolve_by_date() {
        let rows = compiled_default_params();
        let mut cond = IndexMap::new();
        cond.insert("region".to_string(), "non_metropolitan".to_string());
        cond.insert("rate_type".to_string(), "variable".to_string());

        let in_phase2 = phase2_start() + chrono::Duration::days(30);
        let in_phase3 = phase3_start() + chrono::Duration::days(30);

        let p2 = resolve_from_rows(
            &rows,
            "stress_dsr.non_metropolitan.variable",
            in_phase2,
            Some(&cond),
        )
        .and_then(|r| r.value.as_rate_pp())
        .unwrap();
        let p3 = resolve_from_rows(
            &rows,
            "stress_dsr.non_metropolitan.variable",
            in_phase3,
            Some(&cond),
        )
        .and_then(|r| r.value.as_rate_pp())
        .unwrap();

        assert!((p2 - 1.50).abs() < 1e-9);
        assert!((p3 - 3.00).abs() < 1e-9);
        assert!(p3 > p2, "phase 3 add-on must exceed phase 2");
    }

    #[test]
    fn test_phase_boundary_tie_breaks_to_latest_effective_from() {
        // both windows cover the boundary instant (inclusive ends); the
        // later effective_from must win deterministically
        let rows = compiled_default_params();
        let mut cond = IndexMap::new();
        cond.insert("region".to_string(), "metropolitan".to_string());
        cond.insert("rate_type".to_string(), "variable".to_string());

        let at_boundary = phase3_start();
        let resolved = resolve_from_rows(
            &rows,
            "stress_dsr.metropolitan.variable",
            at_boundary,
            Some(&cond),
        )
        .unwrap();
        assert_eq!(resolved.phase_label.as_deref(), Some("phase3"));
    }

    #[test]
    fn test_non_metropolitan_never_below_metropolitan() {
        let rows = compiled_default_params();
        for at in [
            phase2_start() + chrono::Duration::days(1),
            phase3_start() + chrono::Duration::days(1),
        ] {
            for rate_type in ["variable", "mixed_short", "mixed_long"] {
                let lookup = |region: &str| {
                    let mut cond = IndexMap::new();
                    cond.insert("region".to_string(), region.to_string());
                    cond.insert("rate_type".to_string(), rate_type.to_string());
                    resolve_from_rows(
                        &rows,
                        &format!("stress_dsr.{region}.{rate_type}"),
                        at,
                        Some(&cond),
                    )
                    .and_then(|r| r.value.as_rate_pp())
                    .unwrap()
                };
                assert!(lookup("non_metropolitan") >= lookup("metropolitan"));
            }
        }
    }

    #[test]
    fn test_mixed_rate_types_apply_fraction_of_variable() {
        let rows = compiled_default_params();
        let at = phase3_start() + chrono::Duration::days(1);
        let lookup = |rate_type: &str| {
            let mut cond = IndexMap::new();
            cond.insert("region".to_string(), "metropolitan".to_string());
            cond.insert("rate_type".to_string(), rate_type.to_string());
            resolve_from_rows(
                &rows,
                &format!("stress_dsr.metropolitan.{rate_type}"),
                at,
                Some(&cond),
            )
            .and_then(|r| r.value.as_rate_pp())
            .unwrap()
        };
        let variable = lookup("variable");
        assert!((lookup("mixed_short") - 0.6 * variable).abs() < 1e-9);
        assert!((lookup("mixed_long") - 0.3 * variable).abs() < 1e-9);
    }

    #[test]
    fn test_every_seed_row_satisfies_two_person_rule() {
        for row in compiled_default_params() {
            assert_ne!(row.created_by.as_str(), row.approved_by.as_str());
            assert!(row.change_reason.as_deref().is_some_and(|r| !r.is_empty()));
        }
    }
}
