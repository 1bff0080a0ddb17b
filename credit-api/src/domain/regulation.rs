use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::EqGrade;

/// One versioned row of the regulatory parameter store.
///
/// Rows are never mutated in place: supersession is a new row with a later
/// `effective_from` and the previous row's `effective_to` stamped. Every
/// write records creator and approver under the two-person rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationParam {
    pub id: Uuid,
    /// Dotted key, e.g. `stress_dsr.metropolitan.variable`
    pub param_key: HeaplessString<100>,
    pub category: ParamCategory,
    /// Policy phase for staged regulation, e.g. phase2 | phase3
    pub phase_label: Option<HeaplessString<20>>,
    pub value: ParamValue,
    /// Match-map restricting applicability, e.g. {region, rate_type}
    pub condition: Option<IndexMap<String, String>>,
    /// Inclusive start of the effective window
    pub effective_from: DateTime<Utc>,
    /// Inclusive end; None = open-ended
    pub effective_to: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub legal_basis: Option<String>,
    pub description: Option<String>,
    pub created_by: HeaplessString<50>,
    pub approved_by: HeaplessString<50>,
    pub approved_at: Option<DateTime<Utc>>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegulationParam {
    /// Whether the row's window contains the instant (both ends inclusive)
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.effective_from <= at && self.effective_to.map(|to| to >= at).unwrap_or(true)
    }

    /// Subset matching: every key of the row's condition must appear in the
    /// caller's map with an equal value. Extra caller keys are ignored; a
    /// row without a condition matches everything.
    pub fn condition_matches(&self, caller: Option<&IndexMap<String, String>>) -> bool {
        match &self.condition {
            None => true,
            Some(row_cond) => match caller {
                None => row_cond.is_empty(),
                Some(caller_map) => row_cond
                    .iter()
                    .all(|(k, v)| caller_map.get(k).map(|cv| cv == v).unwrap_or(false)),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParamCategory {
    Dsr,
    Ltv,
    Rate,
    Limit,
    EqGrade,
    Irg,
    Segment,
    Ccf,
    Policy,
}

impl ParamCategory {
    pub fn code(&self) -> &'static str {
        match self {
            ParamCategory::Dsr => "dsr",
            ParamCategory::Ltv => "ltv",
            ParamCategory::Rate => "rate",
            ParamCategory::Limit => "limit",
            ParamCategory::EqGrade => "eq_grade",
            ParamCategory::Irg => "irg",
            ParamCategory::Segment => "segment",
            ParamCategory::Ccf => "ccf",
            ParamCategory::Policy => "policy",
        }
    }

    pub fn parse(code: &str) -> Option<ParamCategory> {
        match code {
            "dsr" => Some(ParamCategory::Dsr),
            "ltv" => Some(ParamCategory::Ltv),
            "rate" => Some(ParamCategory::Rate),
            "limit" => Some(ParamCategory::Limit),
            "eq_grade" => Some(ParamCategory::EqGrade),
            "irg" => Some(ParamCategory::Irg),
            "segment" => Some(ParamCategory::Segment),
            "ccf" => Some(ParamCategory::Ccf),
            "policy" => Some(ParamCategory::Policy),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Structured parameter value. Resolution returns the variant and the
/// caller matches on it; there is no dynamic field access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamValue {
    /// Rate add-on in percentage points, with the share actually applied
    /// (mixed rate types apply a fraction of the variable add-on)
    Rate { rate_pp: f64, apply_ratio: f64 },
    /// Ceiling ratio in percent, optionally penalised for multi-owners
    Ratio {
        max_ratio_pct: f64,
        multi_owner_deduction_pp: Option<f64>,
    },
    /// Income or limit multiplier
    Multiplier { times: f64 },
    /// EQ-grade benefit pair
    EqBenefit {
        limit_multiplier: f64,
        rate_adjustment_pp: f64,
    },
    /// Multiplicative PD adjustment ratio
    PdAdjustment { adjustment: f64 },
    Segment(SegmentBenefit),
    /// Credit conversion factor
    Ccf { ratio: f64 },
    /// Escape hatch for simple scalar bags (e.g. policy switches)
    Raw(IndexMap<String, f64>),
}

impl ParamValue {
    pub fn as_rate_pp(&self) -> Option<f64> {
        match self {
            ParamValue::Rate { rate_pp, apply_ratio } => Some(rate_pp * apply_ratio),
            _ => None,
        }
    }

    pub fn as_max_ratio_pct(&self) -> Option<f64> {
        match self {
            ParamValue::Ratio { max_ratio_pct, .. } => Some(*max_ratio_pct),
            _ => None,
        }
    }
}

/// Codified preferential terms for a borrower segment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentBenefit {
    /// Minimum EQ grade guaranteed during evaluation
    pub guaranteed_eq_grade: Option<EqGrade>,
    pub limit_multiplier: Option<f64>,
    /// Non-positive rate discount in percentage points
    pub rate_discount_pp: f64,
    /// Artist segment: average income over this many months
    pub income_smoothing_months: Option<u32>,
    pub guarantee_link: bool,
    pub age_min: Option<u8>,
    pub age_max: Option<u8>,
}

/// EQ-grade benefit pair resolved from the store or master table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EqGradeBenefit {
    pub limit_multiplier: f64,
    pub rate_adjustment_pp: f64,
}

/// Mortgage collateral area classification for LTV limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AreaType {
    General,
    Regulated,
    SpeculationArea,
}

impl AreaType {
    pub fn as_param_suffix(&self) -> &'static str {
        match self {
            AreaType::General => "general",
            AreaType::Regulated => "regulated",
            AreaType::SpeculationArea => "speculation_area",
        }
    }

    /// Area classification from the collateral flags; speculation takes
    /// precedence over regulated.
    pub fn classify(is_regulated: bool, is_speculation: bool) -> AreaType {
        if is_speculation {
            AreaType::SpeculationArea
        } else if is_regulated {
            AreaType::Regulated
        } else {
            AreaType::General
        }
    }
}

/// Parameter creation request. The two-person rule (`approved_by` must
/// differ from `created_by`) is enforced by the admin service on top of the
/// field-level validation here.
#[derive(Debug, Clone, Validate)]
pub struct CreateParamRequest {
    #[validate(length(min = 1, max = 100))]
    pub param_key: String,
    pub category: ParamCategory,
    pub phase_label: Option<String>,
    pub value: ParamValue,
    pub condition: Option<IndexMap<String, String>>,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    #[validate(length(max = 200))]
    pub legal_basis: Option<String>,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub created_by: String,
    #[validate(length(min = 1, max = 50))]
    pub approved_by: String,
    #[validate(length(min = 1))]
    pub change_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_condition(pairs: &[(&str, &str)]) -> RegulationParam {
        RegulationParam {
            id: Uuid::new_v4(),
            param_key: HeaplessString::try_from("stress_dsr.metropolitan.variable").unwrap(),
            category: ParamCategory::Dsr,
            phase_label: None,
            value: ParamValue::Rate {
                rate_pp: 0.75,
                apply_ratio: 1.0,
            },
            condition: if pairs.is_empty() {
                None
            } else {
                Some(
                    pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                )
            },
            effective_from: Utc::now(),
            effective_to: None,
            is_active: true,
            legal_basis: None,
            description: None,
            created_by: HeaplessString::try_from("ops.kim").unwrap(),
            approved_by: HeaplessString::try_from("risk.lee").unwrap(),
            approved_at: Some(Utc::now()),
            change_reason: Some("seed".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_condition_subset_matching() {
        let row = row_with_condition(&[("region", "metropolitan"), ("rate_type", "variable")]);

        let mut caller = IndexMap::new();
        caller.insert("region".to_string(), "metropolitan".to_string());
        caller.insert("rate_type".to_string(), "variable".to_string());
        caller.insert("channel".to_string(), "digital".to_string());
        // extra caller keys are ignored
        assert!(row.condition_matches(Some(&caller)));

        caller.insert("rate_type".to_string(), "fixed".to_string());
        assert!(!row.condition_matches(Some(&caller)));

        // a conditioned row does not match an unconditioned lookup
        assert!(!row.condition_matches(None));

        let unconditioned = row_with_condition(&[]);
        assert!(unconditioned.condition_matches(None));
        assert!(unconditioned.condition_matches(Some(&caller)));
    }

    #[test]
    fn test_effective_window_is_inclusive() {
        let mut row = row_with_condition(&[]);
        let from = row.effective_from;
        row.effective_to = Some(from + chrono::Duration::days(30));

        assert!(row.covers(from));
        assert!(row.covers(from + chrono::Duration::days(30)));
        assert!(!row.covers(from - chrono::Duration::seconds(1)));
        assert!(!row.covers(from + chrono::Duration::days(31)));
    }

    #[test]
    fn test_area_type_precedence() {
        assert_eq!(AreaType::classify(true, true), AreaType::SpeculationArea);
        assert_eq!(AreaType::classify(true, false), AreaType::Regulated);
        assert_eq!(AreaType::classify(false, false), AreaType::General);
    }
}
