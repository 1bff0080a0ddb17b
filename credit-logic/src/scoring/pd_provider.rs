//! Probability-of-default providers.
//!
//! Two implementations share one contract: a feature vector in, a raw
//! default probability strictly inside (1e-6, 1 - 1e-6) out, bit-identical
//! for identical inputs. The trained scorer is an additive binary-logit
//! tree ensemble loaded from a JSON artifact; the statistical model is the
//! logistic fallback used when no artifact is present and as the test
//! oracle.

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use credit_api::domain::{ApplicantKind, EmploymentKind};
use credit_api::{CreditError, CreditResult};

use crate::constants::{PD_RAW_CEIL, PD_RAW_FLOOR};

/// Scoring features assembled by the decision engine from the applicant,
/// the application and the bureau report
#[derive(Debug, Clone)]
pub struct FeatureVector {
    pub cb_score: f64,
    pub delinquency_count_12m: f64,
    pub worst_delinquency_status: f64,
    pub open_loan_count: f64,
    pub total_loan_balance: f64,
    pub inquiry_count_3m: f64,
    pub annual_income: f64,
    pub requested_amount: f64,
    pub requested_term_months: u32,
    pub existing_monthly_payment: f64,
    pub age: f64,
    pub employment_kind: EmploymentKind,
    pub applicant_kind: ApplicantKind,
    pub telecom_no_delinquency: bool,
    pub health_insurance_paid_months_12m: f64,
    pub business_duration_months: f64,
    pub tax_filings_3y: f64,
}

impl FeatureVector {
    /// Value by manifest name; ordering for the trained scorer is fixed by
    /// the artifact's feature-names manifest, not by this struct.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "cb_score" => Some(self.cb_score),
            "delinquency_count_12m" => Some(self.delinquency_count_12m),
            "worst_delinquency_status" => Some(self.worst_delinquency_status),
            "open_loan_count" => Some(self.open_loan_count),
            "total_loan_balance_m" => Some(self.total_loan_balance / 1_000_000.0),
            "inquiry_count_3m" => Some(self.inquiry_count_3m),
            "annual_income_m" => Some(self.annual_income / 1_000_000.0),
            "requested_amount_m" => Some(self.requested_amount / 1_000_000.0),
            "age" => Some(self.age),
            "is_employed" => Some(if self.employment_kind == EmploymentKind::Employed {
                1.0
            } else {
                0.0
            }),
            "is_sole_proprietor" => Some(if self.applicant_kind == ApplicantKind::SoleProprietor {
                1.0
            } else {
                0.0
            }),
            "telecom_no_delinquency" => Some(if self.telecom_no_delinquency { 1.0 } else { 0.0 }),
            "health_insurance_paid_months_12m" => Some(self.health_insurance_paid_months_12m),
            _ => None,
        }
    }
}

/// One additive feature contribution in log-odds space, used for the
/// explanation factors when the model exposes them
#[derive(Debug, Clone)]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: f64,
}

pub trait PdProvider: Send + Sync {
    /// Raw 12-month default probability, strictly inside (1e-6, 1 - 1e-6)
    fn raw_probability(&self, features: &FeatureVector) -> f64;

    fn model_version(&self) -> &str;

    /// Per-feature attribution when the scorer can produce one; the engine
    /// falls back to the documented heuristic otherwise
    fn contributions(&self, _features: &FeatureVector) -> Option<Vec<FeatureContribution>> {
        None
    }
}

fn sigmoid(log_odds: f64) -> f64 {
    1.0 / (1.0 + (-log_odds).exp())
}

fn clamp_raw(pd: f64) -> f64 {
    pd.clamp(PD_RAW_FLOOR, PD_RAW_CEIL)
}

// ============================================================================
// STATISTICAL FALLBACK
// ============================================================================

/// Logistic approximation used when no trained artifact is deployed.
#[derive(Debug, Clone, Default)]
pub struct StatisticalModel;

pub const STATISTICAL_MODEL_VERSION: &str = "stat-v1.0";

impl StatisticalModel {
    fn log_odds(&self, v: &FeatureVector) -> f64 {
        let mut log_odds = -3.5;

        // bureau score effect, anchored at 700
        log_odds += (v.cb_score - 700.0) / 100.0 * (-1.8);

        // delinquency history
        log_odds += 0.6 * v.delinquency_count_12m;
        log_odds += 0.8 * v.worst_delinquency_status;

        // debt-service pressure above the 40% line
        let monthly_income = v.annual_income / 12.0;
        let new_monthly = crate::scoring::monthly_payment(
            v.requested_amount,
            crate::constants::DSR_REFERENCE_RATE_PCT,
            v.requested_term_months,
        );
        let dsr = crate::scoring::dsr_pct(monthly_income, new_monthly, v.existing_monthly_payment);
        let dsr_excess = if dsr.is_finite() { (dsr - 40.0).max(0.0) } else { 999.0 };
        log_odds += 0.03 * dsr_excess;

        // income suppression, pivot 50M KRW
        log_odds += 0.5 * (1.0 + 50_000_000.0 / v.annual_income.max(1.0)).ln();

        // recent inquiries
        log_odds += 0.3 * v.inquiry_count_3m;

        // alternative data
        log_odds -= 0.3 * if v.telecom_no_delinquency { 1.0 } else { 0.0 };
        log_odds -= 0.4 * (v.health_insurance_paid_months_12m / 12.0);

        // sole-proprietor surcharge
        if v.applicant_kind == ApplicantKind::SoleProprietor {
            log_odds += 0.3;
            if v.business_duration_months < 24.0 {
                log_odds += 0.4;
            }
            if v.tax_filings_3y < 2.0 {
                log_odds += 0.3;
            }
        }

        log_odds
    }
}

impl PdProvider for StatisticalModel {
    fn raw_probability(&self, features: &FeatureVector) -> f64 {
        clamp_raw(sigmoid(self.log_odds(features)))
    }

    fn model_version(&self) -> &str {
        STATISTICAL_MODEL_VERSION
    }
}

// ============================================================================
// TRAINED TREE-ENSEMBLE SCORER
// ============================================================================

/// One node of a regression tree in the serialized artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn eval(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let x = row.get(*feature).copied().unwrap_or(0.0);
                if x <= *threshold {
                    left.eval(row)
                } else {
                    right.eval(row)
                }
            }
        }
    }
}

/// Serialized scorecard artifact: binary-logit boosted trees plus the
/// feature-names manifest fixing input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardArtifact {
    pub version: String,
    pub feature_names: Vec<String>,
    /// Intercept in log-odds space
    pub base_score: f64,
    pub trees: Vec<TreeNode>,
}

/// Boosted-tree scorer loaded from `application_scorecard.json`
#[derive(Debug, Clone)]
pub struct GradientBoostedModel {
    artifact: ScorecardArtifact,
}

impl GradientBoostedModel {
    pub fn from_artifact(artifact: ScorecardArtifact) -> CreditResult<Self> {
        // every manifest name must resolve against the feature vector;
        // catching a typo here beats silently scoring zeros later
        let probe = FeatureVector {
            cb_score: 700.0,
            delinquency_count_12m: 0.0,
            worst_delinquency_status: 0.0,
            open_loan_count: 0.0,
            total_loan_balance: 0.0,
            inquiry_count_3m: 0.0,
            annual_income: 1.0,
            requested_amount: 0.0,
            requested_term_months: 12,
            existing_monthly_payment: 0.0,
            age: 30.0,
            employment_kind: EmploymentKind::Employed,
            applicant_kind: ApplicantKind::Individual,
            telecom_no_delinquency: true,
            health_insurance_paid_months_12m: 12.0,
            business_duration_months: 0.0,
            tax_filings_3y: 0.0,
        };
        for name in &artifact.feature_names {
            if probe.get(name).is_none() {
                return Err(CreditError::ValidationError {
                    field: "feature_names".to_string(),
                    message: format!("unknown feature in manifest: {name}"),
                });
            }
        }
        Ok(Self { artifact })
    }

    pub fn load(artifacts_dir: &Path) -> CreditResult<Self> {
        let path = artifacts_dir.join("application_scorecard.json");
        let raw = std::fs::read_to_string(&path).map_err(|e| CreditError::ValidationError {
            field: "model_artifacts_path".to_string(),
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let artifact: ScorecardArtifact =
            serde_json::from_str(&raw).map_err(|e| CreditError::ValidationError {
                field: "application_scorecard.json".to_string(),
                message: e.to_string(),
            })?;
        Self::from_artifact(artifact)
    }

    fn row(&self, features: &FeatureVector) -> Vec<f64> {
        self.artifact
            .feature_names
            .iter()
            .map(|name| features.get(name).unwrap_or(0.0))
            .collect()
    }
}

impl PdProvider for GradientBoostedModel {
    fn raw_probability(&self, features: &FeatureVector) -> f64 {
        let row = self.row(features);
        let raw: f64 = self.artifact.base_score
            + self.artifact.trees.iter().map(|t| t.eval(&row)).sum::<f64>();
        clamp_raw(sigmoid(raw))
    }

    fn model_version(&self) -> &str {
        &self.artifact.version
    }
}

// ============================================================================
// SWAPPABLE MODEL HANDLE
// ============================================================================

/// Process-wide handle to the active PD model.
///
/// `current()` hands out the `Arc` an evaluation keeps for its whole run, so
/// a concurrent `swap` never changes a result mid-flight and
/// `ScoringResult.model_version` reflects the version the evaluation
/// started with.
pub struct PdModelHandle {
    inner: RwLock<Arc<dyn PdProvider>>,
}

impl PdModelHandle {
    pub fn new(provider: Arc<dyn PdProvider>) -> Self {
        Self {
            inner: RwLock::new(provider),
        }
    }

    /// Statistical fallback when no artifact directory is usable
    pub fn statistical() -> Self {
        Self::new(Arc::new(StatisticalModel))
    }

    /// Load the trained artifact if present, else fall back to the
    /// statistical model
    pub fn from_artifacts_dir(dir: &Path) -> Self {
        match GradientBoostedModel::load(dir) {
            Ok(model) => {
                tracing::info!(version = model.model_version(), "scorecard artifact loaded");
                Self::new(Arc::new(model))
            }
            Err(err) => {
                tracing::info!(%err, "no usable scorecard artifact, statistical fallback active");
                Self::statistical()
            }
        }
    }

    pub fn current(&self) -> Arc<dyn PdProvider> {
        self.inner
            .read()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_else(|poisoned| Arc::clone(&poisoned.into_inner()))
    }

    /// Atomically swap the active model; in-flight evaluations complete on
    /// the version they started with
    pub fn swap(&self, provider: Arc<dyn PdProvider>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = provider,
            Err(poisoned) => *poisoned.into_inner() = provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prime_features() -> FeatureVector {
        FeatureVector {
            cb_score: 850.0,
            delinquency_count_12m: 0.0,
            worst_delinquency_status: 0.0,
            open_loan_count: 1.0,
            total_loan_balance: 0.0,
            inquiry_count_3m: 0.0,
            annual_income: 80_000_000.0,
            requested_amount: 30_000_000.0,
            requested_term_months: 36,
            existing_monthly_payment: 0.0,
            age: 38.0,
            employment_kind: EmploymentKind::Employed,
            applicant_kind: ApplicantKind::Individual,
            telecom_no_delinquency: true,
            health_insurance_paid_months_12m: 12.0,
            business_duration_months: 0.0,
            tax_filings_3y: 0.0,
        }
    }

    #[test]
    fn test_statistical_model_is_deterministic_and_bounded() {
        let model = StatisticalModel;
        let a = model.raw_probability(&prime_features());
        let b = model.raw_probability(&prime_features());
        assert_eq!(a.to_bits(), b.to_bits(), "identical inputs must be bit-identical");
        assert!(a > PD_RAW_FLOOR && a < PD_RAW_CEIL);
        // prime profile sits deep in the low-risk tail
        assert!(a < 0.01, "prime borrower pd was {a}");
    }

    #[test]
    fn test_statistical_model_orders_risk_sensibly() {
        let model = StatisticalModel;
        let prime = model.raw_probability(&prime_features());

        let mut delinquent = prime_features();
        delinquent.cb_score = 480.0;
        delinquent.worst_delinquency_status = 3.0;
        delinquent.delinquency_count_12m = 2.0;
        let risky = model.raw_probability(&delinquent);

        assert!(risky > prime * 100.0, "delinquent {risky} vs prime {prime}");
    }

    #[test]
    fn test_sole_proprietor_surcharge_applies() {
        let model = StatisticalModel;
        let individual = model.raw_probability(&prime_features());

        let mut soho = prime_features();
        soho.applicant_kind = ApplicantKind::SoleProprietor;
        soho.business_duration_months = 12.0;
        soho.tax_filings_3y = 1.0;
        let soho_pd = model.raw_probability(&soho);

        // +0.3 base, +0.4 short tenure, +0.3 thin filings = +1.0 log-odds
        let expected_ratio = 1.0f64.exp();
        let ratio = (soho_pd / (1.0 - soho_pd)) / (individual / (1.0 - individual));
        assert!((ratio - expected_ratio).abs() < 0.01, "odds ratio {ratio}");
    }

    #[test]
    fn test_tree_artifact_scoring_and_manifest_validation() {
        let artifact = ScorecardArtifact {
            version: "app-v2.1".to_string(),
            feature_names: vec!["cb_score".to_string(), "inquiry_count_3m".to_string()],
            base_score: -3.0,
            trees: vec![TreeNode::Split {
                feature: 0,
                threshold: 700.0,
                left: Box::new(TreeNode::Leaf { value: 0.8 }),
                right: Box::new(TreeNode::Leaf { value: -0.9 }),
            }],
        };
        let model = GradientBoostedModel::from_artifact(artifact).unwrap();

        let strong = model.raw_probability(&prime_features());
        let mut weak_features = prime_features();
        weak_features.cb_score = 600.0;
        let weak = model.raw_probability(&weak_features);
        assert!(strong < weak);
        assert!((strong - sigmoid(-3.9)).abs() < 1e-12);
        assert_eq!(model.model_version(), "app-v2.1");

        let bad = ScorecardArtifact {
            version: "x".to_string(),
            feature_names: vec!["no_such_feature".to_string()],
            base_score: 0.0,
            trees: vec![],
        };
        assert!(GradientBoostedModel::from_artifact(bad).is_err());
    }

    #[test]
    fn test_handle_swap_is_atomic_for_holders() {
        let handle = PdModelHandle::statistical();
        let held = handle.current();
        assert_eq!(held.model_version(), STATISTICAL_MODEL_VERSION);

        let artifact = ScorecardArtifact {
            version: "app-v2.1".to_string(),
            feature_names: vec!["cb_score".to_string()],
            base_score: -3.0,
            trees: vec![],
        };
        handle.swap(Arc::new(GradientBoostedModel::from_artifact(artifact).unwrap()));

        // the held reference still scores with the old version
        assert_eq!(held.model_version(), STATISTICAL_MODEL_VERSION);
        assert_eq!(handle.current().model_version(), "app-v2.1");
    }
}
