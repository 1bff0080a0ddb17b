use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};

/// Population-stability bands: < 0.10 green, < 0.20 yellow, else red
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PsiStatus {
    Green,
    Yellow,
    Red,
}

impl PsiStatus {
    pub fn from_value(psi: f64) -> PsiStatus {
        if psi < 0.10 {
            PsiStatus::Green
        } else if psi < 0.20 {
            PsiStatus::Yellow
        } else {
            PsiStatus::Red
        }
    }
}

impl std::fmt::Display for PsiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PsiStatus::Green => write!(f, "green"),
            PsiStatus::Yellow => write!(f, "yellow"),
            PsiStatus::Red => write!(f, "red"),
        }
    }
}

/// Whether a report was computed from persisted decisions or synthetic
/// demo distributions (fewer than 100 realised outcomes available)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSource {
    Database,
    Demo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsiBin {
    pub bin: usize,
    /// None for the unbounded outer edges
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub ref_pct: f64,
    pub cur_pct: f64,
    pub psi_contribution: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsiReport {
    pub value: f64,
    pub status: PsiStatus,
    pub bins: Vec<PsiBin>,
    pub n_reference: usize,
    pub n_current: usize,
    pub data_source: DataSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityBin {
    pub bin: usize,
    pub lower: f64,
    pub upper: f64,
    pub mean_predicted_prob: Option<f64>,
    pub fraction_of_positives: Option<f64>,
    pub n_samples: usize,
    pub calibration_gap: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CalibrationStatus {
    Pass,
    Warning,
    Fail,
}

/// ECE / Brier calibration report. Pass thresholds: ECE <= 0.02,
/// Brier <= 0.07.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub ece: f64,
    pub brier_score: f64,
    pub ece_status: CalibrationStatus,
    pub n_bins: usize,
    pub n_samples: usize,
    pub reliability_diagram: Vec<ReliabilityBin>,
    pub data_source: DataSource,
}

pub const ECE_PASS_THRESHOLD: f64 = 0.02;
pub const ECE_WARNING_THRESHOLD: f64 = 0.05;
pub const BRIER_PASS_THRESHOLD: f64 = 0.07;

impl CalibrationReport {
    pub fn status_for(ece: f64) -> CalibrationStatus {
        if ece <= ECE_PASS_THRESHOLD {
            CalibrationStatus::Pass
        } else if ece <= ECE_WARNING_THRESHOLD {
            CalibrationStatus::Warning
        } else {
            CalibrationStatus::Fail
        }
    }
}

/// Cumulative bad rates for one origination cohort at the tracked
/// months-on-book checkpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortCurve {
    /// Origination month, YYYY-MM
    pub cohort_month: HeaplessString<7>,
    pub n_accounts: usize,
    /// (months_on_book, cumulative 90+ DPD rate)
    pub checkpoints: Vec<(u32, f64)>,
}

/// Monthly delinquency-bucket transition rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollRateMatrix {
    pub current_to_dpd30: f64,
    pub dpd30_to_dpd60: f64,
    pub dpd60_to_dpd90: f64,
    pub dpd90_to_default: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VintageReport {
    pub cohorts: Vec<CohortCurve>,
    pub roll_rates: RollRateMatrix,
    pub data_source: DataSource,
}

/// Aggregate monitoring report over all computed indicators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub computed_at: DateTime<Utc>,
    pub model_version: Option<HeaplessString<30>>,
    pub overall_status: PsiStatus,
    pub score_psi: PsiReport,
    pub feature_psi: Vec<(String, PsiReport)>,
    pub calibration: CalibrationReport,
    /// Root-cause analysis required when any indicator leaves green
    pub rca_required: bool,
}
