//! Scoring and decisioning constants.
//!
//! Regulatory ceilings (DSR/LTV limits, stress add-ons, the statutory rate
//! cap) are NOT here; they live in the parameter store and its compiled
//! default table. This module carries only the model-scale anchors and
//! internal pricing components.

/// Score at the anchor odds (base PD)
pub const SCORE_BASE: f64 = 600.0;
/// Points to double the odds
pub const SCORE_PDO: f64 = 40.0;
/// PD at the anchor score
pub const BASE_PD: f64 = 0.072;
pub const SCORE_MIN: i32 = 300;
pub const SCORE_MAX: i32 = 900;

/// Raw model probabilities are kept strictly inside (0, 1)
pub const PD_RAW_FLOOR: f64 = 1e-6;
pub const PD_RAW_CEIL: f64 = 1.0 - 1e-6;
/// Final PD after the IRG adjustment
pub const PD_FINAL_FLOOR: f64 = 1e-3;
pub const PD_FINAL_CEIL: f64 = 0.999;

/// Below this score: automatic rejection
pub const CUTOFF_REJECT: i32 = 450;
/// Below this score (and above reject): manual review
pub const CUTOFF_MANUAL: i32 = 530;

/// Statutory income floor in KRW
pub const MIN_ANNUAL_INCOME_KRW: i64 = 12_000_000;
/// Absolute micro-loan ceiling in KRW
pub const MICRO_LOAN_MAX_KRW: i64 = 30_000_000;

/// Appeal window after an adverse decision
pub const APPEAL_WINDOW_DAYS: i64 = 30;

// Rate composition, percentage points
pub const FUNDING_COST_PP: f64 = 1.2;
pub const OPERATING_COST_PP: f64 = 0.8;
/// Expected loss to spread conversion multiplier
pub const CREDIT_SPREAD_MULTIPLIER: f64 = 2.5;
/// Floor above base rate for the final offered rate
pub const MIN_MARGIN_PP: f64 = 0.5;
/// RAROC hurdle; informational, never rejects on its own
pub const RAROC_HURDLE: f64 = 0.15;

/// Reference servicing rate for DSR amortisation, percent.
/// The stress add-on is applied on top of this for the stressed ratio.
pub const DSR_REFERENCE_RATE_PCT: f64 = 5.0;

/// Basel capital ratio for economic capital
pub const CAPITAL_RATIO: f64 = 0.08;

/// Default revolving credit-conversion factor when the store has no row
pub const DEFAULT_REVOLVING_CCF: f64 = 0.50;
