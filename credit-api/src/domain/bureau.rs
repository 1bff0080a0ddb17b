use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a bureau report came from within the fallback chain
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BureauSource {
    Nice,
    Kcb,
    Cached,
    Fallback,
}

impl BureauSource {
    pub fn code(&self) -> &'static str {
        match self {
            BureauSource::Nice => "nice",
            BureauSource::Kcb => "kcb",
            BureauSource::Cached => "cached",
            BureauSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for BureauSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// External credit-bureau report used as scoring input.
///
/// `conservative()` is the final fallback when NICE, KCB and the cache are
/// all unusable; it is deliberately middling so a bureau outage neither
/// waves applicants through nor hard-rejects them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BureauReport {
    pub source: BureauSource,
    /// Bureau score on the 300-1000 scale
    pub cb_score: i32,
    /// Bureau rating label; sized for two-character Korean grades
    pub credit_grade: HeaplessString<10>,
    pub delinquency_count_12m: u32,
    /// 0 = clean, 1 = 30 days, 2 = 60 days, 3 = 90+ days overdue
    pub worst_delinquency_status: u8,
    pub open_loan_count: u32,
    /// Total outstanding loan balance in KRW
    pub total_loan_balance: Decimal,
    pub inquiry_count_3m: u32,
    pub inquiry_count_6m: u32,
    pub telecom_no_delinquency: bool,
    /// Health-insurance contribution months in the last year
    pub health_insurance_paid_months_12m: u32,
    pub queried_at: DateTime<Utc>,
    pub is_fallback: bool,
    pub error_message: Option<String>,
}

pub const BUREAU_FALLBACK_SCORE: i32 = 700;
pub const BUREAU_FALLBACK_GRADE: &str = "BB";

impl BureauReport {
    pub fn conservative(queried_at: DateTime<Utc>, reason: &str) -> Self {
        BureauReport {
            source: BureauSource::Fallback,
            cb_score: BUREAU_FALLBACK_SCORE,
            credit_grade: HeaplessString::try_from(BUREAU_FALLBACK_GRADE).unwrap_or_default(),
            delinquency_count_12m: 0,
            worst_delinquency_status: 0,
            open_loan_count: 0,
            total_loan_balance: Decimal::ZERO,
            inquiry_count_3m: 0,
            inquiry_count_6m: 0,
            telecom_no_delinquency: true,
            health_insurance_paid_months_12m: 12,
            queried_at,
            is_fallback: true,
            error_message: Some(reason.to_string()),
        }
    }
}
