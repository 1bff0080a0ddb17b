//! Pure scoring primitives.
//!
//! Deterministic, side-effect-free numeric transforms shared by the
//! decision engine and the monitors. Ratios are expressed in percent to
//! match the parameter store's limit units; rounding happens only at the
//! storage boundary, never mid-pipeline.

use credit_api::domain::{CreditGrade, ProductKind};

use crate::constants::{
    BASE_PD, CAPITAL_RATIO, PD_RAW_CEIL, PD_RAW_FLOOR, SCORE_BASE, SCORE_MAX, SCORE_MIN, SCORE_PDO,
};

fn odds(pd: f64) -> f64 {
    pd / (1.0 - pd)
}

/// PD to score on the 300-900 scale.
///
/// score = SCORE_BASE - (PDO / ln 2) * ln(odds(pd) / odds(BASE_PD)),
/// rounded half-away-from-zero and clamped to the scale. Input outside
/// (1e-6, 1-1e-6) is clamped before the logarithm.
pub fn pd_to_score(pd: f64) -> i32 {
    let pd = pd.clamp(PD_RAW_FLOOR, PD_RAW_CEIL);
    let score = SCORE_BASE - (SCORE_PDO / std::f64::consts::LN_2) * (odds(pd) / odds(BASE_PD)).ln();
    (score.round() as i32).clamp(SCORE_MIN, SCORE_MAX)
}

/// Grade bands are closed intervals covering [300, 900] with no gaps.
/// 600 sits at the top of B; 900 is AAA, 300 is D.
const GRADE_BANDS: [(CreditGrade, i32, i32); 10] = [
    (CreditGrade::Aaa, 870, 900),
    (CreditGrade::Aa, 840, 869),
    (CreditGrade::A, 805, 839),
    (CreditGrade::Bbb, 750, 804),
    (CreditGrade::Bb, 665, 749),
    (CreditGrade::B, 600, 664),
    (CreditGrade::Ccc, 515, 599),
    (CreditGrade::Cc, 445, 514),
    (CreditGrade::C, 351, 444),
    (CreditGrade::D, 300, 350),
];

pub fn score_to_grade(score: i32) -> CreditGrade {
    let score = score.clamp(SCORE_MIN, SCORE_MAX);
    for (grade, lower, upper) in GRADE_BANDS {
        if score >= lower && score <= upper {
            return grade;
        }
    }
    CreditGrade::D
}

/// Amortised monthly payment.
///
/// Zero rate degrades to linear division; zero principal or non-positive
/// term returns zero.
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, months: u32) -> f64 {
    if principal <= 0.0 || months == 0 {
        return 0.0;
    }
    let monthly_rate = annual_rate_pct / 100.0 / 12.0;
    if monthly_rate <= 0.0 {
        return principal / months as f64;
    }
    principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-(months as i32)))
}

/// Debt-service ratio in percent: annual debt service over annual income.
/// Non-positive income yields positive infinity so every limit check
/// trips.
pub fn dsr_pct(monthly_income: f64, new_monthly_payment: f64, existing_monthly_payment: f64) -> f64 {
    if monthly_income <= 0.0 {
        return f64::INFINITY;
    }
    (new_monthly_payment + existing_monthly_payment) / monthly_income * 100.0
}

/// Loan-to-value in percent; absent when there is no usable collateral
pub fn ltv_pct(loan_amount: f64, collateral_value: f64) -> Option<f64> {
    if collateral_value <= 0.0 {
        return None;
    }
    Some(loan_amount / collateral_value * 100.0)
}

/// EAD for term products: the requested principal is drawn at once
pub fn ead_for_product(product: ProductKind, requested_amount: f64) -> f64 {
    match product {
        ProductKind::Credit | ProductKind::Mortgage | ProductKind::Micro
        | ProductKind::CreditSoho => requested_amount,
    }
}

/// EAD for revolving facilities: drawn balance plus the credit-conversion
/// factor applied to the undrawn line
pub fn revolving_ead(current_balance: f64, credit_line: f64, ccf: f64) -> f64 {
    current_balance + ccf * (credit_line - current_balance).max(0.0)
}

/// Loss given default by product
pub fn lgd_for_product(product: ProductKind) -> f64 {
    match product {
        ProductKind::Credit => 0.45,
        ProductKind::CreditSoho => 0.50,
        ProductKind::Mortgage => 0.25,
        ProductKind::Micro => 0.60,
    }
}

/// Standardised risk weight by product
pub fn risk_weight_for_product(product: ProductKind) -> f64 {
    match product {
        ProductKind::Credit | ProductKind::CreditSoho => 0.75,
        ProductKind::Mortgage => 0.35,
        ProductKind::Micro => 1.00,
    }
}

/// Economic capital: EAD x RW x 8%
pub fn economic_capital(ead: f64, risk_weight: f64) -> f64 {
    ead * risk_weight * CAPITAL_RATIO
}

/// Round a rate to the four-decimal storage convention
pub fn round_rate(rate: f64) -> f64 {
    (rate * 10_000.0).round() / 10_000.0
}

/// Round a probability to six decimals for storage
pub fn round_probability(p: f64) -> f64 {
    (p * 1_000_000.0).round() / 1_000_000.0
}
