//! Rate decomposition and RAROC.
//!
//! Builds the offered-rate breakdown under the statutory cap and verifies
//! the risk-adjusted-return hurdle at the final rate. The hurdle flag is
//! informational and stored; it never rejects on its own.

use crate::constants::{
    CREDIT_SPREAD_MULTIPLIER, FUNDING_COST_PP, MIN_MARGIN_PP, OPERATING_COST_PP, RAROC_HURDLE,
};
use crate::scoring::primitives::round_rate;
use credit_api::domain::RateBreakdown;

/// Inputs to one rate composition, all rates in percentage points
#[derive(Debug, Clone)]
pub struct RateInputs {
    pub pd: f64,
    pub lgd: f64,
    /// Exposure at default, KRW
    pub ead: f64,
    /// Economic capital, KRW
    pub economic_capital: f64,
    pub base_rate: f64,
    /// Statutory cap resolved from the parameter store
    pub statutory_cap: f64,
    pub eq_rate_adjustment: f64,
    pub segment_discount: f64,
    pub relationship_discount: f64,
}

/// Compose the offered rate.
///
/// final = clamp(base + spread + funding + operating + eq + segment +
/// relationship, base + 0.5, cap). The cap is applied before the floor so
/// a heavily discounted rate can never undercut base + 0.5.
pub fn compose_rate(inputs: &RateInputs) -> RateBreakdown {
    let expected_loss = inputs.pd * inputs.lgd;
    let credit_spread = round_rate(expected_loss * 100.0 * CREDIT_SPREAD_MULTIPLIER);

    let raw_rate = inputs.base_rate
        + credit_spread
        + FUNDING_COST_PP
        + OPERATING_COST_PP
        + inputs.eq_rate_adjustment
        + inputs.segment_discount
        + inputs.relationship_discount;

    let rate_capped = raw_rate > inputs.statutory_cap;
    let final_rate = raw_rate
        .min(inputs.statutory_cap)
        .max(inputs.base_rate + MIN_MARGIN_PP);

    // RAROC = (net interest - expected loss) / economic capital
    let net_interest = final_rate / 100.0 * inputs.ead;
    let el_amount = expected_loss * inputs.ead;
    let raroc = if inputs.economic_capital > 0.0 {
        (net_interest - el_amount) / inputs.economic_capital
    } else {
        0.0
    };

    RateBreakdown {
        base_rate: round_rate(inputs.base_rate),
        credit_spread,
        funding_cost: FUNDING_COST_PP,
        operating_cost: OPERATING_COST_PP,
        eq_adjustment: round_rate(inputs.eq_rate_adjustment),
        segment_discount: round_rate(inputs.segment_discount),
        relationship_discount: round_rate(inputs.relationship_discount),
        final_rate: round_rate(final_rate),
        rate_capped,
        raroc_at_final_rate: round_rate(raroc),
        hurdle_rate_satisfied: raroc >= RAROC_HURDLE,
    }
}
