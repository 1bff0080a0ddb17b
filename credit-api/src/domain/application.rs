use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{EqGrade, IrgGrade, SegmentBenefit};

/// One origination session for a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub product: ProductKind,
    /// Requested principal in KRW
    pub requested_amount: Decimal,
    pub requested_term_months: u32,
    pub step: ApplicationStep,
    pub status: ApplicationStatus,
    /// Present iff `product` is `Mortgage`
    pub mortgage: Option<MortgageDetails>,
    pub debt_profile: DebtProfile,
    pub stress_dsr_region: StressDsrRegion,
    pub rate_type: RateType,
    /// Every regulatory value resolved during the last evaluation
    pub regulation_snapshot: Option<RegulationSnapshot>,
    pub channel: Channel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProductKind {
    Credit,
    Mortgage,
    Micro,
    CreditSoho,
}

impl ProductKind {
    pub fn code(&self) -> &'static str {
        match self {
            ProductKind::Credit => "credit",
            ProductKind::Mortgage => "mortgage",
            ProductKind::Micro => "micro",
            ProductKind::CreditSoho => "credit_soho",
        }
    }

    pub fn parse(code: &str) -> Option<ProductKind> {
        match code {
            "credit" => Some(ProductKind::Credit),
            "mortgage" => Some(ProductKind::Mortgage),
            "micro" => Some(ProductKind::Micro),
            "credit_soho" => Some(ProductKind::CreditSoho),
            _ => None,
        }
    }

    /// Unsecured products take the income-multiplier cap
    pub fn is_unsecured(&self) -> bool {
        matches!(self, ProductKind::Credit | ProductKind::CreditSoho)
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Linear application journey; steps only advance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApplicationStep {
    IdentityVerify,
    Consent,
    BasicInfo,
    FinancialInfo,
    ProductSelect,
    Review,
    Submit,
}

impl ApplicationStep {
    pub fn next(&self) -> Option<ApplicationStep> {
        match self {
            ApplicationStep::IdentityVerify => Some(ApplicationStep::Consent),
            ApplicationStep::Consent => Some(ApplicationStep::BasicInfo),
            ApplicationStep::BasicInfo => Some(ApplicationStep::FinancialInfo),
            ApplicationStep::FinancialInfo => Some(ApplicationStep::ProductSelect),
            ApplicationStep::ProductSelect => Some(ApplicationStep::Review),
            ApplicationStep::Review => Some(ApplicationStep::Submit),
            ApplicationStep::Submit => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    ManualReview,
    Suspended,
}

impl ApplicationStatus {
    /// Forward-only transitions; `Suspended` is terminal and reachable from
    /// any non-terminal state via an early-warning event.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (Pending, UnderReview) => true,
            (UnderReview, Approved) | (UnderReview, Rejected) | (UnderReview, ManualReview) => true,
            (ManualReview, Approved) | (ManualReview, Rejected) => true,
            (Pending, Suspended) | (UnderReview, Suspended) | (ManualReview, Suspended) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Suspended
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::ManualReview => "manual_review",
            ApplicationStatus::Suspended => "suspended",
        }
    }

    pub fn parse(code: &str) -> Option<ApplicationStatus> {
        match code {
            "pending" => Some(ApplicationStatus::Pending),
            "under_review" => Some(ApplicationStatus::UnderReview),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            "manual_review" => Some(ApplicationStatus::ManualReview),
            "suspended" => Some(ApplicationStatus::Suspended),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Stress-DSR regional split per the supervisory guideline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StressDsrRegion {
    Metropolitan,
    NonMetropolitan,
}

impl StressDsrRegion {
    pub fn as_param_suffix(&self) -> &'static str {
        match self {
            StressDsrRegion::Metropolitan => "metropolitan",
            StressDsrRegion::NonMetropolitan => "non_metropolitan",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RateType {
    Variable,
    /// Mixed with fixed period under five years
    MixedShort,
    /// Mixed with fixed period of five years or more
    MixedLong,
    Fixed,
}

impl RateType {
    pub fn as_param_suffix(&self) -> &'static str {
        match self {
            RateType::Variable => "variable",
            RateType::MixedShort => "mixed_short",
            RateType::MixedLong => "mixed_long",
            RateType::Fixed => "fixed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Channel {
    Digital,
    Branch,
    Phone,
}

/// Mortgage-only collateral block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageDetails {
    /// Appraised collateral value in KRW
    pub collateral_value: Decimal,
    pub is_regulated_area: bool,
    pub is_speculation_area: bool,
    pub owned_property_count: u32,
}

/// Existing debt-service inputs for DSR and revolving EAD
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebtProfile {
    /// Monthly principal-and-interest on existing loans, KRW
    pub existing_monthly_payment: Decimal,
    /// Total revolving credit line, KRW
    pub existing_credit_line: Decimal,
    /// Drawn revolving balance, KRW
    pub existing_credit_balance: Decimal,
}

/// Structured record of every regulatory input resolved during one
/// evaluation. Stored alongside the application so the decision can be
/// reproduced bit-for-bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationSnapshot {
    pub effective_at: DateTime<Utc>,
    /// DSR ceiling in percent
    pub dsr_limit: f64,
    /// LTV ceiling in percent; 100 for non-mortgage products
    pub ltv_limit: f64,
    /// Stress add-on in percentage points
    pub stress_dsr_rate: f64,
    pub stress_dsr_region: StressDsrRegion,
    pub rate_type: RateType,
    /// Statutory rate cap in percent
    pub max_interest_rate: f64,
    /// Central-bank base rate in percent
    pub base_rate: f64,
    /// EQ grade after the segment minimum-grade guarantee
    pub eq_grade_applied: EqGrade,
    pub eq_limit_multiplier: f64,
    pub eq_rate_adjustment: f64,
    pub irg_grade: IrgGrade,
    pub irg_pd_adjustment: f64,
    pub segment_code: Option<HeaplessString<30>>,
    pub segment_benefit: Option<SegmentBenefit>,
    pub income_multiplier: f64,
    pub bureau_source: HeaplessString<10>,
    pub bureau_score: i32,
    pub bureau_is_fallback: bool,
    /// Collaborator failures absorbed by the fallback chain
    pub degradations: Vec<Degradation>,
}

/// One collaborator failure recovered locally during an evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Degradation {
    pub dependency: HeaplessString<40>,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_machine_is_forward_only() {
        use ApplicationStatus::*;
        assert!(Pending.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(ManualReview));
        assert!(ManualReview.can_transition_to(Rejected));

        assert!(!Approved.can_transition_to(UnderReview));
        assert!(!Rejected.can_transition_to(Pending));
        assert!(!UnderReview.can_transition_to(Pending));
        assert!(!Suspended.can_transition_to(UnderReview));
    }

    #[test]
    fn test_suspension_reachable_from_non_terminal_states() {
        use ApplicationStatus::*;
        for from in [Pending, UnderReview, ManualReview] {
            assert!(from.can_transition_to(Suspended), "{from} must suspend");
        }
        for from in [Approved, Rejected, Suspended] {
            assert!(!from.can_transition_to(Suspended));
        }
    }

    #[test]
    fn test_step_machine_walks_to_submit() {
        let mut step = ApplicationStep::IdentityVerify;
        let mut hops = 0;
        while let Some(next) = step.next() {
            step = next;
            hops += 1;
        }
        assert_eq!(step, ApplicationStep::Submit);
        assert_eq!(hops, 6);
    }
}
