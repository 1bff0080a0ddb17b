use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Natural person or sole proprietor seeking credit.
///
/// The national registration number is never stored; `identity_token` holds
/// its keyed hash and equal tokens identify the same person across
/// applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    pub id: Uuid,
    pub applicant_kind: ApplicantKind,
    /// HMAC-SHA256 of the registration number, hex-encoded (64 chars)
    pub identity_token: HeaplessString<64>,
    pub age: u8,
    pub employment_kind: EmploymentKind,
    /// Annual income in KRW
    pub annual_income: Decimal,
    /// Income confirmed against health-insurance contributions
    pub income_verified: bool,
    /// Employer credit-quality grade; absent defaults to C at evaluation
    pub employer_eq_grade: Option<EqGrade>,
    /// Industry risk grade; absent defaults to M at evaluation
    pub industry_risk_grade: Option<IrgGrade>,
    pub segment_code: Option<SegmentCode>,
    pub consent: ConsentFlags,
    /// Arts-welfare-fund registration, required for the artist segment
    pub art_fund_registered: bool,
    /// Present iff `applicant_kind` is `SoleProprietor`
    pub sole_proprietor: Option<SoleProprietorProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicantKind {
    Individual,
    SoleProprietor,
}

impl std::fmt::Display for ApplicantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicantKind::Individual => write!(f, "individual"),
            ApplicantKind::SoleProprietor => write!(f, "sole_proprietor"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmploymentKind {
    Employed,
    SelfEmployed,
    Unemployed,
    Retired,
    Student,
}

impl EmploymentKind {
    /// Parameter-key suffix for income-multiplier lookups
    pub fn as_param_suffix(&self) -> &'static str {
        match self {
            EmploymentKind::Employed => "employed",
            EmploymentKind::SelfEmployed => "self_employed",
            EmploymentKind::Unemployed => "unemployed",
            EmploymentKind::Retired => "retired",
            EmploymentKind::Student => "student",
        }
    }
}

impl std::fmt::Display for EmploymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param_suffix())
    }
}

/// Employer credit-quality grade. S is the strongest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EqGrade {
    S,
    A,
    B,
    C,
    D,
    E,
}

impl EqGrade {
    /// Rank with 0 as the strongest grade; used for minimum-grade guarantees
    pub fn rank(&self) -> u8 {
        match self {
            EqGrade::S => 0,
            EqGrade::A => 1,
            EqGrade::B => 2,
            EqGrade::C => 3,
            EqGrade::D => 4,
            EqGrade::E => 5,
        }
    }

    pub fn is_stronger_than(&self, other: &EqGrade) -> bool {
        self.rank() < other.rank()
    }

    pub fn code(&self) -> &'static str {
        match self {
            EqGrade::S => "EQ-S",
            EqGrade::A => "EQ-A",
            EqGrade::B => "EQ-B",
            EqGrade::C => "EQ-C",
            EqGrade::D => "EQ-D",
            EqGrade::E => "EQ-E",
        }
    }

    pub fn parse(code: &str) -> Option<EqGrade> {
        match code {
            "EQ-S" | "S" => Some(EqGrade::S),
            "EQ-A" | "A" => Some(EqGrade::A),
            "EQ-B" | "B" => Some(EqGrade::B),
            "EQ-C" | "C" => Some(EqGrade::C),
            "EQ-D" | "D" => Some(EqGrade::D),
            "EQ-E" | "E" => Some(EqGrade::E),
            _ => None,
        }
    }
}

impl std::fmt::Display for EqGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Industry risk grade derived from the KSIC classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IrgGrade {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl IrgGrade {
    pub fn code(&self) -> &'static str {
        match self {
            IrgGrade::Low => "L",
            IrgGrade::Medium => "M",
            IrgGrade::High => "H",
            IrgGrade::VeryHigh => "VH",
        }
    }

    pub fn parse(code: &str) -> Option<IrgGrade> {
        match code {
            "L" => Some(IrgGrade::Low),
            "M" => Some(IrgGrade::Medium),
            "H" => Some(IrgGrade::High),
            "VH" => Some(IrgGrade::VeryHigh),
            _ => None,
        }
    }
}

impl std::fmt::Display for IrgGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Closed set of borrower categories with codified preferential terms.
///
/// MOU segments carry the partner-agreement code so the EQ master can attach
/// a special negotiated rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SegmentCode {
    /// SEG-DR: medical professionals
    Doctor,
    /// SEG-JD: legal and accounting professionals
    Judicial,
    /// SEG-ART: registered artists (income smoothing)
    Artist,
    /// SEG-YTH: youth aged 19-34
    Youth,
    /// SEG-MIL: military and public officials
    Military,
    /// SEG-MOU-{code}: partner-agreement employees
    Mou(HeaplessString<20>),
}

impl SegmentCode {
    pub fn code(&self) -> String {
        match self {
            SegmentCode::Doctor => "SEG-DR".to_string(),
            SegmentCode::Judicial => "SEG-JD".to_string(),
            SegmentCode::Artist => "SEG-ART".to_string(),
            SegmentCode::Youth => "SEG-YTH".to_string(),
            SegmentCode::Military => "SEG-MIL".to_string(),
            SegmentCode::Mou(code) => format!("SEG-MOU-{}", code.as_str()),
        }
    }

    /// Parameter-key suffix; MOU codes collapse onto the shared SEG-MOU row
    pub fn as_param_suffix(&self) -> &'static str {
        match self {
            SegmentCode::Doctor => "SEG-DR",
            SegmentCode::Judicial => "SEG-JD",
            SegmentCode::Artist => "SEG-ART",
            SegmentCode::Youth => "SEG-YTH",
            SegmentCode::Military => "SEG-MIL",
            SegmentCode::Mou(_) => "SEG-MOU",
        }
    }

    pub fn mou_code(&self) -> Option<&str> {
        match self {
            SegmentCode::Mou(code) => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn parse(code: &str) -> Option<SegmentCode> {
        match code {
            "" => None,
            "SEG-DR" => Some(SegmentCode::Doctor),
            "SEG-JD" => Some(SegmentCode::Judicial),
            "SEG-ART" => Some(SegmentCode::Artist),
            "SEG-YTH" => Some(SegmentCode::Youth),
            "SEG-MIL" => Some(SegmentCode::Military),
            other => other
                .strip_prefix("SEG-MOU-")
                .and_then(|suffix| HeaplessString::try_from(suffix).ok())
                .map(SegmentCode::Mou),
        }
    }
}

impl std::fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Consents collected during the application journey
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConsentFlags {
    pub bureau_inquiry: bool,
    pub alt_data: bool,
    pub open_banking: bool,
}

/// SOHO fields present only for sole proprietors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoleProprietorProfile {
    pub business_duration_months: u32,
    /// Annual revenue in KRW
    pub annual_revenue: Decimal,
    /// Operating income in KRW
    pub operating_income: Decimal,
    /// Tax filings in the last three years
    pub tax_filings_3y: u32,
}

pub const APPLICANT_AGE_MIN: u8 = 19;
pub const APPLICANT_AGE_MAX: u8 = 80;

impl Applicant {
    /// Validate the applicant against the business invariants
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.identity_token.len() != 64
            || !self.identity_token.chars().all(|c| c.is_ascii_hexdigit())
        {
            errors.push("identity_token must be a 64-char hex digest".to_string());
        }

        if self.age < APPLICANT_AGE_MIN || self.age > APPLICANT_AGE_MAX {
            errors.push(format!(
                "age {} outside business range {}-{}",
                self.age, APPLICANT_AGE_MIN, APPLICANT_AGE_MAX
            ));
        }

        if self.annual_income < Decimal::ZERO {
            errors.push("annual_income cannot be negative".to_string());
        }

        match self.applicant_kind {
            ApplicantKind::SoleProprietor if self.sole_proprietor.is_none() => {
                errors.push("sole proprietor requires the SOHO profile".to_string());
            }
            ApplicantKind::Individual if self.sole_proprietor.is_some() => {
                errors.push("individual applicant carries a SOHO profile".to_string());
            }
            _ => {}
        }

        if matches!(self.segment_code, Some(SegmentCode::Artist)) && !self.art_fund_registered {
            errors.push("artist segment requires arts-fund registration".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Grade used when the employer grade is unresolved
    pub fn effective_eq_grade(&self) -> EqGrade {
        self.employer_eq_grade.unwrap_or(EqGrade::C)
    }

    /// Grade used when the industry grade is unresolved
    pub fn effective_irg_grade(&self) -> IrgGrade {
        self.industry_risk_grade.unwrap_or(IrgGrade::Medium)
    }
}
