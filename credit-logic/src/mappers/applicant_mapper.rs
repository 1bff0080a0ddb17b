use heapless::String as HeaplessString;

use credit_api::domain::{
    Applicant, ApplicantKind, ConsentFlags, EmploymentKind, EqGrade, IrgGrade, SegmentCode,
    SoleProprietorProfile,
};
use credit_api::{CreditError, CreditResult};
use credit_db::models::ApplicantModel;
use rust_decimal::Decimal;

use super::parse_enum;

pub struct ApplicantMapper;

impl ApplicantMapper {
    pub fn to_model(applicant: &Applicant) -> ApplicantModel {
        ApplicantModel {
            id: applicant.id,
            applicant_kind: applicant.applicant_kind.to_string(),
            identity_token: applicant.identity_token.to_string(),
            age: applicant.age as i32,
            employment_kind: applicant.employment_kind.to_string(),
            annual_income: applicant.annual_income,
            income_verified: applicant.income_verified,
            employer_eq_grade: applicant.employer_eq_grade.map(|g| g.code().to_string()),
            industry_risk_grade: applicant.industry_risk_grade.map(|g| g.code().to_string()),
            segment_code: applicant.segment_code.as_ref().map(|s| s.code()),
            bureau_consent: applicant.consent.bureau_inquiry,
            alt_data_consent: applicant.consent.alt_data,
            open_banking_consent: applicant.consent.open_banking,
            art_fund_registered: applicant.art_fund_registered,
            business_duration_months: applicant
                .sole_proprietor
                .as_ref()
                .map(|p| p.business_duration_months as i32),
            annual_revenue: applicant.sole_proprietor.as_ref().map(|p| p.annual_revenue),
            operating_income: applicant
                .sole_proprietor
                .as_ref()
                .map(|p| p.operating_income),
            tax_filings_3y: applicant
                .sole_proprietor
                .as_ref()
                .map(|p| p.tax_filings_3y as i32),
            created_at: applicant.created_at,
            updated_at: applicant.updated_at,
        }
    }

    pub fn from_model(model: &ApplicantModel) -> CreditResult<Applicant> {
        let applicant_kind = parse_enum(&model.applicant_kind, "applicant_kind", |s| match s {
            "individual" => Some(ApplicantKind::Individual),
            "sole_proprietor" => Some(ApplicantKind::SoleProprietor),
            _ => None,
        })?;
        let employment_kind = parse_enum(&model.employment_kind, "employment_kind", |s| match s {
            "employed" => Some(EmploymentKind::Employed),
            "self_employed" => Some(EmploymentKind::SelfEmployed),
            "unemployed" => Some(EmploymentKind::Unemployed),
            "retired" => Some(EmploymentKind::Retired),
            "student" => Some(EmploymentKind::Student),
            _ => None,
        })?;

        let employer_eq_grade = model
            .employer_eq_grade
            .as_deref()
            .map(|code| parse_enum(code, "employer_eq_grade", EqGrade::parse))
            .transpose()?;
        let industry_risk_grade = model
            .industry_risk_grade
            .as_deref()
            .map(|code| parse_enum(code, "industry_risk_grade", IrgGrade::parse))
            .transpose()?;
        let segment_code = model
            .segment_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .map(|code| parse_enum(code, "segment_code", SegmentCode::parse))
            .transpose()?;

        let sole_proprietor = match (
            model.business_duration_months,
            model.annual_revenue,
            model.operating_income,
            model.tax_filings_3y,
        ) {
            (Some(months), revenue, income, filings) => Some(SoleProprietorProfile {
                business_duration_months: months.max(0) as u32,
                annual_revenue: revenue.unwrap_or(Decimal::ZERO),
                operating_income: income.unwrap_or(Decimal::ZERO),
                tax_filings_3y: filings.unwrap_or(0).max(0) as u32,
            }),
            _ => None,
        };

        Ok(Applicant {
            id: model.id,
            applicant_kind,
            identity_token: HeaplessString::try_from(model.identity_token.as_str()).map_err(
                |_| CreditError::ValidationError {
                    field: "identity_token".to_string(),
                    message: "token exceeds 64 chars".to_string(),
                },
            )?,
            age: model.age.clamp(0, u8::MAX as i32) as u8,
            employment_kind,
            annual_income: model.annual_income,
            income_verified: model.income_verified,
            employer_eq_grade,
            industry_risk_grade,
            segment_code,
            consent: ConsentFlags {
                bureau_inquiry: model.bureau_consent,
                alt_data: model.alt_data_consent,
                open_banking: model.open_banking_consent,
            },
            art_fund_registered: model.art_fund_registered,
            sole_proprietor,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
