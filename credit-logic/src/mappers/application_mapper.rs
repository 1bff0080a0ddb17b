use credit_api::domain::{
    ApplicationStatus, ApplicationStep, Channel, DebtProfile, LoanApplication, MortgageDetails,
    ProductKind, RateType, RegulationSnapshot, StressDsrRegion,
};
use credit_api::{CreditError, CreditResult};
use credit_db::models::LoanApplicationModel;

use super::parse_enum;

pub struct ApplicationMapper;

fn step_code(step: ApplicationStep) -> &'static str {
    match step {
        ApplicationStep::IdentityVerify => "identity_verify",
        ApplicationStep::Consent => "consent",
        ApplicationStep::BasicInfo => "basic_info",
        ApplicationStep::FinancialInfo => "financial_info",
        ApplicationStep::ProductSelect => "product_select",
        ApplicationStep::Review => "review",
        ApplicationStep::Submit => "submit",
    }
}

fn parse_step(code: &str) -> Option<ApplicationStep> {
    match code {
        "identity_verify" => Some(ApplicationStep::IdentityVerify),
        "consent" => Some(ApplicationStep::Consent),
        "basic_info" => Some(ApplicationStep::BasicInfo),
        "financial_info" => Some(ApplicationStep::FinancialInfo),
        "product_select" => Some(ApplicationStep::ProductSelect),
        "review" => Some(ApplicationStep::Review),
        "submit" => Some(ApplicationStep::Submit),
        _ => None,
    }
}

fn channel_code(channel: Channel) -> &'static str {
    match channel {
        Channel::Digital => "digital",
        Channel::Branch => "branch",
        Channel::Phone => "phone",
    }
}

fn parse_channel(code: &str) -> Option<Channel> {
    match code {
        "digital" => Some(Channel::Digital),
        "branch" => Some(Channel::Branch),
        "phone" => Some(Channel::Phone),
        _ => None,
    }
}

impl ApplicationMapper {
    pub fn to_model(application: &LoanApplication) -> LoanApplicationModel {
        LoanApplicationModel {
            id: application.id,
            applicant_id: application.applicant_id,
            product: application.product.code().to_string(),
            requested_amount: application.requested_amount,
            requested_term_months: application.requested_term_months as i32,
            step: step_code(application.step).to_string(),
            status: application.status.code().to_string(),
            collateral_value: application.mortgage.as_ref().map(|m| m.collateral_value),
            is_regulated_area: application.mortgage.as_ref().map(|m| m.is_regulated_area),
            is_speculation_area: application.mortgage.as_ref().map(|m| m.is_speculation_area),
            owned_property_count: application
                .mortgage
                .as_ref()
                .map(|m| m.owned_property_count as i32),
            existing_monthly_payment: application.debt_profile.existing_monthly_payment,
            existing_credit_line: application.debt_profile.existing_credit_line,
            existing_credit_balance: application.debt_profile.existing_credit_balance,
            stress_dsr_region: application.stress_dsr_region.as_param_suffix().to_string(),
            rate_type: application.rate_type.as_param_suffix().to_string(),
            regulation_snapshot: application
                .regulation_snapshot
                .as_ref()
                .and_then(|s| serde_json::to_value(s).ok()),
            channel: channel_code(application.channel).to_string(),
            created_at: application.created_at,
            updated_at: application.updated_at,
        }
    }

    pub fn from_model(model: &LoanApplicationModel) -> CreditResult<LoanApplication> {
        let product = parse_enum(&model.product, "product", ProductKind::parse)?;
        let step = parse_enum(&model.step, "step", parse_step)?;
        let status = parse_enum(&model.status, "status", ApplicationStatus::parse)?;
        let stress_dsr_region =
            parse_enum(&model.stress_dsr_region, "stress_dsr_region", |s| match s {
                "metropolitan" => Some(StressDsrRegion::Metropolitan),
                "non_metropolitan" => Some(StressDsrRegion::NonMetropolitan),
                _ => None,
            })?;
        let rate_type = parse_enum(&model.rate_type, "rate_type", |s| match s {
            "variable" => Some(RateType::Variable),
            "mixed_short" => Some(RateType::MixedShort),
            "mixed_long" => Some(RateType::MixedLong),
            "fixed" => Some(RateType::Fixed),
            _ => None,
        })?;
        let channel = parse_enum(&model.channel, "channel", parse_channel)?;

        let mortgage = model.collateral_value.map(|collateral_value| MortgageDetails {
            collateral_value,
            is_regulated_area: model.is_regulated_area.unwrap_or(false),
            is_speculation_area: model.is_speculation_area.unwrap_or(false),
            owned_property_count: model.owned_property_count.unwrap_or(0).max(0) as u32,
        });

        let regulation_snapshot = model
            .regulation_snapshot
            .as_ref()
            .map(|raw| {
                serde_json::from_value::<RegulationSnapshot>(raw.clone()).map_err(|e| {
                    CreditError::Internal(format!("corrupt regulation snapshot: {e}"))
                })
            })
            .transpose()?;

        Ok(LoanApplication {
            id: model.id,
            applicant_id: model.applicant_id,
            product,
            requested_amount: model.requested_amount,
            requested_term_months: model.requested_term_months.max(0) as u32,
            step,
            status,
            mortgage,
            debt_profile: DebtProfile {
                existing_monthly_payment: model.existing_monthly_payment,
                existing_credit_line: model.existing_credit_line,
                existing_credit_balance: model.existing_credit_balance,
            },
            stress_dsr_region,
            rate_type,
            regulation_snapshot,
            channel,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
