use heapless::String as HeaplessString;
use indexmap::IndexMap;

use credit_api::domain::{ParamCategory, ParamValue, RegulationParam};
use credit_api::{CreditError, CreditResult};
use credit_db::models::RegulationParamModel;

use super::parse_enum;

pub struct RegulationMapper;

impl RegulationMapper {
    pub fn to_model(param: &RegulationParam) -> RegulationParamModel {
        RegulationParamModel {
            id: param.id,
            param_key: param.param_key.to_string(),
            category: param.category.code().to_string(),
            phase_label: param.phase_label.as_ref().map(|p| p.to_string()),
            value: serde_json::to_value(&param.value).unwrap_or(serde_json::Value::Null),
            condition: param
                .condition
                .as_ref()
                .and_then(|c| serde_json::to_value(c).ok()),
            effective_from: param.effective_from,
            effective_to: param.effective_to,
            is_active: param.is_active,
            legal_basis: param.legal_basis.clone(),
            description: param.description.clone(),
            created_by: param.created_by.to_string(),
            approved_by: param.approved_by.to_string(),
            approved_at: param.approved_at,
            change_reason: param.change_reason.clone(),
            created_at: param.created_at,
            updated_at: param.updated_at,
        }
    }

    pub fn from_model(model: &RegulationParamModel) -> CreditResult<RegulationParam> {
        let category = parse_enum(&model.category, "category", ParamCategory::parse)?;
        let value: ParamValue = serde_json::from_value(model.value.clone()).map_err(|e| {
            CreditError::Internal(format!("corrupt param value for {}: {e}", model.param_key))
        })?;
        let condition: Option<IndexMap<String, String>> = model
            .condition
            .as_ref()
            .map(|raw| {
                serde_json::from_value(raw.clone()).map_err(|e| {
                    CreditError::Internal(format!(
                        "corrupt condition for {}: {e}",
                        model.param_key
                    ))
                })
            })
            .transpose()?;

        Ok(RegulationParam {
            id: model.id,
            param_key: HeaplessString::try_from(model.param_key.as_str()).map_err(|_| {
                CreditError::ValidationError {
                    field: "param_key".to_string(),
                    message: "key exceeds 100 chars".to_string(),
                }
            })?,
            category,
            phase_label: model
                .phase_label
                .as_deref()
                .and_then(|p| HeaplessString::try_from(p).ok()),
            value,
            condition,
            effective_from: model.effective_from,
            effective_to: model.effective_to,
            is_active: model.is_active,
            legal_basis: model.legal_basis.clone(),
            description: model.description.clone(),
            created_by: HeaplessString::try_from(model.created_by.as_str()).unwrap_or_default(),
            approved_by: HeaplessString::try_from(model.approved_by.as_str()).unwrap_or_default(),
            approved_at: model.approved_at,
            change_reason: model.change_reason.clone(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::param_defaults::compiled_default_params;

    #[test]
    fn test_every_default_row_survives_the_model_round_trip() {
        for param in compiled_default_params() {
            let model = RegulationMapper::to_model(&param);
            let back = RegulationMapper::from_model(&model).unwrap();
            assert_eq!(back.param_key, param.param_key);
            assert_eq!(back.value, param.value, "value drift for {}", param.param_key);
            assert_eq!(back.condition, param.condition);
            assert_eq!(back.effective_from, param.effective_from);
            assert_eq!(back.effective_to, param.effective_to);
        }
    }
}
