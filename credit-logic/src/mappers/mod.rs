pub mod applicant_mapper;
pub mod application_mapper;
pub mod audit_mapper;
pub mod credit_score_mapper;
pub mod regulation_mapper;

pub use applicant_mapper::*;
pub use application_mapper::*;
pub use audit_mapper::*;
pub use credit_score_mapper::*;
pub use regulation_mapper::*;

use credit_api::{CreditError, CreditResult};

/// Shared parse helper for string-encoded enum columns
pub(crate) fn parse_enum<T>(
    value: &str,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> CreditResult<T> {
    parse(value).ok_or_else(|| CreditError::InvalidEnumValue {
        value: value.to_string(),
        field: field.to_string(),
    })
}
