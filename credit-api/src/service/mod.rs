pub mod audit_service;
pub mod bureau_service;
pub mod decision_service;
pub mod monitoring_service;
pub mod param_admin_service;
pub mod policy_service;

pub use audit_service::*;
pub use bureau_service::*;
pub use decision_service::*;
pub use monitoring_service::*;
pub use param_admin_service::*;
pub use policy_service::*;
