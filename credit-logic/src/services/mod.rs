pub mod audit_service_impl;
pub mod decision_service_impl;
pub mod param_admin_service_impl;
pub mod param_defaults;
pub mod policy_service_impl;

pub use audit_service_impl::*;
pub use decision_service_impl::*;
pub use param_admin_service_impl::*;
pub use param_defaults::*;
pub use policy_service_impl::*;
