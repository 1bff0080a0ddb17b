pub mod applicant_repository;
pub mod application_repository;
pub mod audit_repository;
pub mod credit_score_repository;
pub mod masters_repository;
pub mod regulation_repository;

pub use applicant_repository::*;
pub use application_repository::*;
pub use audit_repository::*;
pub use credit_score_repository::*;
pub use masters_repository::*;
pub use regulation_repository::*;
