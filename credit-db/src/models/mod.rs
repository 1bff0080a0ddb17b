pub mod applicant;
pub mod application;
pub mod audit;
pub mod credit_score;
pub mod regulation;

pub use applicant::*;
pub use application::*;
pub use audit::*;
pub use credit_score::*;
pub use regulation::*;
