pub mod applicant;
pub mod application;
pub mod audit;
pub mod bureau;
pub mod identity;
pub mod masters;
pub mod monitoring;
pub mod regulation;
pub mod scoring;

pub use applicant::*;
pub use application::*;
pub use audit::*;
pub use bureau::*;
pub use identity::*;
pub use masters::*;
pub use monitoring::*;
pub use regulation::*;
pub use scoring::*;
