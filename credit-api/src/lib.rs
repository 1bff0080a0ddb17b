pub mod domain;
pub mod service;
pub mod error;

pub use domain::*;
pub use service::*;
pub use error::*;
