pub mod bureau_gateway;

pub use bureau_gateway::*;
