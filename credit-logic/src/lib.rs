pub mod constants;
pub mod context;
pub mod integration;
pub mod mappers;
pub mod monitoring;
pub mod scoring;
pub mod services;
pub mod settings;

pub use context::*;
pub use services::*;
