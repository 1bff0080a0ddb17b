//! In-memory repository implementations.
//!
//! Owned stores keyed by id behind `RwLock<HashMap>`, enforcing the same
//! uniqueness constraints the SQL schema declares. Used by the test suites
//! and by embedded wiring where a database is not available.

pub mod repository;

pub use repository::*;
