pub mod applicant_repository_impl;
pub mod application_repository_impl;
pub mod audit_repository_impl;
pub mod credit_score_repository_impl;
pub mod masters_repository_impl;
pub mod regulation_repository_impl;

pub use applicant_repository_impl::*;
pub use application_repository_impl::*;
pub use audit_repository_impl::*;
pub use credit_score_repository_impl::*;
pub use masters_repository_impl::*;
pub use regulation_repository_impl::*;

use credit_db::RepositoryError;
use std::sync::{PoisonError, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn poisoned_read<T>(_: PoisonError<RwLockReadGuard<'_, T>>) -> RepositoryError {
    RepositoryError::Storage("store lock poisoned".to_string())
}

pub(crate) fn poisoned_write<T>(_: PoisonError<RwLockWriteGuard<'_, T>>) -> RepositoryError {
    RepositoryError::Storage("store lock poisoned".to_string())
}
