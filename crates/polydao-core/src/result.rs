//! Result type aliases for Polydao.

use crate::DaoError;

/// A specialized `Result` type for data-access operations.
pub type DaoResult<T> = Result<T, DaoError>;
