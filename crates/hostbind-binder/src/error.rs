//! Binder and search error types.
//!
//! Only misconfiguration is an error. A requirement that simply does not
//! fit is `Ok(None)` from the binder and [`SearchOutcome::Insufficient`]
//! from search.
//!
//! [`SearchOutcome::Insufficient`]: crate::search::SearchOutcome::Insufficient

use hostbind_model::{ExpressionError, ResourceKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("requirement kind {requirement} does not match specification kind {specification}")]
    KindMismatch {
        requirement: ResourceKind,
        specification: ResourceKind,
    },

    #[error("where condition failed: {0}")]
    Expression(#[from] ExpressionError),
}

pub type BindResult<T> = Result<T, BindError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    #[error("host where condition failed: {0}")]
    Expression(#[from] ExpressionError),

    #[error("candidate source error: {0}")]
    Source(String),

    #[error("search needs a host requirement with a count range, got {0}")]
    NotHostRequirement(ResourceKind),
}

pub type SearchResult<T> = Result<T, SearchError>;
