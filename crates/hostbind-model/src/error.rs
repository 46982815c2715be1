//! Error types for model construction.
//!
//! Everything here is a construction-time failure: a malformed tree is
//! rejected before any matching starts and is never retried.

use thiserror::Error;

use crate::kind::ResourceKind;
use crate::property::ValueType;

/// Result type alias for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building requirements, specifications, work, or
/// loading them from documents.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid property name `{0}`: expected a [bns]_ prefix followed by [a-z0-9_]")]
    InvalidPropertyName(String),

    #[error("property `{name}` expects a {expected} value, got {actual}")]
    PropertyType {
        name: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("{kind} specification is missing key property `{name}`")]
    MissingKey {
        kind: ResourceKind,
        name: &'static str,
    },

    #[error("invalid key property `{name}` on {kind} specification: {reason}")]
    InvalidKey {
        kind: ResourceKind,
        name: &'static str,
        reason: String,
    },

    #[error("duplicate {kind} specification {key} under the same parent")]
    DuplicateSibling { kind: ResourceKind, key: String },

    #[error("{child} cannot be nested under {parent}")]
    IllegalChild {
        parent: ResourceKind,
        child: ResourceKind,
    },

    #[error("invalid {kind} requirement: {reason}")]
    InvalidRequirement { kind: ResourceKind, reason: String },

    #[error("invalid {kind} specification: {reason}")]
    InvalidSpecification { kind: ResourceKind, reason: String },

    #[error("invalid capacity on {kind}: {reason}")]
    InvalidCapacity { kind: ResourceKind, reason: String },

    #[error("invalid work: {0}")]
    InvalidWork(String),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("failed to read document: {0}")]
    DocumentRead(String),

    #[error("failed to parse document: {0}")]
    DocumentParse(String),
}

/// Errors raised while building expressions.
///
/// Unknown functions and signature mismatches are configuration errors,
/// never matching failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("no overload of `{function}` accepts ({args})")]
    SignatureMismatch { function: String, args: String },

    #[error("invalid variable name `{0}`")]
    InvalidVariable(String),

    #[error("variable `{name}` is declared {expected} but the scope holds {actual}")]
    VariableType {
        name: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("where condition must be boolean, got {0}")]
    NotBoolean(ValueType),
}
