//! Error types for filter compilation.

use crate::access::CastError;
use thiserror::Error;

/// Errors that can occur while compiling a filter mapping into predicates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Unsupported filter value of type {type_name}")]
    UnsupportedValue { type_name: String },

    #[error("Type cast failed: {0}")]
    TypeCast(#[from] CastError),

    #[error("Nested array in filter on '{column}'; flatten the array before filtering")]
    NestedArray { column: String },

    #[error("Filter key '{key}' is used both as a column and as a table")]
    ConflictingFilterKey { key: String },

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),
}

/// Result type for filter compilation
pub type BuildResult<T> = Result<T, BuildError>;
