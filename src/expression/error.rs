//! Error types for predicate evaluation.

use crate::access::DataType;
use thiserror::Error;

/// Errors that can occur while evaluating a predicate against a row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Unknown column {column} in row")]
    UnknownColumn { column: String },

    #[error("Parameter :{name} is not bound")]
    UnboundParameter { name: String },

    #[error("Invalid operand types for {operator}: {left_type:?} and {right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    #[error("Cannot evaluate {0} without executing a query")]
    Unsupported(String),
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
