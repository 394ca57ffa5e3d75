//! Predicate expression trees.
//!
//! This module provides:
//! - Attribute references and the predicate factories (`equals`, `in_list`, `between`)
//! - The predicate tree and its SQL rendering
//! - Three-valued evaluation of predicates against rows

pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::Row;
pub use expr::{Attribute, AttributeRef, BindParam, Expression, SubQuery};
pub use operator::{BinaryOperator, UnaryOperator};
