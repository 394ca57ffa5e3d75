//! Access layer for scalar values.
//!
//! - **Value**: scalar operands appearing in filters and predicates
//! - **DataType**: column types, and the storage casts applied to filter values
//!   before they become predicate operands

pub mod value;

pub use value::{CastError, DataType, Value};
