pub mod access;
pub mod catalog;
pub mod expression;
pub mod filter;
pub mod predicate_builder;
