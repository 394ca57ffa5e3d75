//! Filter mappings handed to the predicate builder.
//!
//! A [`FilterMapping`] maps column names, association names, or dotted
//! `table.column` keys to a [`FilterValue`]. Mappings can be built in code or
//! decoded from JSON (see [`json`]).

pub mod json;
pub mod mapping;

pub use mapping::{list, CustomValue, FilterMapping, FilterRange, FilterValue, RecordRef};
