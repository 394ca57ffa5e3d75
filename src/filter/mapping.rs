//! Filter mappings: the caller-facing description of a requested filter.

use crate::access::Value;
use crate::expression::{BindParam, SubQuery};
use indexmap::map::{IndexMap, Iter};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Extension values for types the built-in handlers do not know about.
///
/// Pair with [`crate::predicate_builder::register_handler`] to give them meaning.
pub trait CustomValue: fmt::Debug + Send + Sync + 'static {
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

/// Reference to a persisted domain object
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRef {
    pub entity: String,
    pub id: Value,
}

impl RecordRef {
    pub fn new(entity: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// A half- or fully-bounded range; `None` leaves that end open
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRange {
    pub start: Option<Value>,
    pub end: Option<Value>,
    pub exclude_end: bool,
}

impl FilterRange {
    /// `start..=end`
    pub fn inclusive(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            exclude_end: false,
        }
    }

    /// `start..end`
    pub fn exclusive(start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Self {
            exclude_end: true,
            ..Self::inclusive(start, end)
        }
    }

    /// `start..`
    pub fn starting_at(start: impl Into<Value>) -> Self {
        Self {
            start: Some(start.into()),
            end: None,
            exclude_end: false,
        }
    }

    /// `..=end`
    pub fn through(end: impl Into<Value>) -> Self {
        Self {
            start: None,
            end: Some(end.into()),
            exclude_end: false,
        }
    }

    /// `..end`
    pub fn until(end: impl Into<Value>) -> Self {
        Self {
            exclude_end: true,
            ..Self::through(end)
        }
    }
}

/// Value side of a filter entry
#[derive(Debug, Clone)]
pub enum FilterValue {
    /// Plain scalar; `Value::Null` is nil
    Scalar(Value),
    /// Sequence, possibly holding nils and ranges
    List(Vec<FilterValue>),
    Range(FilterRange),
    /// Filters on an associated (or explicitly named) table
    Nested(FilterMapping),
    /// Domain object, compared by identity
    Record(RecordRef),
    /// Entity class reference, compared by name
    Entity(String),
    Relation(SubQuery),
    Param(BindParam),
    Custom(Arc<dyn CustomValue>),
}

impl FilterValue {
    pub fn null() -> Self {
        FilterValue::Scalar(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Scalar(Value::Null))
    }

    pub fn custom(value: impl CustomValue) -> Self {
        FilterValue::Custom(Arc::new(value))
    }

    /// Runtime type name, used in dispatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Scalar(value) => value.type_name(),
            FilterValue::List(_) => "list",
            FilterValue::Range(_) => "range",
            FilterValue::Nested(_) => "mapping",
            FilterValue::Record(_) => "record",
            FilterValue::Entity(_) => "entity",
            FilterValue::Relation(_) => "relation",
            FilterValue::Param(_) => "bind parameter",
            FilterValue::Custom(custom) => custom.type_name(),
        }
    }
}

impl PartialEq for FilterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FilterValue::Scalar(a), FilterValue::Scalar(b)) => a == b,
            (FilterValue::List(a), FilterValue::List(b)) => a == b,
            (FilterValue::Range(a), FilterValue::Range(b)) => a == b,
            (FilterValue::Nested(a), FilterValue::Nested(b)) => a == b,
            (FilterValue::Record(a), FilterValue::Record(b)) => a == b,
            (FilterValue::Entity(a), FilterValue::Entity(b)) => a == b,
            (FilterValue::Relation(a), FilterValue::Relation(b)) => a == b,
            (FilterValue::Param(a), FilterValue::Param(b)) => a == b,
            (FilterValue::Custom(a), FilterValue::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! scalar_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_filter_value!(Value, bool, i32, i64, f64, &str, String);

impl From<FilterMapping> for FilterValue {
    fn from(mapping: FilterMapping) -> Self {
        FilterValue::Nested(mapping)
    }
}

impl From<FilterRange> for FilterValue {
    fn from(range: FilterRange) -> Self {
        FilterValue::Range(range)
    }
}

impl From<RecordRef> for FilterValue {
    fn from(record: RecordRef) -> Self {
        FilterValue::Record(record)
    }
}

impl From<SubQuery> for FilterValue {
    fn from(subquery: SubQuery) -> Self {
        FilterValue::Relation(subquery)
    }
}

impl From<BindParam> for FilterValue {
    fn from(param: BindParam) -> Self {
        FilterValue::Param(param)
    }
}

/// Ordered mapping from column, association, or `table.column` keys to values.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMapping {
    entries: IndexMap<String, FilterValue>,
}

impl FilterMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Option<FilterValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FilterValue> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, FilterValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FilterMapping {
    type Item = (&'a String, &'a FilterValue);
    type IntoIter = Iter<'a, String, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for FilterMapping {
    type Item = (String, FilterValue);
    type IntoIter = indexmap::map::IntoIter<String, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = FilterMapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

/// Build a `FilterValue::List` from anything convertible
pub fn list<T: Into<FilterValue>>(items: impl IntoIterator<Item = T>) -> FilterValue {
    FilterValue::List(items.into_iter().map(Into::into).collect())
}
