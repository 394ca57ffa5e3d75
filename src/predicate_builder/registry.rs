//! Value-type dispatch for predicate handlers.
//!
//! A registry is an ordered list of `(matcher, handler)` entries. Registration
//! prepends, so the most recently registered matcher is checked first and can
//! override the built-ins for the values it accepts.
//!
//! The process-wide registry is populated at startup through
//! [`register_handler`]; every [`PredicateBuilder`] takes an immutable snapshot
//! when it is created, so compilation never holds the lock.

use crate::expression::{Attribute, Expression};
use crate::filter::FilterValue;
use crate::predicate_builder::{
    array_handler, relation_handler, BuildError, BuildResult, PredicateBuilder,
};
use log::trace;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Decides whether a handler applies to a (type-cast) value
pub type Matcher = Arc<dyn Fn(&FilterValue) -> bool + Send + Sync>;

/// Turns an attribute and a type-cast value into a predicate
pub type Handler = Arc<
    dyn Fn(&PredicateBuilder<'_>, &Attribute, &FilterValue) -> BuildResult<Expression>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub struct HandlerEntry {
    pub matcher: Matcher,
    pub handler: Handler,
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    /// Highest priority first
    entries: Vec<HandlerEntry>,
}

impl HandlerRegistry {
    /// A registry with no handlers at all; every dispatch fails
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in handlers, lowest priority registered first
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register(
            |value| matches!(value, FilterValue::Scalar(_) | FilterValue::Param(_)),
            |_, attribute, value| Ok(attribute.equals(operand(value)?)),
        );

        // Entity references compare by entity name
        registry.register(
            |value| matches!(value, FilterValue::Entity(_)),
            |_, attribute, value| Ok(attribute.equals(operand(value)?)),
        );

        registry.register(
            |value| matches!(value, FilterValue::Record(_)),
            |_, attribute, value| Ok(attribute.equals(operand(value)?)),
        );

        registry.register(
            |value| matches!(value, FilterValue::Range(_)),
            |_, attribute, value| match value {
                FilterValue::Range(range) => Ok(attribute.between(
                    range.start.clone().map(Expression::Literal),
                    range.end.clone().map(Expression::Literal),
                    range.exclude_end,
                )),
                other => Err(unsupported(other)),
            },
        );

        registry.register(
            |value| matches!(value, FilterValue::Relation(_)),
            relation_handler::call,
        );

        registry.register(
            |value| matches!(value, FilterValue::List(_)),
            array_handler::call,
        );

        registry
    }

    /// Snapshot of the process-wide registry
    pub fn global() -> Self {
        global_registry().read().clone()
    }

    /// Add a handler ahead of every existing entry
    pub fn register<M, H>(&mut self, matcher: M, handler: H)
    where
        M: Fn(&FilterValue) -> bool + Send + Sync + 'static,
        H: Fn(&PredicateBuilder<'_>, &Attribute, &FilterValue) -> BuildResult<Expression>
            + Send
            + Sync
            + 'static,
    {
        self.entries.insert(
            0,
            HandlerEntry {
                matcher: Arc::new(matcher),
                handler: Arc::new(handler),
            },
        );
    }

    /// First handler whose matcher accepts `value`
    pub fn handler_for(&self, value: &FilterValue) -> BuildResult<&Handler> {
        let position = self
            .entries
            .iter()
            .position(|entry| (entry.matcher)(value))
            .ok_or_else(|| unsupported(value))?;
        trace!(
            "dispatching {} value to handler #{}",
            value.type_name(),
            position
        );
        Ok(&self.entries[position].handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn global_registry() -> &'static RwLock<HandlerRegistry> {
    static GLOBAL: OnceLock<RwLock<HandlerRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(HandlerRegistry::with_defaults()))
}

/// Register a handler in the process-wide registry.
///
/// Meant for startup. Builders created before the call keep their old snapshot.
pub fn register_handler<M, H>(matcher: M, handler: H)
where
    M: Fn(&FilterValue) -> bool + Send + Sync + 'static,
    H: Fn(&PredicateBuilder<'_>, &Attribute, &FilterValue) -> BuildResult<Expression>
        + Send
        + Sync
        + 'static,
{
    global_registry().write().register(matcher, handler);
}

pub(crate) fn unsupported(value: &FilterValue) -> BuildError {
    BuildError::UnsupportedValue {
        type_name: value.type_name().to_string(),
    }
}

/// The comparison operand a value stands for: scalars and parameters as
/// themselves, records by identity, entity references by name
pub(crate) fn operand(value: &FilterValue) -> BuildResult<Expression> {
    match value {
        FilterValue::Scalar(v) => Ok(Expression::Literal(v.clone())),
        FilterValue::Param(param) => Ok(Expression::Param(param.clone())),
        FilterValue::Record(record) => Ok(Expression::Literal(record.id.clone())),
        FilterValue::Entity(name) => Ok(Expression::literal(name.as_str())),
        other => Err(unsupported(other)),
    }
}
