//! Compiles filter mappings into predicate trees.
//!
//! ```text
//! {"author" => user, "orders.status" => "paid", "age" => 18..65}
//!   -> "posts"."author_id" = 7
//!      "orders"."status" = 'paid'
//!      "posts"."age" BETWEEN 18 AND 65
//! ```
//!
//! Compilation proceeds as follows:
//! 1. Dotted keys are normalized into nested mappings
//! 2. Nested mappings recurse with a scope for the associated table
//! 3. Association keys are rewritten to their foreign key, plus a discriminator
//!    predicate for polymorphic associations
//! 4. Values are cast to the column type and dispatched to a handler
//!
//! The result is a flat list of predicates for the caller to AND together.

pub mod array_handler;
pub mod association;
pub mod cast;
pub mod config;
pub mod dot_notation;
pub mod error;
pub mod registry;
pub mod relation_handler;

pub use association::{AssociationResolver, ResolvedAssociation, TypeCondition};
pub use config::{BuilderConfig, NestedArrayPolicy};
pub use error::{BuildError, BuildResult};
pub use registry::{register_handler, Handler, HandlerRegistry, Matcher};

use crate::catalog::Schema;
use crate::expression::{Attribute, AttributeRef, Expression};
use crate::filter::{FilterMapping, FilterValue};
use indexmap::IndexSet;
use log::debug;

/// Entity and table a group of filter keys applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// `None` when the table has no known entity; no association or type lookups happen then
    pub entity: Option<String>,
    pub table: String,
}

impl Scope {
    pub fn new(entity: Option<&str>, table: impl Into<String>) -> Self {
        Self {
            entity: entity.map(str::to_string),
            table: table.into(),
        }
    }
}

pub struct PredicateBuilder<'a> {
    schema: &'a dyn Schema,
    registry: HandlerRegistry,
    config: BuilderConfig,
    scope: Scope,
}

impl<'a> PredicateBuilder<'a> {
    /// Builder for `table`, using a snapshot of the process-wide handler registry
    pub fn new(schema: &'a dyn Schema, entity: Option<&str>, table: impl Into<String>) -> Self {
        Self {
            schema,
            registry: HandlerRegistry::global(),
            config: BuilderConfig::default(),
            scope: Scope::new(entity, table),
        }
    }

    /// Builder scoped to a catalog entity and its table
    pub fn for_entity(schema: &'a dyn Schema, entity: &str) -> BuildResult<Self> {
        let table = schema
            .entity(entity)
            .map(|info| info.table_name.clone())
            .ok_or_else(|| BuildError::UnknownEntity(entity.to_string()))?;
        Ok(Self::new(schema, Some(entity), table))
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn schema(&self) -> &'a dyn Schema {
        self.schema
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Compile a filter mapping into predicates to be combined with AND.
    ///
    /// An empty mapping, at the top level or nested, yields an always-false
    /// predicate for that level rather than no predicate at all.
    pub fn build_from_hash(&self, attributes: &FilterMapping) -> BuildResult<Vec<Expression>> {
        let normalized = dot_notation::normalize(attributes)?;
        let predicates = self.expand_mapping(&self.scope, &normalized)?;
        debug!(
            "compiled {} filter keys on {} into {} predicates",
            attributes.len(),
            self.scope.table,
            predicates.len()
        );
        Ok(predicates)
    }

    /// Compile one column (or association) filter in this builder's scope
    pub fn expand(&self, column: &str, value: &FilterValue) -> BuildResult<Vec<Expression>> {
        self.expand_in(&self.scope, column, value)
    }

    /// Cast `value` for the attribute and dispatch it to the matching handler
    pub fn build(&self, attribute: &Attribute, value: &FilterValue) -> BuildResult<Expression> {
        let value = cast::type_cast(value, attribute.data_type)?;
        let handler = self.registry.handler_for(&value)?;
        handler(self, attribute, &value)
    }

    /// Attribute for `column` on this builder's table
    pub fn attribute(&self, column: &str) -> Attribute {
        self.attribute_in(&self.scope, column)
    }

    /// Rewrite keys that are attribute aliases on this builder's entity
    pub fn resolve_column_aliases(&self, attributes: &FilterMapping) -> FilterMapping {
        attributes
            .iter()
            .map(|(key, value)| (self.resolve_alias(&self.scope, key), value.clone()))
            .collect()
    }

    /// Association (table) names a filter refers to: keys holding nested
    /// mappings and the table part of dotted keys
    pub fn references(attributes: &FilterMapping) -> IndexSet<String> {
        attributes
            .iter()
            .filter_map(|(key, value)| match value {
                FilterValue::Nested(_) => Some(key.clone()),
                _ => key.split_once('.').map(|(table, _)| table.to_string()),
            })
            .collect()
    }

    fn expand_mapping(
        &self,
        scope: &Scope,
        attributes: &FilterMapping,
    ) -> BuildResult<Vec<Expression>> {
        if attributes.is_empty() {
            debug!("empty filter on {}; matching nothing", scope.table);
            return Ok(vec![Expression::always_false()]);
        }

        let mut predicates = Vec::with_capacity(attributes.len());
        for (key, value) in attributes {
            match value {
                FilterValue::Nested(nested) => {
                    let child = self.child_scope(scope, key);
                    predicates.extend(self.expand_mapping(&child, nested)?);
                }
                _ => {
                    let column = self.resolve_alias(scope, key);
                    predicates.extend(self.expand_in(scope, &column, value)?);
                }
            }
        }
        Ok(predicates)
    }

    fn expand_in(
        &self,
        scope: &Scope,
        column: &str,
        value: &FilterValue,
    ) -> BuildResult<Vec<Expression>> {
        let mut predicates = Vec::with_capacity(2);
        let mut column = column.to_string();

        let resolved = scope.entity.as_deref().and_then(|entity| {
            AssociationResolver::new(self.schema).resolve(entity, &column, value)
        });

        if let Some(resolved) = resolved {
            if let Some(condition) = resolved.type_condition {
                let attribute = self.attribute_in(scope, &condition.column);
                let base_entity = FilterValue::Entity(condition.base_entity);
                predicates.push(self.build(&attribute, &base_entity)?);
            }
            column = resolved.foreign_key;
        }

        debug!("expanding {}.{} ({})", scope.table, column, value.type_name());
        let attribute = self.attribute_in(scope, &column);
        predicates.push(self.build(&attribute, value)?);
        Ok(predicates)
    }

    /// Scope for a nested mapping under `key`: the table is aliased by the key,
    /// the entity is the association's target when `key` names one
    fn child_scope(&self, scope: &Scope, key: &str) -> Scope {
        let entity = scope
            .entity
            .as_deref()
            .and_then(|entity| self.schema.reflect_on_association(entity, key))
            .and_then(|association| association.target_entity.clone());
        debug!("nested filter on {} (entity {:?})", key, entity);
        Scope {
            entity,
            table: key.to_string(),
        }
    }

    fn attribute_in(&self, scope: &Scope, column: &str) -> Attribute {
        let data_type = scope
            .entity
            .as_deref()
            .and_then(|entity| self.schema.type_for(entity, column));
        Attribute::new(AttributeRef::new(scope.table.as_str(), column), data_type)
    }

    fn resolve_alias(&self, scope: &Scope, key: &str) -> String {
        scope
            .entity
            .as_deref()
            .and_then(|entity| self.schema.attribute_alias(entity, key))
            .unwrap_or(key)
            .to_string()
    }
}
