//! Handler for sub-query values.

use crate::expression::{Attribute, Expression};
use crate::filter::FilterValue;
use crate::predicate_builder::registry::unsupported;
use crate::predicate_builder::{BuildResult, PredicateBuilder};

/// `attr IN (SELECT ...)`. A sub-query without a select list selects the
/// target entity's primary key (`id` when the entity is unknown).
pub fn call(
    builder: &PredicateBuilder<'_>,
    attribute: &Attribute,
    value: &FilterValue,
) -> BuildResult<Expression> {
    let FilterValue::Relation(subquery) = value else {
        return Err(unsupported(value));
    };

    let mut subquery = subquery.clone();
    if subquery.select.is_none() {
        let primary_key = builder
            .schema()
            .entity(&subquery.entity)
            .map(|entity| entity.primary_key.clone())
            .unwrap_or_else(|| "id".to_string());
        subquery.select = Some(primary_key);
    }

    Ok(attribute.in_subquery(subquery))
}
