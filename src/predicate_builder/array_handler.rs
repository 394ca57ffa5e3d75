//! Handler for list-valued filters.
//!
//! `[1, 2, nil, 5..7]` compiles to `(attr IN (1, 2) OR attr IS NULL) OR attr BETWEEN 5 AND 7`.
//! Nils become an `IS NULL` branch and ranges their own range branches. A single
//! plain value is compiled exactly as if it had been given on its own.

use crate::expression::{Attribute, Expression};
use crate::filter::FilterValue;
use crate::predicate_builder::registry::{operand, unsupported};
use crate::predicate_builder::{BuildError, BuildResult, NestedArrayPolicy, PredicateBuilder};
use log::warn;

pub fn call(
    builder: &PredicateBuilder<'_>,
    attribute: &Attribute,
    value: &FilterValue,
) -> BuildResult<Expression> {
    let FilterValue::List(items) = value else {
        return Err(unsupported(value));
    };

    let items = flatten(builder, attribute, items)?;
    let (nils, values): (Vec<_>, Vec<_>) = items.into_iter().partition(FilterValue::is_null);

    if values.is_empty() && nils.is_empty() {
        return Ok(attribute.in_list(Vec::new()));
    }

    let (ranges, scalars): (Vec<_>, Vec<_>) = values
        .into_iter()
        .partition(|v| matches!(v, FilterValue::Range(_)));

    // `None` is the identity for OR
    let mut predicate = match scalars.as_slice() {
        [] => None,
        [single] => Some(builder.build(attribute, single)?),
        many => Some(
            attribute.in_list(
                many.iter()
                    .map(|v| operand(&unwrap_record(v)))
                    .collect::<BuildResult<Vec<_>>>()?,
            ),
        ),
    };

    if !nils.is_empty() {
        predicate = or_with(predicate, builder.build(attribute, &FilterValue::null())?);
    }

    for range in &ranges {
        predicate = or_with(predicate, builder.build(attribute, range)?);
    }

    Ok(predicate.unwrap_or_else(|| attribute.in_list(Vec::new())))
}

fn or_with(acc: Option<Expression>, next: Expression) -> Option<Expression> {
    Some(match acc {
        None => next,
        Some(acc) => Expression::or(acc, next),
    })
}

/// Records inside a list compare by identity
fn unwrap_record(value: &FilterValue) -> FilterValue {
    match value {
        FilterValue::Record(record) => FilterValue::Scalar(record.id.clone()),
        other => other.clone(),
    }
}

/// Flatten nested lists at every depth, or reject them, per the configured policy
fn flatten(
    builder: &PredicateBuilder<'_>,
    attribute: &Attribute,
    items: &[FilterValue],
) -> BuildResult<Vec<FilterValue>> {
    if !items.iter().any(|v| matches!(v, FilterValue::List(_))) {
        return Ok(items.to_vec());
    }

    match builder.config().nested_array_policy {
        NestedArrayPolicy::Reject => Err(BuildError::NestedArray {
            column: attribute.name().to_string(),
        }),
        NestedArrayPolicy::Flatten => {
            warn!(
                "Passing a nested array to a filter on '{}' is deprecated; \
                 flatten the array before using it for IN conditions",
                attribute.name()
            );
            let mut flat = Vec::with_capacity(items.len());
            flatten_into(items, &mut flat);
            Ok(flat)
        }
    }
}

fn flatten_into(items: &[FilterValue], out: &mut Vec<FilterValue>) {
    for item in items {
        match item {
            FilterValue::List(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}
