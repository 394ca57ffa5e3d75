//! Storage casts applied to filter values before handler dispatch.

use crate::access::DataType;
use crate::filter::{FilterRange, FilterValue, RecordRef};
use crate::predicate_builder::BuildResult;

/// Cast `value` for a column of type `data_type`.
///
/// Scalars are cast directly, lists element by element and ranges per endpoint.
/// Record identities are cast too. Bound parameters, entity references,
/// relations, nested mappings and custom values pass through untouched, as does
/// everything when the column type is unknown.
pub fn type_cast(value: &FilterValue, data_type: Option<DataType>) -> BuildResult<FilterValue> {
    let Some(data_type) = data_type else {
        return Ok(value.clone());
    };

    let cast = match value {
        FilterValue::Scalar(v) => FilterValue::Scalar(data_type.cast(v)?),
        FilterValue::List(items) => FilterValue::List(
            items
                .iter()
                .map(|item| type_cast(item, Some(data_type)))
                .collect::<BuildResult<Vec<_>>>()?,
        ),
        FilterValue::Range(range) => FilterValue::Range(FilterRange {
            start: range.start.as_ref().map(|v| data_type.cast(v)).transpose()?,
            end: range.end.as_ref().map(|v| data_type.cast(v)).transpose()?,
            exclude_end: range.exclude_end,
        }),
        FilterValue::Record(record) => FilterValue::Record(RecordRef {
            entity: record.entity.clone(),
            id: data_type.cast(&record.id)?,
        }),
        other => other.clone(),
    };
    Ok(cast)
}
