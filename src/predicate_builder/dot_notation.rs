//! Rewrites `"table.column"` keys into nested mappings.

use crate::filter::{FilterMapping, FilterValue};
use crate::predicate_builder::{BuildError, BuildResult};

/// Move every dotted key under a nested mapping keyed by its table name.
///
/// Only the first `.` splits. A nested mapping that already exists for the table
/// is merged into, with later keys overriding earlier ones. Keys without a `.`
/// pass through unchanged.
pub fn normalize(attributes: &FilterMapping) -> BuildResult<FilterMapping> {
    let mut normalized = FilterMapping::new();

    for (key, value) in attributes {
        match key.split_once('.') {
            Some((table, column)) => merge(
                &mut normalized,
                table,
                FilterMapping::new().with(column, value.clone()),
            )?,
            None => match value {
                FilterValue::Nested(nested) => merge(&mut normalized, key, nested.clone())?,
                _ if normalized.contains_key(key) => {
                    return Err(BuildError::ConflictingFilterKey { key: key.clone() })
                }
                _ => {
                    normalized.insert(key.as_str(), value.clone());
                }
            },
        }
    }

    Ok(normalized)
}

fn merge(target: &mut FilterMapping, table: &str, entries: FilterMapping) -> BuildResult<()> {
    match target.get_mut(table) {
        None => {
            target.insert(table, entries);
        }
        Some(FilterValue::Nested(existing)) => {
            for (column, value) in entries {
                existing.insert(column, value);
            }
        }
        Some(_) => {
            return Err(BuildError::ConflictingFilterKey {
                key: table.to_string(),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_key_becomes_nested() -> BuildResult<()> {
        let dotted = FilterMapping::new().with("orders.status", "paid");
        let nested =
            FilterMapping::new().with("orders", FilterMapping::new().with("status", "paid"));
        assert_eq!(normalize(&dotted)?, nested);
        assert_eq!(normalize(&nested)?, nested);
        Ok(())
    }

    #[test]
    fn test_merges_into_existing_table() -> BuildResult<()> {
        let mapping = FilterMapping::new()
            .with("name", "bob")
            .with("orders", FilterMapping::new().with("status", "open").with("total", 5))
            .with("orders.status", "paid");

        let expected = FilterMapping::new().with("name", "bob").with(
            "orders",
            FilterMapping::new().with("status", "paid").with("total", 5),
        );
        assert_eq!(normalize(&mapping)?, expected);
        Ok(())
    }

    #[test]
    fn test_explicit_mapping_after_dotted_key() -> BuildResult<()> {
        let mapping = FilterMapping::new()
            .with("orders.status", "paid")
            .with("orders", FilterMapping::new().with("total", 5));
        let expected = FilterMapping::new().with(
            "orders",
            FilterMapping::new().with("status", "paid").with("total", 5),
        );
        assert_eq!(normalize(&mapping)?, expected);
        Ok(())
    }

    #[test]
    fn test_splits_on_first_dot_only() -> BuildResult<()> {
        let mapping = FilterMapping::new().with("a.b.c", 1);
        let expected = FilterMapping::new().with("a", FilterMapping::new().with("b.c", 1));
        assert_eq!(normalize(&mapping)?, expected);
        Ok(())
    }

    #[test]
    fn test_conflicting_shapes() {
        let column_then_table = FilterMapping::new()
            .with("orders", 5)
            .with("orders.status", "paid");
        assert_eq!(
            normalize(&column_then_table),
            Err(BuildError::ConflictingFilterKey {
                key: "orders".to_string()
            })
        );

        let table_then_column = FilterMapping::new()
            .with("orders.status", "paid")
            .with("orders", 5);
        assert!(normalize(&table_then_column).is_err());
    }
}
