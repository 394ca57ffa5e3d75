//! Association lookups for filter keys.
//!
//! `{"author": user}` on a `belongs_to :author` becomes `author_id = user.id`.
//! For a polymorphic association whose value names a concrete entity, the
//! discriminator column is also matched against that entity's base.

use crate::catalog::Schema;
use crate::filter::FilterValue;
use log::debug;

/// Discriminator predicate emitted for polymorphic associations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCondition {
    pub column: String,
    pub base_entity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssociation {
    pub foreign_key: String,
    pub type_condition: Option<TypeCondition>,
}

pub struct AssociationResolver<'a> {
    schema: &'a dyn Schema,
}

impl<'a> AssociationResolver<'a> {
    pub fn new(schema: &'a dyn Schema) -> Self {
        Self { schema }
    }

    /// `None` when `name` is not an association of `entity`; the key is then an
    /// ordinary column
    pub fn resolve(
        &self,
        entity: &str,
        name: &str,
        value: &FilterValue,
    ) -> Option<ResolvedAssociation> {
        let reflection = self.schema.reflect_on_association(entity, name)?;

        let type_condition = match reflection.foreign_type() {
            Some(column) => self
                .polymorphic_base_entity(value)
                .map(|base_entity| TypeCondition {
                    column,
                    base_entity,
                }),
            None => None,
        };

        let resolved = ResolvedAssociation {
            foreign_key: reflection.foreign_key(),
            type_condition,
        };
        debug!("resolved association {}.{}: {:?}", entity, name, resolved);
        Some(resolved)
    }

    /// Base entity identified by a filter value, if any
    pub fn polymorphic_base_entity(&self, value: &FilterValue) -> Option<String> {
        match value {
            FilterValue::Record(record) => Some(self.schema.base_entity(&record.entity)),
            FilterValue::Relation(subquery) => Some(self.schema.base_entity(&subquery.entity)),
            FilterValue::List(items) => match items.iter().find(|v| !v.is_null())? {
                FilterValue::Record(record) => Some(self.schema.base_entity(&record.entity)),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DataType;
    use crate::catalog::{AssociationInfo, Catalog, EntityInfo};
    use crate::expression::SubQuery;
    use crate::filter::{list, RecordRef};

    fn catalog() -> Catalog {
        Catalog::new()
            .with_entity(EntityInfo::new("Treasure", "treasures").column("id", DataType::Int64))
            .with_entity(EntityInfo::new("Gem", "treasures").inherits("Treasure"))
            .with_entity(
                EntityInfo::new("PriceEstimate", "price_estimates")
                    .association(AssociationInfo::polymorphic("estimate_of"))
                    .association(AssociationInfo::belongs_to("currency", "Currency")),
            )
    }

    #[test]
    fn test_plain_association() {
        let catalog = catalog();
        let resolver = AssociationResolver::new(&catalog);
        let resolved = resolver
            .resolve("PriceEstimate", "currency", &RecordRef::new("Currency", 1).into())
            .unwrap();
        assert_eq!(resolved.foreign_key, "currency_id");
        assert_eq!(resolved.type_condition, None);
    }

    #[test]
    fn test_polymorphic_association_uses_base_entity() {
        let catalog = catalog();
        let resolver = AssociationResolver::new(&catalog);
        let resolved = resolver
            .resolve("PriceEstimate", "estimate_of", &RecordRef::new("Gem", 1).into())
            .unwrap();
        assert_eq!(resolved.foreign_key, "estimate_of_id");
        assert_eq!(
            resolved.type_condition,
            Some(TypeCondition {
                column: "estimate_of_type".to_string(),
                base_entity: "Treasure".to_string(),
            })
        );
    }

    #[test]
    fn test_polymorphic_without_concrete_value() {
        let catalog = catalog();
        let resolver = AssociationResolver::new(&catalog);
        let resolved = resolver
            .resolve("PriceEstimate", "estimate_of", &5.into())
            .unwrap();
        assert_eq!(resolved.type_condition, None);
    }

    #[test]
    fn test_base_entity_from_value_shapes() {
        let catalog = catalog();
        let resolver = AssociationResolver::new(&catalog);
        assert_eq!(
            resolver.polymorphic_base_entity(&list([
                FilterValue::null(),
                RecordRef::new("Gem", 1).into(),
            ])),
            Some("Treasure".to_string())
        );
        assert_eq!(
            resolver.polymorphic_base_entity(&list([1, 2])),
            None
        );
        assert_eq!(
            resolver.polymorphic_base_entity(&SubQuery::new("Gem", "treasures").into()),
            Some("Treasure".to_string())
        );
        assert_eq!(resolver.polymorphic_base_entity(&"x".into()), None);
    }

    #[test]
    fn test_non_association_is_none() {
        let catalog = catalog();
        let resolver = AssociationResolver::new(&catalog);
        assert!(resolver.resolve("PriceEstimate", "price", &1.into()).is_none());
        assert!(resolver.resolve("Unknown", "currency", &1.into()).is_none());
    }
}
