//! Schema and association metadata consulted while compiling filters.
//!
//! The compiler only talks to the [`Schema`] trait; [`Catalog`] is the in-memory
//! implementation, built programmatically or loaded from a JSON document.

pub mod association_info;
pub mod column_info;
pub mod entity_info;

pub use association_info::AssociationInfo;
pub use column_info::ColumnInfo;
pub use entity_info::EntityInfo;

use crate::access::DataType;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Upper bound on inheritance chain walks; guards against cyclic `base` links.
const MAX_INHERITANCE_DEPTH: usize = 64;

/// Type-system and reflection lookups used by the predicate builder
pub trait Schema {
    fn entity(&self, name: &str) -> Option<&EntityInfo>;

    /// Declared type of a column, `None` when the column is unknown
    fn type_for(&self, entity: &str, column: &str) -> Option<DataType> {
        self.entity(entity)?.column_type(column)
    }

    fn reflect_on_association(&self, entity: &str, name: &str) -> Option<&AssociationInfo> {
        self.entity(entity)?.find_association(name)
    }

    fn attribute_alias(&self, entity: &str, name: &str) -> Option<&str> {
        self.entity(entity)?
            .attribute_aliases
            .get(name)
            .map(String::as_str)
    }

    /// Root of the entity's inheritance chain. Unknown entities are their own base.
    fn base_entity(&self, name: &str) -> String {
        let mut current = name;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            match self.entity(current).and_then(|e| e.base_entity.as_deref()) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    entities: Vec<EntityInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: HashMap<String, EntityInfo>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration; replaces an entity with the same name
    pub fn with_entity(mut self, entity: EntityInfo) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    pub fn add_entity(&mut self, entity: EntityInfo) -> Result<()> {
        if self.entities.contains_key(&entity.name) {
            bail!("Entity '{}' already exists", entity.name);
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Parse a catalog from `{"entities": [...]}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: CatalogDocument =
            serde_json::from_str(json).context("Failed to parse catalog document")?;

        let mut catalog = Catalog::new();
        for entity in document.entities {
            catalog.add_entity(entity)?;
        }
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn list_entities(&self) -> Vec<&EntityInfo> {
        let mut entities: Vec<_> = self.entities.values().collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        entities
    }
}

impl Schema for Catalog {
    fn entity(&self, name: &str) -> Option<&EntityInfo> {
        self.entities.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Catalog {
        Catalog::new()
            .with_entity(EntityInfo::new("Treasure", "treasures").column("id", DataType::Int64))
            .with_entity(EntityInfo::new("Gem", "treasures").inherits("Treasure"))
            .with_entity(EntityInfo::new("Ruby", "treasures").inherits("Gem"))
            .with_entity(
                EntityInfo::new("User", "users")
                    .column("id", DataType::Int64)
                    .alias("login", "name")
                    .column("name", DataType::Varchar),
            )
    }

    #[test]
    fn test_base_entity_walks_inheritance() {
        let catalog = sample();
        assert_eq!(catalog.base_entity("Ruby"), "Treasure");
        assert_eq!(catalog.base_entity("Treasure"), "Treasure");
        assert_eq!(catalog.base_entity("Unknown"), "Unknown");
    }

    #[test]
    fn test_base_entity_with_cycle_terminates() {
        let catalog = Catalog::new()
            .with_entity(EntityInfo::new("A", "a").inherits("B"))
            .with_entity(EntityInfo::new("B", "b").inherits("A"));
        let base = catalog.base_entity("A");
        assert!(base == "A" || base == "B");
    }

    #[test]
    fn test_lookups() {
        let catalog = sample();
        assert_eq!(catalog.type_for("User", "name"), Some(DataType::Varchar));
        assert_eq!(catalog.type_for("User", "missing"), None);
        assert_eq!(catalog.type_for("Nope", "name"), None);
        assert_eq!(catalog.attribute_alias("User", "login"), Some("name"));
        assert_eq!(catalog.attribute_alias("User", "name"), None);
        assert!(catalog.reflect_on_association("User", "posts").is_none());
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let json = r#"{"entities": [
            {"name": "User", "table": "users"},
            {"name": "User", "table": "people"}
        ]}"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"entities": [{{"name": "Post", "table": "posts",
                "columns": [{{"name": "id", "type": "int64"}}],
                "associations": [{{"name": "author", "target": "User"}}]}}]}}"#
        )?;

        let catalog = Catalog::load(file.path())?;
        assert_eq!(catalog.list_entities().len(), 1);
        let author = catalog
            .reflect_on_association("Post", "author")
            .expect("author association");
        assert_eq!(author.foreign_key(), "author_id");
        Ok(())
    }
}
