//! Entity information and metadata structures.

use crate::access::DataType;
use crate::catalog::{AssociationInfo, ColumnInfo};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_primary_key() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    pub name: String,
    #[serde(rename = "table")]
    pub table_name: String,
    /// Parent entity in a single-table inheritance chain
    #[serde(default, rename = "base")]
    pub base_entity: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub associations: Vec<AssociationInfo>,
    /// Attribute alias -> real column name
    #[serde(default, rename = "aliases")]
    pub attribute_aliases: IndexMap<String, String>,
}

impl EntityInfo {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            base_entity: None,
            primary_key: default_primary_key(),
            columns: Vec::new(),
            associations: Vec::new(),
            attribute_aliases: IndexMap::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, column_type: DataType) -> Self {
        self.columns.push(ColumnInfo::new(name, column_type));
        self
    }

    pub fn association(mut self, association: AssociationInfo) -> Self {
        self.associations.push(association);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>, column: impl Into<String>) -> Self {
        self.attribute_aliases.insert(alias.into(), column.into());
        self
    }

    pub fn inherits(mut self, base_entity: impl Into<String>) -> Self {
        self.base_entity = Some(base_entity.into());
        self
    }

    pub fn column_type(&self, column: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|c| c.column_name == column)
            .map(|c| c.column_type)
    }

    pub fn find_association(&self, name: &str) -> Option<&AssociationInfo> {
        self.associations.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_lookup() {
        let post = EntityInfo::new("Post", "posts")
            .column("id", DataType::Int64)
            .column("title", DataType::Varchar)
            .association(AssociationInfo::belongs_to("author", "User"));

        assert_eq!(post.column_type("title"), Some(DataType::Varchar));
        assert_eq!(post.column_type("missing"), None);
        assert!(post.find_association("author").is_some());
        assert!(post.find_association("title").is_none());
    }

    #[test]
    fn test_entity_from_json_defaults() {
        let entity: EntityInfo =
            serde_json::from_str(r#"{"name": "User", "table": "users"}"#).unwrap();
        assert_eq!(entity.primary_key, "id");
        assert!(entity.columns.is_empty());
        assert!(entity.base_entity.is_none());
    }
}
