//! Association reflection metadata.

use serde::{Deserialize, Serialize};

/// A named relationship from one entity to another.
///
/// The foreign key defaults to `<name>_id`; polymorphic associations also carry a
/// discriminator column, defaulting to `<name>_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationInfo {
    pub name: String,
    /// Target entity. `None` for polymorphic associations, whose target varies per row.
    #[serde(default, rename = "target")]
    pub target_entity: Option<String>,
    #[serde(default)]
    pub polymorphic: bool,
    #[serde(default)]
    foreign_key: Option<String>,
    #[serde(default)]
    foreign_type: Option<String>,
}

impl AssociationInfo {
    pub fn belongs_to(name: impl Into<String>, target_entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_entity: Some(target_entity.into()),
            polymorphic: false,
            foreign_key: None,
            foreign_type: None,
        }
    }

    pub fn polymorphic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_entity: None,
            polymorphic: true,
            foreign_key: None,
            foreign_type: None,
        }
    }

    pub fn with_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn with_foreign_type(mut self, column: impl Into<String>) -> Self {
        self.foreign_type = Some(column.into());
        self
    }

    pub fn foreign_key(&self) -> String {
        self.foreign_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", self.name))
    }

    /// Discriminator column; only meaningful for polymorphic associations.
    pub fn foreign_type(&self) -> Option<String> {
        if !self.polymorphic {
            return None;
        }
        Some(
            self.foreign_type
                .clone()
                .unwrap_or_else(|| format!("{}_type", self.name)),
        )
    }
}
