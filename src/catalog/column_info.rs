//! Column information and metadata structures.

use crate::access::DataType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(rename = "name")]
    pub column_name: String,
    #[serde(rename = "type")]
    pub column_type: DataType,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, column_type: DataType) -> Self {
        Self {
            column_name: column_name.into(),
            column_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_info_from_json() {
        let column: ColumnInfo =
            serde_json::from_str(r#"{"name": "age", "type": "int32"}"#).unwrap();
        assert_eq!(column, ColumnInfo::new("age", DataType::Int32));
    }
}
