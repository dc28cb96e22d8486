use serde::{Deserialize, Serialize};

use crate::database::SqlType;

/// Key classification of a column, as reported by `information_schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnKey {
    #[serde(rename = "PRI")]
    Primary,
    #[serde(rename = "UNI")]
    Unique,
    #[serde(rename = "MUL")]
    Multiple,
    #[default]
    #[serde(rename = "")]
    None,
}

/// Description of one column of one table.
///
/// `column_type` accepts any declared type string when deserialized
/// (`varchar(100)`, `INTEGER`, ...) and is stored as a `SqlType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    #[serde(default)]
    pub schema: String,
    pub table: String,
    pub column: String,
    #[serde(alias = "column_type")]
    pub column_type: SqlType,
    pub not_null: bool,
    #[serde(default, alias = "column_key")]
    pub column_key: ColumnKey,
    #[serde(default)]
    pub default: Option<String>,
}

impl ColumnSchema {
    pub fn new(table: &str, column: &str, column_type: SqlType, not_null: bool) -> Self {
        Self {
            schema: String::new(),
            table: table.to_string(),
            column: column.to_string(),
            column_type,
            not_null,
            column_key: ColumnKey::None,
            default: None,
        }
    }

    pub fn with_key(mut self, column_key: ColumnKey) -> Self {
        self.column_key = column_key;
        self
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.column_key == ColumnKey::Primary
    }

    pub fn is_unique(&self) -> bool {
        matches!(self.column_key, ColumnKey::Primary | ColumnKey::Unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_information_schema_row() {
        let raw = r#"{"schema":"mydb","table":"mytable1","column":"id","column_type":"int(11)","notNull":true,"columnKey":"PRI"}"#;
        let column: ColumnSchema = serde_json::from_str(raw).unwrap();
        assert_eq!(column.column_type, SqlType::Int);
        assert!(column.is_primary_key());
        assert!(column.is_unique());
        assert_eq!(column.default, None);
    }

    #[test]
    fn test_missing_key_defaults_to_none() {
        let raw = r#"{"table":"t","column":"c","columnType":"varchar","notNull":false}"#;
        let column: ColumnSchema = serde_json::from_str(raw).unwrap();
        assert_eq!(column.column_key, ColumnKey::None);
        assert!(!column.is_unique());
    }
}
