use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::{ColumnSchema, ForeignKey, SchemaError, SchemaProvider};

/// Columns of a single table, in declaration order, keyed by lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub columns: IndexMap<String, ColumnSchema>,
}

impl TableSchema {
    pub fn new(schema: &str, name: &str) -> Self {
        Self { schema: schema.to_string(), name: name.to_string(), columns: IndexMap::new() }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnSchema> {
        self.columns.get(&column.to_ascii_lowercase())
    }

    pub fn primary_key(&self) -> Vec<&ColumnSchema> {
        self.columns.values().filter(|c| c.is_primary_key()).collect()
    }

    pub fn is_unique(&self, column: &str) -> bool {
        self.get(column).map(|c| c.is_unique()).unwrap_or(false)
    }
}

/// Serialized form of a catalog: the flat `information_schema` style column
/// list plus optional foreign keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// In-memory schema snapshot the analyzer reads from.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: IndexMap<String, TableSchema>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn table_key(schema: &str, table: &str) -> String {
        format!("{}.{}", schema.to_ascii_lowercase(), table.to_ascii_lowercase())
    }

    pub fn add_column(&mut self, column: ColumnSchema) -> Result<(), SchemaError> {
        let key = Self::table_key(&column.schema, &column.table);
        let table = self
            .tables
            .entry(key)
            .or_insert_with(|| TableSchema::new(&column.schema, &column.table));

        let column_key = column.column.to_ascii_lowercase();
        if table.columns.contains_key(&column_key) {
            return Err(SchemaError::DuplicateColumn { table: column.table, column: column.column });
        }
        table.columns.insert(column_key, column);
        Ok(())
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Result<Self, SchemaError> {
        self.add_column(column)?;
        Ok(self)
    }

    pub fn add_foreign_key(&mut self, fk: ForeignKey) -> Result<(), SchemaError> {
        let known = |table: &str, column: &str| {
            self.find_table(None, table).and_then(|t| t.get(column)).is_some()
        };
        if !known(&fk.table, &fk.column) || !known(&fk.ref_table, &fk.ref_column) {
            return Err(SchemaError::InvalidReference {
                table: fk.table,
                column: fk.column,
                ref_table: fk.ref_table,
                ref_column: fk.ref_column,
            });
        }
        self.foreign_keys.push(fk);
        Ok(())
    }

    pub fn from_columns(columns: Vec<ColumnSchema>) -> Result<Self, SchemaError> {
        let mut catalog = Self::new();
        for column in columns {
            catalog.add_column(column)?;
        }
        Ok(catalog)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self, SchemaError> {
        let mut catalog = Self::from_columns(document.columns)?;
        for fk in document.foreign_keys {
            catalog.add_foreign_key(fk)?;
        }
        debug!(tables = catalog.tables.len(), foreign_keys = catalog.foreign_keys.len(), "schema catalog loaded");
        Ok(catalog)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let document: CatalogDocument = serde_json::from_str(text)?;
        Self::from_document(document)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| SchemaError::Io { path: path.to_string_lossy().to_string(), source })?;
        Self::from_json_str(&text)
    }

    pub async fn load_from_file_async(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SchemaError::Io { path: path.to_string_lossy().to_string(), source })?;
        Self::from_json_str(&text)
    }

    fn find_table(&self, schema: Option<&str>, name: &str) -> Option<&TableSchema> {
        match schema {
            Some(schema) => self.tables.get(&Self::table_key(schema, name)),
            None => self.tables.values().find(|t| t.name.eq_ignore_ascii_case(name)),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            columns: self.tables.values().flat_map(|t| t.columns.values().cloned()).collect(),
            foreign_keys: self.foreign_keys.clone(),
        }
    }
}

impl SchemaProvider for SchemaCatalog {
    fn table(&self, schema: Option<&str>, name: &str) -> Option<&TableSchema> {
        self.find_table(schema, name)
    }

    fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::database::{ColumnKey, SqlType};

    fn sample() -> SchemaCatalog {
        SchemaCatalog::from_columns(vec![
            ColumnSchema::new("users", "id", SqlType::Int, true).with_key(ColumnKey::Primary),
            ColumnSchema::new("users", "email", SqlType::Varchar, true).with_key(ColumnKey::Unique),
            ColumnSchema::new("posts", "id", SqlType::Int, true).with_key(ColumnKey::Primary),
            ColumnSchema::new("posts", "fk_user", SqlType::Int, false),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = sample();
        let users = catalog.table(None, "USERS").unwrap();
        assert_eq!(users.name, "users");
        assert!(users.get("Email").is_some());
        assert!(users.is_unique("email"));
        assert_eq!(users.primary_key().len(), 1);
    }

    #[test]
    fn test_duplicate_column_is_rejected() {
        let err = sample()
            .with_column(ColumnSchema::new("users", "ID", SqlType::Int, true))
            .unwrap_err();
        match err {
            SchemaError::DuplicateColumn { table, column } => {
                assert_eq!(table, "users");
                assert_eq!(column, "ID");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_foreign_key_must_reference_known_columns() {
        let mut catalog = sample();
        catalog.add_foreign_key(ForeignKey::new("posts", "fk_user", "users", "id")).unwrap();
        assert_eq!(catalog.foreign_keys().len(), 1);
        assert!(catalog.foreign_keys()[0].links("users", "posts"));

        let err = catalog.add_foreign_key(ForeignKey::new("posts", "author", "users", "id"));
        assert!(matches!(err, Err(SchemaError::InvalidReference { .. })));
    }

    #[test]
    fn test_document_roundtrip_keeps_order() {
        let catalog = sample();
        let text = serde_json::to_string(&catalog.to_document()).unwrap();
        let reloaded = SchemaCatalog::from_json_str(&text).unwrap();
        let names: Vec<_> = reloaded.tables().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["users", "posts"]);
    }

    #[test]
    fn test_malformed_document() {
        let err = SchemaCatalog::from_json_str("{\"columns\": 1}").unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_load_from_file_async() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"columns":[{{"table":"t","column":"a","columnType":"bigint","notNull":true,"columnKey":"PRI"}}]}}"#
        )
        .unwrap();

        let catalog = SchemaCatalog::load_from_file_async(file.path()).await.unwrap();
        let column = catalog.table(None, "t").and_then(|t| t.get("a")).unwrap();
        assert_eq!(column.column_type, SqlType::BigInt);

        let sync = SchemaCatalog::load_from_file(file.path()).unwrap();
        assert!(sync.table(Some(""), "t").is_some());
    }

    #[tokio::test]
    async fn test_missing_file_reports_io() {
        let err = SchemaCatalog::load_from_file_async("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }
}
