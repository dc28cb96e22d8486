pub mod sql_type;
pub use sql_type::*;

pub mod column_schema;
pub use column_schema::*;

pub mod schema_catalog;
pub use schema_catalog::*;

pub mod reference_column;
pub use reference_column::*;

pub mod schema_error;
pub use schema_error::*;

pub trait SchemaProvider {
    /// Return the table with the given name, optionally qualified by schema.
    fn table(&self, schema: Option<&str>, name: &str) -> Option<&TableSchema>;

    /// Every foreign key known to the provider.
    fn foreign_keys(&self) -> &[ForeignKey];
}
