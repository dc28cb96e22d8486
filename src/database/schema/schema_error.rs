use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("could not read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed schema document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("duplicated column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },
    #[error("foreign key {table}.{column} references unknown column {ref_table}.{ref_column}")]
    InvalidReference {
        table: String,
        column: String,
        ref_table: String,
        ref_column: String,
    },
}
