pub mod parser;

pub mod database;
pub use database::{ColumnKey, ColumnSchema, ForeignKey, SchemaCatalog, SchemaProvider, SqlType};

pub mod analyzer;
pub use analyzer::{AnalysisResult, AnalyzerConfig, ColumnType, ExpressionTypeResolver, ParameterDescriptor, QueryType, ResultColumn};

pub mod nested;
pub mod dynamic;

pub mod describe;
pub use describe::*;
