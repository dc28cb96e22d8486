use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    analyzer::{AnalysisResult, AnalyzerConfig, AnalyzerError, ExpressionTypeResolver, QueryAnalyzer, QueryType},
    database::{SchemaCatalog, SchemaError, SchemaProvider},
    dynamic::{FragmentExtractor, describe_dynamic_query},
    nested::NestedResultDecomposer,
    parser::{ParseError, ast::StatementParser, preprocess_sql},
};

#[derive(Debug, Error)]
pub enum DescribeErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// Failure to describe one statement, with the statement text attached.
#[derive(Debug, Error)]
#[error("{kind}\n  in: {sql}")]
pub struct DescribeError {
    pub sql: String,
    #[source]
    pub kind: DescribeErrorKind,
}

impl DescribeError {
    pub fn new(sql: &str, kind: impl Into<DescribeErrorKind>) -> Self {
        Self { sql: sql.to_string(), kind: kind.into() }
    }
}

/// Switches of one [`describe_sql`] call. `nested` and `dynamic` are OR-ed
/// with the `-- @nested` and `-- @dynamicQuery` annotations of the statement.
#[derive(Clone, Default)]
pub struct DescribeOptions<'a> {
    pub config: AnalyzerConfig,
    pub resolver: Option<&'a dyn ExpressionTypeResolver>,
    pub nested: bool,
    pub dynamic: bool,
}

impl<'a> DescribeOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ExpressionTypeResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }
}

/// Describe the inputs and outputs of one SQL statement against `schemas`.
pub fn describe_sql(sql: &str, schemas: &dyn SchemaProvider, options: &DescribeOptions) -> Result<AnalysisResult, DescribeError> {
    // 1) named placeholders and annotations
    let processed = preprocess_sql(sql);

    // 2) parse and analyze
    let statement = StatementParser::parse(&processed.sql).map_err(|e| DescribeError::new(sql, e))?;
    let analyzed = QueryAnalyzer::analyze(&statement, schemas, &processed.parameters, &options.config, options.resolver)
        .map_err(|e| DescribeError::new(sql, e))?;
    let mut result = analyzed.result;

    // 3) optional post-processing of SELECT statements
    let nested = options.nested || processed.nested;
    let dynamic = options.dynamic || processed.dynamic;
    match (&analyzed.layout, result.query_type) {
        (Some(layout), QueryType::Select) => {
            if nested {
                result.nested_result_info =
                    Some(NestedResultDecomposer::decompose(&result.columns, layout, schemas.foreign_keys()));
            }
            if dynamic {
                let info = FragmentExtractor::extract(layout, &result.columns);
                let names: Vec<String> = (0..statement.placeholders)
                    .map(|ordinal| match processed.parameters.get(ordinal) {
                        Some(Some(name)) => name.clone(),
                        _ => format!("param{}", ordinal + 1),
                    })
                    .collect();
                result.dynamic_sql_query = Some(describe_dynamic_query(&info, &names));
            }
        }
        _ if nested || dynamic => {
            warn!(query_type = ?result.query_type, "nested and dynamic descriptions only apply to SELECT");
        }
        _ => {}
    }

    debug!(
        query_type = ?result.query_type,
        columns = result.columns.len(),
        parameters = result.parameters.len(),
        "statement described"
    );
    Ok(result)
}

/// Load a JSON catalog from `path` and describe `sql` against it.
pub async fn describe_with_catalog_file(
    sql: &str,
    path: impl AsRef<Path>,
    options: &DescribeOptions<'_>,
) -> Result<AnalysisResult, DescribeError> {
    let catalog = SchemaCatalog::load_from_file_async(path).await.map_err(|e| DescribeError::new(sql, e))?;
    describe_sql(sql, &catalog, options)
}
