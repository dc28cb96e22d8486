use indexmap::IndexMap;
use thiserror::Error;

use crate::analyzer::ColumnType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not resolve the type of '{expression}': {message}")]
pub struct ResolverError {
    pub expression: String,
    pub message: String,
}

impl ResolverError {
    pub fn new(expression: &str, message: &str) -> Self {
        Self { expression: expression.to_string(), message: message.to_string() }
    }
}

/// Capability that types an expression no static rule covers, usually by
/// running it against a live connection.
///
/// `from` is the FROM clause text of the query the expression belongs to, so
/// column references inside the expression can be evaluated.
pub trait ExpressionTypeResolver {
    fn resolve_expression_type(&self, expression: &str, from: Option<&str>) -> Result<ColumnType, ResolverError>;
}

/// Resolver answering from a fixed table of expression texts.
///
/// Lookups ignore ASCII case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct ExpressionTypeMap {
    types: IndexMap<String, ColumnType>,
}

impl ExpressionTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, expression: &str, column_type: ColumnType) -> Self {
        self.insert(expression, column_type);
        self
    }

    pub fn insert(&mut self, expression: &str, column_type: ColumnType) {
        self.types.insert(Self::key(expression), column_type);
    }

    fn key(expression: &str) -> String {
        expression.trim().to_ascii_lowercase()
    }
}

impl ExpressionTypeResolver for ExpressionTypeMap {
    fn resolve_expression_type(&self, expression: &str, _from: Option<&str>) -> Result<ColumnType, ResolverError> {
        self.types
            .get(&Self::key(expression))
            .cloned()
            .ok_or_else(|| ResolverError::new(expression, "no type registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqlType;

    #[test]
    pub fn test_lookup_ignores_case() {
        let resolver = ExpressionTypeMap::new().with("JSON_EXTRACT(doc, '$.a')", ColumnType::Single(SqlType::Json));
        match resolver.resolve_expression_type("json_extract(doc, '$.a')", Some("FROM t")) {
            Ok(ColumnType::Single(SqlType::Json)) => {}
            other => panic!("{other:?}"),
        }
        match resolver.resolve_expression_type("other(x)", None) {
            Ok(_) => panic!(),
            Err(err) => assert_eq!(err.to_string(), "could not resolve the type of 'other(x)': no type registered"),
        }
    }
}
