use crate::{
    analyzer::{AnalysisContext, AnalyzerError, BoundColumn, ColumnResolver},
    parser::ast::SelectItem,
};

pub struct WildcardResolver;

impl WildcardResolver {
    /// Expand `*` or `t.*` into the columns of the current scope, in FROM order.
    /// Any other item expands to nothing.
    pub fn expand_wildcard(item: &SelectItem, ctx: &AnalysisContext) -> Result<Vec<BoundColumn>, AnalyzerError> {
        let scope_index = ctx.scopes.len().saturating_sub(1);
        let Some(scope) = ctx.current_scope() else {
            return Err(AnalyzerError::InvalidStatement("wildcard outside of a query".into()));
        };

        match item {
            SelectItem::Wildcard { .. } => {
                if scope.sources.is_empty() {
                    return Err(AnalyzerError::InvalidStatement("no tables used".into()));
                }
                // expand all visible sources in insertion order
                let mut result = Vec::new();
                for (source_index, source) in scope.sources.iter().enumerate() {
                    for (column_index, from) in source.columns.iter().enumerate() {
                        result.push(ColumnResolver::bind(scope_index, source_index, source, column_index, from));
                    }
                }
                Ok(result)
            }
            SelectItem::QualifiedWildcard { table, .. } => {
                let (source_index, source) = scope
                    .source(table)
                    .ok_or_else(|| AnalyzerError::UnknownTable(table.clone()))?;
                Ok(source
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(column_index, from)| ColumnResolver::bind(scope_index, source_index, source, column_index, from))
                    .collect())
            }
            SelectItem::Expr { .. } => Ok(vec![]),
        }
    }
}
