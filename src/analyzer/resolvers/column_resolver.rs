use crate::{
    analyzer::{AnalysisContext, AnalyzerError, BoundColumn, FromColumn, Reference, Source},
    parser::ast::ColumnRef,
};

pub struct ColumnResolver;

impl ColumnResolver {
    /// Bind a column reference to the innermost scope that provides it.
    ///
    /// Select aliases are a fallback of the innermost scope while it allows
    /// them (GROUP BY, HAVING, ORDER BY).
    pub fn resolve_column(column: &ColumnRef, ctx: &AnalysisContext) -> Result<Reference, AnalyzerError> {
        match &column.table {
            Some(table) => {
                for (scope_index, scope) in ctx.scopes.iter().enumerate().rev() {
                    let Some((source_index, source)) = scope.source(table) else {
                        continue;
                    };
                    if let (Some(wanted), Some(actual)) = (&column.schema, &source.schema) {
                        if !wanted.eq_ignore_ascii_case(actual) {
                            continue;
                        }
                    }
                    return match source.column(&column.name) {
                        Some((column_index, from)) => {
                            Ok(Reference::Column(Self::bind(scope_index, source_index, source, column_index, from)))
                        }
                        None => Err(AnalyzerError::UnknownColumn {
                            name: format!("{}.{}", table, column.name),
                            candidates: source.column_names(),
                        }),
                    };
                }
                Err(AnalyzerError::UnknownTable(table.clone()))
            }
            None => {
                let innermost = ctx.scopes.len().saturating_sub(1);
                for (scope_index, scope) in ctx.scopes.iter().enumerate().rev() {
                    // search each visible source for this column
                    let matches: Vec<(usize, &Source, usize, &FromColumn)> = scope
                        .sources
                        .iter()
                        .enumerate()
                        .filter_map(|(source_index, source)| {
                            source.column(&column.name).map(|(column_index, from)| (source_index, source, column_index, from))
                        })
                        .collect();

                    if matches.len() > 1 && !scope.is_using_column(&column.name) {
                        return Err(AnalyzerError::AmbiguousColumn {
                            name: column.name.clone(),
                            matches: matches.iter().map(|(_, source, _, from)| format!("{}.{}", source.visible, from.name)).collect(),
                        });
                    }
                    if let Some((source_index, source, column_index, from)) = matches.first() {
                        return Ok(Reference::Column(Self::bind(scope_index, *source_index, source, *column_index, from)));
                    }
                    if scope_index == innermost && scope.allow_aliases {
                        if let Some(alias) = scope.alias(&column.name) {
                            return Ok(Reference::Alias { var: alias.var, not_null: alias.not_null });
                        }
                    }
                }
                Err(AnalyzerError::UnknownColumn {
                    name: column.name.clone(),
                    candidates: ctx
                        .current_scope()
                        .map(|scope| scope.sources.iter().flat_map(|s| s.column_names()).collect())
                        .unwrap_or_default(),
                })
            }
        }
    }

    pub fn bind(scope: usize, source_index: usize, source: &Source, column_index: usize, from: &FromColumn) -> BoundColumn {
        BoundColumn {
            scope,
            source: source_index,
            column: column_index,
            var: from.var,
            visible: source.visible.clone(),
            table: source.table.clone(),
            name: from.name.clone(),
            column_key: from.column_key,
        }
    }
}
