use crate::{
    analyzer::{AnalysisContext, AnalyzerError, ExpressionAnalyzer, FromColumn, SelectAnalyzer, Source},
    parser::ast::{ExprId, JoinConstraint, JoinKind, TableFactor, TableRef},
};

/// What the FROM clause contributed besides its sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFrom {
    /// ON conditions of inner joins; their null-rejecting columns are not null.
    /// Dropped again when a later RIGHT or FULL join pads the sources they read.
    pub inner_predicates: Vec<ExprId>,
    /// `(joined source, ON condition)` of every join with an ON clause.
    pub join_conditions: Vec<(usize, ExprId)>,
    /// `(joined source, column)` of every `USING` column.
    pub using_columns: Vec<(usize, String)>,
    /// Text each source adds to the statement, indexed like the sources.
    pub fragments: Vec<String>,
}

pub struct JoinResolver;

impl JoinResolver {
    /// Add every FROM source to the current scope, left to right, walking
    /// each ON condition once the tables it can see are in place.
    pub fn resolve_from(from: &[TableRef], ctx: &mut AnalysisContext) -> Result<ResolvedFrom, AnalyzerError> {
        let mut resolved = ResolvedFrom::default();
        if let (Some(first), Some(last)) = (from.first(), from.last()) {
            let text = ctx.text(first.span.to(last.span));
            if let Some(scope) = ctx.current_scope_mut() {
                scope.from_text = Some(format!("FROM {}", text));
            }
        }

        for (ref_index, table_ref) in from.iter().enumerate() {
            let first_source = Self::source_count(ctx);
            let first_predicate = resolved.inner_predicates.len();
            let source = Self::resolve_factor(&table_ref.factor, ref_index, ctx)?;
            Self::push_source(source, ctx);
            let factor_text = ctx.text(table_ref.factor.span());
            resolved.fragments.push(match ref_index {
                0 => format!("FROM {}", factor_text),
                _ => format!(", {}", factor_text),
            });

            for join in &table_ref.joins {
                let source = Self::resolve_factor(&join.factor, ref_index, ctx)?;
                let joined = Self::push_source(source, ctx);
                resolved.fragments.push(ctx.text(join.span).to_string());

                if let Some(scope) = ctx.current_scope_mut() {
                    let nullable_range = match join.kind {
                        JoinKind::Left => joined..joined + 1,
                        JoinKind::Right => first_source..joined,
                        JoinKind::Full => first_source..joined + 1,
                        JoinKind::Inner | JoinKind::Cross => joined..joined,
                    };
                    for source in &mut scope.sources[nullable_range] {
                        source.outer_nullable = true;
                    }
                }
                // earlier ON conditions of this item no longer hold for rows the outer join pads
                if matches!(join.kind, JoinKind::Right | JoinKind::Full) {
                    resolved.inner_predicates.truncate(first_predicate);
                }

                match &join.constraint {
                    JoinConstraint::On(on) => {
                        ExpressionAnalyzer::walk(*on, ctx)?;
                        resolved.join_conditions.push((joined, *on));
                        if !join.kind.is_outer() {
                            resolved.inner_predicates.push(*on);
                        }
                    }
                    JoinConstraint::Using(columns) => {
                        Self::resolve_using(columns, joined, ctx)?;
                        resolved.using_columns.extend(columns.iter().map(|c| (joined, c.clone())));
                    }
                    JoinConstraint::None => {}
                }
            }
        }
        Ok(resolved)
    }

    /// Add a plain table to the current scope and return its source index.
    pub fn add_table(
        schema: Option<&str>,
        name: &str,
        alias: Option<&str>,
        ctx: &mut AnalysisContext,
    ) -> Result<usize, AnalyzerError> {
        let source = Self::table_source(schema, name, alias, 0, ctx)?;
        Ok(Self::push_source(source, ctx))
    }

    fn resolve_factor(factor: &TableFactor, table_ref: usize, ctx: &mut AnalysisContext) -> Result<Source, AnalyzerError> {
        match factor {
            TableFactor::Table { schema, name, alias, .. } => {
                Self::table_source(schema.as_deref(), name, alias.as_deref(), table_ref, ctx)
            }
            TableFactor::Derived { query, alias, .. } => {
                // a derived table cannot see the query it belongs to
                let saved = std::mem::take(&mut ctx.scopes);
                let shape = SelectAnalyzer::analyze_select(query, ctx);
                ctx.scopes = saved;
                let shape = shape?;

                Ok(Source {
                    visible: alias.clone(),
                    table: alias.clone(),
                    schema: None,
                    columns: shape
                        .columns
                        .iter()
                        .map(|c| FromColumn { name: c.name.clone(), var: c.var, not_null: c.not_null, column_key: c.column_key })
                        .collect(),
                    outer_nullable: false,
                    derived: true,
                    table_ref,
                })
            }
        }
    }

    fn table_source(
        schema: Option<&str>,
        name: &str,
        alias: Option<&str>,
        table_ref: usize,
        ctx: &mut AnalysisContext,
    ) -> Result<Source, AnalyzerError> {
        let table = ctx
            .schemas
            .table(schema, name)
            .ok_or_else(|| AnalyzerError::UnknownTable(name.to_string()))?;

        let mut columns = Vec::with_capacity(table.columns.len());
        for column in table.columns.values() {
            let var = ctx.solver.fresh();
            ctx.solver.fix(var, column.column_type);
            columns.push(FromColumn { name: column.column.clone(), var, not_null: column.not_null, column_key: column.column_key });
        }

        Ok(Source {
            visible: alias.unwrap_or(name).to_string(),
            table: table.name.clone(),
            schema: schema.map(str::to_string),
            columns,
            outer_nullable: false,
            derived: false,
            table_ref,
        })
    }

    fn resolve_using(columns: &[String], joined: usize, ctx: &mut AnalysisContext) -> Result<(), AnalyzerError> {
        let Some(scope) = ctx.current_scope_mut() else {
            return Ok(());
        };
        for column in columns {
            let on_both_sides = scope.sources[joined].column(column).is_some()
                && scope.sources[..joined].iter().any(|s| s.column(column).is_some());
            if !on_both_sides {
                return Err(AnalyzerError::UnknownColumn {
                    name: column.clone(),
                    candidates: scope.sources[joined].column_names(),
                });
            }
            scope.using_columns.push(column.clone());
        }
        Ok(())
    }

    fn source_count(ctx: &AnalysisContext) -> usize {
        ctx.current_scope().map(|s| s.sources.len()).unwrap_or(0)
    }

    fn push_source(source: Source, ctx: &mut AnalysisContext) -> usize {
        match ctx.current_scope_mut() {
            Some(scope) => {
                scope.sources.push(source);
                scope.sources.len() - 1
            }
            None => 0,
        }
    }
}
