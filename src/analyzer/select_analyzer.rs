use tracing::warn;

use crate::{
    analyzer::{
        AnalysisContext, AnalyzerError, BoundColumn, ColumnOrigin, Constraint, ExpressionAnalyzer, FunctionRegistry,
        JoinResolver, LayoutField, LayoutItem, NullabilityInference, OrderByResolver, Reference, Scope, SelectAlias,
        SpecLayout, TypeVar, WildcardResolver,
    },
    database::{ColumnKey, SqlType},
    parser::ast::{BinaryOp, ExprId, ExprKind, Literal, QuerySpec, SelectItem, SelectStatement, TableFactor},
};

/// One output column of a query, before its type is solved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeColumn {
    pub name: String,
    pub var: TypeVar,
    pub not_null: bool,
    /// Select-list expression producing the column; `None` for `*` expansions and UNION merges.
    pub expr: Option<ExprId>,
    pub origin: Option<ColumnOrigin>,
    pub column_key: ColumnKey,
}

/// Result of one query specification.
#[derive(Debug, Clone)]
pub struct SpecShape {
    pub columns: Vec<ShapeColumn>,
    pub layout: SpecLayout,
    pub scope: Scope,
    /// The query specification alone returns at most one row.
    pub single_row: bool,
}

/// Result of a whole SELECT, UNION branches merged.
#[derive(Debug, Clone)]
pub struct SelectShape {
    pub columns: Vec<ShapeColumn>,
    pub multiple_rows: bool,
    /// Layout of the first query specification.
    pub layout: SpecLayout,
    /// Column names of every FROM source of the first query specification.
    pub from_columns: Vec<String>,
    pub has_order_by: bool,
}

pub struct SelectAnalyzer;

impl SelectAnalyzer {
    pub fn analyze_select(select: &SelectStatement, ctx: &mut AnalysisContext) -> Result<SelectShape, AnalyzerError> {
        let mut specs = Vec::with_capacity(select.specs.len());
        for spec in &select.specs {
            specs.push(Self::analyze_spec(spec, ctx)?);
        }
        let mut specs = specs.into_iter();
        let Some(first) = specs.next() else {
            return Err(AnalyzerError::InvalidStatement("query without a select list".into()));
        };
        let branches: Vec<SpecShape> = specs.collect();

        let from_columns = first.scope.sources.iter().flat_map(|s| s.column_names()).collect();
        let columns = match branches.is_empty() {
            true => first.columns,
            false => Self::merge_union(first.columns, &branches, ctx),
        };

        if select.is_union() {
            let mut scope = Scope::new();
            scope.aliases = columns
                .iter()
                .map(|c| SelectAlias { name: c.name.clone(), var: c.var, not_null: c.not_null })
                .collect();
            OrderByResolver::resolve_order_by(&select.order_by, scope, ctx)?;
        } else {
            OrderByResolver::resolve_order_by(&select.order_by, first.scope, ctx)?;
        }

        let mut limit_one = false;
        if let Some(limit) = &select.limit {
            limit_one = matches!(ctx.kind(limit.count), ExprKind::Literal(Literal::Int(1)));
            for expr in std::iter::once(limit.count).chain(limit.offset) {
                let var = ExpressionAnalyzer::walk(expr, ctx)?;
                ctx.solver.expect(var, SqlType::BigInt);
            }
        }

        let single_row = limit_one || (!select.is_union() && first.single_row);
        Ok(SelectShape {
            columns,
            multiple_rows: !ctx.config.infer_multiple_rows || !single_row,
            layout: first.layout,
            from_columns,
            has_order_by: !select.order_by.is_empty(),
        })
    }

    /// Analyze one query specification inside its own scope.
    pub fn analyze_spec(spec: &QuerySpec, ctx: &mut AnalysisContext) -> Result<SpecShape, AnalyzerError> {
        ctx.push_scope(Scope::new());
        let analyzed = Self::analyze_in_scope(spec, ctx);
        let scope = ctx.pop_scope();
        let (columns, layout, single_row) = analyzed?;
        Ok(SpecShape { columns, layout, scope, single_row })
    }

    fn analyze_in_scope(
        spec: &QuerySpec,
        ctx: &mut AnalysisContext,
    ) -> Result<(Vec<ShapeColumn>, SpecLayout, bool), AnalyzerError> {
        let scope_index = ctx.scopes.len().saturating_sub(1);

        // 1) sources and join conditions
        let from = JoinResolver::resolve_from(&spec.from, ctx)?;

        // 2) filters, then the columns they prove not null
        if let Some(predicate) = spec.where_clause {
            ExpressionAnalyzer::walk(predicate, ctx)?;
        }
        let mut predicates = from.inner_predicates.clone();
        predicates.extend(spec.where_clause);
        NullabilityInference::prove_not_null(&predicates, ctx);

        // 3) select list
        let mut columns: Vec<ShapeColumn> = Vec::with_capacity(spec.items.len());
        let mut items = Vec::with_capacity(spec.items.len());
        for item in &spec.items {
            let start = columns.len();
            match item {
                SelectItem::Expr { expr, alias, span } => {
                    let var = ExpressionAnalyzer::walk(*expr, ctx)?;
                    let not_null = NullabilityInference::not_null(*expr, ctx);
                    let bound = match ctx.references.get(expr) {
                        Some(Reference::Column(bound)) if bound.scope == scope_index => Some(bound.clone()),
                        _ => None,
                    };
                    let name = match (alias, ctx.kind(*expr)) {
                        (Some(alias), _) => alias.clone(),
                        (None, ExprKind::Column(column)) => column.name.clone(),
                        (None, _) => ctx.expr_text(*expr).to_string(),
                    };

                    if let Some(scope) = ctx.current_scope_mut() {
                        scope.aliases.push(SelectAlias { name: name.clone(), var, not_null });
                    }
                    columns.push(ShapeColumn {
                        name,
                        var,
                        not_null,
                        expr: Some(*expr),
                        origin: bound.as_ref().map(Self::origin),
                        column_key: bound.map(|b| b.column_key).unwrap_or_default(),
                    });
                    items.push(LayoutItem {
                        text: ctx.text(*span).to_string(),
                        columns: start..start + 1,
                        fields: SpecLayout::fields(*expr, Some(start), ctx),
                    });
                }
                SelectItem::Wildcard { .. } | SelectItem::QualifiedWildcard { .. } => {
                    let mut fields = Vec::new();
                    for bound in WildcardResolver::expand_wildcard(item, ctx)? {
                        let not_null = ctx
                            .current_scope()
                            .map(|scope| scope.column_not_null(bound.source, bound.column))
                            .unwrap_or(false);
                        fields.push(LayoutField { source: bound.source, column: bound.name.clone(), output: Some(columns.len()) });
                        columns.push(ShapeColumn {
                            name: bound.name.clone(),
                            var: bound.var,
                            not_null,
                            expr: None,
                            origin: Some(Self::origin(&bound)),
                            column_key: bound.column_key,
                        });
                    }
                    items.push(LayoutItem { text: ctx.text(item.span()).to_string(), columns: start..columns.len(), fields });
                }
            }
        }

        // 4) GROUP BY and HAVING may name select aliases
        if let Some(scope) = ctx.current_scope_mut() {
            scope.allow_aliases = true;
        }
        for expr in &spec.group_by {
            ExpressionAnalyzer::walk(*expr, ctx)?;
        }
        if let Some(having) = spec.having {
            ExpressionAnalyzer::walk(having, ctx)?;
        }

        let layout = match ctx.current_scope() {
            Some(scope) => SpecLayout::build(scope, &from, items, spec.where_clause, ctx),
            None => SpecLayout::default(),
        };
        Ok((columns, layout, Self::single_row(spec, ctx)))
    }

    /// Fold the UNION branches into the first one, position by position.
    fn merge_union(first: Vec<ShapeColumn>, branches: &[SpecShape], ctx: &mut AnalysisContext) -> Vec<ShapeColumn> {
        for (branch, shape) in branches.iter().enumerate() {
            if shape.columns.len() != first.len() {
                warn!(
                    branch = branch + 1,
                    expected = first.len(),
                    found = shape.columns.len(),
                    "union branches return a different number of columns"
                );
            }
        }

        first
            .into_iter()
            .enumerate()
            .map(|(position, column)| {
                let mut args = vec![column.var];
                let mut not_null = column.not_null;
                for other in branches.iter().filter_map(|shape| shape.columns.get(position)) {
                    args.push(other.var);
                    not_null &= other.not_null;
                }
                let var = ctx.solver.fresh();
                ctx.solver.add(Constraint::Widen { target: var, args });
                ShapeColumn { name: column.name, var, not_null, expr: None, origin: None, column_key: ColumnKey::None }
            })
            .collect()
    }

    /// A specification yields at most one row without FROM, when it only
    /// aggregates, or when its WHERE pins the whole primary key of its
    /// single table.
    fn single_row(spec: &QuerySpec, ctx: &AnalysisContext) -> bool {
        if spec.from.is_empty() {
            return true;
        }
        let aggregates_only = spec.group_by.is_empty()
            && !spec.items.is_empty()
            && spec.items.iter().all(|item| match item {
                SelectItem::Expr { expr, .. } => {
                    matches!(ctx.kind(*expr), ExprKind::Function { name, .. } if FunctionRegistry::is_aggregate(name))
                }
                _ => false,
            });
        aggregates_only || Self::primary_key_filter(spec, ctx)
    }

    fn primary_key_filter(spec: &QuerySpec, ctx: &AnalysisContext) -> bool {
        let [table_ref] = spec.from.as_slice() else {
            return false;
        };
        if !table_ref.joins.is_empty() {
            return false;
        }
        let TableFactor::Table { schema, name, .. } = &table_ref.factor else {
            return false;
        };
        let (Some(table), Some(predicate)) = (ctx.schemas.table(schema.as_deref(), name), spec.where_clause) else {
            return false;
        };
        let primary_key = table.primary_key();
        if primary_key.is_empty() {
            return false;
        }

        let current = ctx.scopes.len().saturating_sub(1);
        let mut pinned: Vec<&str> = Vec::new();
        for conjunct in ctx.arena().conjuncts(predicate) {
            let ExprKind::Binary { op: BinaryOp::Eq, left, right } = ctx.kind(conjunct) else {
                continue;
            };
            for (column, value) in [(*left, *right), (*right, *left)] {
                let is_value = matches!(ctx.kind(value), ExprKind::Literal(_) | ExprKind::Placeholder(_));
                if let (true, Some(Reference::Column(bound))) = (is_value, ctx.references.get(&column)) {
                    if bound.scope == current && bound.source == 0 {
                        pinned.push(&bound.name);
                    }
                }
            }
        }
        primary_key.iter().all(|pk| pinned.iter().any(|p| p.eq_ignore_ascii_case(&pk.column)))
    }

    fn origin(bound: &BoundColumn) -> ColumnOrigin {
        ColumnOrigin {
            source: bound.source,
            table: bound.table.clone(),
            visible: bound.visible.clone(),
            column: bound.name.clone(),
        }
    }
}
