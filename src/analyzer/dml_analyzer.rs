use tracing::warn;

use crate::{
    analyzer::{
        AnalysisContext, AnalyzerError, ColumnResolver, Constraint, ExpressionAnalyzer, FromColumn, JoinResolver, QueryType, Reference,
        ResultColumn, Scope, SelectAnalyzer, TypeVar,
    },
    database::SqlType,
    parser::ast::{
        Assignment, ColumnRef, DeleteStatement, ExprId, InsertSource, InsertStatement, SelectStatement, UpdateStatement,
    },
};

/// One bind site reported in a parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSlot {
    pub ordinal: usize,
    /// Display name; `None` falls back to the `:name` or `param<n>`.
    pub name: Option<String>,
    pub not_null: bool,
}

/// How repeated `:name` occurrences of a list combine their not-null facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapse {
    /// Not null when every occurrence is.
    All,
    /// Not null when any occurrence is.
    Any,
    /// Occurrences are reported one by one.
    Keep,
}

/// Inputs and outputs of an INSERT, UPDATE or DELETE before types are solved.
#[derive(Debug, Clone)]
pub struct DmlShape {
    pub query_type: QueryType,
    pub columns: Vec<ResultColumn>,
    pub data: Vec<ParameterSlot>,
    pub parameters: Vec<ParameterSlot>,
    pub collapse: Collapse,
}

impl DmlShape {
    fn new(query_type: QueryType, collapse: Collapse) -> Self {
        let mut columns = vec![ResultColumn::new("affectedRows", SqlType::Int, true)];
        if query_type == QueryType::Insert {
            columns.push(ResultColumn::new("insertId", SqlType::Int, true));
        }
        Self { query_type, columns, data: vec![], parameters: vec![], collapse }
    }
}

/// Column receiving a value in an INSERT or UPDATE.
struct Target {
    name: String,
    var: TypeVar,
    not_null: bool,
}

impl Target {
    fn from_column(column: &FromColumn) -> Self {
        Self { name: column.name.clone(), var: column.var, not_null: column.not_null }
    }
}

pub struct DmlAnalyzer;

impl DmlAnalyzer {
    pub fn analyze_insert(insert: &InsertStatement, ctx: &mut AnalysisContext) -> Result<DmlShape, AnalyzerError> {
        ctx.push_scope(Scope::new());
        let analyzed = Self::insert_in_scope(insert, ctx);
        ctx.pop_scope();
        analyzed
    }

    fn insert_in_scope(insert: &InsertStatement, ctx: &mut AnalysisContext) -> Result<DmlShape, AnalyzerError> {
        let mut shape = DmlShape::new(QueryType::Insert, Collapse::Any);
        let table = &insert.table;
        let source_index = JoinResolver::add_table(table.schema.as_deref(), &table.name, table.alias.as_deref(), ctx)?;

        let targets: Vec<Target> = {
            let Some(source) = ctx.current_scope().and_then(|scope| scope.sources.get(source_index)) else {
                return Err(AnalyzerError::UnknownTable(table.name.clone()));
            };
            match insert.columns.is_empty() {
                true => source.columns.iter().map(Target::from_column).collect(),
                false => insert
                    .columns
                    .iter()
                    .map(|name| {
                        source.column(name).map(|(_, c)| Target::from_column(c)).ok_or_else(|| AnalyzerError::UnknownColumn {
                            name: name.clone(),
                            candidates: source.column_names(),
                        })
                    })
                    .collect::<Result<_, _>>()?,
            }
        };

        match &insert.source {
            InsertSource::Values(rows) => {
                for row in rows {
                    if row.len() != targets.len() {
                        warn!(expected = targets.len(), found = row.len(), "insert row does not match its column list");
                    }
                    for (value, target) in row.iter().zip(&targets) {
                        Self::assign_value(*value, target, &mut shape, ctx)?;
                    }
                }
            }
            InsertSource::Select(query) => {
                Self::insert_select(query, &targets, &mut shape, ctx)?;
            }
        }

        for assignment in &insert.on_duplicate {
            let target = Self::assignment_target(assignment, ctx)?;
            Self::assign_value(assignment.value, &target, &mut shape, ctx)?;
        }
        Ok(shape)
    }

    fn insert_select(
        query: &SelectStatement,
        targets: &[Target],
        shape: &mut DmlShape,
        ctx: &mut AnalysisContext,
    ) -> Result<(), AnalyzerError> {
        let saved = std::mem::take(&mut ctx.scopes);
        let analyzed = SelectAnalyzer::analyze_select(query, ctx);
        ctx.scopes = saved;
        let select = analyzed?;

        if select.columns.len() != targets.len() {
            warn!(expected = targets.len(), found = select.columns.len(), "insert select does not match its column list");
        }
        for (column, target) in select.columns.iter().zip(targets) {
            ctx.solver.equal(column.var, target.var);
            // a bare placeholder selected into a nullable column may be NULL
            if let Some(ordinal) = column.expr.and_then(|expr| ctx.placeholder(expr)) {
                if !target.not_null {
                    ctx.mark_nullable_ordinal(ordinal);
                }
            }
        }

        let mut ordinals: Vec<usize> = query
            .expressions()
            .into_iter()
            .flat_map(|expr| ctx.arena().placeholders(expr))
            .collect();
        ordinals.sort_unstable();
        ordinals.dedup();
        shape.parameters.extend(ordinals.into_iter().map(|ordinal| ParameterSlot {
            ordinal,
            name: None,
            not_null: ctx.param_not_null.get(ordinal).copied().unwrap_or(false),
        }));
        Ok(())
    }

    pub fn analyze_update(update: &UpdateStatement, ctx: &mut AnalysisContext) -> Result<DmlShape, AnalyzerError> {
        ctx.push_scope(Scope::new());
        let analyzed = Self::update_in_scope(update, ctx);
        ctx.pop_scope();
        analyzed
    }

    fn update_in_scope(update: &UpdateStatement, ctx: &mut AnalysisContext) -> Result<DmlShape, AnalyzerError> {
        let mut shape = DmlShape::new(QueryType::Update, Collapse::Keep);
        JoinResolver::resolve_from(&update.tables, ctx)?;

        for assignment in &update.assignments {
            let target = Self::assignment_target(assignment, ctx)?;
            let value = assignment.value;
            if ctx.placeholder(value).is_some() {
                Self::assign_value(value, &target, &mut shape, ctx)?;
                continue;
            }

            // placeholders nested in the value are data of the assigned column
            let var = ExpressionAnalyzer::walk(value, ctx)?;
            ctx.solver.add(Constraint::Hint { var, from: target.var });
            let schema_not_null = Self::schema_not_null(&target, ctx);
            for ordinal in ctx.arena().placeholders(value) {
                let not_null = ctx.param_not_null.get(ordinal).copied().unwrap_or(false) && schema_not_null;
                let name = ctx.named_parameter(ordinal).unwrap_or(target.name.as_str()).to_string();
                shape.data.push(ParameterSlot { ordinal, name: Some(name), not_null });
            }
        }

        shape.parameters = Self::filter_parameters(update.where_clause, ctx)?;
        Ok(shape)
    }

    pub fn analyze_delete(delete: &DeleteStatement, ctx: &mut AnalysisContext) -> Result<DmlShape, AnalyzerError> {
        ctx.push_scope(Scope::new());
        let analyzed = Self::delete_in_scope(delete, ctx);
        ctx.pop_scope();
        analyzed
    }

    fn delete_in_scope(delete: &DeleteStatement, ctx: &mut AnalysisContext) -> Result<DmlShape, AnalyzerError> {
        let mut shape = DmlShape::new(QueryType::Delete, Collapse::Any);
        let table = &delete.table;
        JoinResolver::add_table(table.schema.as_deref(), &table.name, table.alias.as_deref(), ctx)?;
        shape.parameters = Self::filter_parameters(delete.where_clause, ctx)?;
        Ok(shape)
    }

    /// Walk a value bound to `target`. A bare placeholder becomes a data
    /// parameter typed by the column; placeholders inside an expression are
    /// reported as plain parameters.
    fn assign_value(value: ExprId, target: &Target, shape: &mut DmlShape, ctx: &mut AnalysisContext) -> Result<(), AnalyzerError> {
        let var = ExpressionAnalyzer::walk(value, ctx)?;
        let schema_not_null = Self::schema_not_null(target, ctx);

        match ctx.placeholder(value) {
            Some(ordinal) => {
                ctx.solver.equal(var, target.var);
                let name = ctx.named_parameter(ordinal).unwrap_or(target.name.as_str()).to_string();
                shape.data.push(ParameterSlot { ordinal, name: Some(name), not_null: schema_not_null });
            }
            None => {
                ctx.solver.add(Constraint::Hint { var, from: target.var });
                for ordinal in ctx.arena().placeholders(value) {
                    if !schema_not_null {
                        ctx.mark_nullable_ordinal(ordinal);
                    }
                    let not_null = ctx.param_not_null.get(ordinal).copied().unwrap_or(false);
                    shape.parameters.push(ParameterSlot { ordinal, name: None, not_null });
                }
            }
        }
        Ok(())
    }

    fn assignment_target(assignment: &Assignment, ctx: &AnalysisContext) -> Result<Target, AnalyzerError> {
        let column = ColumnRef { schema: None, table: assignment.table.clone(), name: assignment.column.clone() };
        match ColumnResolver::resolve_column(&column, ctx)? {
            Reference::Column(bound) => {
                let not_null = ctx
                    .scopes
                    .get(bound.scope)
                    .and_then(|scope| scope.sources.get(bound.source))
                    .and_then(|source| source.columns.get(bound.column))
                    .map(|c| c.not_null)
                    .unwrap_or(false);
                Ok(Target { name: bound.name, var: bound.var, not_null })
            }
            Reference::Alias { .. } => Err(AnalyzerError::UnknownColumn { name: column.to_string(), candidates: vec![] }),
        }
    }

    fn filter_parameters(where_clause: Option<ExprId>, ctx: &mut AnalysisContext) -> Result<Vec<ParameterSlot>, AnalyzerError> {
        let Some(predicate) = where_clause else {
            return Ok(vec![]);
        };
        ExpressionAnalyzer::walk(predicate, ctx)?;
        Ok(ctx
            .arena()
            .placeholders(predicate)
            .into_iter()
            .map(|ordinal| ParameterSlot {
                ordinal,
                name: None,
                not_null: ctx.param_not_null.get(ordinal).copied().unwrap_or(false),
            })
            .collect())
    }

    /// Not-null of a value parameter bound to `target`.
    fn schema_not_null(target: &Target, ctx: &AnalysisContext) -> bool {
        ctx.config.data_not_null_from_schema && target.not_null
    }
}
