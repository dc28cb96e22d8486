use indexmap::IndexMap;
use tracing::trace;

use crate::{
    analyzer::{
        AnalysisContext, AnalysisResult, AnalyzerConfig, AnalyzerError, Collapse, ColumnType, DmlAnalyzer, DmlShape,
        ExpressionTypeResolver, OrderByResolver, ParameterDescriptor, ParameterSlot, QueryType, ResultColumn,
        SelectAnalyzer, SpecLayout,
    },
    database::{SchemaProvider, SqlType},
    parser::ast::{SelectStatement, Statement, StatementKind},
};

/// Analysis result plus the layout of the first query specification, which
/// the nested and dynamic post-processors read.
#[derive(Debug, Clone)]
pub struct AnalyzedStatement {
    pub result: AnalysisResult,
    pub layout: Option<SpecLayout>,
}

pub struct QueryAnalyzer;

impl QueryAnalyzer {
    pub fn analyze(
        statement: &Statement,
        schemas: &dyn SchemaProvider,
        parameter_names: &[Option<String>],
        config: &AnalyzerConfig,
        resolver: Option<&dyn ExpressionTypeResolver>,
    ) -> Result<AnalyzedStatement, AnalyzerError> {
        let mut ctx = AnalysisContext::new(statement, schemas, parameter_names, config, resolver);
        match &statement.kind {
            StatementKind::Select(select) => Self::analyze_select(select, ctx),
            StatementKind::Insert(insert) => {
                let shape = DmlAnalyzer::analyze_insert(insert, &mut ctx)?;
                Ok(Self::assemble_dml(shape, ctx))
            }
            StatementKind::Update(update) => {
                let shape = DmlAnalyzer::analyze_update(update, &mut ctx)?;
                Ok(Self::assemble_dml(shape, ctx))
            }
            StatementKind::Delete(delete) => {
                let shape = DmlAnalyzer::analyze_delete(delete, &mut ctx)?;
                Ok(Self::assemble_dml(shape, ctx))
            }
        }
    }

    fn analyze_select(select: &SelectStatement, mut ctx: AnalysisContext) -> Result<AnalyzedStatement, AnalyzerError> {
        let shape = SelectAnalyzer::analyze_select(select, &mut ctx)?;
        Self::solve(&mut ctx);

        let mut columns: Vec<ResultColumn> = shape
            .columns
            .iter()
            .map(|column| {
                let column_type = column
                    .expr
                    .and_then(|expr| ctx.type_overrides.get(&expr).cloned())
                    .unwrap_or_else(|| ColumnType::Single(ctx.solver.resolved(column.var)));
                ResultColumn {
                    name: column.name.clone(),
                    column_type,
                    not_null: column.not_null,
                    origin: column.origin.clone(),
                    source_name: column.name.clone(),
                }
            })
            .collect();
        if ctx.config.rename_duplicated_columns {
            Self::rename_duplicated(&mut columns);
        }

        let slots: Vec<ParameterSlot> = (0..ctx.statement.placeholders)
            .map(|ordinal| ParameterSlot {
                ordinal,
                name: None,
                not_null: ctx.param_not_null.get(ordinal).copied().unwrap_or(false),
            })
            .collect();

        let mut result = AnalysisResult::new(&ctx.statement.sql, QueryType::Select);
        result.multiple_rows_result = shape.multiple_rows;
        result.parameters = Self::parameters(slots, Collapse::Any, &ctx);
        if ctx.has_named_parameters() {
            result.parameter_names = Some(ctx.parameter_names.iter().flatten().cloned().collect());
        }
        if shape.has_order_by {
            result.order_by_columns = Some(OrderByResolver::order_by_columns(
                shape.from_columns.iter().map(String::as_str),
                columns.iter().map(|c| c.name.as_str()),
            ));
        }
        result.columns = columns;

        Ok(AnalyzedStatement { result, layout: Some(shape.layout) })
    }

    fn assemble_dml(shape: DmlShape, mut ctx: AnalysisContext) -> AnalyzedStatement {
        Self::solve(&mut ctx);

        let mut result = AnalysisResult::new(&ctx.statement.sql, shape.query_type);
        result.columns = shape.columns;
        if shape.query_type != QueryType::Delete {
            result.data = Some(Self::parameters(shape.data, Collapse::All, &ctx));
        }
        result.parameters = Self::parameters(shape.parameters, shape.collapse, &ctx);
        AnalyzedStatement { result, layout: None }
    }

    fn solve(ctx: &mut AnalysisContext) {
        ctx.solver.solve(ctx.config.default_parameter_type);
        trace!(
            variables = ctx.solver.vars.len(),
            constraints = ctx.solver.constraints().len(),
            "type constraints solved"
        );
    }

    /// Turn bind sites into descriptors, merging same-named occurrences
    /// under `collapse` when the statement used named parameters.
    fn parameters(slots: Vec<ParameterSlot>, collapse: Collapse, ctx: &AnalysisContext) -> Vec<ParameterDescriptor> {
        let merge = collapse != Collapse::Keep && ctx.has_named_parameters();
        let mut merged: IndexMap<String, ParameterDescriptor> = IndexMap::new();
        let mut descriptors = Vec::with_capacity(slots.len());

        for (position, slot) in slots.into_iter().enumerate() {
            let name = slot.name.unwrap_or_else(|| ctx.parameter_name(slot.ordinal, position));
            let column_type = ctx
                .param_vars
                .get(slot.ordinal)
                .map(|var| ctx.solver.resolved(*var))
                .unwrap_or(SqlType::Unknown);
            let list = ctx.param_list.get(slot.ordinal).copied().unwrap_or(false);
            let descriptor = ParameterDescriptor { name, column_type: column_type.into(), not_null: slot.not_null, list };

            if !merge {
                descriptors.push(descriptor);
                continue;
            }
            match merged.get_mut(&descriptor.name) {
                Some(existing) => {
                    existing.not_null = match collapse {
                        Collapse::All => existing.not_null && descriptor.not_null,
                        _ => existing.not_null || descriptor.not_null,
                    };
                    existing.list |= descriptor.list;
                }
                None => {
                    merged.insert(descriptor.name.clone(), descriptor);
                }
            }
        }

        match merge {
            true => merged.into_values().collect(),
            false => descriptors,
        }
    }

    /// Append `_2`, `_3`, ... to the second and later occurrences of a name.
    fn rename_duplicated(columns: &mut [ResultColumn]) {
        let mut seen: IndexMap<String, usize> = IndexMap::new();
        for column in columns.iter_mut() {
            let count = seen.entry(column.name.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                column.name = format!("{}_{}", column.name, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_rename_duplicated() {
        let mut columns = vec![
            ResultColumn::new("id", SqlType::Int, true),
            ResultColumn::new("name", SqlType::Varchar, false),
            ResultColumn::new("id", SqlType::Int, true),
            ResultColumn::new("id", SqlType::Int, false),
        ];
        QueryAnalyzer::rename_duplicated(&mut columns);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "id_2", "id_3"]);
        assert_eq!(columns[2].source_name, "id");
    }
}
