use indexmap::IndexSet;

use crate::{
    analyzer::{AnalysisContext, AnalyzerError, ExpressionAnalyzer, Scope},
    parser::ast::OrderByItem,
};

pub struct OrderByResolver;

impl OrderByResolver {
    /// Walk the ORDER BY keys inside `scope`, which lets them name select aliases.
    pub fn resolve_order_by(order_by: &[OrderByItem], scope: Scope, ctx: &mut AnalysisContext) -> Result<(), AnalyzerError> {
        if order_by.is_empty() {
            return Ok(());
        }
        ctx.push_scope(Scope { allow_aliases: true, ..scope });
        let walked = order_by.iter().try_for_each(|item| ExpressionAnalyzer::walk(item.expr, ctx).map(|_| ()));
        ctx.pop_scope();
        walked
    }

    /// Names a caller may sort by: FROM columns first, then result columns, without repeats.
    pub fn order_by_columns<'n>(
        from_columns: impl IntoIterator<Item = &'n str>,
        result_columns: impl IntoIterator<Item = &'n str>,
    ) -> Vec<String> {
        let names: IndexSet<&str> = from_columns.into_iter().chain(result_columns).collect();
        names.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_order_by_columns_are_deduplicated() {
        let columns = OrderByResolver::order_by_columns(["id", "value", "id"], ["id", "total"]);
        assert_eq!(columns, vec!["id", "value", "total"]);
    }
}
