use crate::parser::ast::{ExprId, Span, TableRef};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*`
    Wildcard { span: Span },
    /// `t.*`
    QualifiedWildcard { table: String, span: Span },
    Expr { expr: ExprId, alias: Option<String>, span: Span },
}

impl SelectItem {
    pub fn span(&self) -> Span {
        match self {
            SelectItem::Wildcard { span }
            | SelectItem::QualifiedWildcard { span, .. }
            | SelectItem::Expr { span, .. } => *span,
        }
    }
}

/// One `SELECT ... FROM ... WHERE ... GROUP BY ... HAVING ...` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySpec {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Vec<TableRef>,
    pub where_clause: Option<ExprId>,
    pub group_by: Vec<ExprId>,
    pub having: Option<ExprId>,
    pub span: Span,
}

impl QuerySpec {
    pub fn expressions(&self) -> Vec<ExprId> {
        let mut found: Vec<ExprId> = self
            .items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Expr { expr, .. } => Some(*expr),
                _ => None,
            })
            .collect();
        for table_ref in &self.from {
            found.extend(table_ref.expressions());
        }
        found.extend(self.where_clause);
        found.extend(self.group_by.iter().copied());
        found.extend(self.having);
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderByItem {
    pub expr: ExprId,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit {
    pub count: ExprId,
    pub offset: Option<ExprId>,
}

/// A full query: one or more specs joined by `UNION`, plus the trailing
/// `ORDER BY` / `LIMIT` that apply to the whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    pub specs: Vec<QuerySpec>,
    /// `union_all[i]` tells whether spec `i + 1` was joined with `UNION ALL`.
    pub union_all: Vec<bool>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Limit>,
    pub span: Span,
}

impl SelectStatement {
    pub fn is_union(&self) -> bool {
        self.specs.len() > 1
    }

    /// Top-level expression roots of every clause, nested derived tables included.
    pub fn expressions(&self) -> Vec<ExprId> {
        let mut found: Vec<ExprId> = self.specs.iter().flat_map(|s| s.expressions()).collect();
        found.extend(self.order_by.iter().map(|o| o.expr));
        if let Some(limit) = &self.limit {
            found.push(limit.count);
            found.extend(limit.offset);
        }
        found
    }
}
