use crate::parser::ast::{ExprId, SelectStatement, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TableFactor {
    Table { schema: Option<String>, name: String, alias: Option<String>, span: Span },
    Derived { query: Box<SelectStatement>, alias: String, span: Span },
}

impl TableFactor {
    /// Name the rest of the query uses for this factor.
    pub fn visible_name(&self) -> &str {
        match self {
            TableFactor::Table { name, alias, .. } => alias.as_deref().unwrap_or(name),
            TableFactor::Derived { alias, .. } => alias,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TableFactor::Table { span, .. } | TableFactor::Derived { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Cross,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn is_outer(self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Right | JoinKind::Full)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    On(ExprId),
    Using(Vec<String>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub factor: TableFactor,
    pub constraint: JoinConstraint,
    /// From the join keyword to the end of the constraint.
    pub span: Span,
}

/// One comma-separated FROM item: a factor followed by its joins.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub factor: TableFactor,
    pub joins: Vec<Join>,
    pub span: Span,
}

impl TableRef {
    pub fn factors(&self) -> impl Iterator<Item = &TableFactor> {
        std::iter::once(&self.factor).chain(self.joins.iter().map(|j| &j.factor))
    }

    pub fn expressions(&self) -> Vec<ExprId> {
        let mut found = Vec::new();
        for factor in self.factors() {
            if let TableFactor::Derived { query, .. } = factor {
                found.extend(query.expressions());
            }
        }
        for join in &self.joins {
            if let JoinConstraint::On(on) = join.constraint {
                found.push(on);
            }
        }
        found
    }
}
