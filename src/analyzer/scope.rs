use std::collections::HashSet;

use crate::{
    analyzer::TypeVar,
    database::ColumnKey,
    parser::ast::{BinaryOp, ExprArena, ExprId, ExprKind, UnaryOp},
};

/// Column a FROM source exposes to the rest of its query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromColumn {
    pub name: String,
    pub var: TypeVar,
    /// Declared not-null (or, for a derived table, the inner column's fact).
    pub not_null: bool,
    pub column_key: ColumnKey,
}

/// One table or derived table of a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub visible: String,
    pub table: String,
    pub schema: Option<String>,
    pub columns: Vec<FromColumn>,
    /// Reached through the nullable side of an outer join.
    pub outer_nullable: bool,
    pub derived: bool,
    /// Index of the comma separated FROM item holding this source.
    pub table_ref: usize,
}

impl Source {
    pub fn column(&self, name: &str) -> Option<(usize, &FromColumn)> {
        self.columns.iter().enumerate().find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Select-list alias usable by GROUP BY, HAVING and ORDER BY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectAlias {
    pub name: String,
    pub var: TypeVar,
    pub not_null: bool,
}

/// Name resolution frame of one query specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub sources: Vec<Source>,
    /// Columns merged by `JOIN ... USING`; unqualified references to them are not ambiguous.
    pub using_columns: Vec<String>,
    pub aliases: Vec<SelectAlias>,
    /// `(source, column)` pairs a filter proves not null.
    pub proven: HashSet<(usize, usize)>,
    pub allow_aliases: bool,
    /// `FROM ...` text of the query.
    pub from_text: Option<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self, visible: &str) -> Option<(usize, &Source)> {
        self.sources.iter().enumerate().find(|(_, s)| s.visible.eq_ignore_ascii_case(visible))
    }

    pub fn alias(&self, name: &str) -> Option<&SelectAlias> {
        self.aliases.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn is_using_column(&self, name: &str) -> bool {
        self.using_columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Not-null fact of a column as seen from this scope.
    pub fn column_not_null(&self, source: usize, column: usize) -> bool {
        let Some(from) = self.sources.get(source) else {
            return false;
        };
        let declared = from.columns.get(column).map(|c| c.not_null).unwrap_or(false);
        (declared && !from.outer_nullable) || self.proven.contains(&(source, column))
    }
}

/// A column reference bound to the source that provides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    /// Index of the scope in the stack at the time of binding.
    pub scope: usize,
    pub source: usize,
    pub column: usize,
    pub var: TypeVar,
    pub visible: String,
    pub table: String,
    pub name: String,
    pub column_key: ColumnKey,
}

/// What a column reference expression resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Column(BoundColumn),
    Alias { var: TypeVar, not_null: bool },
}

impl Reference {
    pub fn var(&self) -> TypeVar {
        match self {
            Reference::Column(bound) => bound.var,
            Reference::Alias { var, .. } => *var,
        }
    }
}

/// Column references that a predicate proves not null, at the top level of
/// the expression. Descends only through operators that yield NULL for a
/// NULL operand.
pub fn null_rejected_columns(arena: &ExprArena, predicate: ExprId) -> Vec<ExprId> {
    fn operands(arena: &ExprArena, expr: ExprId, found: &mut Vec<ExprId>) {
        match arena.kind(expr) {
            ExprKind::Column(_) => found.push(expr),
            ExprKind::Binary { op, left, right } if op.is_arithmetic() || op.is_bitwise() => {
                operands(arena, *left, found);
                operands(arena, *right, found);
            }
            ExprKind::Unary { op: UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot, expr } => operands(arena, *expr, found),
            _ => {}
        }
    }

    let mut found = Vec::new();
    for conjunct in arena.conjuncts(predicate) {
        match arena.kind(conjunct) {
            ExprKind::Binary { op, left, right } if op.is_comparison() && *op != BinaryOp::NullSafeEq => {
                operands(arena, *left, &mut found);
                operands(arena, *right, &mut found);
            }
            ExprKind::Binary { op: BinaryOp::Regexp, left, right } => {
                operands(arena, *left, &mut found);
                operands(arena, *right, &mut found);
            }
            ExprKind::Between { expr, low, high, .. } => {
                operands(arena, *expr, &mut found);
                operands(arena, *low, &mut found);
                operands(arena, *high, &mut found);
            }
            ExprKind::InList { expr, .. } | ExprKind::InSubquery { expr, .. } => operands(arena, *expr, &mut found),
            ExprKind::Like { expr, pattern, .. } => {
                operands(arena, *expr, &mut found);
                operands(arena, *pattern, &mut found);
            }
            ExprKind::IsNull { expr, negated: true } => operands(arena, *expr, &mut found),
            _ => {}
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ast::ExprParser, QueryParser};

    fn source(visible: &str, not_null: &[bool]) -> Source {
        Source {
            visible: visible.to_string(),
            table: visible.to_string(),
            schema: None,
            columns: not_null
                .iter()
                .enumerate()
                .map(|(i, n)| FromColumn { name: format!("c{i}"), var: TypeVar(i), not_null: *n, column_key: ColumnKey::None })
                .collect(),
            outer_nullable: false,
            derived: false,
            table_ref: 0,
        }
    }

    #[test]
    pub fn test_column_not_null() {
        let mut scope = Scope::new();
        scope.sources.push(source("a", &[true, false]));
        let mut outer = source("b", &[true]);
        outer.outer_nullable = true;
        scope.sources.push(outer);

        assert!(scope.column_not_null(0, 0));
        assert!(!scope.column_not_null(0, 1));
        assert!(!scope.column_not_null(1, 0));

        scope.proven.insert((0, 1));
        assert!(scope.column_not_null(0, 1));
        assert_eq!(scope.source("A").map(|(i, _)| i), Some(0));
    }

    #[test]
    pub fn test_null_rejected_columns() {
        let mut parser = QueryParser::new("a = ? AND b + 1 > 2 AND (c = 1 OR d = 2) AND e IS NOT NULL AND f <=> 1 AND g IS NULL").unwrap();
        let predicate = ExprParser::parse(&mut parser).unwrap();
        let columns: Vec<String> = null_rejected_columns(&parser.arena, predicate)
            .into_iter()
            .map(|id| parser.arena.span(id).text(&parser.text).to_string())
            .collect();
        assert_eq!(columns, vec!["a", "b", "e"]);
    }
}
