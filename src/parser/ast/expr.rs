use std::fmt;

use crate::{
    database::SqlType,
    parser::ast::{BinaryOp, Literal, SelectStatement, UnaryOp},
};

/// Byte range of a node in the statement text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn text(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or_default()
    }
}

/// Stable handle of an expression node inside its statement's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub name: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.", schema)?;
        }
        if let Some(table) = &self.table {
            write!(f, "{}.", table)?;
        }
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Column(ColumnRef),
    /// Bind parameter with its 0-based position in the statement.
    Placeholder(usize),
    Unary { op: UnaryOp, expr: ExprId },
    Binary { op: BinaryOp, left: ExprId, right: ExprId },
    IsNull { expr: ExprId, negated: bool },
    IsBool { expr: ExprId, value: bool, negated: bool },
    InList { expr: ExprId, list: Vec<ExprId>, negated: bool },
    InSubquery { expr: ExprId, query: Box<SelectStatement>, negated: bool },
    Between { expr: ExprId, low: ExprId, high: ExprId, negated: bool },
    Like { expr: ExprId, pattern: ExprId, escape: Option<ExprId>, negated: bool },
    Case { operand: Option<ExprId>, branches: Vec<(ExprId, ExprId)>, else_result: Option<ExprId> },
    Function { name: String, args: Vec<ExprId>, distinct: bool, star: bool },
    Cast { expr: ExprId, target: SqlType },
    Interval { expr: ExprId, unit: String },
    Exists { query: Box<SelectStatement> },
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
}

/// Owner of every expression node of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
}

impl ExprArena {
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.nodes.push(ExprNode { kind, span });
        ExprId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.get(id).kind
    }

    pub fn span(&self, id: ExprId) -> Span {
        self.get(id).span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of a node, subquery internals excluded.
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        match self.kind(id) {
            ExprKind::Literal(_) | ExprKind::Column(_) | ExprKind::Placeholder(_) => vec![],
            ExprKind::Unary { expr, .. }
            | ExprKind::IsNull { expr, .. }
            | ExprKind::IsBool { expr, .. }
            | ExprKind::Cast { expr, .. }
            | ExprKind::Interval { expr, .. }
            | ExprKind::InSubquery { expr, .. } => vec![*expr],
            ExprKind::Binary { left, right, .. } => vec![*left, *right],
            ExprKind::InList { expr, list, .. } => std::iter::once(*expr).chain(list.iter().copied()).collect(),
            ExprKind::Between { expr, low, high, .. } => vec![*expr, *low, *high],
            ExprKind::Like { expr, pattern, escape, .. } => {
                let mut children = vec![*expr, *pattern];
                children.extend(escape.iter().copied());
                children
            }
            ExprKind::Case { operand, branches, else_result } => {
                let mut children: Vec<ExprId> = operand.iter().copied().collect();
                for (when, then) in branches {
                    children.push(*when);
                    children.push(*then);
                }
                children.extend(else_result.iter().copied());
                children
            }
            ExprKind::Function { args, .. } => args.clone(),
            ExprKind::Exists { .. } | ExprKind::Subquery(_) => vec![],
        }
    }

    /// Every node reachable from `id`, including nodes inside subqueries.
    pub fn descendants(&self, id: ExprId) -> Vec<ExprId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            found.push(current);
            match self.kind(current) {
                ExprKind::Exists { query } | ExprKind::Subquery(query) => stack.extend(query.expressions()),
                ExprKind::InSubquery { query, .. } => stack.extend(query.expressions()),
                _ => {}
            }
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// Placeholder ordinals under `id`, in source order.
    pub fn placeholders(&self, id: ExprId) -> Vec<usize> {
        let mut ordinals: Vec<usize> = self
            .descendants(id)
            .into_iter()
            .filter_map(|node| match self.kind(node) {
                ExprKind::Placeholder(ordinal) => Some(*ordinal),
                _ => None,
            })
            .collect();
        ordinals.sort_unstable();
        ordinals
    }

    /// Column references under `id`, subqueries excluded.
    pub fn column_refs(&self, id: ExprId) -> Vec<ExprId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let ExprKind::Column(_) = self.kind(current) {
                found.push(current);
            }
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        found
    }

    /// Split a predicate on top-level `AND`.
    pub fn conjuncts(&self, id: ExprId) -> Vec<ExprId> {
        match self.kind(id) {
            ExprKind::Binary { op: BinaryOp::And, left, right } => {
                let mut parts = self.conjuncts(*left);
                parts.extend(self.conjuncts(*right));
                parts
            }
            _ => vec![id],
        }
    }
}
