use std::ops::Range;

use crate::{
    analyzer::{AnalysisContext, BoundColumn, Reference, ResolvedFrom, Scope},
    database::ColumnKey,
    parser::ast::{BinaryOp, ExprId, ExprKind},
};

/// A column of a FROM source, read by an item or a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    pub source: usize,
    pub column: String,
    /// Result column the field ends up in, for select items.
    pub output: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSource {
    pub visible: String,
    pub table: String,
    pub derived: bool,
    pub columns: Vec<(String, ColumnKey)>,
    /// Text the source adds to the FROM clause (`FROM t`, `, t` or the whole join clause).
    pub fragment: String,
}

impl LayoutSource {
    pub fn column_key(&self, column: &str) -> ColumnKey {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, key)| *key)
            .unwrap_or_default()
    }
}

/// `child.child_column = parent.parent_column` taken from a join condition,
/// where the parent comes earlier in the FROM clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
    pub child: usize,
    pub child_column: String,
    pub parent: usize,
    pub parent_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutItem {
    pub text: String,
    /// Result columns produced by the item.
    pub columns: Range<usize>,
    pub fields: Vec<LayoutField>,
}

/// One top-level AND conjunct of the WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConjunct {
    pub text: String,
    pub fields: Vec<LayoutField>,
    /// Placeholder ordinals bound inside the conjunct.
    pub ordinals: Vec<usize>,
}

/// Structure of a query specification as the post-processors see it: the
/// FROM sources and how they join, the select items and the WHERE conjuncts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecLayout {
    pub sources: Vec<LayoutSource>,
    pub links: Vec<JoinLink>,
    pub items: Vec<LayoutItem>,
    pub conjuncts: Vec<LayoutConjunct>,
}

impl SpecLayout {
    /// Build the layout of the current scope. Expressions must already be walked.
    pub fn build(
        scope: &Scope,
        from: &ResolvedFrom,
        items: Vec<LayoutItem>,
        where_clause: Option<ExprId>,
        ctx: &AnalysisContext,
    ) -> Self {
        let sources = scope
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| LayoutSource {
                visible: source.visible.clone(),
                table: source.table.clone(),
                derived: source.derived,
                columns: source.columns.iter().map(|c| (c.name.clone(), c.column_key)).collect(),
                fragment: from.fragments.get(index).cloned().unwrap_or_default(),
            })
            .collect();

        let mut links = Vec::new();
        for (joined, on) in &from.join_conditions {
            for conjunct in ctx.arena().conjuncts(*on) {
                let ExprKind::Binary { op: BinaryOp::Eq, left, right } = ctx.kind(conjunct) else {
                    continue;
                };
                let (Some(left), Some(right)) = (Self::local_column(*left, ctx), Self::local_column(*right, ctx)) else {
                    continue;
                };
                let (child, parent) = match (left.source == *joined, right.source == *joined) {
                    (true, false) if right.source < *joined => (left, right),
                    (false, true) if left.source < *joined => (right, left),
                    _ => continue,
                };
                links.push(JoinLink {
                    child: child.source,
                    child_column: child.name.clone(),
                    parent: parent.source,
                    parent_column: parent.name.clone(),
                });
            }
        }
        for (joined, column) in &from.using_columns {
            let parent = scope.sources[..*joined].iter().position(|s| s.column(column).is_some());
            if let Some(parent) = parent {
                links.push(JoinLink { child: *joined, child_column: column.clone(), parent, parent_column: column.clone() });
            }
        }

        let conjuncts = match where_clause {
            Some(predicate) => ctx
                .arena()
                .conjuncts(predicate)
                .into_iter()
                .map(|conjunct| LayoutConjunct {
                    text: ctx.expr_text(conjunct).to_string(),
                    fields: Self::fields(conjunct, None, ctx),
                    ordinals: ctx.arena().placeholders(conjunct),
                })
                .collect(),
            None => vec![],
        };

        Self { sources, links, items, conjuncts }
    }

    /// Columns of the current scope read by `expr`.
    pub fn fields(expr: ExprId, output: Option<usize>, ctx: &AnalysisContext) -> Vec<LayoutField> {
        ctx.arena()
            .column_refs(expr)
            .into_iter()
            .filter_map(|column| Self::local_column(column, ctx))
            .map(|bound| LayoutField { source: bound.source, column: bound.name.clone(), output })
            .collect()
    }

    fn local_column<'c>(expr: ExprId, ctx: &'c AnalysisContext) -> Option<&'c BoundColumn> {
        let current = ctx.scopes.len().saturating_sub(1);
        match ctx.references.get(&expr) {
            Some(Reference::Column(bound)) if bound.scope == current => Some(bound),
            _ => None,
        }
    }
}
