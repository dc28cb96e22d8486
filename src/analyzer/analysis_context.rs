use std::collections::HashMap;

use crate::{
    analyzer::{AnalyzerConfig, ColumnType, ExpressionTypeResolver, Reference, Scope, TypeSolver, TypeVar},
    database::SchemaProvider,
    parser::ast::{ExprArena, ExprId, ExprKind, Span, Statement},
};

/// Per-statement state shared by every resolver and analyzer pass.
///
/// Inferred facts live in side tables keyed by [`ExprId`]; the statement
/// itself is never mutated.
pub struct AnalysisContext<'a> {
    pub statement: &'a Statement,
    /// access to schemas
    pub schemas: &'a dyn SchemaProvider,
    pub resolver: Option<&'a dyn ExpressionTypeResolver>,
    pub config: &'a AnalyzerConfig,
    /// `:name` of each placeholder ordinal, `None` for a plain `?`.
    pub parameter_names: &'a [Option<String>],
    pub solver: TypeSolver,
    /// Innermost scope last.
    pub scopes: Vec<Scope>,
    pub references: HashMap<ExprId, Reference>,
    pub expr_vars: HashMap<ExprId, TypeVar>,
    /// Types reported by the expression resolver as a set of candidates.
    pub type_overrides: HashMap<ExprId, ColumnType>,
    pub param_vars: Vec<TypeVar>,
    pub param_not_null: Vec<bool>,
    pub param_list: Vec<bool>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        statement: &'a Statement,
        schemas: &'a dyn SchemaProvider,
        parameter_names: &'a [Option<String>],
        config: &'a AnalyzerConfig,
        resolver: Option<&'a dyn ExpressionTypeResolver>,
    ) -> Self {
        let mut solver = TypeSolver::new();
        // a name denotes one value, so its occurrences share a variable
        let mut by_name: HashMap<&str, TypeVar> = HashMap::new();
        let param_vars = (0..statement.placeholders)
            .map(|ordinal| match parameter_names.get(ordinal).and_then(Option::as_deref) {
                Some(name) => *by_name.entry(name).or_insert_with(|| solver.fresh_free()),
                None => solver.fresh_free(),
            })
            .collect();

        Self {
            statement,
            schemas,
            resolver,
            config,
            parameter_names,
            solver,
            scopes: vec![],
            references: HashMap::new(),
            expr_vars: HashMap::new(),
            type_overrides: HashMap::new(),
            param_vars,
            param_not_null: vec![true; statement.placeholders],
            param_list: vec![false; statement.placeholders],
        }
    }

    pub fn arena(&self) -> &'a ExprArena {
        &self.statement.arena
    }

    pub fn kind(&self, expr: ExprId) -> &'a ExprKind {
        self.statement.arena.kind(expr)
    }

    pub fn text(&self, span: Span) -> &'a str {
        span.text(&self.statement.sql)
    }

    pub fn expr_text(&self, expr: ExprId) -> &'a str {
        self.text(self.arena().span(expr))
    }

    /// Type variable of an expression, created on first use.
    pub fn var_of(&mut self, expr: ExprId) -> TypeVar {
        if let ExprKind::Placeholder(ordinal) = self.kind(expr) {
            if let Some(var) = self.param_vars.get(*ordinal) {
                return *var;
            }
        }
        if let Some(reference) = self.references.get(&expr) {
            return reference.var();
        }
        if let Some(var) = self.expr_vars.get(&expr) {
            return *var;
        }
        let var = self.solver.fresh();
        self.expr_vars.insert(expr, var);
        var
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) -> Scope {
        self.scopes.pop().unwrap_or_default()
    }

    pub fn current_scope(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn current_scope_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    /// Ordinal of the placeholder if `expr` is one.
    pub fn placeholder(&self, expr: ExprId) -> Option<usize> {
        match self.kind(expr) {
            ExprKind::Placeholder(ordinal) => Some(*ordinal),
            _ => None,
        }
    }

    pub fn mark_nullable(&mut self, expr: ExprId) {
        if let Some(ordinal) = self.placeholder(expr) {
            self.mark_nullable_ordinal(ordinal);
        }
    }

    pub fn mark_nullable_ordinal(&mut self, ordinal: usize) {
        if let Some(not_null) = self.param_not_null.get_mut(ordinal) {
            *not_null = false;
        }
    }

    pub fn mark_list(&mut self, expr: ExprId) {
        if let Some(ordinal) = self.placeholder(expr) {
            self.mark_nullable(expr);
            if let Some(list) = self.param_list.get_mut(ordinal) {
                *list = true;
            }
        }
    }

    /// `:name` the placeholder was written with.
    pub fn named_parameter(&self, ordinal: usize) -> Option<&'a str> {
        self.parameter_names.get(ordinal).and_then(Option::as_deref)
    }

    pub fn has_named_parameters(&self) -> bool {
        self.parameter_names.iter().any(Option::is_some)
    }

    /// Display name of a placeholder: its `:name`, else `param<n>`.
    pub fn parameter_name(&self, ordinal: usize, position: usize) -> String {
        match self.named_parameter(ordinal) {
            Some(name) => name.to_string(),
            None => format!("param{}", position + 1),
        }
    }

    /// Text of the FROM clause of the innermost query, handed to the expression resolver.
    pub fn from_text(&self) -> Option<String> {
        self.scopes.iter().rev().find_map(|scope| scope.from_text.clone())
    }
}
