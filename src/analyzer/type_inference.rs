use tracing::trace;

use crate::{
    analyzer::{TypeVar, TypeVars},
    database::SqlType,
};

const MAX_ROUNDS: usize = 64;

/// Forward rule computing a type from the types of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveRule {
    /// `+`, `-`, `*`
    Arithmetic,
    /// `/`
    Division,
    /// Least common type of the arguments.
    Promote,
    /// `SUM`/`AVG`: `double` for approximate input, `decimal` otherwise.
    Sum,
    /// Type of the argument at the given position.
    SameAs(usize),
}

impl DeriveRule {
    fn apply(self, args: &[Option<SqlType>]) -> Option<SqlType> {
        match self {
            DeriveRule::Arithmetic | DeriveRule::Division | DeriveRule::Promote => {
                let resolved: Option<Vec<SqlType>> = args.iter().copied().collect();
                let resolved = resolved?;
                let (first, rest) = resolved.split_first()?;
                Some(rest.iter().fold(*first, |acc, t| match self {
                    DeriveRule::Arithmetic => SqlType::arithmetic(acc, *t),
                    DeriveRule::Division => SqlType::division(acc, *t),
                    _ => SqlType::promote(acc, *t),
                }))
            }
            DeriveRule::Sum => match args.first().copied().flatten()? {
                t if t.is_approximate() || t.is_textual() => Some(SqlType::Double),
                SqlType::Unknown => Some(SqlType::Unknown),
                _ => Some(SqlType::Decimal),
            },
            DeriveRule::SameAs(index) => args.get(index).copied().flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The variable has this type. Conflicting fixes promote.
    Fix(TypeVar, SqlType),
    /// Both sides denote the same value. Only classes still free of any
    /// fixed type are merged, so two columns compared with each other keep
    /// their own declared types.
    Equal(TypeVar, TypeVar),
    Derive { target: TypeVar, rule: DeriveRule, args: Vec<TypeVar> },
    /// Target is the least common type of the arguments; a resolved target
    /// flows back to unresolved free arguments.
    Widen { target: TypeVar, args: Vec<TypeVar> },
    /// Type an unresolved free variable should take when nothing else says otherwise.
    Expect(TypeVar, SqlType),
    /// Give `var` the type of `from` when nothing else resolves it.
    Hint { var: TypeVar, from: TypeVar },
}

/// Constraint solver over a [`TypeVars`] table.
///
/// Solving alternates forward propagation (equalities, derived and widened
/// types) until stable with one backward round (widened targets flowing back
/// to their arguments, then expectations). Every step only merges classes or
/// widens types, so the outcome does not depend on the order constraints
/// were added in.
#[derive(Debug, Clone, Default)]
pub struct TypeSolver {
    pub vars: TypeVars,
    constraints: Vec<Constraint>,
}

impl TypeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variable of an expression whose type the statement determines.
    pub fn fresh(&mut self) -> TypeVar {
        self.vars.fresh(false)
    }

    /// Variable of a bind parameter.
    pub fn fresh_free(&mut self) -> TypeVar {
        self.vars.fresh(true)
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn fix(&mut self, var: TypeVar, sql_type: SqlType) {
        self.add(Constraint::Fix(var, sql_type));
    }

    pub fn equal(&mut self, a: TypeVar, b: TypeVar) {
        self.add(Constraint::Equal(a, b));
    }

    pub fn expect(&mut self, var: TypeVar, sql_type: SqlType) {
        self.add(Constraint::Expect(var, sql_type));
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Resolve every variable. Free variables left unresolved take
    /// `default_type`; anything else left unresolved becomes `Unknown`.
    pub fn solve(&mut self, default_type: SqlType) {
        for constraint in &self.constraints {
            if let Constraint::Fix(var, sql_type) = constraint {
                self.vars.widen(*var, *sql_type);
            }
        }

        self.propagate();

        let defaulted = self.vars.unresolved_free();
        if !defaulted.is_empty() {
            trace!(count = defaulted.len(), default = %default_type, "defaulting unconstrained parameters");
            for var in defaulted {
                self.vars.set(var, default_type);
            }
            self.propagate();
        }

        for var in self.vars.unresolved() {
            self.vars.set(var, SqlType::Unknown);
        }
    }

    fn propagate(&mut self) {
        for round in 0..MAX_ROUNDS {
            while self.forward() {}
            let changed = self.backward_from_targets() || self.backward_expectations();
            trace!(round, changed, "type solver round");
            if !changed {
                return;
            }
        }
        trace!(rounds = MAX_ROUNDS, "type solver stopped before reaching a fixed point");
    }

    fn forward(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.constraints.len() {
            changed |= match &self.constraints[index] {
                Constraint::Equal(a, b) => {
                    let (a, b) = (*a, *b);
                    self.apply_equal(a, b)
                }
                Constraint::Derive { target, rule, args } => {
                    let resolved: Vec<Option<SqlType>> = args.iter().map(|arg| self.vars.get(*arg)).collect();
                    match rule.apply(&resolved) {
                        Some(sql_type) => {
                            let target = *target;
                            self.vars.set(target, sql_type)
                        }
                        None => false,
                    }
                }
                Constraint::Widen { target, args } => {
                    let widened = args
                        .iter()
                        .filter_map(|arg| self.vars.get(*arg))
                        .reduce(SqlType::promote);
                    match widened {
                        Some(sql_type) => {
                            let target = *target;
                            self.vars.set(target, sql_type)
                        }
                        None => false,
                    }
                }
                Constraint::Fix(..) | Constraint::Expect(..) | Constraint::Hint { .. } => false,
            };
        }
        changed
    }

    fn apply_equal(&mut self, a: TypeVar, b: TypeVar) -> bool {
        if self.vars.same(a, b) {
            return false;
        }
        let (free_a, free_b) = (self.vars.is_free(a), self.vars.is_free(b));
        if !free_a && !free_b {
            return false;
        }
        // a NULL literal says nothing about the other side
        let bound = if free_a { b } else { a };
        if !(free_a && free_b) && self.vars.get(bound) == Some(SqlType::Null) {
            return false;
        }
        self.vars.union(a, b);
        true
    }

    fn backward_from_targets(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.constraints.len() {
            match &self.constraints[index] {
                Constraint::Widen { target, args } => {
                    let Some(sql_type) = self.vars.get(*target).filter(|t| Self::propagates(*t)) else {
                        continue;
                    };
                    let pending = self.pending_free(args.iter().copied());
                    for arg in pending {
                        changed |= self.vars.set(arg, sql_type);
                    }
                }
                Constraint::Derive { target, rule, args } => {
                    let Some(sql_type) = self.vars.get(*target).filter(|t| Self::propagates(*t)) else {
                        continue;
                    };
                    let pending = match rule {
                        DeriveRule::Sum => vec![],
                        DeriveRule::SameAs(position) => self.pending_free(args.get(*position).copied()),
                        _ => self.pending_free(args.iter().copied()),
                    };
                    for arg in pending {
                        changed |= self.vars.set(arg, sql_type);
                    }
                }
                Constraint::Hint { var, from } => {
                    if self.vars.get(*var).is_some() {
                        continue;
                    }
                    if let Some(sql_type) = self.vars.get(*from).filter(|t| Self::propagates(*t)) {
                        let var = *var;
                        changed |= self.vars.set(var, sql_type);
                    }
                }
                _ => {}
            }
        }
        changed
    }

    fn backward_expectations(&mut self) -> bool {
        let mut changed = false;
        for index in 0..self.constraints.len() {
            if let Constraint::Expect(var, sql_type) = &self.constraints[index] {
                if self.vars.is_free(*var) && self.vars.get(*var).is_none() && Self::propagates(*sql_type) {
                    let (var, sql_type) = (*var, *sql_type);
                    changed |= self.vars.set(var, sql_type);
                }
            }
        }
        changed
    }

    fn pending_free(&self, vars: impl IntoIterator<Item = TypeVar>) -> Vec<TypeVar> {
        vars.into_iter()
            .filter(|var| self.vars.is_free(*var) && self.vars.get(*var).is_none())
            .collect()
    }

    fn propagates(sql_type: SqlType) -> bool {
        !matches!(sql_type, SqlType::Null | SqlType::Unknown)
    }

    /// Resolved type of a variable, `Unknown` before [`TypeSolver::solve`].
    pub fn resolved(&self, var: TypeVar) -> SqlType {
        self.vars.get(var).unwrap_or(SqlType::Unknown)
    }
}
