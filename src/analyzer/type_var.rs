use std::fmt;

use crate::database::SqlType;

/// Handle of a type variable inside a [`TypeVars`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar(pub usize);

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Union-find over type variables.
///
/// Each class carries the type resolved so far and whether it is free. A
/// class is free while every member is a placeholder: nothing in the
/// statement pins its type, so equalities may pull it to another class.
#[derive(Debug, Clone, Default)]
pub struct TypeVars {
    parent: Vec<usize>,
    rank: Vec<u8>,
    free: Vec<bool>,
    types: Vec<Option<SqlType>>,
}

impl TypeVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, free: bool) -> TypeVar {
        let index = self.parent.len();
        self.parent.push(index);
        self.rank.push(0);
        self.free.push(free);
        self.types.push(None);
        TypeVar(index)
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&self, var: TypeVar) -> usize {
        let mut current = var.0;
        while self.parent[current] != current {
            current = self.parent[current];
        }
        current
    }

    pub fn same(&self, a: TypeVar, b: TypeVar) -> bool {
        self.find(a) == self.find(b)
    }

    /// Merge two classes; the merged class is free only if both were.
    pub fn union(&mut self, a: TypeVar, b: TypeVar) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (root, child) = if self.rank[ra] >= self.rank[rb] { (ra, rb) } else { (rb, ra) };
        if self.rank[root] == self.rank[child] {
            self.rank[root] += 1;
        }
        self.parent[child] = root;
        self.free[root] = self.free[root] && self.free[child];
        self.types[root] = match (self.types[root], self.types[child]) {
            (Some(x), Some(y)) => Some(SqlType::promote(x, y)),
            (x, y) => x.or(y),
        };
    }

    pub fn is_free(&self, var: TypeVar) -> bool {
        self.free[self.find(var)]
    }

    pub fn get(&self, var: TypeVar) -> Option<SqlType> {
        self.types[self.find(var)]
    }

    /// Overwrite the class type; returns whether it changed.
    pub fn set(&mut self, var: TypeVar, value: SqlType) -> bool {
        let root = self.find(var);
        if self.types[root] == Some(value) {
            return false;
        }
        self.types[root] = Some(value);
        true
    }

    /// Widen the class type with `value`; returns whether it changed.
    pub fn widen(&mut self, var: TypeVar, value: SqlType) -> bool {
        let widened = match self.get(var) {
            Some(current) => SqlType::promote(current, value),
            None => value,
        };
        self.set(var, widened)
    }

    /// Roots of the classes that are still free and unresolved.
    pub fn unresolved_free(&self) -> Vec<TypeVar> {
        (0..self.parent.len())
            .filter(|index| self.parent[*index] == *index && self.free[*index] && self.types[*index].is_none())
            .map(TypeVar)
            .collect()
    }

    pub fn unresolved(&self) -> Vec<TypeVar> {
        (0..self.parent.len())
            .filter(|index| self.parent[*index] == *index && self.types[*index].is_none())
            .map(TypeVar)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_union_keeps_type_and_freedom() {
        let mut vars = TypeVars::new();
        let placeholder = vars.fresh(true);
        let column = vars.fresh(false);
        vars.set(column, SqlType::Int);

        assert!(vars.is_free(placeholder));
        vars.union(placeholder, column);
        assert!(vars.same(placeholder, column));
        assert!(!vars.is_free(placeholder));
        assert_eq!(vars.get(placeholder), Some(SqlType::Int));
    }

    #[test]
    pub fn test_widen_and_unresolved() {
        let mut vars = TypeVars::new();
        let a = vars.fresh(true);
        let b = vars.fresh(false);
        assert_eq!(vars.unresolved_free(), vec![a]);
        assert_eq!(vars.unresolved().len(), 2);

        assert!(vars.widen(b, SqlType::Int));
        assert!(vars.widen(b, SqlType::Double));
        assert!(!vars.widen(b, SqlType::Int));
        assert_eq!(vars.get(b), Some(SqlType::Double));
    }
}
