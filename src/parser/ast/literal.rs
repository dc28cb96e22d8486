use std::fmt::{self, Display};

use ordered_float::NotNan;

use crate::database::SqlType;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String(String),
    Int(i64),
    /// Fixed-point literal such as `1.50`.
    Decimal(NotNan<f64>),
    /// Literal written with an exponent such as `2e3`.
    Float(NotNan<f64>),
    Bool(bool),
    Null,
}

impl Literal {
    /// Type MySQL gives the literal on its own.
    pub fn natural_type(&self) -> SqlType {
        match self {
            Literal::String(_) => SqlType::Varchar,
            Literal::Int(value) if i32::try_from(*value).is_ok() => SqlType::Int,
            Literal::Int(_) => SqlType::BigInt,
            Literal::Decimal(_) => SqlType::Decimal,
            Literal::Float(_) => SqlType::Double,
            Literal::Bool(_) => SqlType::TinyInt,
            Literal::Null => SqlType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "s: \"{}\"", s),
            Literal::Int(i) => write!(f, "i: {}", i),
            Literal::Decimal(n) => write!(f, "d: {}", n.into_inner()),
            Literal::Float(n) => write!(f, "f: {}", n.into_inner()),
            Literal::Bool(b) => write!(f, "b: {}", b),
            Literal::Null => write!(f, "n: NULL"),
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(_) => write!(f, "String({})", self),
            Literal::Int(_) => write!(f, "Int({})", self),
            Literal::Decimal(_) => write!(f, "Decimal({})", self),
            Literal::Float(_) => write!(f, "Float({})", self),
            Literal::Bool(_) => write!(f, "Bool({})", self),
            Literal::Null => write!(f, "Null(n: NULL)"),
        }
    }
}
