use thiserror::Error;

use crate::analyzer::ResolverError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    #[error("unknown column '{name}'{}", candidates_hint(.candidates))]
    UnknownColumn { name: String, candidates: Vec<String> },
    #[error("column '{name}' is ambiguous, found in {}", .matches.join(", "))]
    AmbiguousColumn { name: String, matches: Vec<String> },
    #[error("expected {expected} columns, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("invalid statement: {0}")]
    InvalidStatement(String),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

fn candidates_hint(candidates: &[String]) -> String {
    if candidates.is_empty() {
        return String::new();
    }
    format!(" (candidates: {})", candidates.join(", "))
}
