use crate::{
    analyzer::{null_rejected_columns, AnalysisContext, FunctionRegistry, Reference},
    parser::ast::{BinaryOp, ExprId, ExprKind},
};

/// Bottom-up not-null facts of expressions already walked by the
/// [`ExpressionAnalyzer`](crate::analyzer::ExpressionAnalyzer).
pub struct NullabilityInference;

impl NullabilityInference {
    pub fn not_null(expr: ExprId, ctx: &AnalysisContext) -> bool {
        let all = |exprs: &[ExprId]| exprs.iter().all(|e| Self::not_null(*e, ctx));

        match ctx.kind(expr) {
            ExprKind::Literal(literal) => !literal.is_null(),
            ExprKind::Column(_) => match ctx.references.get(&expr) {
                Some(Reference::Column(bound)) => ctx
                    .scopes
                    .get(bound.scope)
                    .map(|scope| scope.column_not_null(bound.source, bound.column))
                    .unwrap_or(false),
                Some(Reference::Alias { not_null, .. }) => *not_null,
                None => false,
            },
            ExprKind::Placeholder(ordinal) => ctx.param_not_null.get(*ordinal).copied().unwrap_or(false),
            ExprKind::Unary { expr, .. } => Self::not_null(*expr, ctx),
            ExprKind::Binary { op: BinaryOp::NullSafeEq, .. } => true,
            ExprKind::Binary { left, right, .. } => all(&[*left, *right]),
            ExprKind::IsNull { .. } | ExprKind::IsBool { .. } => true,
            ExprKind::InList { expr, list, .. } => Self::not_null(*expr, ctx) && all(list),
            ExprKind::InSubquery { .. } => false,
            ExprKind::Between { expr, low, high, .. } => all(&[*expr, *low, *high]),
            ExprKind::Like { expr, pattern, .. } => all(&[*expr, *pattern]),
            ExprKind::Case { branches, else_result, .. } => match else_result {
                // the implicit ELSE yields NULL
                None => false,
                Some(else_result) => branches.iter().all(|(_, then)| Self::not_null(*then, ctx)) && Self::not_null(*else_result, ctx),
            },
            ExprKind::Function { name, args, .. } => match FunctionRegistry::get(name) {
                Some(signature) => {
                    let facts: Vec<bool> = args.iter().map(|arg| Self::not_null(*arg, ctx)).collect();
                    signature.nullability.evaluate(&facts)
                }
                None => false,
            },
            ExprKind::Cast { expr, .. } | ExprKind::Interval { expr, .. } => Self::not_null(*expr, ctx),
            ExprKind::Exists { .. } => true,
            ExprKind::Subquery(_) => false,
        }
    }

    /// Record the columns of the current scope that the predicates reject
    /// NULL for, so later references to them read as not null.
    pub fn prove_not_null(predicates: &[ExprId], ctx: &mut AnalysisContext) {
        let current = ctx.scopes.len().saturating_sub(1);
        let mut proven = Vec::new();
        for predicate in predicates {
            for column in null_rejected_columns(ctx.arena(), *predicate) {
                if let Some(Reference::Column(bound)) = ctx.references.get(&column) {
                    if bound.scope == current {
                        proven.push((bound.source, bound.column));
                    }
                }
            }
        }
        if let Some(scope) = ctx.current_scope_mut() {
            scope.proven.extend(proven);
        }
    }
}
