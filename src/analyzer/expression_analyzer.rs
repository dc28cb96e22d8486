use tracing::debug;

use crate::{
    analyzer::{
        AnalysisContext, AnalyzerError, ColumnResolver, ColumnType, Constraint, DeriveRule, FunctionRegistry,
        ReturnRule, SelectAnalyzer, TypeVar,
    },
    database::SqlType,
    parser::ast::{BinaryOp, ExprId, ExprKind, UnaryOp},
};

/// Walks an expression tree, binding column references and emitting the
/// type constraints of every node.
pub struct ExpressionAnalyzer;

impl ExpressionAnalyzer {
    pub fn walk(expr: ExprId, ctx: &mut AnalysisContext) -> Result<TypeVar, AnalyzerError> {
        match ctx.kind(expr) {
            ExprKind::Literal(literal) => {
                let var = ctx.var_of(expr);
                ctx.solver.fix(var, literal.natural_type());
                Ok(var)
            }
            ExprKind::Column(column) => {
                let reference = ColumnResolver::resolve_column(column, ctx)?;
                let var = reference.var();
                ctx.references.insert(expr, reference);
                Ok(var)
            }
            ExprKind::Placeholder(_) => Ok(ctx.var_of(expr)),
            ExprKind::Unary { op, expr: operand } => {
                let inner = Self::walk(*operand, ctx)?;
                let var = ctx.var_of(expr);
                match op {
                    UnaryOp::Minus | UnaryOp::Plus => {
                        ctx.solver.expect(inner, SqlType::Double);
                        ctx.solver.add(Constraint::Derive { target: var, rule: DeriveRule::SameAs(0), args: vec![inner] });
                    }
                    UnaryOp::Not => ctx.solver.fix(var, SqlType::TinyInt),
                    UnaryOp::BitNot => {
                        ctx.solver.expect(inner, SqlType::BigInt);
                        ctx.solver.fix(var, SqlType::BigInt);
                    }
                }
                Ok(var)
            }
            ExprKind::Binary { op, left, right } => Self::walk_binary(expr, *op, *left, *right, ctx),
            ExprKind::IsNull { expr: operand, .. } => {
                Self::walk(*operand, ctx)?;
                ctx.mark_nullable(*operand);
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::IsBool { expr: operand, .. } => {
                Self::walk(*operand, ctx)?;
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::InList { expr: operand, list, .. } => {
                let left = Self::walk(*operand, ctx)?;
                for item in list {
                    let right = Self::walk(*item, ctx)?;
                    ctx.solver.equal(left, right);
                }
                if let [single] = list.as_slice() {
                    ctx.mark_list(*single);
                }
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::InSubquery { expr: operand, query, .. } => {
                let left = Self::walk(*operand, ctx)?;
                let shape = SelectAnalyzer::analyze_select(query, ctx)?;
                if let Some(first) = shape.columns.first() {
                    ctx.solver.equal(left, first.var);
                }
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::Between { expr: operand, low, high, .. } => {
                let value = Self::walk(*operand, ctx)?;
                let low = Self::walk(*low, ctx)?;
                let high = Self::walk(*high, ctx)?;
                ctx.solver.equal(value, low);
                ctx.solver.equal(value, high);
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::Like { expr: operand, pattern, escape, .. } => {
                let value = Self::walk(*operand, ctx)?;
                let pattern = Self::walk(*pattern, ctx)?;
                ctx.solver.expect(value, SqlType::Varchar);
                ctx.solver.expect(pattern, SqlType::Varchar);
                if let Some(escape) = escape {
                    let escape = Self::walk(*escape, ctx)?;
                    ctx.solver.expect(escape, SqlType::Varchar);
                }
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::Case { operand, branches, else_result } => {
                let operand = match operand {
                    Some(operand) => Some(Self::walk(*operand, ctx)?),
                    None => None,
                };
                let mut results = Vec::with_capacity(branches.len() + 1);
                for (when, then) in branches {
                    let when = Self::walk(*when, ctx)?;
                    if let Some(operand) = operand {
                        ctx.solver.equal(operand, when);
                    }
                    results.push(Self::walk(*then, ctx)?);
                }
                if let Some(else_result) = else_result {
                    results.push(Self::walk(*else_result, ctx)?);
                }
                let var = ctx.var_of(expr);
                ctx.solver.add(Constraint::Widen { target: var, args: results });
                Ok(var)
            }
            ExprKind::Function { name, args, .. } => Self::walk_function(expr, name, args, ctx),
            ExprKind::Cast { expr: operand, target } => {
                Self::walk(*operand, ctx)?;
                let var = ctx.var_of(expr);
                ctx.solver.fix(var, *target);
                Ok(var)
            }
            ExprKind::Interval { expr: operand, .. } => {
                let amount = Self::walk(*operand, ctx)?;
                ctx.solver.expect(amount, SqlType::BigInt);
                let var = ctx.var_of(expr);
                ctx.solver.fix(var, SqlType::Unknown);
                Ok(var)
            }
            ExprKind::Exists { query } => {
                SelectAnalyzer::analyze_select(query, ctx)?;
                Ok(Self::boolean(expr, ctx))
            }
            ExprKind::Subquery(query) => {
                let shape = SelectAnalyzer::analyze_select(query, ctx)?;
                let var = ctx.var_of(expr);
                let args = shape.columns.first().map(|c| vec![c.var]).unwrap_or_default();
                ctx.solver.add(Constraint::Widen { target: var, args });
                Ok(var)
            }
        }
    }

    fn walk_binary(
        expr: ExprId,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        ctx: &mut AnalysisContext,
    ) -> Result<TypeVar, AnalyzerError> {
        let left_var = Self::walk(left, ctx)?;
        let right_var = Self::walk(right, ctx)?;
        let var = ctx.var_of(expr);
        let left_interval = matches!(ctx.kind(left), ExprKind::Interval { .. });
        let right_interval = matches!(ctx.kind(right), ExprKind::Interval { .. });

        match op {
            // date arithmetic keeps the type of the date operand
            BinaryOp::Add | BinaryOp::Sub if left_interval || right_interval => {
                let position = if right_interval { 0 } else { 1 };
                ctx.solver.add(Constraint::Derive {
                    target: var,
                    rule: DeriveRule::SameAs(position),
                    args: vec![left_var, right_var],
                });
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                ctx.solver.expect(left_var, SqlType::Double);
                ctx.solver.expect(right_var, SqlType::Double);
                let rule = match op {
                    BinaryOp::Div => DeriveRule::Division,
                    BinaryOp::Mod => DeriveRule::Promote,
                    _ => DeriveRule::Arithmetic,
                };
                ctx.solver.add(Constraint::Derive { target: var, rule, args: vec![left_var, right_var] });
            }
            BinaryOp::IntDiv => {
                ctx.solver.expect(left_var, SqlType::Double);
                ctx.solver.expect(right_var, SqlType::Double);
                ctx.solver.fix(var, SqlType::BigInt);
            }
            op if op.is_bitwise() => {
                ctx.solver.expect(left_var, SqlType::BigInt);
                ctx.solver.expect(right_var, SqlType::BigInt);
                ctx.solver.fix(var, SqlType::BigInt);
            }
            BinaryOp::Concat => {
                ctx.solver.expect(left_var, SqlType::Varchar);
                ctx.solver.expect(right_var, SqlType::Varchar);
                ctx.solver.fix(var, SqlType::Varchar);
            }
            op if op.is_comparison() => {
                ctx.solver.equal(left_var, right_var);
                ctx.solver.fix(var, SqlType::TinyInt);
            }
            BinaryOp::Regexp => {
                ctx.solver.expect(left_var, SqlType::Varchar);
                ctx.solver.expect(right_var, SqlType::Varchar);
                ctx.solver.fix(var, SqlType::TinyInt);
            }
            _ => ctx.solver.fix(var, SqlType::TinyInt),
        }
        Ok(var)
    }

    fn walk_function(expr: ExprId, name: &str, args: &[ExprId], ctx: &mut AnalysisContext) -> Result<TypeVar, AnalyzerError> {
        let mut arg_vars = Vec::with_capacity(args.len());
        for arg in args {
            arg_vars.push(Self::walk(*arg, ctx)?);
        }
        let var = ctx.var_of(expr);

        let Some(signature) = FunctionRegistry::get(name) else {
            Self::delegate(expr, name, var, ctx);
            return Ok(var);
        };

        for (position, arg_var) in arg_vars.iter().enumerate() {
            if let Some(expected) = signature.args.expected(position) {
                ctx.solver.expect(*arg_var, expected);
            }
        }
        if signature.nullable_args {
            for arg in args {
                ctx.mark_nullable(*arg);
            }
        }

        match signature.returns {
            ReturnRule::Fixed(sql_type) => ctx.solver.fix(var, sql_type),
            ReturnRule::SameAsArg(position) if position < arg_vars.len() => {
                ctx.solver.add(Constraint::Derive { target: var, rule: DeriveRule::SameAs(position), args: arg_vars });
            }
            ReturnRule::SameAsArg(_) => ctx.solver.fix(var, SqlType::Unknown),
            ReturnRule::Widen => ctx.solver.add(Constraint::Widen { target: var, args: arg_vars }),
            ReturnRule::WidenFrom(position) => {
                let args = arg_vars.get(position..).map(<[TypeVar]>::to_vec).unwrap_or_default();
                ctx.solver.add(Constraint::Widen { target: var, args });
            }
            ReturnRule::Sum => ctx.solver.add(Constraint::Derive { target: var, rule: DeriveRule::Sum, args: arg_vars }),
        }
        Ok(var)
    }

    /// Type a call no static rule covers through the expression resolver.
    fn delegate(expr: ExprId, name: &str, var: TypeVar, ctx: &mut AnalysisContext) {
        let Some(resolver) = ctx.resolver else {
            debug!(function = name, "unknown function, reporting an opaque type");
            ctx.solver.fix(var, SqlType::Unknown);
            return;
        };

        let text = ctx.expr_text(expr);
        let from = ctx.from_text();
        match resolver.resolve_expression_type(text, from.as_deref()) {
            Ok(column_type) => {
                debug!(expression = text, resolved = %column_type, "expression type delegated");
                ctx.solver.fix(var, column_type.promoted());
                if let ColumnType::OneOf(_) = column_type {
                    ctx.type_overrides.insert(expr, column_type);
                }
            }
            Err(err) => {
                debug!(error = %err, "expression type resolver failed, reporting an opaque type");
                ctx.solver.fix(var, SqlType::Unknown);
            }
        }
    }

    fn boolean(expr: ExprId, ctx: &mut AnalysisContext) -> TypeVar {
        let var = ctx.var_of(expr);
        ctx.solver.fix(var, SqlType::TinyInt);
        var
    }
}
