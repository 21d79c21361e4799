//! Lowering of C expressions.

use crate::{
    common::{Position, go_ident},
    error::context::Context,
    ingest::ast::{Node, NodeKind},
    transpile::{
        ast::{Expr, Stmt, UnOp},
        call,
        env::Env,
        error::{StmtError, TranspileError, arity},
        literal::{byte_string, go_string, init_list, int_literal, zero_value},
        lowered::Lowered,
        operators,
    },
    types::{self, size_of},
};

pub(crate) type LowerResult = Result<Lowered, StmtError>;

/// Children which take part in translation, without type nodes, attributes
/// and comments.
pub(crate) fn operands(node: &Node) -> Vec<&Node> {
    node.children()
        .iter()
        .filter(|n| !n.kind.is_metadata())
        .collect()
}

/// Exactly `n` operands, or a child arity error.
pub(crate) fn expect_operands(node: &Node, n: usize) -> Result<Vec<&Node>, TranspileError> {
    let ops = operands(node);
    if ops.len() != n {
        return Err(arity(node.kind_name(), &n.to_string(), ops.len()));
    }
    Ok(ops)
}

/// C type of an expression node, `void` for nodes without one.
pub(crate) fn c_type_of(env: &Env, node: &Node) -> String {
    node.expr_type()
        .map(|qt| env.pick(qt))
        .unwrap_or_else(|| "void".to_string())
}

/// Lower an expression and convert it to `target`.
pub(crate) fn lower_as(ctx: &mut Context, env: &mut Env, node: &Node, target: &str) -> LowerResult {
    let pos = env.position(&node.pos);
    match &node.kind {
        NodeKind::InitListExpr { .. } => return init_list(ctx, env, node, target),
        NodeKind::ImplicitValueInitExpr { .. } => {
            return Ok(Lowered::new(zero_value(ctx, env, &pos, target), target));
        }
        _ => (),
    }
    if let Some(alloc) = call::allocation(ctx, env, node, target)? {
        return Ok(alloc);
    }
    let l = lower_expr(ctx, env, node)?;
    Ok(convert(ctx, env, &pos, l, target))
}

/// Lower an expression used as a condition.
pub(crate) fn lower_cond(ctx: &mut Context, env: &mut Env, node: &Node) -> LowerResult {
    lower_as(ctx, env, node, "bool")
}

pub(crate) fn convert(ctx: &mut Context, env: &mut Env, pos: &Position, mut l: Lowered, target: &str) -> Lowered {
    if l.expr != Expr::Nil {
        l.expr = env.cast(ctx, pos, l.expr, &l.c_type, target);
    }
    l.c_type = target.to_string();
    l
}

pub(crate) fn lower_expr(ctx: &mut Context, env: &mut Env, node: &Node) -> LowerResult {
    let pos = env.position(&node.pos);
    let c_type = c_type_of(env, node);
    match &node.kind {
        NodeKind::IntegerLiteral { value, .. } => Ok(Lowered::new(Expr::IntLit(int_literal(value)), c_type)),
        NodeKind::FloatingLiteral { value, .. } => Ok(Lowered::new(Expr::FloatLit(value.clone()), c_type)),
        NodeKind::CharacterLiteral { value, .. } => Ok(Lowered::new(Expr::int(value), c_type)),
        NodeKind::StringLiteral { value, .. } => Ok(Lowered::new(byte_string(&go_string(value)), c_type)),
        NodeKind::PredefinedExpr { .. } => {
            let name = env.function().map(|f| f.name.clone()).unwrap_or_default();
            Ok(Lowered::new(byte_string(&name), c_type))
        }
        NodeKind::DeclRefExpr { name, .. } => Ok(Lowered::new(Expr::ident(go_ident(name)), c_type)),
        // grouping is recomputed from Go precedence when printing
        NodeKind::ParenExpr { .. } => {
            let ops = expect_operands(node, 1)?;
            lower_expr(ctx, env, ops[0])
        }
        NodeKind::ImplicitCastExpr { cast, .. } | NodeKind::CStyleCastExpr { cast, .. } => {
            lower_cast(ctx, env, node, cast, &c_type, &pos)
        }
        NodeKind::UnaryOperator { op, postfix, .. } => operators::unary(ctx, env, node, op, *postfix),
        NodeKind::BinaryOperator { op, .. } => operators::binary(ctx, env, node, op),
        NodeKind::CompoundAssignOperator { op, .. } => operators::compound_assign(ctx, env, node, op),
        NodeKind::MemberExpr { name, arrow, .. } => member(ctx, env, node, name, *arrow, c_type),
        NodeKind::ArraySubscriptExpr { .. } => subscript(ctx, env, node, c_type),
        NodeKind::ConditionalOperator { .. } => conditional(ctx, env, node, c_type, &pos),
        NodeKind::BinaryConditionalOperator { .. } => binary_conditional(ctx, env, node, c_type),
        NodeKind::CallExpr { .. } => call::call(ctx, env, node),
        NodeKind::UnaryExprOrTypeTraitExpr {
            trait_name, arg_ty, ..
        } => {
            let measured = match arg_ty {
                Some(qt) => qt.canonical().to_string(),
                None => operands(node)
                    .first()
                    .and_then(|n| n.expr_type())
                    .map(|qt| qt.canonical().to_string())
                    .ok_or_else(|| arity(node.kind_name(), "1", 0))?,
            };
            let size = size_of(&env.st, &measured)?;
            let value = match trait_name.as_str() {
                "sizeof" => size,
                _ => size.min(8),
            };
            Ok(Lowered::new(Expr::int(value), c_type))
        }
        NodeKind::InitListExpr { .. } => init_list(ctx, env, node, &c_type),
        NodeKind::ImplicitValueInitExpr { .. } => {
            Ok(Lowered::new(zero_value(ctx, env, &pos, &c_type), c_type))
        }
        NodeKind::CompoundLiteralExpr { .. } => {
            let ops = expect_operands(node, 1)?;
            lower_as(ctx, env, ops[0], &c_type)
        }
        NodeKind::ConstantExpr { .. } => {
            let first = operands(node)
                .into_iter()
                .find(|n| !matches!(n.kind, NodeKind::ConstantValue { .. }))
                .ok_or_else(|| arity(node.kind_name(), "1", 0))?;
            lower_expr(ctx, env, first)
        }
        NodeKind::OpaqueValueExpr { .. } => {
            let ops = expect_operands(node, 1)?;
            lower_expr(ctx, env, ops[0])
        }
        NodeKind::StmtExpr { .. } => Err(unsupported("statement expression")),
        NodeKind::VAArgExpr { .. } => Err(unsupported("va_arg")),
        NodeKind::OffsetOfExpr { .. } => Err(unsupported("offsetof")),
        other => Err(unsupported(&format!("{} as an expression", other.name()))),
    }
}

pub(crate) fn unsupported(what: &str) -> StmtError {
    StmtError::Transpile(TranspileError::Unsupported(what.to_string()))
}

fn lower_cast(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    cast: &str,
    c_type: &str,
    pos: &Position,
) -> LowerResult {
    let ops = expect_operands(node, 1)?;
    match cast {
        "NullToPointer" => Ok(Lowered::new(Expr::Nil, c_type)),
        "ToVoid" => {
            let mut inner = lower_expr(ctx, env, ops[0])?;
            inner.c_type = "void".into();
            Ok(inner)
        }
        _ => {
            if let Some(alloc) = call::allocation(ctx, env, ops[0], c_type)? {
                return Ok(alloc);
            }
            let inner = lower_expr(ctx, env, ops[0])?;
            Ok(convert(ctx, env, pos, inner, c_type))
        }
    }
}

fn member(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    name: &str,
    arrow: bool,
    c_type: String,
) -> LowerResult {
    if name.is_empty() {
        return Err(unsupported("access to an anonymous member"));
    }
    let ops = expect_operands(node, 1)?;
    let base = lower_expr(ctx, env, ops[0])?;
    let through_slice = arrow && env.is_slice(&base.c_type);
    let shared = env.is_shared_union(&base.c_type, arrow);
    let mut out = Lowered::new(Expr::Nil, c_type);
    let mut value = out.absorb(base);
    if through_slice {
        value = Expr::index(value, Expr::int(0));
    }
    out.expr = if shared {
        let pos = env.position(&node.pos);
        let member_type = out.c_type.clone();
        env.union_member(ctx, &pos, value, &member_type)
    } else {
        Expr::selector(value, &go_ident(name))
    };
    Ok(out)
}

fn subscript(ctx: &mut Context, env: &mut Env, node: &Node, c_type: String) -> LowerResult {
    let ops = expect_operands(node, 2)?;
    let first = lower_expr(ctx, env, ops[0])?;
    let second = lower_expr(ctx, env, ops[1])?;
    // `i[a]` is legal C
    let (base, index) = if !env.is_slice(&first.c_type) && env.is_slice(&second.c_type) {
        (second, first)
    } else {
        (first, second)
    };
    let mut out = Lowered::new(Expr::Nil, c_type);
    let base = out.absorb(base);
    let index = out.absorb(index);
    out.expr = Expr::index(base, index);
    Ok(out)
}

/// Statements of a closure branch which yields `l`.
fn branch_body(l: Lowered, env: &mut Env, has_result: bool) -> Vec<Stmt> {
    if has_result {
        l.into_return(|| env.fresh_temp())
    } else {
        l.into_stmts()
    }
}

/// `c ? a : b` becomes `func() T { if c { return a }; return b }()`.
fn conditional(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    c_type: String,
    pos: &Position,
) -> LowerResult {
    let ops = expect_operands(node, 3)?;
    let cond = lower_cond(ctx, env, ops[0])?;
    let has_result = types::strip_qualifiers(&c_type) != "void";
    let (then, els) = if has_result {
        (
            lower_as(ctx, env, ops[1], &c_type)?,
            lower_as(ctx, env, ops[2], &c_type)?,
        )
    } else {
        (lower_expr(ctx, env, ops[1])?, lower_expr(ctx, env, ops[2])?)
    };

    let mut out = Lowered::new(Expr::Nil, c_type.clone());
    let cond = out.absorb(cond);
    let then = branch_body(then, env, has_result);
    let mut body = vec![Stmt::If {
        cond,
        then,
        els: None,
    }];
    let els = branch_body(els, env, has_result);
    if has_result {
        body.extend(els);
    } else if let Some(Stmt::If { els: slot, .. }) = body.last_mut() {
        *slot = Some(els);
    }
    let result = if has_result {
        Some(env.go_type(ctx, pos, &c_type))
    } else {
        None
    };
    out.expr = Expr::FuncLit {
        result,
        body,
        invoke: true,
    };
    Ok(out)
}

/// GNU `a ?: b`: `a` is evaluated once into a temporary.
fn binary_conditional(ctx: &mut Context, env: &mut Env, node: &Node, c_type: String) -> LowerResult {
    let ops: Vec<&Node> = operands(node)
        .into_iter()
        .filter(|n| !matches!(n.kind, NodeKind::OpaqueValueExpr { .. }))
        .collect();
    if ops.len() < 2 {
        return Err(arity(node.kind_name(), "at least 2", ops.len()).into());
    }
    let pos = env.position(&node.pos);
    let value = lower_as(ctx, env, ops[0], &c_type)?;
    let fallback = lower_as(ctx, env, ops[ops.len() - 1], &c_type)?;

    let t = env.fresh_temp();
    let mut out = Lowered::new(Expr::ident(&t), c_type.clone());
    let value = out.absorb(value);
    out.pre.push(Stmt::Define {
        names: vec![t.clone()],
        value,
    });
    let test = env.cast(ctx, &pos, Expr::ident(&t), &c_type, "bool");
    let mut replace = fallback.pre;
    replace.push(Stmt::assign(Expr::ident(&t), fallback.expr));
    replace.extend(fallback.post);
    out.pre.push(Stmt::If {
        cond: Expr::unary(UnOp::Not, Expr::Paren(Box::new(test))),
        then: replace,
        els: None,
    });
    Ok(out)
}
