//! Unary, binary and assignment operators.

use crate::{
    error::context::Context,
    ingest::ast::{Node, NodeKind},
    transpile::{
        ast::{BinOp, Expr, Stmt, UnOp},
        env::Env,
        expr::{LowerResult, c_type_of, expect_operands, lower_as, lower_cond, lower_expr, unsupported},
        lowered::Lowered,
    },
};

pub(crate) fn unary(ctx: &mut Context, env: &mut Env, node: &Node, op: &str, postfix: bool) -> LowerResult {
    let c_type = c_type_of(env, node);
    let ops = expect_operands(node, 1)?;
    let operand = ops[0];
    match op {
        "-" | "+" | "~" => {
            let inner = lower_expr(ctx, env, operand)?;
            let op = match op {
                "-" => UnOp::Neg,
                "+" => UnOp::Plus,
                _ => UnOp::BitNot,
            };
            let mut out = Lowered::new(Expr::Nil, c_type);
            let value = out.absorb(inner);
            out.expr = Expr::unary(op, value);
            Ok(out)
        }
        "!" => {
            let inner = lower_cond(ctx, env, operand)?;
            let mut out = Lowered::new(Expr::Nil, "bool");
            let value = out.absorb(inner);
            out.expr = Expr::unary(UnOp::Not, value);
            Ok(out)
        }
        "*" => {
            let inner = lower_expr(ctx, env, operand)?;
            let through_slice = env.is_slice(&inner.c_type);
            let mut out = Lowered::new(Expr::Nil, c_type);
            let value = out.absorb(inner);
            out.expr = if through_slice {
                Expr::index(value, Expr::int(0))
            } else {
                Expr::unary(UnOp::Deref, value)
            };
            Ok(out)
        }
        "&" => address_of(ctx, env, node, operand, c_type),
        "++" | "--" => increment(ctx, env, operand, op == "++", postfix, c_type),
        "__extension__" => lower_expr(ctx, env, operand),
        other => Err(unsupported(&format!("unary operator `{}`", other))),
    }
}

fn strip_parens(node: &Node) -> &Node {
    match &node.kind {
        NodeKind::ParenExpr { .. } => match expect_operands(node, 1) {
            Ok(ops) => strip_parens(ops[0]),
            Err(_) => node,
        },
        _ => node,
    }
}

/// `&a[i]` is `a[i:]`, `&s` of a record is `&s`, anything else is a
/// one-element view on the variable.
fn address_of(ctx: &mut Context, env: &mut Env, node: &Node, operand: &Node, c_type: String) -> LowerResult {
    let pos = env.position(&node.pos);
    let target = strip_parens(operand);
    if let NodeKind::ArraySubscriptExpr { .. } = target.kind {
        let element = lower_expr(ctx, env, target)?;
        let mut out = Lowered::new(Expr::Nil, c_type);
        out.expr = match out.absorb(element) {
            Expr::Index { expr, index } => Expr::Slice {
                expr,
                low: Some(index),
                high: None,
            },
            other => Expr::unary(UnOp::Addr, other),
        };
        return Ok(out);
    }
    if let NodeKind::DeclRefExpr { decl_kind, .. } = &target.kind {
        if decl_kind == "Function" {
            return Ok(Lowered::new(lower_expr(ctx, env, target)?.expr, c_type));
        }
    }

    let inner = lower_expr(ctx, env, operand)?;
    let inner_type = inner.c_type.clone();
    let mut out = Lowered::new(Expr::Nil, c_type.clone());
    let value = out.absorb(inner);
    if env.is_reference(&c_type) || !env.is_slice(&c_type) {
        out.expr = Expr::unary(UnOp::Addr, value);
        return Ok(out);
    }
    let element = env.go_type(ctx, &pos, &inner_type);
    let pointer = env.qualified("unsafe", "Pointer");
    out.expr = Expr::Slice {
        expr: Box::new(Expr::conversion(
            &format!("*[1]{}", element),
            Expr::call(pointer, vec![Expr::unary(UnOp::Addr, value)]),
        )),
        low: None,
        high: None,
    };
    Ok(out)
}

fn increment(
    ctx: &mut Context,
    env: &mut Env,
    operand: &Node,
    inc: bool,
    postfix: bool,
    c_type: String,
) -> LowerResult {
    let target = lower_expr(ctx, env, operand)?;
    let is_slice = env.is_slice(&target.c_type);
    let mut out = Lowered::new(Expr::Nil, c_type);
    let lvalue = out.absorb(target);
    let step = match (is_slice, inc) {
        (true, true) => Stmt::assign(lvalue.clone(), Expr::slice_from(lvalue.clone(), Expr::int(1))),
        (true, false) => return Err(unsupported("decrementing a pointer")),
        (false, _) => Stmt::IncDec {
            expr: lvalue.clone(),
            inc,
        },
    };
    if postfix {
        out.post.push(step);
    } else {
        out.pre.push(step);
    }
    out.expr = lvalue;
    Ok(out)
}

pub(crate) fn binary(ctx: &mut Context, env: &mut Env, node: &Node, op: &str) -> LowerResult {
    let c_type = c_type_of(env, node);
    let ops = expect_operands(node, 2)?;
    match op {
        "=" => assign(ctx, env, ops[0], ops[1]),
        "," => {
            let first = lower_expr(ctx, env, ops[0])?;
            let second = lower_expr(ctx, env, ops[1])?;
            let mut stmts = first.into_stmts();
            stmts.extend(second.pre);
            Ok(Lowered {
                expr: second.expr,
                c_type: second.c_type,
                pre: stmts,
                post: second.post,
            })
        }
        "&&" | "||" => {
            let lhs = lower_cond(ctx, env, ops[0])?;
            let rhs = lower_cond(ctx, env, ops[1])?;
            let op = if op == "&&" { BinOp::LAnd } else { BinOp::LOr };
            let mut out = Lowered::new(Expr::Nil, "bool");
            let l = out.absorb(lhs);
            // the right side may only run when the left one decides so
            let r = if rhs.has_effects() {
                Expr::FuncLit {
                    result: Some("bool".into()),
                    body: rhs.into_return(|| env.fresh_temp()),
                    invoke: true,
                }
            } else {
                rhs.expr
            };
            out.expr = Expr::binary(op, l, r);
            Ok(out)
        }
        _ => {
            let bin = BinOp::from_c(op).ok_or_else(|| unsupported(&format!("binary operator `{}`", op)))?;
            arithmetic(ctx, env, node, bin, ops[0], ops[1], c_type)
        }
    }
}

fn arithmetic(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    op: BinOp,
    lhs: &Node,
    rhs: &Node,
    c_type: String,
) -> LowerResult {
    let pos = env.position(&node.pos);
    let mut l = lower_expr(ctx, env, lhs)?;
    let mut r = lower_expr(ctx, env, rhs)?;

    if op.is_comparison() {
        let mut out = Lowered::new(Expr::Nil, "bool");
        let l_nil = l.expr == Expr::Nil;
        let r_nil = r.expr == Expr::Nil;
        if matches!(op, BinOp::Eq | BinOp::Ne) && l_nil != r_nil {
            // a NULL `char *` is an empty C string
            let string = if l_nil { &r } else { &l };
            if env.is_byte_slice(&string.c_type) {
                let s = if l_nil { out.absorb(r) } else { out.absorb(l) };
                let convert = env.qualified("noarch", "CStringToString");
                out.expr = Expr::binary(op, Expr::call(convert, vec![s]), Expr::StringLit(String::new()));
                return Ok(out);
            }
        }
        let (lv, rv) = if l_nil || r_nil {
            (out.absorb(l), out.absorb(r))
        } else {
            let target = l.c_type.clone();
            let lv = out.absorb(l);
            let r_type = r.c_type.clone();
            let rv = out.absorb(r);
            (lv, env.cast(ctx, &pos, rv, &r_type, &target))
        };
        out.expr = Expr::binary(op, lv, rv);
        return Ok(out);
    }

    let l_slice = env.is_slice(&l.c_type);
    let r_slice = env.is_slice(&r.c_type);
    if l_slice || r_slice {
        return match (op, l_slice, r_slice) {
            (BinOp::Add, true, false) => {
                let mut out = Lowered::new(Expr::Nil, l.c_type.clone());
                let base = out.absorb(l);
                let offset = out.absorb(r);
                out.expr = Expr::slice_from(base, offset);
                Ok(out)
            }
            (BinOp::Add, false, true) => {
                let mut out = Lowered::new(Expr::Nil, r.c_type.clone());
                let offset = out.absorb(l);
                let base = out.absorb(r);
                out.expr = Expr::slice_from(base, offset);
                Ok(out)
            }
            _ => Err(unsupported(&format!("pointer arithmetic with `{}`", op.symbol()))),
        };
    }

    // Go has no arithmetic on bool
    if env.is_bool(&l.c_type) {
        l.expr = env.cast(ctx, &pos, l.expr, &l.c_type, &c_type);
        l.c_type = c_type.clone();
    }
    if env.is_bool(&r.c_type) {
        r.expr = env.cast(ctx, &pos, r.expr, &r.c_type, &c_type);
        r.c_type = c_type.clone();
    }

    let result_type = l.c_type.clone();
    let mut out = Lowered::new(Expr::Nil, result_type.clone());
    let lv = out.absorb(l);
    let r_type = r.c_type.clone();
    let rv = out.absorb(r);
    let rv = match op {
        BinOp::Shl | BinOp::Shr => rv,
        _ => env.cast(ctx, &pos, rv, &r_type, &result_type),
    };
    out.expr = Expr::binary(op, lv, rv);
    Ok(out)
}

/// `a = b` yields `a`, the assignment runs before the value is used.
pub(crate) fn assign(ctx: &mut Context, env: &mut Env, lhs: &Node, rhs: &Node) -> LowerResult {
    let target = lower_expr(ctx, env, lhs)?;
    let value = lower_as(ctx, env, rhs, &target.c_type)?;
    let mut out = Lowered::new(Expr::Nil, target.c_type.clone());
    let lvalue = out.absorb(target);
    let post = std::mem::take(&mut out.post);
    let value = out.absorb(value);
    out.pre.push(Stmt::assign(lvalue.clone(), value));
    out.post.splice(0..0, post);
    out.expr = lvalue;
    Ok(out)
}

/// `a op= b`. Re-slicing handles `p += n` on pointers.
pub(crate) fn compound_assign(ctx: &mut Context, env: &mut Env, node: &Node, op: &str) -> LowerResult {
    let ops = expect_operands(node, 2)?;
    let pos = env.position(&node.pos);
    let symbol = op.strip_suffix('=').unwrap_or(op);
    let bin = BinOp::from_c(symbol).ok_or_else(|| unsupported(&format!("assignment operator `{}`", op)))?;

    let target = lower_expr(ctx, env, ops[0])?;
    let value = lower_expr(ctx, env, ops[1])?;
    let is_slice = env.is_slice(&target.c_type);
    let target_type = target.c_type.clone();
    let value_type = value.c_type.clone();

    let mut out = Lowered::new(Expr::Nil, target_type.clone());
    let lvalue = out.absorb(target);
    let v = out.absorb(value);
    let stmt = match (is_slice, bin) {
        (true, BinOp::Add) => Stmt::assign(lvalue.clone(), Expr::slice_from(lvalue.clone(), v)),
        (true, _) => return Err(unsupported(&format!("pointer arithmetic with `{}`", op))),
        (false, BinOp::Shl | BinOp::Shr) => Stmt::Assign {
            lhs: vec![lvalue.clone()],
            op: Some(bin),
            rhs: vec![v],
        },
        (false, _) => Stmt::Assign {
            lhs: vec![lvalue.clone()],
            op: Some(bin),
            rhs: vec![env.cast(ctx, &pos, v, &value_type, &target_type)],
        },
    };
    // operand post effects run after the assignment, as with `=`
    out.pre.push(stmt);
    out.expr = lvalue;
    Ok(out)
}
