//! Lowering of C statements.

use crate::{
    common::go_ident,
    error::context::Context,
    ingest::ast::{Node, NodeKind},
    transpile::{
        ast::{Expr, Stmt, UnOp},
        decl,
        env::Env,
        error::{StmtError, TranspileError, arity, asm_skipped, placeholder, statement_dropped},
        expr::{lower_as, lower_cond, lower_expr, operands},
        lowered::Lowered,
        switch,
    },
};

/// Lower one statement. Type and size failures replace the statement by a
/// placeholder, other failures reach the enclosing declaration.
pub(crate) fn lower_stmt(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, TranspileError> {
    let pos = env.position(&node.pos);
    match stmt(ctx, env, node) {
        Ok(stmts) => Ok(stmts),
        Err(StmtError::Transpile(e)) => Err(e),
        Err(e) => {
            ctx.report(statement_dropped(&pos, node.kind_name(), &e));
            Ok(vec![Stmt::Placeholder(placeholder(node.kind_name(), &pos, &e))])
        }
    }
}

/// Statements of a body: the children of a compound statement, or the one
/// statement standing in for it.
pub(crate) fn lower_body(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, TranspileError> {
    env.position(&node.pos);
    match node.kind {
        NodeKind::CompoundStmt => {
            let mut out = vec![];
            for child in operands(node) {
                out.extend(lower_stmt(ctx, env, child)?);
            }
            Ok(out)
        }
        _ => lower_stmt(ctx, env, node),
    }
}

fn stmt(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, StmtError> {
    let ops = operands(node);
    Ok(match &node.kind {
        NodeKind::CompoundStmt => vec![Stmt::Block(lower_body(ctx, env, node)?)],
        NodeKind::DeclStmt => decl::local(ctx, env, node)?,
        NodeKind::IfStmt {
            has_init,
            has_var,
            has_else,
        } => if_stmt(ctx, env, node, *has_init, *has_var, *has_else)?,
        NodeKind::ForStmt => for_stmt(ctx, env, node)?,
        NodeKind::WhileStmt { .. } => {
            let [.., cond, body] = ops.as_slice() else {
                return Err(arity(node.kind_name(), "at least 2", ops.len()).into());
            };
            let cond = lower_cond(ctx, env, cond)?;
            let body = lower_body(ctx, env, body)?;
            vec![loop_with(cond, None, body)]
        }
        NodeKind::DoStmt => do_stmt(ctx, env, node)?,
        NodeKind::SwitchStmt { .. } => switch::switch_stmt(ctx, env, node)?,
        NodeKind::CaseStmt | NodeKind::DefaultStmt => {
            return Err(TranspileError::CaseOutsideSwitch {
                kind: node.kind_name().to_string(),
            }
            .into());
        }
        NodeKind::BreakStmt => vec![Stmt::Break],
        NodeKind::ContinueStmt => vec![Stmt::Continue],
        NodeKind::ReturnStmt => return_stmt(ctx, env, ops.first().copied())?,
        NodeKind::LabelStmt { name } => {
            let mut out = vec![Stmt::Label(go_ident(name))];
            for child in ops {
                out.extend(lower_stmt(ctx, env, child)?);
            }
            out
        }
        NodeKind::GotoStmt { label } => vec![Stmt::Goto(go_ident(label))],
        NodeKind::NullStmt => vec![],
        NodeKind::GCCAsmStmt => {
            let pos = env.position(&node.pos);
            ctx.report(asm_skipped(&pos));
            vec![]
        }
        _ => lower_expr(ctx, env, node)?.into_stmts(),
    })
}

/// Children of an if statement: `[init] [var] cond then [else]`.
fn if_stmt(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    has_init: bool,
    has_var: bool,
    has_else: bool,
) -> Result<Vec<Stmt>, StmtError> {
    let ops = operands(node);
    let flagged = has_init || has_var || has_else || ops.len() == 2;
    let (init, var, rest) = if flagged {
        let skip = has_init as usize + has_var as usize;
        let expected = skip + 2 + has_else as usize;
        if ops.len() != expected {
            return Err(arity(node.kind_name(), &expected.to_string(), ops.len()).into());
        }
        let init = has_init.then(|| ops[0]);
        let var = has_var.then(|| ops[skip - 1]);
        (init, var, &ops[skip..])
    } else {
        // older dumps print every slot, with null statements for the empty ones
        match ops.len() {
            3 => (None, None, &ops[..]),
            4 => (None, Some(ops[0]), &ops[1..]),
            5 => (Some(ops[0]), Some(ops[1]), &ops[2..]),
            n => return Err(arity(node.kind_name(), "2 to 5", n).into()),
        }
    };
    let (cond, then, els) = match rest {
        [cond, then] => (*cond, *then, None),
        [cond, then, els] => (*cond, *then, Some(*els).filter(|n| !n.is_null())),
        _ => return Err(arity(node.kind_name(), "2 to 5", ops.len()).into()),
    };

    let mut out = vec![];
    for prelude in [init, var].into_iter().flatten().filter(|n| !n.is_null()) {
        out.extend(lower_stmt(ctx, env, prelude)?);
    }
    let cond = lower_cond(ctx, env, cond)?;
    out.extend(cond.pre);

    let mut then_body = cond.post.clone();
    then_body.extend(lower_body(ctx, env, then)?);
    let els_body = match els {
        Some(els) => {
            let mut body = cond.post.clone();
            body.extend(lower_body(ctx, env, els)?);
            Some(body)
        }
        None if !cond.post.is_empty() => Some(cond.post.clone()),
        None => None,
    };
    out.push(Stmt::If {
        cond: cond.expr,
        then: then_body,
        els: els_body,
    });
    Ok(out)
}

/// `for cond { body }`, or a loop testing the condition at the top of the
/// body when the condition has side effects.
fn loop_with(cond: Lowered, post: Option<Box<Stmt>>, body: Vec<Stmt>) -> Stmt {
    if !cond.has_effects() {
        return Stmt::For {
            init: None,
            cond: Some(cond.expr),
            post,
            body,
        };
    }
    let mut full = cond.pre;
    full.push(Stmt::If {
        cond: Expr::unary(UnOp::Not, cond.expr),
        then: cond.post.clone().into_iter().chain([Stmt::Break]).collect(),
        els: None,
    });
    full.extend(cond.post);
    full.extend(body);
    Stmt::For {
        init: None,
        cond: None,
        post,
        body: full,
    }
}

/// A statement allowed as the post statement of a Go `for`.
fn is_simple(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::Assign { .. } | Stmt::IncDec { .. } | Stmt::Expr(_) | Stmt::Define { .. }
    )
}

/// Children: init, condition variable, cond, inc, body. Missing clauses are
/// null statements.
fn for_stmt(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, StmtError> {
    let ops = operands(node);
    let [init, var, cond, inc, body] = ops.as_slice() else {
        return Err(arity(node.kind_name(), "5", ops.len()).into());
    };

    let mut before = vec![];
    for prelude in [init, var] {
        if !prelude.is_null() {
            before.extend(lower_stmt(ctx, env, prelude)?);
        }
    }
    let post = if inc.is_null() {
        None
    } else {
        let stmts = lower_expr(ctx, env, inc)?.into_stmts();
        match stmts.as_slice() {
            [] => None,
            [single] if is_simple(single) => Some(Box::new(single.clone())),
            _ => Some(Box::new(Stmt::Expr(Expr::FuncLit {
                result: None,
                body: stmts,
                invoke: true,
            }))),
        }
    };
    let body = lower_body(ctx, env, body)?;
    let looped = if cond.is_null() {
        Stmt::For {
            init: None,
            cond: None,
            post,
            body,
        }
    } else {
        let cond = lower_cond(ctx, env, cond)?;
        loop_with(cond, post, body)
    };

    Ok(match before.as_slice() {
        [] => vec![looped],
        [single @ (Stmt::Assign { .. } | Stmt::IncDec { .. } | Stmt::Define { .. })] => {
            let Stmt::For {
                cond, post, body, ..
            } = looped
            else {
                return Ok(vec![single.clone(), looped]);
            };
            vec![Stmt::For {
                init: Some(Box::new(single.clone())),
                cond,
                post,
                body,
            }]
        }
        // declarations stay scoped to the loop
        _ => {
            before.push(looped);
            vec![Stmt::Block(before)]
        }
    })
}

/// `do body while (cond)`.
fn do_stmt(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, StmtError> {
    let ops = operands(node);
    let [body_node, cond] = ops.as_slice() else {
        return Err(arity(node.kind_name(), "2", ops.len()).into());
    };
    let mut body = lower_body(ctx, env, body_node)?;
    let cond = lower_cond(ctx, env, cond)?;

    if !continues(body_node) {
        body.extend(cond.pre);
        body.push(Stmt::If {
            cond: Expr::unary(UnOp::Not, cond.expr),
            then: cond.post.clone().into_iter().chain([Stmt::Break]).collect(),
            els: None,
        });
        body.extend(cond.post);
        return Ok(vec![Stmt::For {
            init: None,
            cond: None,
            post: None,
            body,
        }]);
    }

    // `continue` has to reach the condition: for again := true; again; again = cond
    let again = env.fresh_temp();
    let test = if cond.has_effects() {
        Expr::FuncLit {
            result: Some("bool".into()),
            body: cond.into_return(|| env.fresh_temp()),
            invoke: true,
        }
    } else {
        cond.expr
    };
    Ok(vec![Stmt::For {
        init: Some(Box::new(Stmt::Define {
            names: vec![again.clone()],
            value: Expr::ident("true"),
        })),
        cond: Some(Expr::ident(&again)),
        post: Some(Box::new(Stmt::assign(Expr::ident(&again), test))),
        body,
    }])
}

/// The statement contains a `continue` for the loop around it.
fn continues(node: &Node) -> bool {
    match node.kind {
        NodeKind::ContinueStmt => true,
        NodeKind::ForStmt | NodeKind::WhileStmt { .. } | NodeKind::DoStmt => false,
        _ => node.children().iter().any(continues),
    }
}

fn return_stmt(ctx: &mut Context, env: &mut Env, value: Option<&Node>) -> Result<Vec<Stmt>, StmtError> {
    let Some(func) = env.function().cloned() else {
        return Err(TranspileError::Unsupported("return outside of a function".into()).into());
    };
    let Some(value) = value else {
        return Ok(vec![Stmt::Return(None)]);
    };

    if func.is_main {
        // Go's main has no result, the status goes to os.Exit
        let code = lower_as(ctx, env, value, "int")?;
        let exit = env.qualified("os", "Exit");
        let mut out = code.pre;
        let status = if code.post.is_empty() {
            code.expr
        } else {
            let t = env.fresh_temp();
            out.push(Stmt::Define {
                names: vec![t.clone()],
                value: code.expr,
            });
            Expr::ident(t)
        };
        out.extend(code.post);
        out.push(Stmt::Expr(Expr::call(exit, vec![Expr::conversion("int", status)])));
        return Ok(out);
    }

    if crate::types::strip_qualifiers(&func.return_c_type) == "void" {
        let mut out = lower_expr(ctx, env, value)?.into_stmts();
        out.push(Stmt::Return(None));
        return Ok(out);
    }
    let l = lower_as(ctx, env, value, &func.return_c_type)?;
    Ok(l.into_return(|| env.fresh_temp()))
}
