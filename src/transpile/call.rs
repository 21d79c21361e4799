//! Function calls, substitutions and allocations.

use crate::{
    common::go_ident,
    error::context::Context,
    ingest::ast::{Node, NodeKind},
    symtable::{FunctionSignature, Target},
    transpile::{
        ast::{BinOp, Expr, Stmt, UnOp},
        env::Env,
        error::{StmtError, TranspileError, unknown_function},
        expr::{LowerResult, c_type_of, lower_as, lower_expr, operands},
        lowered::{Lowered, combine},
    },
    types::{self, size_of, strip_qualifiers},
};

/// What a call expression calls.
#[derive(Debug, Clone)]
pub(crate) enum Callee<'a> {
    /// A function referenced by name.
    Named(String),
    /// A function pointer held in a record field.
    Member(&'a Node, String),
}

impl Callee<'_> {
    pub(crate) fn name(&self) -> &str {
        match self {
            Callee::Named(name) | Callee::Member(_, name) => name,
        }
    }
}

/// Look through casts, parentheses and dereferences for the called function.
pub(crate) fn callee(node: &Node) -> Result<Callee<'_>, TranspileError> {
    let unwrappable = || TranspileError::UnwrappableCallee {
        kind: node.kind_name().to_string(),
    };
    match &node.kind {
        NodeKind::ImplicitCastExpr { .. } | NodeKind::CStyleCastExpr { .. } | NodeKind::ParenExpr { .. } => {
            callee(operands(node).first().copied().ok_or_else(unwrappable)?)
        }
        NodeKind::UnaryOperator { op, .. } if op == "*" => {
            callee(operands(node).first().copied().ok_or_else(unwrappable)?)
        }
        NodeKind::MemberExpr { name, .. } => Ok(Callee::Member(node, name.clone())),
        NodeKind::DeclRefExpr { name, .. } => Ok(Callee::Named(name.clone())),
        _ => Err(unwrappable()),
    }
}

pub(crate) fn call(ctx: &mut Context, env: &mut Env, node: &Node) -> LowerResult {
    let pos = env.position(&node.pos);
    let ops = operands(node);
    let Some((function, args)) = ops.split_first() else {
        return Err(TranspileError::UnwrappableCallee {
            kind: node.kind_name().to_string(),
        }
        .into());
    };
    let callee = callee(function)?;
    let name = callee.name().to_string();

    let sig = match env.st.function(&name) {
        Some(sig) => sig.clone(),
        None => {
            if env.guess(&name) {
                ctx.report(unknown_function(&pos, &name));
            }
            log::debug!("guessing the signature of `{}`", name);
            let params = args.iter().map(|a| c_type_of(env, a)).collect();
            FunctionSignature::declared(&name, &c_type_of(env, node), params, false)
        }
    };
    let result_type = strip_qualifiers(&sig.return_c_type);

    let func = match (&sig.substitution, &callee) {
        (Some(Target::Discard), _) => {
            let mut out = Lowered::new(Expr::Nil, "void");
            for arg in args {
                let l = lower_expr(ctx, env, arg)?;
                let value = out.absorb(l);
                out.pre.push(Stmt::assign(Expr::ident("_"), value));
            }
            return Ok(out);
        }
        (Some(Target::Function { package: Some(pkg), name }), _) => env.qualified(pkg, name),
        (Some(Target::Function { package: None, name }), _) => Expr::ident(name),
        (None, Callee::Member(member, _)) => {
            let l = lower_expr(ctx, env, member)?;
            if l.has_effects() {
                return Err(TranspileError::Unsupported("calling through a member with side effects".into()).into());
            }
            l.expr
        }
        (None, Callee::Named(name)) => Expr::ident(go_ident(name)),
    };

    let lowered = match &sig.parameter_positions {
        Some(positions) => arranged_args(ctx, env, &sig, args, positions)?,
        None => {
            let mut parts = Vec::with_capacity(args.len());
            for (i, arg) in args.iter().enumerate() {
                parts.push(match sig.parameter_c_types.get(i) {
                    Some(param) => lower_as(ctx, env, arg, param)?,
                    None => lower_expr(ctx, env, arg)?,
                });
            }
            parts
        }
    };
    let (values, _, pre, post) = combine(lowered);
    let call = Expr::call(func, values);

    let mut out = Lowered::new(call, result_type.clone())
        .with_pre(pre)
        .with_post(post);
    if let Some(returns) = sig.return_positions.as_ref().filter(|r| r.as_slice() != [0]) {
        let temps: Vec<String> = returns.iter().map(|_| env.fresh_temp()).collect();
        let mut stores = vec![];
        for (position, temp) in returns.iter().zip(&temps) {
            if *position == 0 {
                continue;
            }
            let index = position.unsigned_abs() as usize;
            let Some(arg) = index.checked_sub(1).and_then(|i| args.get(i)) else {
                return Err(TranspileError::Unsupported(format!(
                    "result position {} of `{}`",
                    position, name
                ))
                .into());
            };
            let target = result_target(ctx, env, arg)?;
            // an argument which is also passed to the call has its effects there
            let passed = match &sig.parameter_positions {
                Some(positions) => positions.iter().any(|p| p.unsigned_abs() as usize == index),
                None => true,
            };
            let lvalue = if passed {
                target.expr
            } else {
                out.absorb(target)
            };
            stores.push(Stmt::assign(lvalue, Expr::ident(temp)));
        }
        let call = std::mem::replace(&mut out.expr, Expr::Nil);
        out.pre.push(Stmt::Define {
            names: temps.clone(),
            value: call,
        });
        out.pre.extend(stores);
        if let Some(i) = returns.iter().position(|p| *p == 0) {
            out.expr = Expr::ident(&temps[i]);
        }
    }
    Ok(out)
}

/// Arguments in the order a substitution wants them. `-N` passes the
/// address of argument `N`.
fn arranged_args(
    ctx: &mut Context,
    env: &mut Env,
    sig: &FunctionSignature,
    args: &[&Node],
    positions: &[i32],
) -> Result<Vec<Lowered>, StmtError> {
    let mut parts = Vec::with_capacity(positions.len());
    for position in positions {
        let index = position.unsigned_abs() as usize;
        let Some(arg) = index.checked_sub(1).and_then(|i| args.get(i)) else {
            return Err(TranspileError::Unsupported(format!(
                "argument position {} of `{}`",
                position, sig.name
            ))
            .into());
        };
        let mut l = match sig.parameter_c_types.get(index - 1) {
            Some(param) => lower_as(ctx, env, arg, param)?,
            None => lower_expr(ctx, env, arg)?,
        };
        if *position < 0 && !env.is_slice(&l.c_type) {
            l.expr = Expr::unary(UnOp::Addr, l.expr);
        }
        parts.push(l);
    }
    if sig.variadic {
        let used = positions.iter().map(|p| p.unsigned_abs() as usize).max().unwrap_or(0);
        for arg in args.iter().skip(used) {
            parts.push(lower_expr(ctx, env, arg)?);
        }
    }
    Ok(parts)
}

/// Where an extra call result is stored: `x` for `&x`, `p[0]` for a slice `p`.
fn result_target(ctx: &mut Context, env: &mut Env, arg: &Node) -> LowerResult {
    let mut node = arg;
    loop {
        match &node.kind {
            NodeKind::ImplicitCastExpr { .. } | NodeKind::ParenExpr { .. } => {
                match operands(node).first().copied() {
                    Some(inner) => node = inner,
                    None => break,
                }
            }
            _ => break,
        }
    }
    if let NodeKind::UnaryOperator { op, .. } = &node.kind {
        if op == "&" {
            if let Some(inner) = operands(node).first().copied() {
                return lower_expr(ctx, env, inner);
            }
        }
    }
    let mut l = lower_expr(ctx, env, node)?;
    let through = std::mem::replace(&mut l.expr, Expr::Nil);
    l.expr = if env.is_slice(&l.c_type) {
        Expr::index(through, Expr::int(0))
    } else {
        Expr::unary(UnOp::Deref, through)
    };
    Ok(l)
}

// ==== Allocation =============================================================

/// `malloc`/`calloc` converted to a pointer type become `make([]T, n)`.
pub(crate) fn allocation(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    target: &str,
) -> Result<Option<Lowered>, StmtError> {
    let mut call = node;
    loop {
        match &call.kind {
            NodeKind::ImplicitCastExpr { .. } | NodeKind::CStyleCastExpr { .. } | NodeKind::ParenExpr { .. } => {
                match operands(call).first().copied() {
                    Some(inner) => call = inner,
                    None => return Ok(None),
                }
            }
            _ => break,
        }
    }
    if !matches!(call.kind, NodeKind::CallExpr { .. }) || !env.is_slice(target) {
        return Ok(None);
    }
    let ops = operands(call);
    let Some((function, args)) = ops.split_first() else {
        return Ok(None);
    };
    let Ok(Callee::Named(name)) = callee(function) else {
        return Ok(None);
    };
    let count_arg = match (name.as_str(), args) {
        ("malloc", [size]) => Some(*size),
        ("calloc", [_, _]) => None,
        _ => return Ok(None),
    };

    let pos = env.position(&call.pos);
    let t = strip_qualifiers(&env.st.underlying(target));
    let element = t.strip_suffix('*').unwrap_or(&t).trim_end().to_string();
    let element_size = match element.as_str() {
        "void" => 1,
        e => size_of(&env.st, e)?,
    };
    let go_ty = env.go_type(ctx, &pos, target);

    let mut out = Lowered::new(Expr::Nil, target);
    let count = match count_arg {
        None => {
            let l = lower_expr(ctx, env, args[0])?;
            out.absorb(l)
        }
        Some(size) => match sizeof_factor(size, element_size, env) {
            Some(other) => {
                let l = lower_expr(ctx, env, other)?;
                out.absorb(l)
            }
            None => {
                let l = lower_expr(ctx, env, size)?;
                match out.absorb(l) {
                    Expr::IntLit(text) => match text.parse::<usize>() {
                        Ok(n) if element_size > 0 && n % element_size == 0 => Expr::int(n / element_size),
                        _ => Expr::binary(BinOp::Div, Expr::IntLit(text), Expr::int(element_size)),
                    },
                    e if element_size == 1 => e,
                    e => Expr::binary(BinOp::Div, e, Expr::int(element_size)),
                }
            }
        },
    };
    out.expr = Expr::call(Expr::ident("make"), vec![Expr::Type(go_ty), count]);
    Ok(Some(out))
}

/// For `n * sizeof(T)` with the size of `T` equal to `element_size`, the node of `n`.
fn sizeof_factor<'a>(size: &'a Node, element_size: usize, env: &Env) -> Option<&'a Node> {
    let mut node = size;
    while let NodeKind::ImplicitCastExpr { .. } | NodeKind::ParenExpr { .. } = node.kind {
        node = operands(node).first().copied()?;
    }
    let NodeKind::BinaryOperator { op, .. } = &node.kind else {
        return None;
    };
    if op != "*" {
        return None;
    }
    let ops = operands(node);
    let [a, b] = ops.as_slice() else {
        return None;
    };
    let measures = |n: &Node| match &n.kind {
        NodeKind::UnaryExprOrTypeTraitExpr { trait_name, arg_ty, .. } if trait_name == "sizeof" => {
            let t = match arg_ty {
                Some(qt) => qt.canonical().to_string(),
                None => operands(n).first()?.expr_type()?.canonical().to_string(),
            };
            types::size_of(&env.st, &t).ok().filter(|s| *s == element_size)
        }
        _ => None,
    };
    if measures(b).is_some() {
        Some(a)
    } else if measures(a).is_some() {
        Some(b)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::context::testing::context,
        transpile::expr::testing::{env, tree},
    };

    #[test]
    fn callee_unwraps_wrappers() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
|-ParenExpr 0x2 <t.c:1:1, col:5> 'int (*)(int)'
| `-UnaryOperator 0x3 <col:2, col:3> 'int (int)' prefix '*'
|   `-ImplicitCastExpr 0x4 <col:3> 'int (*)(int)' <FunctionToPointerDecay>
|     `-DeclRefExpr 0x5 <col:3> 'int (int)' Function 0x6 'f' 'int (int)'
`-IntegerLiteral 0x7 <col:1> 'int' 1
",
        );
        assert!(matches!(callee(&root.children()[0]), Ok(Callee::Named(name)) if name == "f"));
        assert!(matches!(
            callee(&root.children()[1]),
            Err(TranspileError::UnwrappableCallee { kind }) if kind == "IntegerLiteral"
        ));
    }

    const PRINTF: &str = "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-CallExpr 0x2 </usr/include/stdio.h:1:1, col:20> 'int'
  |-ImplicitCastExpr 0x3 <col:1> 'int (*)(const char *, ...)' <FunctionToPointerDecay>
  | `-DeclRefExpr 0x4 <col:1> 'int (const char *, ...)' Function 0x5 'printf' 'int (const char *, ...)'
  |-ImplicitCastExpr 0x6 <col:8> 'const char *' <NoOp>
  | `-ImplicitCastExpr 0x7 <col:8> 'char *' <ArrayToPointerDecay>
  |   `-StringLiteral 0x8 <col:8> 'char [4]' lvalue \"%d\\n\"
  `-ImplicitCastExpr 0x9 <col:16> 'int' <LValueToRValue>
    `-DeclRefExpr 0xa <col:16> 'int' lvalue Var 0xb 'x' 'int'
";

    #[test]
    fn substituted_call() {
        let root = tree(PRINTF);
        let mut ctx = context();
        let mut env = env(&["stdio.h"]);
        let l = lower_expr(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert_eq!(
            l.expr,
            Expr::call(
                Expr::qualified("noarch", "Printf"),
                vec![
                    Expr::conversion("[]byte", Expr::StringLit("%d\\n\\x00".into())),
                    Expr::ident("x"),
                ]
            )
        );
        assert!(env.imports().contains(&"github.com/elliotchance/c2go/noarch".to_string()));
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn undeclared_function_is_guessed_once() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
|-CallExpr 0x2 <t.c:1:1, col:6> 'int'
| |-ImplicitCastExpr 0x3 <col:1> 'int (*)()' <FunctionToPointerDecay>
| | `-DeclRefExpr 0x4 <col:1> 'int ()' Function 0x5 'g' 'int ()'
| `-IntegerLiteral 0x6 <col:3> 'int' 1
`-CallExpr 0x7 <t.c:2:1, col:6> 'int'
  |-ImplicitCastExpr 0x8 <col:1> 'int (*)()' <FunctionToPointerDecay>
  | `-DeclRefExpr 0x9 <col:1> 'int ()' Function 0x5 'g' 'int ()'
  `-IntegerLiteral 0xa <col:3> 'int' 2
",
        );
        let mut ctx = context();
        let mut env = env(&[]);
        for node in root.children() {
            let l = lower_expr(&mut ctx, &mut env, node).unwrap();
            assert!(matches!(l.expr, Expr::Call { .. }));
        }
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn free_is_discarded() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-CallExpr 0x2 </usr/include/stdlib.h:1:1, col:7> 'void'
  |-ImplicitCastExpr 0x3 <col:1> 'void (*)(void *)' <FunctionToPointerDecay>
  | `-DeclRefExpr 0x4 <col:1> 'void (void *)' Function 0x5 'free' 'void (void *)'
  `-ImplicitCastExpr 0x6 <col:6> 'void *' <BitCast>
    `-ImplicitCastExpr 0x7 <col:6> 'int *' <LValueToRValue>
      `-DeclRefExpr 0x8 <col:6> 'int *' lvalue Var 0x9 'p' 'int *'
",
        );
        let mut ctx = context();
        let mut env = env(&["stdlib.h"]);
        let l = lower_expr(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert_eq!(
            l.into_stmts(),
            vec![Stmt::assign(Expr::ident("_"), Expr::ident("p"))]
        );
    }

    #[test]
    fn malloc_becomes_make() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-ImplicitCastExpr 0x2 </usr/include/stdlib.h:1:1, col:30> 'int *' <BitCast>
  `-CallExpr 0x3 <col:1, col:30> 'void *'
    |-ImplicitCastExpr 0x4 <col:1> 'void *(*)(unsigned long)' <FunctionToPointerDecay>
    | `-DeclRefExpr 0x5 <col:1> 'void *(unsigned long)' Function 0x6 'malloc' 'void *(unsigned long)'
    `-BinaryOperator 0x7 <col:8, col:29> 'unsigned long' '*'
      |-ImplicitCastExpr 0x8 <col:8> 'unsigned long' <IntegralCast>
      | `-ImplicitCastExpr 0x9 <col:8> 'int' <LValueToRValue>
      |   `-DeclRefExpr 0xa <col:8> 'int' lvalue Var 0xb 'n' 'int'
      `-UnaryExprOrTypeTraitExpr 0xc <col:12, col:22> 'unsigned long' sizeof 'int'
",
        );
        let mut ctx = context();
        let mut env = env(&["stdlib.h"]);
        let l = lower_expr(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert_eq!(
            l.expr,
            Expr::call(
                Expr::ident("make"),
                vec![
                    Expr::Type("[]int32".into()),
                    Expr::conversion("uint64", Expr::ident("n"))
                ]
            )
        );
    }

    #[test]
    fn extra_results_keep_argument_effects() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-CallExpr 0x2 </usr/include/math.h:1:1, col:20> 'double'
  |-ImplicitCastExpr 0x3 <col:1> 'double (*)(double, double *)' <FunctionToPointerDecay>
  | `-DeclRefExpr 0x4 <col:1> 'double (double, double *)' Function 0x5 'modf' 'double (double, double *)'
  |-ImplicitCastExpr 0x6 <col:6> 'double' <LValueToRValue>
  | `-DeclRefExpr 0x7 <col:6> 'double' lvalue Var 0x8 'x' 'double'
  `-UnaryOperator 0x9 <col:9, col:18> 'double *' prefix '&'
    `-ArraySubscriptExpr 0xa <col:10, col:18> 'double' lvalue
      |-ImplicitCastExpr 0xb <col:10> 'double *' <ArrayToPointerDecay>
      | `-DeclRefExpr 0xc <col:10> 'double [4]' lvalue Var 0xd 'parts' 'double [4]'
      `-UnaryOperator 0xe <col:16, col:17> 'int' postfix '++'
        `-DeclRefExpr 0xf <col:16> 'int' lvalue Var 0x10 'i' 'int'
",
        );
        let mut ctx = context();
        let mut env = env(&["math.h"]);
        let l = lower_expr(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert_eq!(l.expr, Expr::ident("ctogoTemp1"));
        assert_eq!(
            l.pre,
            vec![
                Stmt::Define {
                    names: vec!["ctogoTemp1".into(), "ctogoTemp2".into()],
                    value: Expr::call(Expr::qualified("math", "Modf"), vec![Expr::ident("x")]),
                },
                Stmt::assign(
                    Expr::index(Expr::ident("parts"), Expr::ident("i")),
                    Expr::ident("ctogoTemp2")
                ),
            ]
        );
        // `i++` runs once, after the store
        assert_eq!(
            l.post,
            vec![Stmt::IncDec {
                expr: Expr::ident("i"),
                inc: true
            }]
        );
    }

    #[test]
    fn rearranged_variadic_call_keeps_its_tail() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-CallExpr 0x2 <t.c:1:1, col:20> 'int'
  |-ImplicitCastExpr 0x3 <col:1> 'int (*)(const char *, ...)' <FunctionToPointerDecay>
  | `-DeclRefExpr 0x4 <col:1> 'int (const char *, ...)' Function 0x5 'report' 'int (const char *, ...)'
  |-ImplicitCastExpr 0x6 <col:8> 'const char *' <NoOp>
  | `-ImplicitCastExpr 0x7 <col:8> 'char *' <LValueToRValue>
  |   `-DeclRefExpr 0x8 <col:8> 'char *' lvalue Var 0x9 'msg' 'char *'
  `-ImplicitCastExpr 0xa <col:13> 'int' <LValueToRValue>
    `-DeclRefExpr 0xb <col:13> 'int' lvalue Var 0xc 'n' 'int'
",
        );
        let mut ctx = context();
        let mut env = env(&[]);
        env.st.add_function(
            FunctionSignature::parse("int report(const char *, ...) -> $0 = noarch.Report($1)").unwrap(),
        );
        let l = lower_expr(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert_eq!(
            l.expr,
            Expr::call(
                Expr::qualified("noarch", "Report"),
                vec![Expr::ident("msg"), Expr::ident("n")]
            )
        );
    }
}
