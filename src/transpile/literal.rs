//! Literal values: strings, initializer lists, zero values.

use crate::{
    common::{Position, go_ident},
    error::context::Context,
    ingest::ast::{Node, NodeKind},
    transpile::{
        ast::{BinOp, Expr, Stmt, VarSpec},
        env::Env,
        error::StmtError,
        expr::{lower_as, operands},
        lowered::Lowered,
    },
    types::{TypeKind, split_array, strip_qualifiers},
};

/// Rewrite a C string body as printed by clang into Go string syntax.
pub(crate) fn go_string(c: &str) -> String {
    let mut out = String::with_capacity(c.len());
    let mut chars = c.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push_str("\\\\");
            break;
        };
        match esc {
            'n' | 't' | 'r' | 'a' | 'b' | 'f' | 'v' | '\\' | '"' => {
                out.push('\\');
                out.push(esc);
            }
            '\'' => out.push('\''),
            '?' => out.push('?'),
            'e' | 'E' => out.push_str("\\x1b"),
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push_str(&format!("\\x{:02x}", value & 0xff));
            }
            'x' => {
                let mut value = 0u32;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                    value = (value << 4 | d) & 0xffff;
                    chars.next();
                }
                out.push_str(&format!("\\x{:02x}", value & 0xff));
            }
            'u' | 'U' => {
                out.push('\\');
                out.push(esc);
            }
            other => out.push(other),
        }
    }
    out
}

/// `[]byte("...\x00")`
pub(crate) fn byte_string(body: &str) -> Expr {
    Expr::conversion("[]byte", Expr::StringLit(format!("{}\\x00", body)))
}

// ==== Zero values ============================================================

/// The value a C object of this type starts with.
pub(crate) fn zero_value(ctx: &mut Context, env: &mut Env, pos: &Position, c_type: &str) -> Expr {
    let Some(kind) = env.underlying(c_type) else {
        return Expr::Nil;
    };
    match kind {
        TypeKind::Array(_, Some(_)) => make_array(ctx, env, pos, c_type),
        k if k.is_numeric() => Expr::int(0),
        TypeKind::Primitive("bool") => Expr::ident("false"),
        TypeKind::Struct(_) | TypeKind::Union(_) | TypeKind::Shim(_, _) => Expr::Composite {
            ty: env.go_type(ctx, pos, c_type),
            elems: vec![],
        },
        _ => Expr::Nil,
    }
}

/// `make([]T, n)` for a fixed array, a filled slice of slices when it has
/// more than one dimension.
pub(crate) fn make_array(ctx: &mut Context, env: &mut Env, pos: &Position, c_type: &str) -> Expr {
    let t = strip_qualifiers(c_type);
    let resolved = strip_qualifiers(&env.st.underlying(&t));
    let Some((element, sizes)) = split_array(&resolved) else {
        return Expr::Nil;
    };
    let Some(Some(len)) = sizes.first().copied() else {
        return Expr::Nil;
    };
    let go_ty = env.go_type(ctx, pos, &resolved);
    let make = Expr::call(
        Expr::ident("make"),
        vec![Expr::Type(go_ty.clone()), Expr::int(len)],
    );
    if sizes.len() == 1 {
        return make;
    }

    let inner = format!(
        "{} {}",
        element,
        sizes[1..]
            .iter()
            .map(|s| format!("[{}]", s.map(|n| n.to_string()).unwrap_or_default()))
            .collect::<String>()
    );
    let v = env.fresh_temp();
    let i = env.fresh_temp();
    let fill = Stmt::For {
        init: Some(Box::new(Stmt::Define {
            names: vec![i.clone()],
            value: Expr::int(0),
        })),
        cond: Some(Expr::binary(BinOp::Lt, Expr::ident(&i), Expr::int(len))),
        post: Some(Box::new(Stmt::IncDec {
            expr: Expr::ident(&i),
            inc: true,
        })),
        body: vec![Stmt::assign(
            Expr::index(Expr::ident(&v), Expr::ident(&i)),
            make_array(ctx, env, pos, &inner),
        )],
    };
    Expr::FuncLit {
        result: Some(go_ty),
        body: vec![
            Stmt::Define {
                names: vec![v.clone()],
                value: make,
            },
            fill,
            Stmt::Return(Some(Expr::ident(v))),
        ],
        invoke: true,
    }
}

// ==== Initializer lists ======================================================

/// Composite literal for an initializer list of C type `c_type`.
pub(crate) fn init_list(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    c_type: &str,
) -> Result<Lowered, StmtError> {
    let pos = env.position(&node.pos);
    let values: Vec<&Node> = operands(node)
        .into_iter()
        .filter(|n| !n.array_filler && !matches!(n.kind, NodeKind::ArrayFiller))
        .collect();
    let resolved = strip_qualifiers(&env.st.underlying(c_type));
    let mut out = Lowered::new(Expr::Nil, c_type);

    if let Some((element, sizes)) = split_array(&resolved) {
        let inner = format!(
            "{} {}",
            element,
            sizes[1..]
                .iter()
                .map(|s| format!("[{}]", s.map(|n| n.to_string()).unwrap_or_default()))
                .collect::<String>()
        );
        let inner = inner.trim_end().to_string();
        let mut elems = vec![];
        for value in &values {
            let l = lower_as(ctx, env, value, &inner)?;
            elems.push((None, out.absorb(l)));
        }
        if let Some(Some(len)) = sizes.first().copied() {
            if values.len() < len {
                let zero = zero_value(ctx, env, &pos, &inner);
                elems.push((Some(Expr::int(len - 1)), zero));
            }
        }
        out.expr = Expr::Composite {
            ty: env.go_type(ctx, &pos, &resolved),
            elems,
        };
        return Ok(out);
    }

    // a union initializer sets its first member
    if env.st.is_shared_union(&resolved) {
        let t = env.fresh_temp();
        let ty = env.go_type(ctx, &pos, c_type);
        out.pre.push(Stmt::Var(VarSpec {
            name: t.clone(),
            ty: Some(ty),
            value: None,
        }));
        let first = env.st.record(&resolved).and_then(|r| r.fields.first().cloned());
        if let (Some(value), Some((_, field_type))) = (values.first(), first) {
            let l = lower_as(ctx, env, value, &field_type)?;
            let v = out.absorb(l);
            let slot = env.union_member(ctx, &pos, Expr::ident(t.clone()), &field_type);
            out.pre.push(Stmt::assign(slot, v));
        }
        out.expr = Expr::ident(t);
        return Ok(out);
    }

    if let Some(record) = env.st.record(&resolved).cloned() {
        let mut elems = vec![];
        for (value, (field, field_type)) in values.iter().zip(record.fields.iter()) {
            let l = lower_as(ctx, env, value, field_type)?;
            elems.push((Some(Expr::ident(go_ident(field))), out.absorb(l)));
        }
        out.expr = Expr::Composite {
            ty: env.go_type(ctx, &pos, c_type),
            elems,
        };
        return Ok(out);
    }

    // braces around a scalar
    match values.first() {
        Some(value) => lower_as(ctx, env, value, c_type),
        None => Ok(Lowered::new(zero_value(ctx, env, &pos, c_type), c_type)),
    }
}

// ==== Constant evaluation ====================================================

/// Value of an integer constant expression, if it is one.
pub(crate) fn const_int(node: &Node) -> Option<i64> {
    let ops = operands(node);
    match &node.kind {
        NodeKind::IntegerLiteral { value, .. } => parse_int(value),
        NodeKind::CharacterLiteral { value, .. } => Some(*value),
        NodeKind::ConstantValue { text } => text.split_whitespace().last().and_then(parse_int),
        NodeKind::ConstantExpr { .. } => {
            let value = ops
                .iter()
                .find(|n| matches!(n.kind, NodeKind::ConstantValue { .. }));
            match value {
                Some(v) => const_int(v),
                None => ops.first().and_then(|n| const_int(n)),
            }
        }
        NodeKind::ParenExpr { .. } | NodeKind::ImplicitCastExpr { .. } | NodeKind::CStyleCastExpr { .. } => {
            ops.first().and_then(|n| const_int(n))
        }
        NodeKind::UnaryOperator { op, .. } => {
            let v = const_int(ops.first()?)?;
            match op.as_str() {
                "-" => v.checked_neg(),
                "+" => Some(v),
                "~" => Some(!v),
                "!" => Some((v == 0) as i64),
                _ => None,
            }
        }
        NodeKind::BinaryOperator { op, .. } => {
            let l = const_int(ops.first()?)?;
            let r = const_int(ops.get(1)?)?;
            match op.as_str() {
                "+" => l.checked_add(r),
                "-" => l.checked_sub(r),
                "*" => l.checked_mul(r),
                "/" => l.checked_div(r),
                "%" => l.checked_rem(r),
                "<<" => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                ">>" => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
                "|" => Some(l | r),
                "&" => Some(l & r),
                "^" => Some(l ^ r),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let t = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    t.parse::<i64>()
        .ok()
        .or_else(|| t.parse::<u64>().ok().map(|v| v as i64))
}

/// Integer literal text without C suffixes.
pub(crate) fn int_literal(text: &str) -> String {
    text.trim_end_matches(['u', 'U', 'l', 'L']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_dump;

    #[test]
    fn strings_are_rewritten_for_go() {
        assert_eq!(go_string(r"hello\n"), r"hello\n");
        assert_eq!(go_string(r"it\'s"), "it's");
        assert_eq!(go_string(r"\033[0m"), r"\x1b[0m");
        assert_eq!(go_string(r"\0"), r"\x00");
        assert_eq!(go_string(r#"say \"hi\""#), r#"say \"hi\""#);
        assert_eq!(go_string(r"\x41\x4a"), r"\x41\x4a");
        assert_eq!(go_string(r"what\?"), "what?");
    }

    #[test]
    fn byte_strings_are_terminated() {
        assert_eq!(
            byte_string("ab"),
            Expr::conversion("[]byte", Expr::StringLit(r"ab\x00".into()))
        );
    }

    #[test]
    fn constant_expressions() {
        let dump = "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-BinaryOperator 0x2 <t.c:1:1, col:9> 'int' '*'
  |-ParenExpr 0x3 <col:1, col:5> 'int'
  | `-UnaryOperator 0x4 <col:2, col:3> 'int' prefix '-'
  |   `-IntegerLiteral 0x5 <col:3> 'int' 4
  `-IntegerLiteral 0x6 <col:9> 'int' 0x10
";
        let root = parse_dump(dump).unwrap();
        assert_eq!(const_int(&root.children()[0]), Some(-64));
        assert_eq!(parse_int("10UL"), Some(10));
        assert_eq!(int_literal("10UL"), "10");
    }
}
