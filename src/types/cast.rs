use crate::{
    symtable::SymTable,
    transpile::ast::{BinOp, Expr},
    types::{TypeError, TypeKind, resolve, strip_qualifiers},
};

/// Convert `expr` of C type `from` so it can be used where `to` is expected.
///
/// Pairs without a direct Go conversion go through a runtime helper named
/// `<From>To<To>`. The helper is recorded in the symbol table, it is not
/// checked to exist.
pub fn cast(st: &mut SymTable, expr: Expr, from: &str, to: &str) -> Result<Expr, TypeError> {
    let from_c = strip_qualifiers(from);
    let to_c = strip_qualifiers(to);
    if from_c == to_c || to_c == "void" || to_c == "void *" {
        return Ok(expr);
    }

    let from_t = resolve(&from_c, st.defined())?;
    let to_t = resolve(&to_c, st.defined())?;
    if from_t.to_string() == to_t.to_string() {
        return Ok(expr);
    }

    // typedefs and enums are compared through what they stand for
    let from_u = resolve(&st.underlying(&from_c), st.defined())?.kind;
    let to_u = resolve(&st.underlying(&to_c), st.defined())?.kind;
    let to_go = to_t.to_string();

    if to_u.is_bool() {
        return Ok(match from_u {
            k if k.is_numeric() => Expr::binary(BinOp::Ne, expr, Expr::int(0)),
            TypeKind::Pointer(_) | TypeKind::Shim(_, _) => Expr::binary(BinOp::Ne, expr, Expr::Nil),
            k if k.is_slice() => Expr::binary(
                BinOp::Ne,
                Expr::call(Expr::ident("len"), vec![expr]),
                Expr::int(0),
            ),
            k if k.is_bool() => Expr::conversion(&to_go, expr),
            _ => helper(st, expr, &from_t.kind, &to_t.kind),
        });
    }

    if from_u.is_numeric() && to_u.is_numeric() {
        // untyped constants convert implicitly
        if let Expr::IntLit(_) = expr {
            return Ok(expr);
        }
        return Ok(Expr::conversion(&to_go, expr));
    }

    if from_u.to_string() == to_u.to_string() {
        return Ok(Expr::conversion(&to_go, expr));
    }

    Ok(helper(st, expr, &from_t.kind, &to_t.kind))
}

fn helper(st: &mut SymTable, expr: Expr, from: &TypeKind, to: &TypeKind) -> Expr {
    let name = format!("{}To{}", from.helper_name(), to.helper_name());
    st.require_helper(&name);
    Expr::call(Expr::qualified("noarch", &name), vec![expr])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn table() -> SymTable {
        let mut st = SymTable::init(&BTreeSet::new());
        st.define("size_t");
        st.add_typedef("size_t", "unsigned long");
        st.define("node");
        st
    }

    fn x() -> Expr {
        Expr::ident("x")
    }

    #[test]
    fn same_type_is_identity() {
        let mut st = table();
        for t in ["int", "char *", "struct node *", "size_t", "double [3]", "mystery_t"] {
            assert_eq!(cast(&mut st, x(), t, t), Ok(x()));
        }
        assert_eq!(cast(&mut st, x(), "const int", "int"), Ok(x()));
    }

    #[test]
    fn numeric_conversions() {
        let mut st = table();
        assert_eq!(
            cast(&mut st, x(), "int", "double"),
            Ok(Expr::conversion("float64", x()))
        );
        assert_eq!(
            cast(&mut st, x(), "int", "size_t"),
            Ok(Expr::conversion("size_t", x()))
        );
        assert_eq!(
            cast(&mut st, x(), "size_t", "int"),
            Ok(Expr::conversion("int32", x()))
        );
        assert_eq!(cast(&mut st, Expr::int(3), "int", "char"), Ok(Expr::int(3)));
    }

    #[test]
    fn truth_values() {
        let mut st = table();
        assert_eq!(
            cast(&mut st, x(), "int", "bool"),
            Ok(Expr::binary(BinOp::Ne, x(), Expr::int(0)))
        );
        assert_eq!(
            cast(&mut st, x(), "struct node *", "_Bool"),
            Ok(Expr::binary(BinOp::Ne, x(), Expr::Nil))
        );
        assert_eq!(
            cast(&mut st, x(), "char *", "bool"),
            Ok(Expr::binary(
                BinOp::Ne,
                Expr::call(Expr::ident("len"), vec![x()]),
                Expr::int(0)
            ))
        );
    }

    #[test]
    fn other_pairs_use_helpers() {
        let mut st = table();
        assert_eq!(
            cast(&mut st, x(), "int *", "char *"),
            Ok(Expr::call(
                Expr::qualified("noarch", "Int32SliceToByteSlice"),
                vec![x()]
            ))
        );
        assert!(st.helpers().contains("Int32SliceToByteSlice"));
        assert_eq!(
            cast(&mut st, x(), "_Bool", "int"),
            Ok(Expr::call(Expr::qualified("noarch", "BoolToInt32"), vec![x()]))
        );
    }

    #[test]
    fn void_targets_pass_through() {
        let mut st = table();
        assert_eq!(cast(&mut st, x(), "int *", "void *"), Ok(x()));
        assert_eq!(cast(&mut st, x(), "int", "void"), Ok(x()));
    }

    #[test]
    fn unresolvable_types_fail() {
        let mut st = table();
        assert!(cast(&mut st, x(), "mystery_t", "int").is_err());
    }

    #[test]
    fn opaque_pairs_use_helpers() {
        let mut st = table();
        assert_eq!(
            cast(&mut st, x(), "int (*)(int)", "int"),
            Ok(Expr::call(Expr::qualified("noarch", "InterfaceToInt32"), vec![x()]))
        );
        assert_eq!(
            cast(&mut st, x(), "int", "struct (anonymous at t.c:1:9)"),
            Ok(Expr::call(Expr::qualified("noarch", "Int32ToInterface"), vec![x()]))
        );
        assert!(st.helpers().contains("InterfaceToInt32"));
        // both sides are `interface{}`
        assert_eq!(cast(&mut st, x(), "int (*)(int)", "void (*)(void)"), Ok(x()));
    }
}
