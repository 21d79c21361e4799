use crate::transpile::ast::{Expr, Stmt};

/// A lowered C expression.
///
/// `pre` runs right before `expr` is evaluated in its place, `post` right
/// after. Go has no comma operator or assignment expressions, so these carry
/// the side effects C keeps inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Lowered {
    pub expr: Expr,
    /// C type of the value, as clang printed it.
    pub c_type: String,
    pub pre: Vec<Stmt>,
    pub post: Vec<Stmt>,
}

impl Lowered {
    pub fn new(expr: Expr, c_type: impl Into<String>) -> Self {
        Self {
            expr,
            c_type: c_type.into(),
            pre: vec![],
            post: vec![],
        }
    }

    pub fn with_pre(mut self, stmts: Vec<Stmt>) -> Self {
        self.pre.extend(stmts.into_iter().filter(|s| !s.is_empty()));
        self
    }

    pub fn with_post(mut self, stmts: Vec<Stmt>) -> Self {
        self.post.extend(stmts.into_iter().filter(|s| !s.is_empty()));
        self
    }

    /// Move the side effects of a sub-expression into this one and return
    /// its value. Sub-expressions have to be absorbed in evaluation order.
    pub fn absorb(&mut self, part: Lowered) -> Expr {
        self.pre.extend(part.pre.into_iter().filter(|s| !s.is_empty()));
        self.post.extend(part.post.into_iter().filter(|s| !s.is_empty()));
        part.expr
    }

    pub fn has_effects(&self) -> bool {
        !self.pre.is_empty() || !self.post.is_empty()
    }

    /// The statements of this expression used as a statement.
    pub fn into_stmts(self) -> Vec<Stmt> {
        let mut out = self.pre;
        match self.expr {
            e if e.is_pure() => (),
            e @ (Expr::Call { .. } | Expr::FuncLit { .. }) => out.push(Stmt::Expr(e)),
            // Go only allows calls as expression statements
            e => out.push(Stmt::assign(Expr::ident("_"), e)),
        }
        out.extend(self.post);
        out
    }

    /// Body of a closure returning this value. The value is saved in a
    /// temporary when `post` has to run after it.
    pub fn into_return(self, temp: impl FnOnce() -> String) -> Vec<Stmt> {
        let mut body = self.pre;
        if self.post.is_empty() {
            body.push(Stmt::Return(Some(self.expr)));
        } else {
            let t = temp();
            body.push(Stmt::Define {
                names: vec![t.clone()],
                value: self.expr,
            });
            body.extend(self.post);
            body.push(Stmt::Return(Some(Expr::ident(t))));
        }
        body
    }
}

/// Combine sub-results in evaluation order: every `pre`, then every `post`.
pub fn combine(parts: Vec<Lowered>) -> (Vec<Expr>, Vec<String>, Vec<Stmt>, Vec<Stmt>) {
    let mut exprs = Vec::with_capacity(parts.len());
    let mut types = Vec::with_capacity(parts.len());
    let mut pre = vec![];
    let mut post = vec![];
    for part in parts {
        exprs.push(part.expr);
        types.push(part.c_type);
        pre.extend(part.pre.into_iter().filter(|s| !s.is_empty()));
        post.extend(part.post.into_iter().filter(|s| !s.is_empty()));
    }
    (exprs, types, pre, post)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(name: &str) -> Stmt {
        Stmt::IncDec {
            expr: Expr::ident(name),
            inc: true,
        }
    }

    #[test]
    fn combine_keeps_order_and_drops_empty() {
        let a = Lowered::new(Expr::ident("a"), "int").with_pre(vec![inc("x"), Stmt::Empty]);
        let b = Lowered::new(Expr::ident("b"), "int")
            .with_pre(vec![inc("y")])
            .with_post(vec![inc("z")]);
        let c = Lowered::new(Expr::ident("c"), "int").with_post(vec![Stmt::Empty, inc("w")]);
        let (exprs, types, pre, post) = combine(vec![a, b, c]);
        assert_eq!(exprs, vec![Expr::ident("a"), Expr::ident("b"), Expr::ident("c")]);
        assert_eq!(types, vec!["int", "int", "int"]);
        assert_eq!(pre, vec![inc("x"), inc("y")]);
        assert_eq!(post, vec![inc("z"), inc("w")]);
    }

    #[test]
    fn pure_values_are_not_statements() {
        let l = Lowered::new(Expr::ident("a"), "int").with_post(vec![inc("a")]);
        assert_eq!(l.into_stmts(), vec![inc("a")]);
        let call = Lowered::new(Expr::call(Expr::ident("f"), vec![]), "int");
        assert_eq!(
            call.into_stmts(),
            vec![Stmt::Expr(Expr::call(Expr::ident("f"), vec![]))]
        );
        let sum = Expr::binary(
            crate::transpile::ast::BinOp::Add,
            Expr::call(Expr::ident("f"), vec![]),
            Expr::int(1),
        );
        assert_eq!(
            Lowered::new(sum.clone(), "int").into_stmts(),
            vec![Stmt::assign(Expr::ident("_"), sum)]
        );
    }

    #[test]
    fn returned_value_outlives_post() {
        let l = Lowered::new(Expr::ident("i"), "int").with_post(vec![inc("i")]);
        assert_eq!(
            l.into_return(|| "t".into()),
            vec![
                Stmt::Define {
                    names: vec!["t".into()],
                    value: Expr::ident("i")
                },
                inc("i"),
                Stmt::Return(Some(Expr::ident("t"))),
            ]
        );
    }
}
