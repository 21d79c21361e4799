use std::{
    fmt::{self, Write as _},
    io::{self, Write},
};

use crate::transpile::ast::{CaseClause, Decl, Expr, File, Func, Stmt, TypeSpec, VarSpec};

/// Print a Go file. Indentation uses tabs like gofmt.
pub fn emit_code<W: Write>(file: &File, w: &mut W) -> io::Result<()> {
    let mut p = Printer::default();
    p.file(file).map_err(io::Error::other)?;
    w.write_all(p.out.as_bytes())
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn nested(&self) -> Printer {
        Printer {
            out: String::new(),
            indent: self.indent + 1,
        }
    }

    fn line(&mut self, text: &str) -> fmt::Result {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        writeln!(self.out, "{}", text)
    }

    fn tabs(&self) -> String {
        "\t".repeat(self.indent)
    }

    // ==== Declarations =======================================================

    fn file(&mut self, file: &File) -> fmt::Result {
        writeln!(self.out, "package {}", file.package)?;
        match file.imports.as_slice() {
            [] => (),
            [single] => write!(self.out, "\nimport \"{}\"\n", single)?,
            many => {
                writeln!(self.out, "\nimport (")?;
                for path in many {
                    writeln!(self.out, "\t\"{}\"", path)?;
                }
                writeln!(self.out, ")")?;
            }
        }
        for decl in &file.decls {
            writeln!(self.out)?;
            self.decl(decl)?;
        }
        Ok(())
    }

    fn decl(&mut self, decl: &Decl) -> fmt::Result {
        match decl {
            Decl::Func(f) => self.func(f),
            Decl::Type {
                name,
                spec: TypeSpec::Named(ty),
            } => self.line(&format!("type {} {}", name, ty)),
            Decl::Type {
                name,
                spec: TypeSpec::Struct(fields),
            } => {
                self.line(&format!("type {} struct {{", name))?;
                self.indent += 1;
                for field in fields {
                    self.line(&format!("{} {}", field.name, field.ty))?;
                }
                self.indent -= 1;
                self.line("}")
            }
            Decl::Var(v) => {
                let text = self.var(v);
                self.line(&text)
            }
            Decl::Const(consts) => {
                self.line("const (")?;
                self.indent += 1;
                for c in consts {
                    let value = self.expr(&c.value);
                    self.line(&format!("{} = {}", c.name, value))?;
                }
                self.indent -= 1;
                self.line(")")
            }
            Decl::Placeholder(text) => self.line(&format!("// {}", text)),
        }
    }

    fn func(&mut self, f: &Func) -> fmt::Result {
        let mut params: Vec<String> = f
            .params
            .iter()
            .map(|p| format!("{} {}", p.name, p.ty))
            .collect();
        if let Some(rest) = &f.variadic {
            params.push(format!("{} ...interface{{}}", rest));
        }
        let result = match &f.result {
            Some(ty) => format!(" {}", ty),
            None => String::new(),
        };
        self.line(&format!("func {}({}){} {{", f.name, params.join(", "), result))?;
        self.block(&f.body)?;
        self.line("}")
    }

    fn var(&mut self, v: &VarSpec) -> String {
        let mut text = format!("var {}", v.name);
        if let Some(ty) = &v.ty {
            write!(text, " {}", ty).ok();
        }
        if let Some(value) = &v.value {
            write!(text, " = {}", self.expr(value)).ok();
        }
        text
    }

    // ==== Statements =========================================================

    fn block(&mut self, stmts: &[Stmt]) -> fmt::Result {
        self.indent += 1;
        for s in stmts {
            self.stmt(s)?;
        }
        self.indent -= 1;
        Ok(())
    }

    /// Statements allowed in the header of `if`, `for` and `switch`.
    fn simple(&mut self, s: &Stmt) -> String {
        match s {
            Stmt::Expr(e) => self.expr(e),
            Stmt::Assign { lhs, op, rhs } => {
                let op = op.map(|o| o.symbol()).unwrap_or("");
                format!("{} {}= {}", self.list(lhs), op, self.list(rhs))
            }
            Stmt::Define { names, value } => format!("{} := {}", names.join(", "), self.expr(value)),
            Stmt::IncDec { expr, inc } => {
                format!("{}{}", self.expr(expr), if *inc { "++" } else { "--" })
            }
            _ => String::new(),
        }
    }

    fn stmt(&mut self, s: &Stmt) -> fmt::Result {
        match s {
            Stmt::Expr(_) | Stmt::Assign { .. } | Stmt::Define { .. } | Stmt::IncDec { .. } => {
                let text = self.simple(s);
                self.line(&text)
            }
            Stmt::Var(v) => {
                let text = self.var(v);
                self.line(&text)
            }
            Stmt::Return(None) => self.line("return"),
            Stmt::Return(Some(e)) => {
                let text = format!("return {}", self.expr(e));
                self.line(&text)
            }
            Stmt::If { .. } => {
                let head = self.if_chain(s)?;
                self.line(&head)
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                let cond = cond.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                let head = if init.is_none() && post.is_none() {
                    match cond.as_str() {
                        "" => "for {".to_string(),
                        c => format!("for {} {{", c),
                    }
                } else {
                    let init = init.as_deref().map(|s| self.simple(s)).unwrap_or_default();
                    let post = post.as_deref().map(|s| self.simple(s)).unwrap_or_default();
                    format!("for {}; {}; {} {{", init, cond, post)
                };
                self.line(&head)?;
                self.block(body)?;
                self.line("}")
            }
            Stmt::Switch { tag, clauses } => {
                let head = format!("switch {} {{", self.expr(tag));
                self.line(&head)?;
                for clause in clauses {
                    self.clause(clause)?;
                }
                self.line("}")
            }
            Stmt::Block(stmts) => {
                self.line("{")?;
                self.block(stmts)?;
                self.line("}")
            }
            Stmt::Label(name) => {
                // gofmt outdents labels by one level
                let indent = self.indent;
                self.indent = indent.saturating_sub(1);
                let r = self.line(&format!("{}:", name));
                self.indent = indent;
                r
            }
            Stmt::Goto(name) => self.line(&format!("goto {}", name)),
            Stmt::Break => self.line("break"),
            Stmt::Continue => self.line("continue"),
            Stmt::Fallthrough => self.line("fallthrough"),
            Stmt::Empty => Ok(()),
            Stmt::Placeholder(text) => self.line(&format!("// {}", text)),
        }
    }

    /// Print an if statement up to its last closing brace, which is returned.
    fn if_chain(&mut self, s: &Stmt) -> Result<String, fmt::Error> {
        let mut head = "if".to_string();
        let mut current = s;
        loop {
            let Stmt::If { cond, then, els } = current else {
                return Ok("}".into());
            };
            let text = format!("{} {} {{", head, self.expr(cond));
            self.line(&text)?;
            self.block(then)?;
            match els.as_deref() {
                None => return Ok("}".into()),
                Some([nested @ Stmt::If { .. }]) => {
                    head = "} else if".into();
                    current = nested;
                }
                Some(stmts) => {
                    self.line("} else {")?;
                    self.block(stmts)?;
                    return Ok("}".into());
                }
            }
        }
    }

    fn clause(&mut self, clause: &CaseClause) -> fmt::Result {
        let head = match clause.values.as_slice() {
            [] => "default:".to_string(),
            values => format!("case {}:", self.list(values)),
        };
        self.line(&head)?;
        self.block(&clause.body)
    }

    // ==== Expressions ========================================================

    fn list(&mut self, exprs: &[Expr]) -> String {
        exprs.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", ")
    }

    /// Operand of a selector, index, call or conversion.
    fn primary(&mut self, e: &Expr) -> String {
        match e {
            Expr::Binary { .. } | Expr::Unary { .. } => format!("({})", self.expr(e)),
            Expr::FuncLit { invoke: false, .. } => format!("({})", self.expr(e)),
            _ => self.expr(e),
        }
    }

    fn expr(&mut self, e: &Expr) -> String {
        match e {
            Expr::Ident(name) | Expr::IntLit(name) | Expr::FloatLit(name) | Expr::Type(name) => {
                name.clone()
            }
            Expr::StringLit(s) => format!("\"{}\"", s),
            Expr::Nil => "nil".into(),
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let l = match lhs.as_ref() {
                    Expr::Binary { op: inner, .. } if inner.precedence() < prec => {
                        format!("({})", self.expr(lhs))
                    }
                    _ => self.expr(lhs),
                };
                let r = match rhs.as_ref() {
                    Expr::Binary { op: inner, .. } if inner.precedence() <= prec => {
                        format!("({})", self.expr(rhs))
                    }
                    _ => self.expr(rhs),
                };
                format!("{} {} {}", l, op.symbol(), r)
            }
            Expr::Unary { op, expr } => {
                let operand = match expr.as_ref() {
                    Expr::Binary { .. } => format!("({})", self.expr(expr)),
                    // `- -x` would print as the `--` operator
                    Expr::Unary { op: inner, .. } if inner.symbol() == op.symbol() => {
                        format!("({})", self.expr(expr))
                    }
                    _ => self.expr(expr),
                };
                format!("{}{}", op.symbol(), operand)
            }
            Expr::Paren(inner) => format!("({})", self.expr(inner)),
            Expr::Call { func, args, spread } => {
                let f = self.primary(func);
                let dots = if *spread { "..." } else { "" };
                format!("{}({}){}", f, self.list(args), dots)
            }
            Expr::Conversion { ty, expr } => {
                let inner = self.expr(expr);
                if ty.starts_with('*') || ty.starts_with("func") {
                    format!("({})({})", ty, inner)
                } else {
                    format!("{}({})", ty, inner)
                }
            }
            Expr::Selector { expr, field } => format!("{}.{}", self.primary(expr), field),
            Expr::Index { expr, index } => {
                let base = self.primary(expr);
                format!("{}[{}]", base, self.expr(index))
            }
            Expr::Slice { expr, low, high } => {
                let base = self.primary(expr);
                let low = low.as_deref().map(|l| self.expr(l)).unwrap_or_default();
                let high = high.as_deref().map(|h| self.expr(h)).unwrap_or_default();
                format!("{}[{}:{}]", base, low, high)
            }
            Expr::Composite { ty, elems } => {
                let items: Vec<String> = elems
                    .iter()
                    .map(|(key, value)| match key {
                        Some(k) => format!("{}: {}", self.expr(k), self.expr(value)),
                        None => self.expr(value),
                    })
                    .collect();
                format!("{}{{{}}}", ty, items.join(", "))
            }
            Expr::FuncLit {
                result,
                body,
                invoke,
            } => {
                let mut inner = self.nested();
                // writing into a String doesn't fail
                body.iter().try_for_each(|s| inner.stmt(s)).ok();
                let result = result.as_ref().map(|r| format!(" {}", r)).unwrap_or_default();
                format!(
                    "func(){} {{\n{}{}}}{}",
                    result,
                    inner.out,
                    self.tabs(),
                    if *invoke { "()" } else { "" }
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpile::ast::{BinOp, ConstSpec, Field, UnOp};

    fn print(file: &File) -> String {
        let mut out = vec![];
        emit_code(file, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn file(imports: &[&str], decls: Vec<Decl>) -> File {
        File {
            package: "main".into(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
            decls,
        }
    }

    fn id(name: &str) -> Expr {
        Expr::ident(name)
    }

    #[test]
    fn precedence_adds_parentheses() {
        let mut p = Printer::default();
        let sum = Expr::binary(BinOp::Add, id("a"), id("b"));
        assert_eq!(p.expr(&Expr::binary(BinOp::Mul, sum.clone(), id("c"))), "(a + b) * c");
        assert_eq!(p.expr(&Expr::binary(BinOp::Add, id("c"), sum.clone())), "c + (a + b)");
        assert_eq!(
            p.expr(&Expr::binary(BinOp::Add, Expr::binary(BinOp::Mul, id("a"), id("b")), id("c"))),
            "a * b + c"
        );
        assert_eq!(p.expr(&Expr::unary(UnOp::Not, sum)), "!(a + b)");
        assert_eq!(
            p.expr(&Expr::unary(UnOp::Neg, Expr::unary(UnOp::Neg, id("x")))),
            "-(-x)"
        );
        assert_eq!(
            p.expr(&Expr::selector(Expr::unary(UnOp::Deref, id("p")), "x")),
            "(*p).x"
        );
        assert_eq!(p.expr(&Expr::conversion("*[1]int32", id("q"))), "(*[1]int32)(q)");
        assert_eq!(p.expr(&Expr::slice_from(id("s"), Expr::int(2))), "s[2:]");
    }

    #[test]
    fn whole_file() {
        let body = vec![
            Stmt::Define {
                names: vec!["n".into()],
                value: Expr::int(0),
            },
            Stmt::For {
                init: Some(Box::new(Stmt::Define {
                    names: vec!["i".into()],
                    value: Expr::int(0),
                })),
                cond: Some(Expr::binary(BinOp::Lt, id("i"), id("len"))),
                post: Some(Box::new(Stmt::IncDec {
                    expr: id("i"),
                    inc: true,
                })),
                body: vec![Stmt::If {
                    cond: Expr::binary(BinOp::Eq, Expr::index(id("s"), id("i")), Expr::int(0)),
                    then: vec![Stmt::Break],
                    els: Some(vec![Stmt::Assign {
                        lhs: vec![id("n")],
                        op: Some(BinOp::Add),
                        rhs: vec![Expr::int(1)],
                    }]),
                }],
            },
            Stmt::Switch {
                tag: id("n"),
                clauses: vec![
                    CaseClause {
                        values: vec![Expr::int(1), Expr::int(2)],
                        body: vec![Stmt::Fallthrough],
                    },
                    CaseClause {
                        values: vec![],
                        body: vec![Stmt::Expr(Expr::call(
                            Expr::qualified("noarch", "Printf"),
                            vec![Expr::conversion("[]byte", Expr::StringLit(r"hi\n\x00".into()))],
                        ))],
                    },
                ],
            },
            Stmt::Placeholder("ctogo: StmtExpr at t.c:9:3: statement expressions is not supported".into()),
            Stmt::Return(Some(id("n"))),
        ];
        let f = file(
            &["github.com/elliotchance/c2go/noarch", "os"],
            vec![
                Decl::Const(vec![ConstSpec {
                    name: "LIMIT".into(),
                    value: Expr::int(10),
                }]),
                Decl::Type {
                    name: "point".into(),
                    spec: TypeSpec::Struct(vec![Field {
                        name: "x".into(),
                        ty: "int32".into(),
                    }]),
                },
                Decl::Func(Func {
                    name: "count".into(),
                    params: vec![
                        Field {
                            name: "s".into(),
                            ty: "[]byte".into(),
                        },
                        Field {
                            name: "len".into(),
                            ty: "int32".into(),
                        },
                    ],
                    variadic: None,
                    result: Some("int32".into()),
                    body,
                }),
            ],
        );
        let expected = r#"package main

import (
	"github.com/elliotchance/c2go/noarch"
	"os"
)

const (
	LIMIT = 10
)

type point struct {
	x int32
}

func count(s []byte, len int32) int32 {
	n := 0
	for i := 0; i < len; i++ {
		if s[i] == 0 {
			break
		} else {
			n += 1
		}
	}
	switch n {
	case 1, 2:
		fallthrough
	default:
		noarch.Printf([]byte("hi\n\x00"))
	}
	// ctogo: StmtExpr at t.c:9:3: statement expressions is not supported
	return n
}
"#;
        assert_eq!(print(&f), expected);
    }

    #[test]
    fn closures_and_else_if() {
        let closure = Expr::FuncLit {
            result: Some("int32".into()),
            body: vec![
                Stmt::If {
                    cond: id("c"),
                    then: vec![Stmt::Return(Some(id("a")))],
                    els: Some(vec![Stmt::If {
                        cond: id("d"),
                        then: vec![Stmt::Return(Some(id("b")))],
                        els: None,
                    }]),
                },
                Stmt::Return(Some(Expr::int(0))),
            ],
            invoke: true,
        };
        let f = file(
            &[],
            vec![Decl::Func(Func {
                name: "main".into(),
                params: vec![],
                variadic: Some("c2goArgs".into()),
                result: None,
                body: vec![
                    Stmt::Var(VarSpec {
                        name: "x".into(),
                        ty: Some("int32".into()),
                        value: Some(closure),
                    }),
                    Stmt::Label("done".into()),
                    Stmt::Return(None),
                ],
            })],
        );
        let expected = "package main

func main(c2goArgs ...interface{}) {
\tvar x int32 = func() int32 {
\t\tif c {
\t\t\treturn a
\t\t} else if d {
\t\t\treturn b
\t\t}
\t\treturn 0
\t}()
done:
\treturn
}
";
        assert_eq!(print(&f), expected);
    }
}
