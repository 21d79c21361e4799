//! C `switch` statements.
//!
//! Clang prints `case` and `default` as siblings in the switch body, each
//! owning only its first statement. The statements up to the next label
//! belong to the clause as well. Go clauses don't fall through, so a clause
//! which doesn't end in `break` gets an explicit `fallthrough`.
//!
//! Declarations ahead of the first label are moved in front of the switch,
//! so the clauses still see them. Other statements there are unreachable.

use crate::{
    common::go_ident,
    error::context::Context,
    ingest::ast::{Node, NodeKind},
    transpile::{
        ast::{CaseClause, Expr, Stmt},
        env::Env,
        error::{StmtError, arity, unreachable_in_switch},
        expr::{lower_as, lower_expr, operands, unsupported},
        stmt::lower_stmt,
    },
};

pub(crate) fn switch_stmt(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, StmtError> {
    let ops = operands(node);
    let [.., cond, body] = ops.as_slice() else {
        return Err(arity(node.kind_name(), "at least 2", ops.len()).into());
    };

    let tag = lower_expr(ctx, env, cond)?;
    let tag_type = tag.c_type.clone();
    let mut out = tag.pre;
    let tag_expr = if tag.post.is_empty() {
        tag.expr
    } else {
        let t = env.fresh_temp();
        out.push(Stmt::Define {
            names: vec![t.clone()],
            value: tag.expr,
        });
        out.extend(tag.post);
        Expr::ident(t)
    };

    let mut clauses = Clauses::new(tag_type);
    let items = match body.kind {
        NodeKind::CompoundStmt => operands(body),
        _ => vec![*body],
    };
    for item in items {
        clauses.add(ctx, env, item)?;
    }
    out.append(&mut clauses.before);
    out.push(Stmt::Switch {
        tag: tag_expr,
        clauses: clauses.finish(),
    });
    Ok(out)
}

/// Clauses collected so far.
struct Clauses {
    tag_type: String,
    /// Declarations found before the first label.
    before: Vec<Stmt>,
    done: Vec<CaseClause>,
    current: Option<CaseClause>,
    /// Labels waiting for the clause they name to open.
    labels: Vec<Stmt>,
    ended_with_break: bool,
}

impl Clauses {
    fn new(tag_type: String) -> Self {
        Self {
            tag_type,
            before: vec![],
            done: vec![],
            current: None,
            labels: vec![],
            ended_with_break: true,
        }
    }

    fn add(&mut self, ctx: &mut Context, env: &mut Env, node: &Node) -> Result<(), StmtError> {
        match node.kind {
            NodeKind::CaseStmt => {
                let ops = operands(node);
                let (value, first) = match ops.as_slice() {
                    [value, first] => (*value, Some(*first)),
                    [value] => (*value, None),
                    [_, _, _] => return Err(unsupported("case ranges")),
                    _ => return Err(arity(node.kind_name(), "2", ops.len()).into()),
                };
                let value = lower_as(ctx, env, value, &self.tag_type)?.expr;
                self.open(vec![value]);
                if let Some(first) = first {
                    self.add(ctx, env, first)?;
                }
            }
            NodeKind::DefaultStmt => {
                self.open(vec![]);
                if let Some(first) = operands(node).first() {
                    self.add(ctx, env, first)?;
                }
            }
            NodeKind::BreakStmt if self.current.is_some() => self.ended_with_break = true,
            NodeKind::LabelStmt { ref name } if self.current.is_some() || labels_case(node) => {
                let label = Stmt::Label(go_ident(name));
                let inner = operands(node).first().copied();
                match inner {
                    Some(inner) if labels_case(node) => {
                        self.labels.push(label);
                        self.add(ctx, env, inner)?;
                    }
                    _ => {
                        self.push(vec![label]);
                        if let Some(inner) = inner {
                            self.add(ctx, env, inner)?;
                        }
                    }
                }
            }
            _ if self.current.is_none() => {
                if matches!(node.kind, NodeKind::DeclStmt) {
                    let stmts = lower_stmt(ctx, env, node)?;
                    self.before.extend(stmts);
                } else {
                    let pos = env.position(&node.pos);
                    ctx.report(unreachable_in_switch(&pos, node.kind_name()));
                }
            }
            _ => {
                let stmts = lower_stmt(ctx, env, node)?;
                self.push(stmts);
            }
        }
        Ok(())
    }

    fn push(&mut self, stmts: Vec<Stmt>) {
        if stmts.is_empty() {
            return;
        }
        if let Some(clause) = self.current.as_mut() {
            // only reachable through a label
            if self.ended_with_break {
                clause.body.push(Stmt::Break);
            }
            clause.body.extend(stmts);
        }
        self.ended_with_break = false;
    }

    fn open(&mut self, values: Vec<Expr>) {
        if let Some(mut previous) = self.current.take() {
            if !self.ended_with_break {
                previous.body.push(Stmt::Fallthrough);
            }
            self.done.push(previous);
        }
        let body = std::mem::take(&mut self.labels);
        self.current = Some(CaseClause { values, body });
        self.ended_with_break = false;
    }

    fn finish(mut self) -> Vec<CaseClause> {
        self.done.extend(self.current);
        self.done
    }
}

/// `name: case ...:` labels a whole clause.
fn labels_case(node: &Node) -> bool {
    operands(node)
        .first()
        .is_some_and(|inner| matches!(inner.kind, NodeKind::CaseStmt | NodeKind::DefaultStmt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::context::testing::context,
        transpile::expr::testing::{env, tree},
    };

    fn inc(name: &str) -> Stmt {
        Stmt::IncDec {
            expr: Expr::ident(name),
            inc: true,
        }
    }

    fn lower(dump: &str) -> Vec<Stmt> {
        let root = tree(dump);
        let mut ctx = context();
        let mut env = env(&[]);
        let stmts = switch_stmt(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert!(ctx.diagnostics().is_empty());
        stmts
    }

    #[test]
    fn missing_break_becomes_fallthrough() {
        let stmts = lower(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-SwitchStmt 0x2 <t.c:1:1, line:6:1>
  |-ImplicitCastExpr 0x3 <line:1:9> 'int' <LValueToRValue>
  | `-DeclRefExpr 0x4 <col:9> 'int' lvalue Var 0x5 'x' 'int'
  `-CompoundStmt 0x6 <col:12, line:6:1>
    |-CaseStmt 0x7 <line:2:1, col:10>
    | |-IntegerLiteral 0x8 <col:6> 'int' 1
    | `-UnaryOperator 0x9 <col:9, col:10> 'int' postfix '++'
    |   `-DeclRefExpr 0xa <col:9> 'int' lvalue Var 0xb 'a' 'int'
    |-CaseStmt 0xc <line:3:1, col:10>
    | |-IntegerLiteral 0xd <col:6> 'int' 2
    | `-UnaryOperator 0xe <col:9, col:10> 'int' postfix '++'
    |   `-DeclRefExpr 0xf <col:9> 'int' lvalue Var 0x10 'b' 'int'
    |-BreakStmt 0x11 <line:4:1>
    `-DefaultStmt 0x12 <line:5:1, col:11>
      `-UnaryOperator 0x13 <col:10, col:11> 'int' postfix '++'
        `-DeclRefExpr 0x14 <col:10> 'int' lvalue Var 0x15 'c' 'int'
",
        );
        assert_eq!(
            stmts,
            vec![Stmt::Switch {
                tag: Expr::ident("x"),
                clauses: vec![
                    CaseClause {
                        values: vec![Expr::int(1)],
                        body: vec![inc("a"), Stmt::Fallthrough],
                    },
                    CaseClause {
                        values: vec![Expr::int(2)],
                        body: vec![inc("b")],
                    },
                    CaseClause {
                        values: vec![],
                        body: vec![inc("c")],
                    },
                ],
            }]
        );
    }

    #[test]
    fn stacked_labels_fall_through() {
        let stmts = lower(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-SwitchStmt 0x2 <t.c:1:1, line:4:1>
  |-ImplicitCastExpr 0x3 <line:1:9> 'int' <LValueToRValue>
  | `-DeclRefExpr 0x4 <col:9> 'int' lvalue Var 0x5 'x' 'int'
  `-CompoundStmt 0x6 <col:12, line:4:1>
    |-CaseStmt 0x7 <line:2:1, col:18>
    | |-IntegerLiteral 0x8 <col:6> 'int' 1
    | `-CaseStmt 0x9 <col:9, col:18>
    |   |-IntegerLiteral 0xa <col:14> 'int' 2
    |   `-UnaryOperator 0xb <col:17, col:18> 'int' postfix '++'
    |     `-DeclRefExpr 0xc <col:17> 'int' lvalue Var 0xd 'a' 'int'
    `-BreakStmt 0xe <line:3:1>
",
        );
        let Stmt::Switch { clauses, .. } = &stmts[0] else {
            panic!("expected a switch");
        };
        assert_eq!(clauses[0].body, vec![Stmt::Fallthrough]);
        assert_eq!(clauses[1].body, vec![inc("a")]);
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn case_ranges_are_unsupported() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-SwitchStmt 0x2 <t.c:1:1, line:3:1>
  |-ImplicitCastExpr 0x3 <line:1:9> 'int' <LValueToRValue>
  | `-DeclRefExpr 0x4 <col:9> 'int' lvalue Var 0x5 'x' 'int'
  `-CompoundStmt 0x6 <col:12, line:3:1>
    `-CaseStmt 0x7 <line:2:1, col:20>
      |-IntegerLiteral 0x8 <col:6> 'int' 1
      |-IntegerLiteral 0x9 <col:12> 'int' 5
      `-BreakStmt 0xa <col:15>
",
        );
        let mut ctx = context();
        let mut env = env(&[]);
        assert!(matches!(
            switch_stmt(&mut ctx, &mut env, &root.children()[0]),
            Err(StmtError::Transpile(_))
        ));
    }

    #[test]
    fn declarations_before_first_case_move_out() {
        let root = tree(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-SwitchStmt 0x2 <t.c:1:1, line:6:1>
  |-ImplicitCastExpr 0x3 <line:1:9> 'int' <LValueToRValue>
  | `-DeclRefExpr 0x4 <col:9> 'int' lvalue Var 0x5 'x' 'int'
  `-CompoundStmt 0x6 <col:12, line:6:1>
    |-DeclStmt 0x7 <line:2:1, col:7>
    | `-VarDecl 0x8 <col:1, col:5> col:5 used y 'int'
    |-UnaryOperator 0x9 <line:3:1, col:2> 'int' postfix '++'
    | `-DeclRefExpr 0xa <col:1> 'int' lvalue Var 0xb 'a' 'int'
    `-CaseStmt 0xc <line:4:1, col:10>
      |-IntegerLiteral 0xd <col:6> 'int' 1
      `-UnaryOperator 0xe <col:9, col:10> 'int' postfix '++'
        `-DeclRefExpr 0xf <col:9> 'int' lvalue Var 0x8 'y' 'int'
",
        );
        let mut ctx = context();
        let mut env = env(&[]);
        let stmts = switch_stmt(&mut ctx, &mut env, &root.children()[0]).unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(!matches!(stmts[0], Stmt::Switch { .. }));
        let Stmt::Switch { clauses, .. } = &stmts[1] else {
            panic!("expected a switch");
        };
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].body, vec![inc("y")]);
        // `a++` can never run
        assert_eq!(ctx.diagnostics().len(), 1);
        assert!(ctx.diagnostics()[0].message.contains("UnaryOperator"));
    }

    #[test]
    fn labels_inside_the_body_are_kept() {
        let stmts = lower(
            "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
`-SwitchStmt 0x2 <t.c:1:1, line:7:1>
  |-ImplicitCastExpr 0x3 <line:1:9> 'int' <LValueToRValue>
  | `-DeclRefExpr 0x4 <col:9> 'int' lvalue Var 0x5 'x' 'int'
  `-CompoundStmt 0x6 <col:12, line:7:1>
    |-CaseStmt 0x7 <line:2:1, col:10>
    | |-IntegerLiteral 0x8 <col:6> 'int' 1
    | `-UnaryOperator 0x9 <col:9, col:10> 'int' postfix '++'
    |   `-DeclRefExpr 0xa <col:9> 'int' lvalue Var 0xb 'a' 'int'
    |-BreakStmt 0xc <line:3:1>
    |-LabelStmt 0xd <line:4:1, col:8> 'again'
    | `-UnaryOperator 0xe <col:7, col:8> 'int' postfix '++'
    |   `-DeclRefExpr 0xf <col:7> 'int' lvalue Var 0x10 'b' 'int'
    `-LabelStmt 0x11 <line:5:1, line:6:4> 'other'
      `-DefaultStmt 0x12 <col:8, line:6:4>
        `-UnaryOperator 0x13 <col:3, col:4> 'int' postfix '++'
          `-DeclRefExpr 0x14 <col:3> 'int' lvalue Var 0x15 'c' 'int'
",
        );
        let Stmt::Switch { clauses, .. } = &stmts[0] else {
            panic!("expected a switch");
        };
        assert_eq!(
            clauses[0].body,
            vec![
                inc("a"),
                Stmt::Break,
                Stmt::Label("again".into()),
                inc("b"),
                Stmt::Fallthrough,
            ]
        );
        assert_eq!(clauses[1].body, vec![Stmt::Label("other".into()), inc("c")]);
    }
}
