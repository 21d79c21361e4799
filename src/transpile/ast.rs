//! Go syntax tree produced by the transpiler.
//!
//! Types are kept as their Go spelling, they are only ever printed.

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: String,
    /// Import paths, sorted.
    pub imports: Vec<String>,
    pub decls: Vec<Decl>,
}

// ==== Declarations ===========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Func(Func),
    /// `type Name struct { ... }` or `type Name Underlying`.
    Type { name: String, spec: TypeSpec },
    Var(VarSpec),
    Const(Vec<ConstSpec>),
    /// A declaration which could not be translated, printed as a comment.
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Struct(Vec<Field>),
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub params: Vec<Field>,
    /// Name of the trailing `...interface{}` parameter.
    pub variadic: Option<String>,
    pub result: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarSpec {
    pub name: String,
    pub ty: Option<String>,
    pub value: Option<Expr>,
}

/// Untyped constant, so it converts to any integer type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstSpec {
    pub name: String,
    pub value: Expr,
}

// ==== Statements =============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `lhs op= rhs`, plain assignment when `op` is `None`.
    Assign {
        lhs: Vec<Expr>,
        op: Option<BinOp>,
        rhs: Vec<Expr>,
    },
    /// `a, b := value`
    Define {
        names: Vec<String>,
        value: Expr,
    },
    IncDec {
        expr: Expr,
        inc: bool,
    },
    Var(VarSpec),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        els: Option<Vec<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Switch {
        tag: Expr,
        clauses: Vec<CaseClause>,
    },
    Block(Vec<Stmt>),
    Label(String),
    Goto(String),
    Break,
    Continue,
    Fallthrough,
    Empty,
    /// A statement which could not be translated, printed as a comment.
    Placeholder(String),
}

impl Stmt {
    pub fn assign(lhs: Expr, rhs: Expr) -> Stmt {
        Stmt::Assign {
            lhs: vec![lhs],
            op: None,
            rhs: vec![rhs],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Stmt::Empty)
    }
}

/// One `case`, or the `default` clause when `values` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub values: Vec<Expr>,
    pub body: Vec<Stmt>,
}

// ==== Expressions ============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    IntLit(String),
    FloatLit(String),
    /// Go string literal, already escaped, without quotes.
    StringLit(String),
    Nil,
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Paren(Box<Expr>),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        /// The last argument is passed as `args...`.
        spread: bool,
    },
    Conversion {
        ty: String,
        expr: Box<Expr>,
    },
    Selector {
        expr: Box<Expr>,
        field: String,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        expr: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
    },
    /// `T{key: value, value}`
    Composite {
        ty: String,
        elems: Vec<(Option<Expr>, Expr)>,
    },
    /// `func() T { body }`, immediately called when `invoke` is set.
    FuncLit {
        result: Option<String>,
        body: Vec<Stmt>,
        invoke: bool,
    },
    /// A type in expression position, like the first argument of `make`.
    Type(String),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(name.into())
    }

    pub fn int(n: impl ToString) -> Expr {
        Expr::IntLit(n.to_string())
    }

    /// `pkg.name`
    pub fn qualified(pkg: &str, name: &str) -> Expr {
        Expr::Selector {
            expr: Box::new(Expr::ident(pkg)),
            field: name.to_string(),
        }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            func: Box::new(func),
            args,
            spread: false,
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnOp, expr: Expr) -> Expr {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn index(expr: Expr, index: Expr) -> Expr {
        Expr::Index {
            expr: Box::new(expr),
            index: Box::new(index),
        }
    }

    pub fn slice_from(expr: Expr, low: Expr) -> Expr {
        Expr::Slice {
            expr: Box::new(expr),
            low: Some(Box::new(low)),
            high: None,
        }
    }

    pub fn selector(expr: Expr, field: &str) -> Expr {
        Expr::Selector {
            expr: Box::new(expr),
            field: field.to_string(),
        }
    }

    pub fn conversion(ty: &str, expr: Expr) -> Expr {
        Expr::Conversion {
            ty: ty.to_string(),
            expr: Box::new(expr),
        }
    }

    /// Evaluating the expression has no effect, so it can't stand alone as a statement.
    pub fn is_pure(&self) -> bool {
        match self {
            Expr::Ident(_)
            | Expr::IntLit(_)
            | Expr::FloatLit(_)
            | Expr::StringLit(_)
            | Expr::Nil
            | Expr::Type(_) => true,
            Expr::Paren(e) | Expr::Selector { expr: e, .. } | Expr::Unary { expr: e, .. } => {
                e.is_pure()
            }
            Expr::Conversion { expr, .. } => expr.is_pure(),
            Expr::Binary { lhs, rhs, .. } => lhs.is_pure() && rhs.is_pure(),
            Expr::Index { expr, index } => expr.is_pure() && index.is_pure(),
            _ => false,
        }
    }

    /// Can appear on the left of an assignment.
    pub fn is_addressable(&self) -> bool {
        match self {
            Expr::Ident(_) | Expr::Index { .. } | Expr::Selector { .. } => true,
            Expr::Unary { op: UnOp::Deref, .. } => true,
            Expr::Paren(e) => e.is_addressable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    LAnd,
    LOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Operator for a C binary operator symbol.
    pub fn from_c(op: &str) -> Option<BinOp> {
        use BinOp::*;
        Some(match op {
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Rem,
            "&" => And,
            "|" => Or,
            "^" => Xor,
            "<<" => Shl,
            ">>" => Shr,
            "&&" => LAnd,
            "||" => LOr,
            "==" => Eq,
            "!=" => Ne,
            "<" => Lt,
            "<=" => Le,
            ">" => Gt,
            ">=" => Ge,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        use BinOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
            And => "&",
            Or => "|",
            Xor => "^",
            Shl => "<<",
            Shr => ">>",
            LAnd => "&&",
            LOr => "||",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
        }
    }

    /// Go binding strength, higher binds tighter.
    pub fn precedence(self) -> u8 {
        use BinOp::*;
        match self {
            Mul | Div | Rem | Shl | Shr | And => 5,
            Add | Sub | Or | Xor => 4,
            Eq | Ne | Lt | Le | Gt | Ge => 3,
            LAnd => 2,
            LOr => 1,
        }
    }

    pub fn is_comparison(self) -> bool {
        use BinOp::*;
        matches!(self, Eq | Ne | Lt | Le | Gt | Ge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Plus,
    Not,
    /// `^x`
    BitNot,
    Deref,
    Addr,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Plus => "+",
            UnOp::Not => "!",
            UnOp::BitNot => "^",
            UnOp::Deref => "*",
            UnOp::Addr => "&",
        }
    }
}
