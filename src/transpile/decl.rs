//! Lowering of C declarations.

use crate::{
    common::{Position, go_ident},
    error::context::Context,
    ingest::ast::{DeclFlags, Node, NodeKind, QualType, RecordTag, StorageClass},
    symtable::{FunctionSignature, Record, record_key},
    transpile::{
        ast::{BinOp, ConstSpec, Decl, Expr, Field, Func, Stmt, TypeSpec, VarSpec},
        env::{Env, FuncInfo, UNION_STORAGE},
        error::{StmtError, TranspileError, placeholder, statement_dropped, union_storage},
        expr::{lower_as, operands},
        literal::{const_int, make_array, zero_value},
        stmt::lower_body,
    },
    types::{self, size_of, split_array, strip_qualifiers},
};

/// Name of the trailing parameter of variadic functions.
const VARIADIC_ARGS: &str = "c2goArgs";

/// Name a typedef gives to the anonymous record or enum right before it.
///
/// `typedef struct { ... } point;` is dumped as an anonymous `RecordDecl`
/// followed by the `TypedefDecl`.
pub(crate) fn anonymous_typedef<'a>(node: &Node, next: Option<&'a Node>) -> Option<&'a str> {
    let anonymous = matches!(
        node.kind,
        NodeKind::RecordDecl { name: None, definition: true, .. } | NodeKind::EnumDecl { name: None }
    );
    if !anonymous {
        return None;
    }
    match &next?.kind {
        NodeKind::TypedefDecl { name, ty, .. }
            if ty.ty.contains("(anonymous") || ty.ty.contains("(unnamed") || ty.ty.ends_with(name.as_str()) =>
        {
            Some(name.as_str())
        }
        _ => None,
    }
}

/// Translate a top-level declaration. `typedef` names an anonymous record or enum.
pub(crate) fn translate(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    typedef: Option<&str>,
) -> Result<Vec<Decl>, TranspileError> {
    let pos = env.position(&node.pos);
    match &node.kind {
        NodeKind::TypedefDecl { name, ty, flags } => Ok(typedef_decl(ctx, env, &pos, name, ty, flags)),
        NodeKind::RecordDecl {
            tag,
            name,
            definition,
            ..
        } => {
            let Some(name) = typedef.or(name.as_deref()) else {
                log::debug!("skipping anonymous record at {}", pos);
                return Ok(vec![]);
            };
            record_decl(ctx, env, node, &pos, *tag, name, *definition, typedef.is_some())
        }
        NodeKind::EnumDecl { name } => enum_decl(env, node, typedef.or(name.as_deref()), typedef.is_some()),
        NodeKind::VarDecl { .. } => match global_var(ctx, env, node) {
            Ok(decls) => Ok(decls),
            Err(StmtError::Transpile(e)) => Err(e),
            Err(e) => {
                ctx.report(statement_dropped(&pos, node.kind_name(), &e));
                Ok(vec![Decl::Placeholder(placeholder(node.kind_name(), &pos, &e))])
            }
        },
        NodeKind::FunctionDecl { .. } => function(ctx, env, node, &pos),
        NodeKind::EmptyDecl => Ok(vec![]),
        _ => {
            log::debug!("ignoring {} at {}", node.kind_name(), pos);
            Ok(vec![])
        }
    }
}

// ==== Types ==================================================================

fn typedef_decl(
    ctx: &mut Context,
    env: &mut Env,
    pos: &Position,
    name: &str,
    ty: &QualType,
    flags: &DeclFlags,
) -> Vec<Decl> {
    if flags.implicit {
        return vec![];
    }
    // names with a fixed Go spelling, like FILE
    if types::resolve(name, &Default::default()).is_ok() {
        log::trace!("typedef `{}` has a built-in mapping", name);
        return vec![];
    }
    let c_type = env.pick(ty);
    if env.st.is_defined(name) {
        env.st.add_typedef(name, &c_type);
        return vec![];
    }

    let go = env.go_type(ctx, pos, &c_type);
    env.st.define(name);
    env.st.add_typedef(name, &c_type);
    if go == go_ident(name) {
        return vec![];
    }
    vec![Decl::Type {
        name: go_ident(name),
        spec: TypeSpec::Named(go),
    }]
}

#[allow(clippy::too_many_arguments)]
fn record_decl(
    ctx: &mut Context,
    env: &mut Env,
    node: &Node,
    pos: &Position,
    tag: RecordTag,
    name: &str,
    definition: bool,
    typedef: bool,
) -> Result<Vec<Decl>, TranspileError> {
    let key = record_key(tag, name);
    if !definition {
        env.st.define(name);
        env.st.forward_record(tag, name);
        return Ok(vec![]);
    }
    if env.st.record(&key).is_some() {
        return Ok(vec![]);
    }
    // defined before the fields, so they can point back at it
    env.st.define(name);

    let mut out = vec![];
    let mut fields = vec![];
    let mut go_fields = vec![];
    for child in operands(node) {
        match &child.kind {
            // nested anonymous records have no name to refer to, fields of their type stay opaque
            NodeKind::RecordDecl { .. } | NodeKind::EnumDecl { .. } => {
                out.extend(translate(ctx, env, child, None)?);
            }
            NodeKind::FieldDecl { name: Some(field), ty, .. } => {
                let c_type = env.pick(ty);
                let field_pos = env.position(&child.pos);
                go_fields.push(Field {
                    name: go_ident(field),
                    ty: env.go_type(ctx, &field_pos, &c_type),
                });
                fields.push((field.clone(), c_type));
            }
            _ => log::trace!("skipping {} in record `{}`", child.kind_name(), name),
        }
    }

    let plain = fields
        .iter()
        .all(|(_, t)| env.underlying(t).is_some_and(|k| k.is_plain_data()));
    env.st.add_record(Record {
        tag,
        name: name.to_string(),
        fields,
    });
    if tag == RecordTag::Union {
        // the buffer may only hold pointer-free members
        match size_of(&env.st, &key) {
            Ok(size) if plain && size > 0 => {
                env.st.share_union(&key);
                go_fields = vec![Field {
                    name: UNION_STORAGE.to_string(),
                    ty: format!("[{}]byte", size),
                }];
            }
            _ => ctx.report(union_storage(pos, name)),
        }
    }
    if typedef {
        env.st.add_typedef(name, &key);
    }
    out.push(Decl::Type {
        name: go_ident(name),
        spec: TypeSpec::Struct(go_fields),
    });
    Ok(out)
}

fn enum_decl(env: &mut Env, node: &Node, name: Option<&str>, typedef: bool) -> Result<Vec<Decl>, TranspileError> {
    if let Some(name) = name {
        if !env.emit_once(&format!("enum {}", name)) {
            return Ok(vec![]);
        }
    }

    let mut consts = vec![];
    let mut next = 0i64;
    for child in operands(node) {
        let NodeKind::EnumConstantDecl { name: constant, .. } = &child.kind else {
            continue;
        };
        if let Some(init) = operands(child).first() {
            next = const_int(init).ok_or_else(|| {
                TranspileError::Unsupported(format!("non-constant value of `{}`", constant))
            })?;
        }
        consts.push(ConstSpec {
            name: go_ident(constant),
            value: Expr::int(next),
        });
        next = next.wrapping_add(1);
    }

    let mut out = vec![];
    if let Some(name) = name {
        if typedef {
            env.st.define(name);
            env.st.add_typedef(name, &format!("enum {}", name));
        }
        out.push(Decl::Type {
            name: go_ident(name),
            spec: TypeSpec::Named("int32".into()),
        });
    }
    if !consts.is_empty() {
        out.push(Decl::Const(consts));
    }
    Ok(out)
}

// ==== Variables ==============================================================

/// The initializer and its C type, for a `VarDecl`.
fn var_parts<'a>(env: &Env, node: &'a Node) -> Option<(&'a str, String, Option<&'a Node>, Option<StorageClass>)> {
    let NodeKind::VarDecl {
        name,
        ty,
        storage,
        has_init,
        ..
    } = &node.kind
    else {
        return None;
    };
    let init = if *has_init {
        operands(node).last().copied()
    } else {
        None
    };
    Some((name.as_str(), env.pick(ty), init, *storage))
}

/// Value of an uninitialized variable, when Go's zero value isn't enough.
fn implicit_value(ctx: &mut Context, env: &mut Env, pos: &Position, c_type: &str) -> Option<Expr> {
    let resolved = strip_qualifiers(&env.st.underlying(c_type));
    match split_array(&resolved) {
        Some((_, sizes)) if matches!(sizes.first(), Some(Some(_))) => Some(make_array(ctx, env, pos, c_type)),
        _ => None,
    }
}

fn global_var(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Decl>, StmtError> {
    let Some((name, c_type, init, storage)) = var_parts(env, node) else {
        return Ok(vec![]);
    };
    if storage == Some(StorageClass::Extern) && init.is_none() {
        return Ok(vec![]);
    }
    if !env.emit_once(name) {
        return Ok(vec![]);
    }
    let pos = env.position(&node.pos);
    let ty = env.go_type(ctx, &pos, &c_type);

    let value = match init {
        Some(init) => {
            let l = lower_as(ctx, env, init, &c_type)?;
            if l.has_effects() {
                // package level code has to run inside a function
                Some(Expr::FuncLit {
                    result: Some(ty.clone()),
                    body: l.into_return(|| env.fresh_temp()),
                    invoke: true,
                })
            } else {
                Some(l.expr)
            }
        }
        None => implicit_value(ctx, env, &pos, &c_type),
    };
    Ok(vec![Decl::Var(VarSpec {
        name: go_ident(name),
        ty: Some(ty),
        value,
    })])
}

/// Declarations inside a function body. Types are hoisted in front of the
/// function, Go has no local type declarations with methods.
pub(crate) fn local(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, StmtError> {
    let children = operands(node);
    let mut out = vec![];
    let mut skip = false;
    for (i, child) in children.iter().enumerate() {
        if std::mem::take(&mut skip) {
            continue;
        }
        match &child.kind {
            NodeKind::VarDecl { .. } => out.extend(local_var(ctx, env, child)?),
            NodeKind::RecordDecl { .. } | NodeKind::EnumDecl { .. } | NodeKind::TypedefDecl { .. } => {
                let typedef = anonymous_typedef(child, children.get(i + 1).copied());
                skip = typedef.is_some();
                let decls = translate(ctx, env, child, typedef)?;
                env.hoist(decls);
            }
            NodeKind::FunctionDecl { .. } => {
                let pos = env.position(&child.pos);
                register(env, child, &pos);
            }
            _ => log::debug!("ignoring {} in a declaration statement", child.kind_name()),
        }
    }
    Ok(out)
}

fn local_var(ctx: &mut Context, env: &mut Env, node: &Node) -> Result<Vec<Stmt>, StmtError> {
    let Some((name, c_type, init, storage)) = var_parts(env, node) else {
        return Ok(vec![]);
    };
    if storage == Some(StorageClass::Extern) {
        return Ok(vec![]);
    }
    let pos = env.position(&node.pos);
    let ty = env.go_type(ctx, &pos, &c_type);
    let mut out = vec![];
    let mut post = vec![];
    let value = match init {
        Some(init) => {
            let l = lower_as(ctx, env, init, &c_type)?;
            out.extend(l.pre);
            post = l.post;
            Some(l.expr)
        }
        None => implicit_value(ctx, env, &pos, &c_type),
    };
    out.push(Stmt::Var(VarSpec {
        name: go_ident(name),
        ty: Some(ty),
        value,
    }));
    out.extend(post);
    Ok(out)
}

// ==== Functions ==============================================================

/// Return type of a function type like `int (const char *, ...)`.
fn return_type(function_type: &str) -> &str {
    match function_type.find('(') {
        Some(open) => function_type[..open].trim(),
        None => function_type.trim(),
    }
}

struct Param<'a> {
    name: Option<&'a str>,
    c_type: String,
}

fn params<'a>(env: &Env, node: &'a Node) -> Vec<Param<'a>> {
    operands(node)
        .into_iter()
        .filter_map(|child| match &child.kind {
            NodeKind::ParmVarDecl { name, ty, .. } => Some(Param {
                name: name.as_deref(),
                c_type: env.pick(ty),
            }),
            _ => None,
        })
        .collect()
}

/// Add the signature of a function declaration to the registry.
/// Returns `false` when calls to it are substituted.
fn register(env: &mut Env, node: &Node, pos: &Position) -> bool {
    let NodeKind::FunctionDecl { name, ty, .. } = &node.kind else {
        return false;
    };
    if env.st.function(name).is_some_and(|f| f.is_substituted()) {
        log::trace!("`{}` at {} is substituted", name, pos);
        return false;
    }
    let sig = FunctionSignature::declared(
        name,
        return_type(&ty.ty),
        params(env, node).into_iter().map(|p| p.c_type).collect(),
        ty.ty.trim_end().ends_with("...)"),
    );
    env.st.add_function(sig)
}

fn function(ctx: &mut Context, env: &mut Env, node: &Node, pos: &Position) -> Result<Vec<Decl>, TranspileError> {
    let NodeKind::FunctionDecl { name, ty, .. } = &node.kind else {
        return Ok(vec![]);
    };
    if !register(env, node, pos) {
        return Ok(vec![]);
    }
    let Some(body) = operands(node)
        .into_iter()
        .find(|c| matches!(c.kind, NodeKind::CompoundStmt))
    else {
        return Ok(vec![]);
    };
    if !env.emit_once(name) {
        return Ok(vec![]);
    }

    let is_main = name == "main";
    let return_c_type = return_type(&ty.ty).to_string();
    let variadic = ty.ty.trim_end().ends_with("...)");
    let params = params(env, node);

    let mut fields = vec![];
    for p in &params {
        fields.push(Field {
            name: p.name.map(go_ident).unwrap_or_else(|| "_".into()),
            ty: env.go_type(ctx, pos, &p.c_type),
        });
    }
    let result = match strip_qualifiers(&return_c_type).as_str() {
        "void" => None,
        _ if is_main => None,
        _ => Some(env.go_type(ctx, pos, &return_c_type)),
    };

    env.enter_function(FuncInfo {
        name: name.clone(),
        return_c_type: return_c_type.clone(),
        is_main,
    });
    let mut stmts = if is_main { main_args(env, &fields) } else { vec![] };
    stmts.extend(lower_body(ctx, env, body)?);
    if result.is_some() && !matches!(stmts.last(), Some(Stmt::Return(_))) {
        // C lets control reach the end of a non-void function
        let zero = zero_value(ctx, env, pos, &return_c_type);
        stmts.push(Stmt::Return(Some(zero)));
    }
    env.leave_function();

    Ok(vec![Decl::Func(Func {
        name: go_ident(name),
        params: if is_main { vec![] } else { fields },
        variadic: (variadic && !is_main).then(|| VARIADIC_ARGS.to_string()),
        result,
        body: stmts,
    })])
}

/// `argc` and `argv` of `main`, built from `os.Args`.
fn main_args(env: &mut Env, params: &[Field]) -> Vec<Stmt> {
    let mut out = vec![];
    let args = || Expr::qualified("os", "Args");
    let len_args = || Expr::call(Expr::ident("len"), vec![args()]);
    if params.is_empty() {
        return out;
    }
    env.use_package("os");

    if let Some(argc) = params.first().filter(|p| p.name != "_") {
        out.push(Stmt::Define {
            names: vec![argc.name.clone()],
            value: Expr::conversion(&argc.ty, len_args()),
        });
    }
    if let Some(argv) = params.get(1).filter(|p| p.name != "_") {
        let i = env.fresh_temp();
        out.push(Stmt::Define {
            names: vec![argv.name.clone()],
            value: Expr::call(Expr::ident("make"), vec![Expr::Type(argv.ty.clone()), len_args()]),
        });
        out.push(Stmt::For {
            init: Some(Box::new(Stmt::Define {
                names: vec![i.clone()],
                value: Expr::int(0),
            })),
            cond: Some(Expr::binary(BinOp::Lt, Expr::ident(&i), len_args())),
            post: Some(Box::new(Stmt::IncDec {
                expr: Expr::ident(&i),
                inc: true,
            })),
            body: vec![Stmt::assign(
                Expr::index(Expr::ident(&argv.name), Expr::ident(&i)),
                Expr::conversion(
                    "[]byte",
                    Expr::binary(
                        BinOp::Add,
                        Expr::index(args(), Expr::ident(&i)),
                        Expr::StringLit("\\x00".into()),
                    ),
                ),
            )],
        });
    }
    out
}
