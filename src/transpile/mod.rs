//! Lowering of the clang tree into a Go syntax tree.

use std::collections::BTreeSet;

use crate::{
    error::{InternalError, context::Context},
    ingest::{
        IngestionError,
        ast::{Node, NodeKind},
    },
    symtable::{SymTable, record_key},
    transpile::{
        ast::{Decl, File, TypeSpec},
        decl::anonymous_typedef,
        env::Env,
        error::{declaration_dropped, placeholder},
    },
};

pub mod ast;
mod call;
mod decl;
mod env;
pub mod error;
mod expr;
mod literal;
pub mod lowered;
mod operators;
mod stmt;
mod switch;

/// Default import root of the Go runtime packages.
pub const DEFAULT_RUNTIME: &str = "github.com/elliotchance/c2go";

/// Settings of one translation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Name of the generated Go package.
    pub package: String,
    /// Import path the runtime packages `noarch`, `linux` and `darwin` live under.
    pub runtime: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            package: "main".into(),
            runtime: DEFAULT_RUNTIME.into(),
        }
    }
}

/// Translate a whole translation unit.
///
/// Declarations that can't be translated are replaced by placeholder
/// comments and reported to `ctx`, the rest of the file is still produced.
pub fn translate(ctx: &mut Context, root: &Node, options: &Options) -> Result<File, InternalError> {
    if root.kind != NodeKind::TranslationUnitDecl {
        return Err(IngestionError::NotTranslationUnit {
            kind: root.kind_name().to_string(),
        }
        .into());
    }

    let mut headers = BTreeSet::new();
    collect_headers(root, &mut headers);
    log::debug!("headers in the dump: {:?}", headers);
    let mut env = Env::new(SymTable::init(&headers), &options.runtime);

    let children = root.children();
    let mut decls = vec![];
    let mut i = 0;
    while i < children.len() {
        let node = &children[i];
        let typedef = anonymous_typedef(node, children.get(i + 1));
        i += if typedef.is_some() { 2 } else { 1 };

        match decl::translate(ctx, &mut env, node, typedef) {
            Ok(translated) => {
                decls.extend(env.take_hoisted());
                decls.extend(translated);
            }
            Err(e) => {
                env.leave_function();
                env.take_hoisted();
                let pos = env.position(&node.pos);
                ctx.report(declaration_dropped(&pos, node.kind_name(), &e));
                decls.push(Decl::Placeholder(placeholder(node.kind_name(), &pos, &e)));
            }
        }
    }

    // records which were only ever forward declared
    for (tag, name) in env.st.take_pending_records() {
        log::debug!("`{}` has no definition, emitting an empty struct", record_key(tag, &name));
        decls.push(Decl::Type {
            name: crate::common::go_ident(&name),
            spec: TypeSpec::Struct(vec![]),
        });
    }

    Ok(File {
        package: options.package.clone(),
        imports: env.imports(),
        decls,
    })
}

/// Base names of every file named in a position, like `stdio.h`.
fn collect_headers(node: &Node, out: &mut BTreeSet<String>) {
    if let Some(file) = &node.pos.file {
        let base = file.rsplit('/').next().unwrap_or(file);
        if !out.contains(base) {
            out.insert(base.to_string());
        }
    }
    for child in node.children() {
        collect_headers(child, out);
    }
}
