use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use crate::{
    common::Position,
    error::context::Context,
    ingest::ast::QualType,
    symtable::SymTable,
    transpile::ast::{Decl, Expr, UnOp},
    types::{self, TypeDescriptor, TypeKind},
};

/// Field holding the bytes of a union whose members share storage.
pub(crate) const UNION_STORAGE: &str = "memory";

/// Packages of the runtime library, imported relative to the runtime root.
const RUNTIME_PACKAGES: [&str; 3] = ["noarch", "linux", "darwin"];

#[derive(Debug, Clone)]
pub struct FuncInfo {
    pub name: String,
    pub return_c_type: String,
    pub is_main: bool,
}

/// State of one translation unit.
#[derive(Debug)]
pub struct Env {
    pub st: SymTable,
    runtime_root: String,
    imports: BTreeSet<String>,
    func: Option<FuncInfo>,
    temps: usize,
    last_file: Option<Arc<str>>,
    last_line: usize,
    /// Names of emitted functions and globals.
    emitted: HashSet<String>,
    /// Functions already reported as called without a declaration.
    guessed: HashSet<String>,
    /// Declarations found inside function bodies, emitted before the function.
    hoisted: Vec<Decl>,
}

impl Env {
    pub(crate) fn new(st: SymTable, runtime_root: &str) -> Self {
        Self {
            st,
            runtime_root: runtime_root.trim_end_matches('/').to_string(),
            imports: BTreeSet::new(),
            func: None,
            temps: 0,
            last_file: None,
            last_line: 0,
            emitted: HashSet::new(),
            guessed: HashSet::new(),
            hoisted: vec![],
        }
    }

    // ==== Positions ==========================================================

    /// Position with file and line filled in from the last position which had them.
    pub(crate) fn position(&mut self, pos: &Position) -> Position {
        if pos.is_empty() {
            return pos.clone();
        }
        if pos.file.is_some() {
            self.last_file = pos.file.clone();
        }
        let mut pos = pos.with_default_file(self.last_file.as_ref());
        if pos.line == 0 {
            pos.line = self.last_line;
        } else {
            self.last_line = pos.line;
        }
        pos
    }

    // ==== Types ==============================================================

    /// Resolve without reporting anything.
    pub(crate) fn descriptor(&self, c_type: &str) -> Option<TypeDescriptor> {
        types::resolve(c_type, self.st.defined()).ok()
    }

    /// The C spelling to use for a clang type: the sugared one if it
    /// resolves, the canonical one otherwise.
    pub(crate) fn pick(&self, qt: &QualType) -> String {
        match &qt.desugared {
            Some(d) if self.descriptor(&qt.ty).is_none() => d.clone(),
            _ => qt.ty.clone(),
        }
    }

    /// Go spelling of a C type. Types Go can't express become
    /// `interface{}` with a warning.
    pub(crate) fn go_type(&mut self, ctx: &mut Context, pos: &Position, c_type: &str) -> String {
        match types::resolve(c_type, self.st.defined()) {
            Ok(desc) => {
                if let TypeKind::Opaque(reason) = innermost(&desc.kind) {
                    ctx.report(types::opaque_type(pos, c_type, reason));
                }
                for pkg in desc.kind.packages() {
                    self.use_package(pkg);
                }
                desc.to_string()
            }
            Err(e) => {
                ctx.report(types::unresolved_type(pos, &e));
                "interface{}".into()
            }
        }
    }

    /// Resolve what a typedef chain stands for, without reporting anything.
    pub(crate) fn underlying(&self, c_type: &str) -> Option<TypeKind> {
        self.descriptor(&self.st.underlying(c_type)).map(|d| d.kind)
    }

    pub(crate) fn is_slice(&self, c_type: &str) -> bool {
        self.underlying(c_type).is_some_and(|k| k.is_slice())
    }

    pub(crate) fn is_reference(&self, c_type: &str) -> bool {
        self.underlying(c_type).is_some_and(|k| k.is_reference())
    }

    pub(crate) fn is_bool(&self, c_type: &str) -> bool {
        self.underlying(c_type).is_some_and(|k| k.is_bool())
    }

    pub(crate) fn is_byte_slice(&self, c_type: &str) -> bool {
        self.underlying(c_type).is_some_and(|k| k.is_byte_slice())
    }

    /// `c_type`, or what it points to when `through_pointer`, is a union
    /// with shared storage.
    pub(crate) fn is_shared_union(&self, c_type: &str, through_pointer: bool) -> bool {
        let mut t = self.st.underlying(c_type);
        if through_pointer {
            match t.strip_suffix('*') {
                Some(inner) => t = self.st.underlying(inner.trim_end()),
                None => return false,
            }
        }
        self.st.is_shared_union(&t)
    }

    /// Member of type `member_c_type` in the shared storage of `base`:
    /// `*(*T)(unsafe.Pointer(&base.memory))`.
    pub(crate) fn union_member(&mut self, ctx: &mut Context, pos: &Position, base: Expr, member_c_type: &str) -> Expr {
        let ty = self.go_type(ctx, pos, member_c_type);
        let memory = Expr::unary(UnOp::Addr, Expr::selector(base, UNION_STORAGE));
        let pointer = Expr::call(self.qualified("unsafe", "Pointer"), vec![memory]);
        Expr::unary(UnOp::Deref, Expr::conversion(&format!("*{}", ty), pointer))
    }

    /// Cast with a warning instead of a failure. The value is passed through
    /// unchanged when a type can't be resolved.
    pub(crate) fn cast(
        &mut self,
        ctx: &mut Context,
        pos: &Position,
        expr: Expr,
        from: &str,
        to: &str,
    ) -> Expr {
        match types::cast(&mut self.st, expr.clone(), from, to) {
            Ok(e) => e,
            Err(e) => {
                ctx.report(types::unresolved_type(pos, &e));
                expr
            }
        }
    }

    // ==== Imports ============================================================

    /// Record that the generated code refers to `pkg` and return its qualifier.
    pub(crate) fn use_package(&mut self, pkg: &str) -> String {
        let path = if RUNTIME_PACKAGES.contains(&pkg) {
            format!("{}/{}", self.runtime_root, pkg)
        } else {
            pkg.to_string()
        };
        self.imports.insert(path);
        pkg.rsplit('/').next().unwrap_or(pkg).to_string()
    }

    /// `pkg.name`, importing `pkg`.
    pub(crate) fn qualified(&mut self, pkg: &str, name: &str) -> Expr {
        let q = self.use_package(pkg);
        Expr::qualified(&q, name)
    }

    pub(crate) fn imports(&mut self) -> Vec<String> {
        if !self.st.helpers().is_empty() {
            self.use_package("noarch");
        }
        self.imports.iter().cloned().collect()
    }

    // ==== Functions ==========================================================

    pub(crate) fn enter_function(&mut self, info: FuncInfo) {
        self.func = Some(info);
        self.temps = 0;
    }

    pub(crate) fn leave_function(&mut self) {
        self.func = None;
    }

    pub(crate) fn function(&self) -> Option<&FuncInfo> {
        self.func.as_ref()
    }

    pub(crate) fn fresh_temp(&mut self) -> String {
        self.temps += 1;
        format!("ctogoTemp{}", self.temps)
    }

    /// Mark a function or global as emitted. Returns `false` if it already was.
    pub(crate) fn emit_once(&mut self, name: &str) -> bool {
        self.emitted.insert(name.to_string())
    }

    /// Returns `true` the first time a name is guessed.
    pub(crate) fn guess(&mut self, name: &str) -> bool {
        self.guessed.insert(name.to_string())
    }

    pub(crate) fn hoist(&mut self, decls: Vec<Decl>) {
        self.hoisted.extend(decls);
    }

    pub(crate) fn take_hoisted(&mut self) -> Vec<Decl> {
        std::mem::take(&mut self.hoisted)
    }
}

fn innermost(kind: &TypeKind) -> &TypeKind {
    match kind {
        TypeKind::Pointer(inner) | TypeKind::Slice(inner) | TypeKind::Array(inner, _) => {
            innermost(inner)
        }
        k => k,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::context::testing;

    fn env() -> Env {
        Env::new(SymTable::default(), "github.com/elliotchance/c2go/")
    }

    #[test]
    fn runtime_packages_are_rooted() {
        let mut env = env();
        assert_eq!(env.use_package("noarch"), "noarch");
        assert_eq!(env.use_package("math"), "math");
        assert_eq!(
            env.imports(),
            vec!["github.com/elliotchance/c2go/noarch", "math"]
        );
    }

    #[test]
    fn files_are_inherited() {
        let mut env = env();
        let first = Position::parse("t.c:3:1, line:5:1").unwrap();
        let next = Position::parse("line:7:2").unwrap();
        env.position(&first);
        assert_eq!(env.position(&next).file.as_deref(), Some("t.c"));
        let col = Position::parse("col:4").unwrap();
        assert_eq!(env.position(&col).line, 7);
    }

    #[test]
    fn unresolvable_types_warn() {
        let mut ctx = testing::context();
        let mut env = env();
        let pos = Position::empty();
        assert_eq!(env.go_type(&mut ctx, &pos, "mystery_t"), "interface{}");
        assert_eq!(env.go_type(&mut ctx, &pos, "int (*)(int)"), "interface{}");
        assert_eq!(env.go_type(&mut ctx, &pos, "FILE *"), "*noarch.File");
        assert_eq!(ctx.diagnostics().len(), 2);
        assert_eq!(env.imports(), vec!["github.com/elliotchance/c2go/noarch"]);
    }

    #[test]
    fn temps_restart_per_function() {
        let mut env = env();
        let info = FuncInfo {
            name: "f".into(),
            return_c_type: "int".into(),
            is_main: false,
        };
        env.enter_function(info.clone());
        assert_eq!(env.fresh_temp(), "ctogoTemp1");
        assert_eq!(env.fresh_temp(), "ctogoTemp2");
        env.enter_function(info);
        assert_eq!(env.fresh_temp(), "ctogoTemp1");
    }
}
