//! Construction of a single [Node] from one dump line.
//!
//! This never looks at other lines: children are attached later by
//! [super::build_tree].

use crate::{
    common::Position,
    ingest::{
        IngestionError,
        ast::{Address, DeclFlags, Node, NodeKind, QualType, RecordTag, StorageClass, TypeNodeKind},
        error::malformed,
        fields::Fields,
    },
};

/// Words clang prints between the location and the name of a declaration.
const DECL_FLAGS: [&str; 6] = ["implicit", "used", "referenced", "invalid", "constexpr", "Inherited"];

/// Parse a line stripped of its tree-drawing prefix.
pub(crate) fn parse_line(line: &str) -> Result<Node, IngestionError> {
    let (array_filler, text) = match line.strip_prefix("array_filler: ") {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    if text == "array filler" {
        return Ok(Node::new(
            Address::default(),
            Position::empty(),
            NodeKind::ArrayFiller,
        ));
    }
    if let Some(value) = text.strip_prefix("value: ") {
        return Ok(Node::new(
            Address::default(),
            Position::empty(),
            NodeKind::ConstantValue {
                text: value.trim().to_string(),
            },
        ));
    }

    let (kind, rest) = text.split_once(' ').unwrap_or((text, ""));
    let fields = Fields::new(rest).map_err(|reason| malformed(line, reason))?;
    let mut p = LineParser { line, f: fields };
    let address = p.f.address().map_err(|reason| malformed(line, reason))?;
    let (pos, kind) = p.parse_kind(kind)?;
    let mut node = Node::new(address, pos, kind);
    node.array_filler = array_filler;
    Ok(node)
}

struct LineParser<'a> {
    line: &'a str,
    f: Fields,
}

impl<'a> LineParser<'a> {
    fn err(&self, reason: &str) -> IngestionError {
        malformed(self.line, reason)
    }

    fn range(&mut self) -> Result<Position, IngestionError> {
        let text = self.f.range().ok_or_else(|| self.err("missing source range"))?;
        self.position(&text)
    }

    fn position(&self, text: &str) -> Result<Position, IngestionError> {
        Position::parse(text).map_err(|e| IngestionError::BadPosition {
            text: e.to_string(),
            line: self.line.to_string(),
        })
    }

    fn opt_range(&mut self) -> Result<Position, IngestionError> {
        match self.f.range() {
            Some(text) => self.position(&text),
            None => Ok(Position::empty()),
        }
    }

    fn ty(&mut self) -> Result<QualType, IngestionError> {
        self.f.qual_type().ok_or_else(|| self.err("missing type"))
    }

    fn quoted(&mut self, what: &str) -> Result<String, IngestionError> {
        self.f
            .quoted()
            .ok_or_else(|| self.err(&format!("missing {}", what)))
    }

    fn word(&mut self, what: &str) -> Result<String, IngestionError> {
        self.f
            .word()
            .ok_or_else(|| self.err(&format!("missing {}", what)))
    }

    /// Range, location, flags and name of a declaration.
    fn head_words(&mut self) -> Result<(Position, Vec<String>), IngestionError> {
        self.f.back_reference("prev");
        self.f.back_reference("parent");
        let pos = self.range()?;
        self.f.location();
        Ok((pos, self.f.leading_words()))
    }

    /// Head of a declaration which may be unnamed: a trailing flag word is a flag.
    fn decl_head(&mut self) -> Result<(Position, DeclFlags, Option<String>), IngestionError> {
        let (pos, mut words) = self.head_words()?;
        let name = match words.last() {
            Some(w) if !DECL_FLAGS.contains(&w.as_str()) => words.pop(),
            _ => None,
        };
        Ok((pos, decl_flags(&words), name))
    }

    /// Head of a declaration which always has a name: the last word.
    fn named_decl_head(&mut self) -> Result<(Position, DeclFlags, String), IngestionError> {
        let (pos, mut words) = self.head_words()?;
        let name = words.pop().ok_or_else(|| self.err("missing declaration name"))?;
        Ok((pos, decl_flags(&words), name))
    }

    fn storage(&mut self) -> Option<StorageClass> {
        if self.f.flag("extern") {
            Some(StorageClass::Extern)
        } else if self.f.flag("static") {
            Some(StorageClass::Static)
        } else {
            None
        }
    }

    /// Range and type shared by every expression, value category flags removed.
    fn expr_head(&mut self) -> Result<(Position, QualType), IngestionError> {
        let pos = self.range()?;
        let ty = self.ty()?;
        for flag in ["lvalue", "xvalue", "prvalue", "bitfield", "part_of_explicit_cast"] {
            self.f.flag(flag);
        }
        Ok((pos, ty))
    }

    fn parse_kind(&mut self, kind: &str) -> Result<(Position, NodeKind), IngestionError> {
        Ok(match kind {
            // ==== Declarations ==================================================
            "TranslationUnitDecl" => {
                let pos = self.range()?;
                (pos, NodeKind::TranslationUnitDecl)
            }
            "TypedefDecl" => {
                let (pos, flags, name) = self.named_decl_head()?;
                let ty = self.ty()?;
                (pos, NodeKind::TypedefDecl { name, ty, flags })
            }
            "RecordDecl" => {
                self.f.back_reference("prev");
                self.f.back_reference("parent");
                let pos = self.range()?;
                self.f.location();
                let words = self.f.leading_words();
                let tag_idx = words
                    .iter()
                    .position(|w| w == "struct" || w == "union")
                    .ok_or_else(|| self.err("missing struct/union keyword"))?;
                let flags = decl_flags(&words[..tag_idx]);
                let tag = if words[tag_idx] == "union" {
                    RecordTag::Union
                } else {
                    RecordTag::Struct
                };
                let name = words
                    .get(tag_idx + 1)
                    .filter(|w| *w != "definition")
                    .cloned();
                let definition = words.iter().any(|w| w == "definition");
                (
                    pos,
                    NodeKind::RecordDecl {
                        tag,
                        name,
                        definition,
                        flags,
                    },
                )
            }
            "FieldDecl" => {
                let (pos, flags, name) = self.decl_head()?;
                let ty = self.ty()?;
                (pos, NodeKind::FieldDecl { name, ty, flags })
            }
            "IndirectFieldDecl" => {
                let (pos, _, name) = self.named_decl_head()?;
                let ty = self.ty()?;
                (pos, NodeKind::IndirectFieldDecl { name, ty })
            }
            "VarDecl" => {
                let (pos, flags, name) = self.named_decl_head()?;
                let ty = self.ty()?;
                let storage = self.storage();
                let has_init =
                    self.f.flag("cinit") | self.f.flag("callinit") | self.f.flag("listinit");
                (
                    pos,
                    NodeKind::VarDecl {
                        name,
                        ty,
                        storage,
                        has_init,
                        flags,
                    },
                )
            }
            "ParmVarDecl" => {
                let (pos, flags, name) = self.decl_head()?;
                let ty = self.ty()?;
                (pos, NodeKind::ParmVarDecl { name, ty, flags })
            }
            "FunctionDecl" => {
                let (pos, flags, name) = self.named_decl_head()?;
                let ty = self.ty()?;
                let storage = self.storage();
                let inline = self.f.flag("inline");
                (
                    pos,
                    NodeKind::FunctionDecl {
                        name,
                        ty,
                        storage,
                        inline,
                        flags,
                    },
                )
            }
            "EnumDecl" => {
                let (pos, _, name) = self.decl_head()?;
                (pos, NodeKind::EnumDecl { name })
            }
            "EnumConstantDecl" => {
                let (pos, _, name) = self.named_decl_head()?;
                let ty = self.ty()?;
                (pos, NodeKind::EnumConstantDecl { name, ty })
            }
            "EmptyDecl" => {
                let pos = self.range()?;
                (pos, NodeKind::EmptyDecl)
            }

            // ==== Statements ====================================================
            "CompoundStmt" => (self.range()?, NodeKind::CompoundStmt),
            "DeclStmt" => (self.range()?, NodeKind::DeclStmt),
            "IfStmt" => {
                let pos = self.range()?;
                let has_init = self.f.flag("has_init");
                let has_var = self.f.flag("has_var");
                let has_else = self.f.flag("has_else");
                (
                    pos,
                    NodeKind::IfStmt {
                        has_init,
                        has_var,
                        has_else,
                    },
                )
            }
            "ForStmt" => (self.range()?, NodeKind::ForStmt),
            "WhileStmt" => {
                let pos = self.range()?;
                let has_var = self.f.flag("has_var");
                (pos, NodeKind::WhileStmt { has_var })
            }
            "DoStmt" => (self.range()?, NodeKind::DoStmt),
            "SwitchStmt" => {
                let pos = self.range()?;
                let has_init = self.f.flag("has_init");
                let has_var = self.f.flag("has_var");
                (pos, NodeKind::SwitchStmt { has_init, has_var })
            }
            "CaseStmt" => (self.range()?, NodeKind::CaseStmt),
            "DefaultStmt" => (self.range()?, NodeKind::DefaultStmt),
            "BreakStmt" => (self.range()?, NodeKind::BreakStmt),
            "ContinueStmt" => (self.range()?, NodeKind::ContinueStmt),
            "ReturnStmt" => (self.range()?, NodeKind::ReturnStmt),
            "LabelStmt" => {
                let pos = self.range()?;
                let name = self.quoted("label name")?;
                (pos, NodeKind::LabelStmt { name })
            }
            "GotoStmt" => {
                let pos = self.range()?;
                let label = self.quoted("label name")?;
                (pos, NodeKind::GotoStmt { label })
            }
            "NullStmt" => (self.opt_range()?, NodeKind::NullStmt),
            "GCCAsmStmt" => (self.range()?, NodeKind::GCCAsmStmt),

            // ==== Expressions ===================================================
            "BinaryOperator" => {
                let (pos, ty) = self.expr_head()?;
                let op = self.quoted("operator")?;
                (pos, NodeKind::BinaryOperator { ty, op })
            }
            "CompoundAssignOperator" => {
                let (pos, ty) = self.expr_head()?;
                let op = self.quoted("operator")?;
                let lhs_ty = self.f.keyed("ComputeLHSTy");
                let result_ty = self.f.keyed("ComputeResultTy");
                (
                    pos,
                    NodeKind::CompoundAssignOperator {
                        ty,
                        op,
                        lhs_ty,
                        result_ty,
                    },
                )
            }
            "UnaryOperator" => {
                let (pos, ty) = self.expr_head()?;
                let postfix = self.f.flag("postfix");
                self.f.flag("prefix");
                let op = self.quoted("operator")?;
                (pos, NodeKind::UnaryOperator { ty, op, postfix })
            }
            "ImplicitCastExpr" | "CStyleCastExpr" => {
                let (pos, ty) = self.expr_head()?;
                let cast = self
                    .f
                    .angle()
                    .ok_or_else(|| self.err("missing cast kind"))?;
                let node = if kind == "ImplicitCastExpr" {
                    NodeKind::ImplicitCastExpr { ty, cast }
                } else {
                    NodeKind::CStyleCastExpr { ty, cast }
                };
                (pos, node)
            }
            "DeclRefExpr" => {
                let pos = self.range()?;
                let ty = self.ty()?;
                let lvalue = self.f.flag("lvalue");
                let decl_kind = self.word("referenced declaration kind")?;
                // address of the referenced declaration
                self.f.word();
                let name = self.quoted("referenced name")?;
                (
                    pos,
                    NodeKind::DeclRefExpr {
                        ty,
                        decl_kind,
                        name,
                        lvalue,
                    },
                )
            }
            "MemberExpr" => {
                let (pos, ty) = self.expr_head()?;
                let member = self.word("member name")?;
                let (arrow, name) = if let Some(name) = member.strip_prefix("->") {
                    (true, name.to_string())
                } else if let Some(name) = member.strip_prefix('.') {
                    (false, name.to_string())
                } else {
                    return Err(self.err("member name must start with `.` or `->`"));
                };
                (pos, NodeKind::MemberExpr { ty, name, arrow })
            }
            "IntegerLiteral" => {
                let (pos, ty) = self.expr_head()?;
                let value = self.word("integer value")?;
                (pos, NodeKind::IntegerLiteral { ty, value })
            }
            "FloatingLiteral" => {
                let (pos, ty) = self.expr_head()?;
                let value = self.word("floating value")?;
                (pos, NodeKind::FloatingLiteral { ty, value })
            }
            "CharacterLiteral" => {
                let (pos, ty) = self.expr_head()?;
                let value = self
                    .word("character value")?
                    .parse()
                    .map_err(|_| self.err("character value is not a number"))?;
                (pos, NodeKind::CharacterLiteral { ty, value })
            }
            "StringLiteral" => {
                let (pos, ty) = self.expr_head()?;
                let value = self
                    .f
                    .string()
                    .ok_or_else(|| self.err("missing string value"))?;
                (pos, NodeKind::StringLiteral { ty, value })
            }
            "PredefinedExpr" => {
                let (pos, ty) = self.expr_head()?;
                let name = self.word("predefined name")?;
                (pos, NodeKind::PredefinedExpr { ty, name })
            }
            "UnaryExprOrTypeTraitExpr" => {
                let (pos, ty) = self.expr_head()?;
                let trait_name = self.word("trait name")?;
                let arg_ty = self.f.qual_type();
                (
                    pos,
                    NodeKind::UnaryExprOrTypeTraitExpr {
                        ty,
                        trait_name,
                        arg_ty,
                    },
                )
            }
            "ArraySubscriptExpr" => self.typed(|ty| NodeKind::ArraySubscriptExpr { ty })?,
            "ParenExpr" => self.typed(|ty| NodeKind::ParenExpr { ty })?,
            "ConditionalOperator" => self.typed(|ty| NodeKind::ConditionalOperator { ty })?,
            "BinaryConditionalOperator" => {
                self.typed(|ty| NodeKind::BinaryConditionalOperator { ty })?
            }
            "CallExpr" => self.typed(|ty| NodeKind::CallExpr { ty })?,
            "InitListExpr" => self.typed(|ty| NodeKind::InitListExpr { ty })?,
            "ImplicitValueInitExpr" => self.typed(|ty| NodeKind::ImplicitValueInitExpr { ty })?,
            "CompoundLiteralExpr" => self.typed(|ty| NodeKind::CompoundLiteralExpr { ty })?,
            "StmtExpr" => self.typed(|ty| NodeKind::StmtExpr { ty })?,
            "VAArgExpr" => self.typed(|ty| NodeKind::VAArgExpr { ty })?,
            "OffsetOfExpr" => self.typed(|ty| NodeKind::OffsetOfExpr { ty })?,
            "ConstantExpr" => self.typed(|ty| NodeKind::ConstantExpr { ty })?,
            "OpaqueValueExpr" => self.typed(|ty| NodeKind::OpaqueValueExpr { ty })?,

            // ==== Types, attributes, comments ===================================
            _ if TypeNodeKind::from_name(kind).is_some() => {
                let type_kind = TypeNodeKind::from_name(kind)
                    .ok_or_else(|| self.err("unknown type node"))?;
                let ty = self.ty()?;
                let extra = self.f.take_rest();
                (
                    Position::empty(),
                    NodeKind::Type {
                        kind: type_kind,
                        ty,
                        extra,
                    },
                )
            }
            _ if kind.ends_with("Attr") => {
                let pos = self.opt_range()?;
                let flags = DeclFlags {
                    inherited: self.f.flag("Inherited"),
                    implicit: self.f.flag("Implicit"),
                    ..DeclFlags::default()
                };
                let args = self.f.take_rest();
                (
                    pos,
                    NodeKind::Attribute {
                        name: kind.to_string(),
                        flags,
                        args,
                    },
                )
            }
            _ if kind.ends_with("Comment") => {
                let pos = self.opt_range()?;
                let text = self.f.keyed("Text");
                let args = self.f.take_rest();
                (
                    pos,
                    NodeKind::Comment {
                        kind: kind.to_string(),
                        text,
                        args,
                    },
                )
            }
            _ => {
                return Err(IngestionError::UnknownKind {
                    line: self.line.to_string(),
                });
            }
        })
    }

    fn typed(
        &mut self,
        make: impl FnOnce(QualType) -> NodeKind,
    ) -> Result<(Position, NodeKind), IngestionError> {
        let (pos, ty) = self.expr_head()?;
        Ok((pos, make(ty)))
    }
}

/// Flags printed ahead of a declaration's name.
fn decl_flags(words: &[String]) -> DeclFlags {
    let mut flags = DeclFlags::default();
    for w in words {
        match w.as_str() {
            "implicit" => flags.implicit = true,
            "used" => flags.used = true,
            "referenced" => flags.referenced = true,
            "Inherited" => flags.inherited = true,
            _ => (),
        }
    }
    flags
}
