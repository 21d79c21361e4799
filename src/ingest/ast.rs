use std::fmt::Display;

use crate::common::Position;

/// Hex identity of a node as printed by clang.
///
/// Only used to recognize repeated declarations, never to link nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A C type as printed by clang: `'size_t':'unsigned long'`.
///
/// `desugared` is the canonical type when clang printed a sugar pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualType {
    pub ty: String,
    pub desugared: Option<String>,
}

impl QualType {
    pub fn new(ty: &str) -> Self {
        Self {
            ty: ty.to_string(),
            desugared: None,
        }
    }

    /// The canonical spelling, falling back to the sugared one.
    pub fn canonical(&self) -> &str {
        self.desugared.as_deref().unwrap_or(&self.ty)
    }
}

impl Display for QualType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.desugared {
            Some(d) => write!(f, "'{}':'{}'", self.ty, d),
            None => write!(f, "'{}'", self.ty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTag {
    Struct,
    Union,
}

impl Display for RecordTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordTag::Struct => write!(f, "struct"),
            RecordTag::Union => write!(f, "union"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Extern,
    Static,
}

/// Boolean markers clang prints after the position of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclFlags {
    pub implicit: bool,
    pub used: bool,
    pub referenced: bool,
    pub inherited: bool,
}

/// One node of the clang AST.
///
/// `children` keeps dump order, which carries meaning for most kinds
/// (operands, branches, loop clauses).
#[derive(Debug, Clone)]
pub struct Node {
    pub address: Address,
    pub pos: Position,
    pub kind: NodeKind,
    /// Printed as `array_filler: <Kind>`, the value fills the remaining array slots.
    pub array_filler: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(address: Address, pos: Position, kind: NodeKind) -> Self {
        Self {
            address,
            pos,
            kind,
            array_filler: false,
            children: vec![],
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn position(&self) -> &Position {
        &self.pos
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn add_child(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Name of the kind as clang prints it.
    pub fn kind_name(&self) -> &str {
        self.kind.name()
    }

    /// Type of an expression node.
    pub fn expr_type(&self) -> Option<&QualType> {
        self.kind.expr_type()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::NullStmt)
    }
}

/// Every kind of node the ingestion accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ==== Declarations =======================================================
    TranslationUnitDecl,
    TypedefDecl {
        name: String,
        ty: QualType,
        flags: DeclFlags,
    },
    /// `struct Foo { ... }`, the name is absent for anonymous records.
    RecordDecl {
        tag: RecordTag,
        name: Option<String>,
        definition: bool,
        flags: DeclFlags,
    },
    FieldDecl {
        name: Option<String>,
        ty: QualType,
        flags: DeclFlags,
    },
    IndirectFieldDecl {
        name: String,
        ty: QualType,
    },
    VarDecl {
        name: String,
        ty: QualType,
        storage: Option<StorageClass>,
        /// `cinit`, `callinit` or `listinit`: the last child is the initializer.
        has_init: bool,
        flags: DeclFlags,
    },
    ParmVarDecl {
        name: Option<String>,
        ty: QualType,
        flags: DeclFlags,
    },
    FunctionDecl {
        name: String,
        ty: QualType,
        storage: Option<StorageClass>,
        inline: bool,
        flags: DeclFlags,
    },
    EnumDecl {
        name: Option<String>,
    },
    EnumConstantDecl {
        name: String,
        ty: QualType,
    },
    EmptyDecl,

    // ==== Statements =========================================================
    CompoundStmt,
    DeclStmt,
    /// Children: `[init] [condition variable] cond then [else]`, older
    /// dumps always print 4 or 5 children with placeholders.
    IfStmt {
        has_init: bool,
        has_var: bool,
        has_else: bool,
    },
    /// Children: init, condition variable, cond, inc, body.
    ForStmt,
    WhileStmt {
        has_var: bool,
    },
    /// Children: body, cond.
    DoStmt,
    SwitchStmt {
        has_init: bool,
        has_var: bool,
    },
    CaseStmt,
    DefaultStmt,
    BreakStmt,
    ContinueStmt,
    ReturnStmt,
    LabelStmt {
        name: String,
    },
    GotoStmt {
        label: String,
    },
    /// Also stands for clang's `<<<NULL>>>` sentinel.
    NullStmt,
    GCCAsmStmt,

    // ==== Expressions ========================================================
    BinaryOperator {
        ty: QualType,
        op: String,
    },
    CompoundAssignOperator {
        ty: QualType,
        op: String,
        lhs_ty: Option<String>,
        result_ty: Option<String>,
    },
    UnaryOperator {
        ty: QualType,
        op: String,
        postfix: bool,
    },
    ImplicitCastExpr {
        ty: QualType,
        cast: String,
    },
    CStyleCastExpr {
        ty: QualType,
        cast: String,
    },
    /// `Var 0x.. 'x' 'int'`: `decl_kind` is `Var`, `Function`, `EnumConstant`, ...
    DeclRefExpr {
        ty: QualType,
        decl_kind: String,
        name: String,
        lvalue: bool,
    },
    MemberExpr {
        ty: QualType,
        name: String,
        arrow: bool,
    },
    ArraySubscriptExpr {
        ty: QualType,
    },
    ParenExpr {
        ty: QualType,
    },
    ConditionalOperator {
        ty: QualType,
    },
    /// GNU `a ?: b`.
    BinaryConditionalOperator {
        ty: QualType,
    },
    CallExpr {
        ty: QualType,
    },
    IntegerLiteral {
        ty: QualType,
        value: String,
    },
    FloatingLiteral {
        ty: QualType,
        value: String,
    },
    CharacterLiteral {
        ty: QualType,
        value: i64,
    },
    /// The value keeps C escapes as printed by clang.
    StringLiteral {
        ty: QualType,
        value: String,
    },
    PredefinedExpr {
        ty: QualType,
        name: String,
    },
    /// `sizeof`/`alignof`, with an argument type or an expression child.
    UnaryExprOrTypeTraitExpr {
        ty: QualType,
        trait_name: String,
        arg_ty: Option<QualType>,
    },
    InitListExpr {
        ty: QualType,
    },
    ImplicitValueInitExpr {
        ty: QualType,
    },
    CompoundLiteralExpr {
        ty: QualType,
    },
    StmtExpr {
        ty: QualType,
    },
    VAArgExpr {
        ty: QualType,
    },
    OffsetOfExpr {
        ty: QualType,
    },
    ConstantExpr {
        ty: QualType,
    },
    /// Shared operand of GNU `a ?: b`, printed again under the operator.
    OpaqueValueExpr {
        ty: QualType,
    },
    /// Older dumps print `array filler` followed by the filler values.
    ArrayFiller,
    /// `value: Int 3` printed under a `ConstantExpr`.
    ConstantValue {
        text: String,
    },

    // ==== Types ==============================================================
    Type {
        kind: TypeNodeKind,
        ty: QualType,
        extra: Vec<String>,
    },

    // ==== Attributes and comments ============================================
    /// Any `*Attr` line. Attributes don't influence translation.
    Attribute {
        name: String,
        flags: DeclFlags,
        args: Vec<String>,
    },
    /// Any `*Comment` line.
    Comment {
        kind: String,
        text: Option<String>,
        args: Vec<String>,
    },
}

/// Type nodes clang prints under declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNodeKind {
    Builtin,
    Pointer,
    Record,
    Elaborated,
    Typedef,
    Enum,
    Paren,
    Decayed,
    Qualified,
    ConstantArray,
    IncompleteArray,
    FunctionProto,
    FunctionNoProto,
    Attributed,
    /// `Record 0x.. 'Foo'` back-reference.
    RecordRef,
    TypedefRef,
    EnumRef,
    FieldRef,
}

impl TypeNodeKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "BuiltinType" => TypeNodeKind::Builtin,
            "PointerType" => TypeNodeKind::Pointer,
            "RecordType" => TypeNodeKind::Record,
            "ElaboratedType" => TypeNodeKind::Elaborated,
            "TypedefType" => TypeNodeKind::Typedef,
            "EnumType" => TypeNodeKind::Enum,
            "ParenType" => TypeNodeKind::Paren,
            "DecayedType" => TypeNodeKind::Decayed,
            "QualType" => TypeNodeKind::Qualified,
            "ConstantArrayType" => TypeNodeKind::ConstantArray,
            "IncompleteArrayType" => TypeNodeKind::IncompleteArray,
            "FunctionProtoType" => TypeNodeKind::FunctionProto,
            "FunctionNoProtoType" => TypeNodeKind::FunctionNoProto,
            "AttributedType" => TypeNodeKind::Attributed,
            "Record" => TypeNodeKind::RecordRef,
            "Typedef" => TypeNodeKind::TypedefRef,
            "Enum" => TypeNodeKind::EnumRef,
            "Field" => TypeNodeKind::FieldRef,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeNodeKind::Builtin => "BuiltinType",
            TypeNodeKind::Pointer => "PointerType",
            TypeNodeKind::Record => "RecordType",
            TypeNodeKind::Elaborated => "ElaboratedType",
            TypeNodeKind::Typedef => "TypedefType",
            TypeNodeKind::Enum => "EnumType",
            TypeNodeKind::Paren => "ParenType",
            TypeNodeKind::Decayed => "DecayedType",
            TypeNodeKind::Qualified => "QualType",
            TypeNodeKind::ConstantArray => "ConstantArrayType",
            TypeNodeKind::IncompleteArray => "IncompleteArrayType",
            TypeNodeKind::FunctionProto => "FunctionProtoType",
            TypeNodeKind::FunctionNoProto => "FunctionNoProtoType",
            TypeNodeKind::Attributed => "AttributedType",
            TypeNodeKind::RecordRef => "Record",
            TypeNodeKind::TypedefRef => "Typedef",
            TypeNodeKind::EnumRef => "Enum",
            TypeNodeKind::FieldRef => "Field",
        }
    }
}

impl NodeKind {
    pub fn name(&self) -> &str {
        match self {
            NodeKind::TranslationUnitDecl => "TranslationUnitDecl",
            NodeKind::TypedefDecl { .. } => "TypedefDecl",
            NodeKind::RecordDecl { .. } => "RecordDecl",
            NodeKind::FieldDecl { .. } => "FieldDecl",
            NodeKind::IndirectFieldDecl { .. } => "IndirectFieldDecl",
            NodeKind::VarDecl { .. } => "VarDecl",
            NodeKind::ParmVarDecl { .. } => "ParmVarDecl",
            NodeKind::FunctionDecl { .. } => "FunctionDecl",
            NodeKind::EnumDecl { .. } => "EnumDecl",
            NodeKind::EnumConstantDecl { .. } => "EnumConstantDecl",
            NodeKind::EmptyDecl => "EmptyDecl",
            NodeKind::CompoundStmt => "CompoundStmt",
            NodeKind::DeclStmt => "DeclStmt",
            NodeKind::IfStmt { .. } => "IfStmt",
            NodeKind::ForStmt => "ForStmt",
            NodeKind::WhileStmt { .. } => "WhileStmt",
            NodeKind::DoStmt => "DoStmt",
            NodeKind::SwitchStmt { .. } => "SwitchStmt",
            NodeKind::CaseStmt => "CaseStmt",
            NodeKind::DefaultStmt => "DefaultStmt",
            NodeKind::BreakStmt => "BreakStmt",
            NodeKind::ContinueStmt => "ContinueStmt",
            NodeKind::ReturnStmt => "ReturnStmt",
            NodeKind::LabelStmt { .. } => "LabelStmt",
            NodeKind::GotoStmt { .. } => "GotoStmt",
            NodeKind::NullStmt => "NullStmt",
            NodeKind::GCCAsmStmt => "GCCAsmStmt",
            NodeKind::BinaryOperator { .. } => "BinaryOperator",
            NodeKind::CompoundAssignOperator { .. } => "CompoundAssignOperator",
            NodeKind::UnaryOperator { .. } => "UnaryOperator",
            NodeKind::ImplicitCastExpr { .. } => "ImplicitCastExpr",
            NodeKind::CStyleCastExpr { .. } => "CStyleCastExpr",
            NodeKind::DeclRefExpr { .. } => "DeclRefExpr",
            NodeKind::MemberExpr { .. } => "MemberExpr",
            NodeKind::ArraySubscriptExpr { .. } => "ArraySubscriptExpr",
            NodeKind::ParenExpr { .. } => "ParenExpr",
            NodeKind::ConditionalOperator { .. } => "ConditionalOperator",
            NodeKind::BinaryConditionalOperator { .. } => "BinaryConditionalOperator",
            NodeKind::CallExpr { .. } => "CallExpr",
            NodeKind::IntegerLiteral { .. } => "IntegerLiteral",
            NodeKind::FloatingLiteral { .. } => "FloatingLiteral",
            NodeKind::CharacterLiteral { .. } => "CharacterLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::PredefinedExpr { .. } => "PredefinedExpr",
            NodeKind::UnaryExprOrTypeTraitExpr { .. } => "UnaryExprOrTypeTraitExpr",
            NodeKind::InitListExpr { .. } => "InitListExpr",
            NodeKind::ImplicitValueInitExpr { .. } => "ImplicitValueInitExpr",
            NodeKind::CompoundLiteralExpr { .. } => "CompoundLiteralExpr",
            NodeKind::StmtExpr { .. } => "StmtExpr",
            NodeKind::VAArgExpr { .. } => "VAArgExpr",
            NodeKind::OffsetOfExpr { .. } => "OffsetOfExpr",
            NodeKind::ConstantExpr { .. } => "ConstantExpr",
            NodeKind::OpaqueValueExpr { .. } => "OpaqueValueExpr",
            NodeKind::ArrayFiller => "array filler",
            NodeKind::ConstantValue { .. } => "value",
            NodeKind::Type { kind, .. } => kind.name(),
            NodeKind::Attribute { name, .. } => name,
            NodeKind::Comment { kind, .. } => kind,
        }
    }

    /// Type of an expression kind, `None` for everything else.
    pub fn expr_type(&self) -> Option<&QualType> {
        match self {
            NodeKind::BinaryOperator { ty, .. }
            | NodeKind::CompoundAssignOperator { ty, .. }
            | NodeKind::UnaryOperator { ty, .. }
            | NodeKind::ImplicitCastExpr { ty, .. }
            | NodeKind::CStyleCastExpr { ty, .. }
            | NodeKind::DeclRefExpr { ty, .. }
            | NodeKind::MemberExpr { ty, .. }
            | NodeKind::ArraySubscriptExpr { ty }
            | NodeKind::ParenExpr { ty }
            | NodeKind::ConditionalOperator { ty }
            | NodeKind::BinaryConditionalOperator { ty }
            | NodeKind::CallExpr { ty }
            | NodeKind::IntegerLiteral { ty, .. }
            | NodeKind::FloatingLiteral { ty, .. }
            | NodeKind::CharacterLiteral { ty, .. }
            | NodeKind::StringLiteral { ty, .. }
            | NodeKind::PredefinedExpr { ty, .. }
            | NodeKind::UnaryExprOrTypeTraitExpr { ty, .. }
            | NodeKind::InitListExpr { ty }
            | NodeKind::ImplicitValueInitExpr { ty }
            | NodeKind::CompoundLiteralExpr { ty }
            | NodeKind::StmtExpr { ty }
            | NodeKind::VAArgExpr { ty }
            | NodeKind::OffsetOfExpr { ty }
            | NodeKind::ConstantExpr { ty }
            | NodeKind::OpaqueValueExpr { ty } => Some(ty),
            _ => None,
        }
    }

    /// Nodes which never produce output: types, attributes and comments.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            NodeKind::Type { .. } | NodeKind::Attribute { .. } | NodeKind::Comment { .. }
        )
    }
}
