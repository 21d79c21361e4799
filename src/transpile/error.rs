use thiserror::Error;

use crate::{
    common::Position,
    error::diagnostic::{Diagnostic, DiagnosticKind, Label},
    types::{SizeError, TypeError},
};

/// A construct that can't be lowered. The enclosing top-level declaration is
/// replaced by a placeholder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranspileError {
    #[error("{kind} has {found} children, expected {expected}")]
    ChildArity {
        kind: String,
        expected: String,
        found: usize,
    },
    #[error("cannot find the function called through {kind}")]
    UnwrappableCallee { kind: String },
    #[error("{0} is not supported")]
    Unsupported(String),
    #[error("{kind} outside of a switch")]
    CaseOutsideSwitch { kind: String },
}

/// Failure while lowering one statement. Type and size problems only
/// replace the statement, anything else escalates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StmtError {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Size(#[from] SizeError),
    #[error(transparent)]
    Transpile(#[from] TranspileError),
}

pub(crate) fn arity(kind: &str, expected: &str, found: usize) -> TranspileError {
    TranspileError::ChildArity {
        kind: kind.to_string(),
        expected: expected.to_string(),
        found,
    }
}

/// Text of a placeholder comment.
pub(crate) fn placeholder(kind: &str, pos: &Position, err: &dyn std::fmt::Display) -> String {
    format!("ctogo: {} at {}: {}", kind, pos, err)
}

pub(crate) fn declaration_dropped(pos: &Position, kind: &str, err: &TranspileError) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::Transpile, pos, err.to_string())
        .with_label(Label::new(pos).with_msg(format!("this {} was replaced by a comment", kind)))
}

pub(crate) fn statement_dropped(pos: &Position, kind: &str, err: &StmtError) -> Diagnostic {
    let diag_kind = match err {
        StmtError::Type(_) => DiagnosticKind::Type,
        StmtError::Size(_) => DiagnosticKind::Size,
        StmtError::Transpile(_) => DiagnosticKind::Transpile,
    };
    Diagnostic::error(diag_kind, pos, err.to_string())
        .with_label(Label::new(pos).with_msg(format!("this {} was replaced by a comment", kind)))
}

pub(crate) fn union_storage(pos: &Position, name: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::Approximation,
        pos,
        format!("union `{}` is translated to a struct", name),
    )
    .with_note("a member holds pointers, so the members do not share storage".to_string())
}

pub(crate) fn unreachable_in_switch(pos: &Position, kind: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::Approximation,
        pos,
        format!("{} before the first case of a switch is skipped", kind),
    )
    .with_note("it can never run".to_string())
}

pub(crate) fn asm_skipped(pos: &Position) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::Approximation,
        pos,
        "inline assembly is skipped".to_string(),
    )
}

pub(crate) fn unknown_function(pos: &Position, name: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::Approximation,
        pos,
        format!("`{}` is called before it is declared", name),
    )
    .with_note("its signature was guessed from the arguments".to_string())
}
