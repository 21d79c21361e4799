use thiserror::Error;

use crate::{
    common::Position,
    error::diagnostic::{Diagnostic, DiagnosticKind, Label},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot resolve type `{raw}`: {reason}")]
pub struct TypeError {
    pub raw: String,
    pub reason: String,
}

impl TypeError {
    pub(crate) fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SizeError {
    #[error("sizeof `{0}`: record has no registered fields")]
    UnregisteredRecord(String),
    #[error("sizeof `{0}`: array without a length")]
    IncompleteArray(String),
    #[error("sizeof `{0}`: unknown type")]
    Unknown(String),
    #[error("sizeof `{0}`: size does not fit in memory")]
    Overflow(String),
}

pub(crate) fn unresolved_type(pos: &Position, err: &TypeError) -> Diagnostic {
    Diagnostic::warning(DiagnosticKind::Type, pos, err.to_string())
        .with_label(Label::new(pos).with_msg(format!("`{}` is used as interface{{}}", err.raw)))
}

pub(crate) fn opaque_type(pos: &Position, raw: &str, reason: &str) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::Approximation,
        pos,
        format!("`{}` is not supported ({}), using interface{{}}", raw, reason),
    )
}

pub(crate) fn unknown_size(pos: &Position, err: &SizeError) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::Size, pos, err.to_string())
}
