use std::fmt::Display;

use colored::Color;

use crate::common::{Position, sources::SourceMap};

/// Severity of a diagnostic.
///
/// Diagnostics never abort translation, an error only means that part of
/// the output was replaced by a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// What kind of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A C type string could not be resolved.
    Type,
    /// `sizeof` could not be computed.
    Size,
    /// A node could not be lowered.
    Transpile,
    /// A construct which is accepted but only approximated.
    Approximation,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiagnosticKind::Type => "type",
            DiagnosticKind::Size => "sizeof",
            DiagnosticKind::Transpile => "transpile",
            DiagnosticKind::Approximation => "approximation",
        };
        write!(f, "{}", s)
    }
}

/// Represents a translation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub pos: Position,
}

impl Diagnostic {
    pub(crate) fn error(kind: DiagnosticKind, pos: &Position, message: String) -> Diagnostic {
        Self {
            severity: Severity::Error,
            kind,
            message,
            pos: pos.clone(),
            labels: vec![],
            notes: vec![],
        }
    }

    pub(crate) fn warning(kind: DiagnosticKind, pos: &Position, message: String) -> Diagnostic {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, pos, message)
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub(crate) fn with_note(mut self, note: String) -> Diagnostic {
        self.notes.push(note);
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.pos, self.kind, self.message)
    }
}

/// Label included with a diagnostic.
#[derive(Debug, Clone)]
pub struct Label {
    pub pos: Position,
    pub msg: String,
    pub color: Color,
}

impl Label {
    pub fn new(pos: &Position) -> Self {
        Label {
            pos: pos.clone(),
            msg: "<no message for this diagnostic>".into(),
            color: colored::Color::Red,
        }
    }

    pub fn with_msg(mut self, msg: String) -> Self {
        self.msg = msg;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Implementors of this trait can be used as diagnostic sinks.
pub trait DiagnosticRenderer: Send + Sync + std::fmt::Debug {
    /// Show the diagnostic.
    fn show(&self, diag: &Diagnostic, sources: &SourceMap) -> std::io::Result<()>;
}
