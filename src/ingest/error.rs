use thiserror::Error;

/// Problems with the dump itself. Any of these aborts the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestionError {
    #[error("unknown node kind in line:\n  {line}")]
    UnknownKind { line: String },
    #[error("malformed line ({reason}):\n  {line}")]
    Malformed { line: String, reason: String },
    #[error("{text} in line:\n  {line}")]
    BadPosition { text: String, line: String },
    #[error("node is deeper than its parent allows:\n  {line}")]
    MisplacedNode { line: String },
    #[error("expected exactly one root node, found {found}")]
    RootCount { found: usize },
    #[error("root node is {kind}, expected TranslationUnitDecl")]
    NotTranslationUnit { kind: String },
}

pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> IngestionError {
    IngestionError::Malformed {
        line: line.to_string(),
        reason: reason.into(),
    }
}
