use std::path::PathBuf;

use thiserror::Error;

use crate::ingest::IngestionError;

pub mod ariadne_renderer;
pub mod context;
pub mod diagnostic;

/// Errors which abort the whole run.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("input file `{}` does not exist", .0.display())]
    MissingInput(PathBuf),
    #[error("`{command}` failed:\n{stderr}")]
    Compiler { command: String, stderr: String },
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error("failed to show diagnostic: {0}")]
    Render(std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
