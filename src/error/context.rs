use std::sync::Arc;

use crate::{
    common::sources::SourceMap,
    error::{
        InternalError,
        diagnostic::{Diagnostic, DiagnosticRenderer, Severity},
    },
};

/// Represents context of one translation run.
#[derive(Debug)]
pub struct Context {
    renderer: Box<dyn DiagnosticRenderer>,
    diagnostics: Vec<Diagnostic>,
    sources: SourceMap,
}

impl Context {
    /// Create a new context.
    pub(crate) fn init(renderer: Box<dyn DiagnosticRenderer>) -> Self {
        Self {
            renderer,
            diagnostics: vec![],
            sources: SourceMap::new(),
        }
    }

    /// Print all diagnostics using provided renderer and destroy context.
    pub(crate) fn finish(self) -> Result<(), InternalError> {
        for diag in &self.diagnostics {
            self.renderer
                .show(diag, &self.sources)
                .map_err(InternalError::Render)?
        }
        Ok(())
    }

    /// Add a diagnostic to this context.
    pub(crate) fn report(&mut self, diag: Diagnostic) {
        log::debug!("diagnostic: {}", diag);
        self.diagnostics.push(diag);
    }

    /// All diagnostics reported so far, in order.
    pub(crate) fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Add source.
    pub(crate) fn add_source(&mut self, filename: Arc<str>, source: String) {
        self.sources.add(filename, source);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::common::sources::SourceMap;

    /// Renderer which drops everything, for tests which only inspect [Context::diagnostics].
    #[derive(Debug)]
    pub struct Silent;

    impl DiagnosticRenderer for Silent {
        fn show(&self, _: &Diagnostic, _: &SourceMap) -> std::io::Result<()> {
            Ok(())
        }
    }

    pub fn context() -> Context {
        Context::init(Box::new(Silent))
    }
}
