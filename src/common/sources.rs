use std::{collections::BTreeMap, ops::Range, sync::Arc};

use ariadne::Source;

use crate::common::Position;

/// Source texts of the files a dump refers to, keyed by the file name used in positions.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    map: BTreeMap<Arc<str>, Source>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Register a file. Registering the same name again replaces the text.
    pub fn add(&mut self, filename: Arc<str>, source: String) {
        let source = Source::from(source);
        if self.map.insert(filename.clone(), source).is_some() {
            log::debug!("source of {} registered twice, keeping the latest", filename);
        }
    }

    pub fn get(&self, filename: &str) -> Option<&Source> {
        self.map.get(filename)
    }

    /// Convert line/column coordinates into a character range of the file.
    pub fn span_of(&self, pos: &Position) -> Option<(Arc<str>, Range<usize>)> {
        let file = pos.file.as_ref()?;
        let source = self.map.get(&**file)?;
        let line = source.line(pos.line.checked_sub(1)?)?;
        let start = line.offset() + pos.column.saturating_sub(1).min(line.len());
        let end = if pos.line_end == 0 && pos.column_end != 0 {
            line.offset() + pos.column_end.min(line.len())
        } else if pos.line_end != 0 {
            source
                .line(pos.line_end - 1)
                .map(|l| l.offset() + pos.column_end.min(l.len()))
                .unwrap_or(start + 1)
        } else {
            start + 1
        };
        Some((file.clone(), start..end.max(start + 1)))
    }
}
