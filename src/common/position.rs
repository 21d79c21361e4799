use std::{fmt::Display, sync::Arc};

use thiserror::Error;

/// A source range as printed by clang inside `<...>`.
///
/// Fields which the dump left out are zero. A position without a file
/// belongs to the most recent file seen earlier in the same dump; it is up
/// to the consumer to track that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub file: Option<Arc<str>>,
    pub line: usize,
    pub column: usize,
    pub line_end: usize,
    pub column_end: usize,
    pub raw: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unable to understand position `{0}`")]
pub struct PositionError(pub String);

/// One side of a range.
#[derive(Debug, PartialEq, Eq)]
enum Loc {
    Invalid,
    Col(usize),
    Line(usize),
    LineCol(usize, usize),
    File(String, usize, usize),
}

impl Position {
    /// Position for nodes which don't carry one.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_none()
            && self.line == 0
            && self.column == 0
            && self.line_end == 0
            && self.column_end == 0
    }

    /// Parse the text between the outer angle brackets of a range.
    ///
    /// ```text
    /// <invalid sloc>
    /// col:4, line:7:2
    /// file.c:3:1, col:9
    /// ```
    pub fn parse(text: &str) -> Result<Position, PositionError> {
        let text = text.trim();
        if text.is_empty() || text == "invalid sloc" || text == "<invalid sloc>" {
            return Ok(Position::empty());
        }
        let err = || PositionError(text.to_string());
        let mut parts = text.split(", ");
        let first = parts.next().ok_or_else(err)?;
        let second = parts.next();
        if parts.next().is_some() {
            return Err(err());
        }

        let mut pos = Position {
            raw: text.to_string(),
            ..Position::default()
        };
        match parse_loc(first).ok_or_else(err)? {
            Loc::Invalid => (),
            Loc::Col(c) => pos.column = c,
            Loc::Line(l) => pos.line = l,
            Loc::LineCol(l, c) => {
                pos.line = l;
                pos.column = c;
            }
            Loc::File(f, l, c) => {
                pos.file = Some(Arc::from(f));
                pos.line = l;
                pos.column = c;
            }
        }
        if let Some(second) = second {
            match parse_loc(second).ok_or_else(err)? {
                Loc::Invalid => (),
                Loc::Col(c) => pos.column_end = c,
                Loc::Line(l) => pos.line_end = l,
                // the end of a range may sit in another file (macro expansion), only the
                // first element names the file of the position
                Loc::LineCol(l, c) | Loc::File(_, l, c) => {
                    pos.line_end = l;
                    pos.column_end = c;
                }
            }
        }
        Ok(pos)
    }

    /// Render the position back into clang's compact notation.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "<invalid sloc>".into();
        }
        let first = match &self.file {
            Some(file) => format!("{}:{}:{}", file, self.line, self.column),
            None if self.line != 0 && self.column != 0 => {
                format!("line:{}:{}", self.line, self.column)
            }
            None if self.line != 0 => format!("line:{}", self.line),
            None => format!("col:{}", self.column),
        };
        let second = if self.line_end != 0 && self.column_end != 0 {
            Some(format!("line:{}:{}", self.line_end, self.column_end))
        } else if self.line_end != 0 {
            Some(format!("line:{}", self.line_end))
        } else if self.column_end != 0 {
            Some(format!("col:{}", self.column_end))
        } else {
            None
        };
        match second {
            Some(second) => format!("{}, {}", first, second),
            None => first,
        }
    }

    /// Copy this position, filling in a missing file.
    pub fn with_default_file(&self, file: Option<&Arc<str>>) -> Position {
        let mut pos = self.clone();
        if pos.file.is_none() {
            pos.file = file.cloned();
        }
        pos
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None if self.is_empty() => write!(f, "<unknown>"),
            None => write!(f, "line {}, column {}", self.line, self.column),
        }
    }
}

fn number(s: &str) -> Option<usize> {
    s.parse().ok()
}

fn parse_loc(s: &str) -> Option<Loc> {
    let s = s.trim();
    if s == "<invalid sloc>" {
        return Some(Loc::Invalid);
    }
    if let Some(rest) = s.strip_prefix("col:") {
        return number(rest).map(Loc::Col);
    }
    if let Some(rest) = s.strip_prefix("line:") {
        return match rest.split_once(':') {
            Some((l, c)) => Some(Loc::LineCol(number(l)?, number(c)?)),
            None => number(rest).map(Loc::Line),
        };
    }
    // <file>:<line>:<col>, the file itself may contain colons
    let mut it = s.rsplitn(3, ':');
    let col = number(it.next()?)?;
    let line = number(it.next()?)?;
    let file = it.next()?;
    if file.is_empty() {
        return None;
    }
    Some(Loc::File(file.to_string(), line, col))
}
