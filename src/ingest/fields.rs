use std::collections::VecDeque;

use crate::ingest::ast::{Address, QualType};

/// A lexical field of a dump line, after the kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Field {
    /// `<...>`, brackets stripped, nesting kept.
    Angle(String),
    /// `'...'`
    Quoted(String),
    /// `'T1':'T2'`
    Pair(String, String),
    /// `"..."`, escapes kept verbatim.
    Str(String),
    Word(String),
}

/// Split the trailing text of a line into fields.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Field>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut out = vec![];
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '<' => {
                let start = i;
                let end = closing_angle(&chars, i)
                    .ok_or_else(|| format!("unbalanced `<` at {}", start))?;
                i = end + 1;
                // `<scratch space>:12:3` is a location, not a range
                if i < chars.len() && chars[i] == ':' {
                    let (word, next) = read_word(&chars, start);
                    out.push(Field::Word(word));
                    i = next;
                } else {
                    out.push(Field::Angle(chars[start + 1..end].iter().collect()));
                }
            }
            '\'' => {
                let (first, next) = read_quoted(&chars, i, '\'')?;
                i = next;
                if i + 1 < chars.len() && chars[i] == ':' && chars[i + 1] == '\'' {
                    let (second, next) = read_quoted(&chars, i + 1, '\'')?;
                    i = next;
                    out.push(Field::Pair(first, second));
                } else {
                    out.push(Field::Quoted(first));
                }
            }
            '"' => {
                let (s, next) = read_quoted(&chars, i, '"')?;
                i = next;
                out.push(Field::Str(s));
            }
            _ => {
                let (word, next) = read_word(&chars, i);
                i = next;
                out.push(Field::Word(word));
            }
        }
    }
    Ok(out)
}

fn closing_angle(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in chars.iter().enumerate().skip(open) {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => (),
        }
    }
    None
}

/// Read a quoted string starting at the opening quote, returns the content and the index past
/// the closing quote.
fn read_quoted(chars: &[char], open: usize, quote: char) -> Result<(String, usize), String> {
    let mut s = String::new();
    let mut i = open + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && quote == '"' && i + 1 < chars.len() {
            s.push(c);
            s.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == quote {
            return Ok((s, i + 1));
        }
        s.push(c);
        i += 1;
    }
    Err(format!("unterminated {} at {}", quote, open))
}

/// Read up to the next whitespace, quoted parts of a word (`Text=" a b"`) may contain spaces.
fn read_word(chars: &[char], start: usize) -> (String, usize) {
    let mut s = String::new();
    let mut i = start;
    while i < chars.len() && !chars[i].is_whitespace() {
        let c = chars[i];
        if (c == '"' || c == '\'') && i > start {
            match read_quoted(chars, i, c) {
                Ok((inner, next)) => {
                    s.push(c);
                    s.push_str(&inner);
                    s.push(c);
                    i = next;
                    continue;
                }
                Err(_) => (),
            }
        }
        if c == '<' {
            if let Some(end) = closing_angle(chars, i) {
                s.extend(&chars[i..=end]);
                i = end + 1;
                continue;
            }
        }
        s.push(c);
        i += 1;
    }
    (s, i)
}

/// Looks like a location printed outside a range: `col:5`, `line:3:7`, `a.c:3:7`.
pub(crate) fn is_location(word: &str) -> bool {
    if let Some(rest) = word.strip_prefix("col:") {
        return rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty();
    }
    let mut parts = word.rsplitn(3, ':');
    let (Some(col), Some(line), Some(file)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !file.is_empty()
        && !col.is_empty()
        && !line.is_empty()
        && col.chars().all(|c| c.is_ascii_digit())
        && line.chars().all(|c| c.is_ascii_digit())
}

/// Cursor over the fields of one line.
///
/// Flags can appear anywhere so they are taken out by name first, the
/// remaining fields are then consumed front to back.
#[derive(Debug)]
pub(crate) struct Fields {
    items: VecDeque<Field>,
}

impl Fields {
    pub fn new(text: &str) -> Result<Self, String> {
        Ok(Self {
            items: tokenize(text)?.into(),
        })
    }

    /// Take the leading `0x..` address, absent for synthesized lines.
    pub fn address(&mut self) -> Result<Address, String> {
        match self.items.front() {
            Some(Field::Word(w)) if w.starts_with("0x") => {
                let value = u64::from_str_radix(&w[2..], 16)
                    .map_err(|_| format!("bad address `{}`", w))?;
                self.items.pop_front();
                Ok(Address(value))
            }
            _ => Ok(Address::default()),
        }
    }

    /// Remove a bare flag word, wherever it is.
    pub fn flag(&mut self, name: &str) -> bool {
        let found = self
            .items
            .iter()
            .position(|f| matches!(f, Field::Word(w) if w == name));
        match found {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove `prev 0x..`/`parent 0x..` back-references.
    pub fn back_reference(&mut self, name: &str) {
        let found = self
            .items
            .iter()
            .position(|f| matches!(f, Field::Word(w) if w == name));
        if let Some(idx) = found {
            self.items.remove(idx);
            if matches!(self.items.get(idx), Some(Field::Word(w)) if w.starts_with("0x")) {
                self.items.remove(idx);
            }
        }
    }

    /// The source range, `None` if the next field isn't one.
    pub fn range(&mut self) -> Option<String> {
        match self.items.front() {
            Some(Field::Angle(_)) => match self.items.pop_front() {
                Some(Field::Angle(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// The declaration location printed after the range.
    pub fn location(&mut self) -> Option<String> {
        let is_loc = match self.items.front() {
            Some(Field::Angle(s)) => s == "invalid sloc",
            Some(Field::Word(w)) => is_location(w),
            _ => false,
        };
        if !is_loc {
            return None;
        }
        match self.items.pop_front() {
            Some(Field::Angle(s)) | Some(Field::Word(s)) => Some(s),
            _ => None,
        }
    }

    /// Next quoted type, possibly a sugar pair.
    pub fn qual_type(&mut self) -> Option<QualType> {
        match self.items.front() {
            Some(Field::Quoted(_)) | Some(Field::Pair(_, _)) => (),
            _ => return None,
        }
        match self.items.pop_front() {
            Some(Field::Quoted(ty)) => Some(QualType {
                ty,
                desugared: None,
            }),
            Some(Field::Pair(ty, d)) => Some(QualType {
                ty,
                desugared: Some(d),
            }),
            _ => None,
        }
    }

    pub fn quoted(&mut self) -> Option<String> {
        match self.items.front() {
            Some(Field::Quoted(_)) => match self.items.pop_front() {
                Some(Field::Quoted(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn string(&mut self) -> Option<String> {
        match self.items.front() {
            Some(Field::Str(_)) => match self.items.pop_front() {
                Some(Field::Str(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn angle(&mut self) -> Option<String> {
        self.range()
    }

    /// Next bare word.
    pub fn word(&mut self) -> Option<String> {
        match self.items.front() {
            Some(Field::Word(_)) => match self.items.pop_front() {
                Some(Field::Word(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// All bare words up to the next non-word field.
    pub fn leading_words(&mut self) -> Vec<String> {
        let mut words = vec![];
        while let Some(w) = self.word() {
            words.push(w);
        }
        words
    }

    /// Take a `Key='value'` word and return the value.
    pub fn keyed(&mut self, key: &str) -> Option<String> {
        let prefix = format!("{}=", key);
        let idx = self
            .items
            .iter()
            .position(|f| matches!(f, Field::Word(w) if w.starts_with(&prefix)))?;
        match self.items.remove(idx) {
            Some(Field::Word(w)) => {
                let value = &w[prefix.len()..];
                Some(value.trim_matches(|c| c == '\'' || c == '"').to_string())
            }
            _ => None,
        }
    }

    /// Remaining fields rendered back to text.
    pub fn take_rest(&mut self) -> Vec<String> {
        std::mem::take(&mut self.items)
            .into_iter()
            .map(|f| match f {
                Field::Angle(s) => format!("<{}>", s),
                Field::Quoted(s) => s,
                Field::Pair(a, b) => format!("{}:{}", a, b),
                Field::Str(s) | Field::Word(s) => s,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_ranges_types_and_words() {
        let fields = tokenize("<col:3, col:9> 'size_t':'unsigned long' lvalue Var").unwrap();
        assert_eq!(
            fields,
            vec![
                Field::Angle("col:3, col:9".into()),
                Field::Pair("size_t".into(), "unsigned long".into()),
                Field::Word("lvalue".into()),
                Field::Word("Var".into()),
            ]
        );
    }

    #[test]
    fn nested_angles_and_invalid_sloc() {
        let fields = tokenize("<<invalid sloc>> <invalid sloc> implicit __int128_t '__int128'")
            .unwrap();
        assert_eq!(fields[0], Field::Angle("<invalid sloc>".into()));
        assert_eq!(fields[1], Field::Angle("invalid sloc".into()));
        assert_eq!(fields[4], Field::Quoted("__int128".into()));
    }

    #[test]
    fn scratch_space_location_is_a_word() {
        let fields = tokenize("<line:1:1> <scratch space>:17:1 __acos").unwrap();
        assert_eq!(fields[1], Field::Word("<scratch space>:17:1".into()));
        assert!(is_location("<scratch space>:17:1"));
    }

    #[test]
    fn strings_keep_escapes() {
        let fields = tokenize(r#"'char [4]' lvalue "a\"b\n""#).unwrap();
        assert_eq!(fields[2], Field::Str(r#"a\"b\n"#.into()));
    }

    #[test]
    fn quoted_operators_with_angles() {
        let fields = tokenize("<col:3, col:8> 'int' '<<='").unwrap();
        assert_eq!(fields[2], Field::Quoted("<<=".into()));
    }

    #[test]
    fn keyed_words_with_spaces() {
        let mut f = Fields::new(r#"<col:4, col:20> Text=" hello world""#).unwrap();
        assert!(f.range().is_some());
        assert_eq!(f.keyed("Text").as_deref(), Some(" hello world"));
    }

    #[test]
    fn flags_are_taken_anywhere() {
        let mut f = Fields::new("<col:1> col:5 used x 'int' cinit").unwrap();
        assert!(f.flag("cinit"));
        assert!(f.flag("used"));
        assert!(!f.flag("extern"));
        assert!(f.range().is_some());
        assert_eq!(f.location().as_deref(), Some("col:5"));
        assert_eq!(f.word().as_deref(), Some("x"));
        assert_eq!(f.qual_type(), Some(QualType::new("int")));
    }

    #[test]
    fn unbalanced_range_fails() {
        assert!(tokenize("<col:3, col:9 'int'").is_err());
        assert!(tokenize("'int").is_err());
    }
}
