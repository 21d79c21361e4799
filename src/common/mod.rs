//! A module for common utilities shared by every pass.

pub mod sources;

mod position;

pub use position::{Position, PositionError};

/// Go keywords which can't be used as identifiers.
const GO_KEYWORDS: [&str; 25] = [
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Turn a C identifier into a Go identifier which can't clash with a keyword.
pub fn go_ident(name: &str) -> String {
    if GO_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::go_ident;

    #[test]
    fn keywords_get_suffix() {
        assert_eq!(go_ident("type"), "type_");
        assert_eq!(go_ident("range"), "range_");
        assert_eq!(go_ident("counter"), "counter");
    }
}
