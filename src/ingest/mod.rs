//! Rebuilding the clang AST from its textual dump.
//!
//! ```text
//! TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
//! |-TypedefDecl 0x2 <<invalid sloc>> <invalid sloc> implicit __int128_t '__int128'
//! `-FunctionDecl 0x3 <main.c:1:1, line:3:1> line:1:5 main 'int ()'
//!   `-CompoundStmt 0x4 <col:12, line:3:1>
//! ```

pub mod ast;
mod error;
mod fields;
mod line;

pub use error::IngestionError;

use ast::{Node, NodeKind};
use line::parse_line;

/// clang's marker for a child which is intentionally absent.
const NULL_SENTINEL: &str = "<<<NULL>>>";

/// One dump line converted to a node, before children are attached.
#[derive(Debug)]
pub(crate) struct FlatNode {
    pub depth: usize,
    pub line: String,
    pub node: Node,
}

/// Parse a complete dump into its translation unit.
pub fn parse_dump(text: &str) -> Result<Node, IngestionError> {
    let text = strip_ansi(text);
    let nodes = flatten_lines(&text)?;
    log::debug!("ingested {} dump lines", nodes.len());
    let mut roots = build_tree(nodes, 0)?;
    if roots.len() != 1 {
        return Err(IngestionError::RootCount { found: roots.len() });
    }
    let root = roots.remove(0);
    if root.kind != NodeKind::TranslationUnitDecl {
        return Err(IngestionError::NotTranslationUnit {
            kind: root.kind_name().to_string(),
        });
    }
    Ok(root)
}

/// Remove terminal color sequences (`ESC [ 1;32 m`).
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            let mut seq = vec![];
            chars.next();
            while let Some(&n) = chars.peek() {
                if n.is_ascii_digit() || n == ';' {
                    seq.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek() == Some(&'m') {
                chars.next();
                continue;
            }
            // not a color sequence, keep it
            out.push(c);
            out.push('[');
            out.extend(seq);
            continue;
        }
        out.push(c);
    }
    out
}

/// Depth of a line and the text after its tree-drawing prefix.
fn split_indent(line: &str) -> (usize, &str) {
    let trimmed = line.trim_start_matches(|c| matches!(c, '|' | ' ' | '-' | '`'));
    ((line.len() - trimmed.len()) / 2, trimmed)
}

/// Convert every non-blank line into a node with its depth.
pub(crate) fn flatten_lines(text: &str) -> Result<Vec<FlatNode>, IngestionError> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|raw| {
            let (depth, body) = split_indent(raw);
            let body = body.trim_end();
            let body = if body == NULL_SENTINEL { "NullStmt" } else { body };
            let node = parse_line(body)?;
            Ok(FlatNode {
                depth,
                line: raw.to_string(),
                node,
            })
        })
        .collect()
}

/// Fold a flat sequence of nodes into trees.
///
/// Every node at `depth` starts a section, the nodes following it which are
/// deeper become its descendants. A sequence which doesn't start at `depth`,
/// or a node more than one level deeper than its parent, is rejected.
pub(crate) fn build_tree(nodes: Vec<FlatNode>, depth: usize) -> Result<Vec<Node>, IngestionError> {
    let mut sections: Vec<(Node, Vec<FlatNode>)> = vec![];
    for flat in nodes {
        if flat.depth == depth {
            sections.push((flat.node, vec![]));
            continue;
        }
        match sections.last_mut() {
            Some((_, interior)) if flat.depth > depth => interior.push(flat),
            _ => return Err(IngestionError::MisplacedNode { line: flat.line }),
        }
    }

    sections
        .into_iter()
        .map(|(mut head, interior)| {
            for child in build_tree(interior, depth + 1)? {
                head.add_child(child);
            }
            Ok(head)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ast::{QualType, RecordTag};

    const DUMP: &str = "\
TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>
|-TypedefDecl 0x2 <<invalid sloc>> <invalid sloc> implicit __int128_t '__int128'
| `-BuiltinType 0x3 '__int128'
|-RecordDecl 0x4 <t.c:1:1, line:3:1> line:1:8 struct point definition
| |-FieldDecl 0x5 <line:2:3, col:7> col:7 x 'int'
| `-FieldDecl 0x6 <col:3, col:10> col:10 y 'int'
`-FunctionDecl 0x7 <line:4:1, line:7:1> line:4:5 main 'int ()'
  `-CompoundStmt 0x8 <col:12, line:7:1>
    `-ForStmt 0x9 <line:5:3, col:12>
      |-<<<NULL>>>
      |-<<<NULL>>>
      |-<<<NULL>>>
      |-<<<NULL>>>
      `-NullStmt 0xa <col:12>
";

    fn depths(node: &Node, depth: usize, out: &mut Vec<usize>) {
        out.push(depth);
        for child in node.children() {
            depths(child, depth + 1, out);
        }
    }

    #[test]
    fn tree_preorder_matches_line_depths() {
        let flat = flatten_lines(DUMP).unwrap();
        let expected: Vec<usize> = flat.iter().map(|f| f.depth).collect();
        let root = parse_dump(DUMP).unwrap();
        let mut got = vec![];
        depths(&root, 0, &mut got);
        assert_eq!(got, expected);
    }

    #[test]
    fn omitted_clauses_become_placeholders() {
        let root = parse_dump(DUMP).unwrap();
        let main = &root.children()[2];
        let for_stmt = &main.children()[0].children()[0];
        assert_eq!(for_stmt.kind, NodeKind::ForStmt);
        assert_eq!(for_stmt.children().len(), 5);
        assert!(for_stmt.children().iter().all(|c| c.is_null()));
    }

    #[test]
    fn declarations_keep_their_fields() {
        let root = parse_dump(DUMP).unwrap();
        match &root.children()[0].kind {
            NodeKind::TypedefDecl { name, ty, flags } => {
                assert_eq!(name, "__int128_t");
                assert_eq!(ty, &QualType::new("__int128"));
                assert!(flags.implicit);
            }
            other => panic!("unexpected {:?}", other),
        }
        let record = &root.children()[1];
        assert_eq!(
            record.kind,
            NodeKind::RecordDecl {
                tag: RecordTag::Struct,
                name: Some("point".into()),
                definition: true,
                flags: Default::default(),
            }
        );
        assert_eq!(record.position().file.as_deref(), Some("t.c"));
        assert_eq!(record.children().len(), 2);
    }

    #[test]
    fn ansi_colors_are_removed() {
        let colored = "\u{1b}[0;1;32mTranslationUnitDecl\u{1b}[0m\u{1b}[0;33m 0x1\u{1b}[0m <<invalid sloc>>";
        assert_eq!(
            strip_ansi(colored),
            "TranslationUnitDecl 0x1 <<invalid sloc>>"
        );
        assert!(parse_dump(colored).is_ok());
    }

    #[test]
    fn unknown_kind_names_the_line() {
        let dump = "TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>\n`-FrobnicateDecl 0x2 <col:1>\n";
        match parse_dump(dump) {
            Err(IngestionError::UnknownKind { line }) => {
                assert_eq!(line, "FrobnicateDecl 0x2 <col:1>")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_fields_are_fatal() {
        let dump = "TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>\n`-BinaryOperator 0x2 <col:1> 'int'\n";
        assert!(matches!(
            parse_dump(dump),
            Err(IngestionError::Malformed { .. })
        ));
    }

    #[test]
    fn root_must_be_single_translation_unit() {
        let two = "TranslationUnitDecl 0x1 <<invalid sloc>>\nTranslationUnitDecl 0x2 <<invalid sloc>>\n";
        assert_eq!(
            parse_dump(two).unwrap_err(),
            IngestionError::RootCount { found: 2 }
        );
        assert_eq!(parse_dump("").unwrap_err(), IngestionError::RootCount { found: 0 });
        let wrong = "CompoundStmt 0x1 <col:1>\n";
        assert!(matches!(
            parse_dump(wrong),
            Err(IngestionError::NotTranslationUnit { .. })
        ));
    }

    #[test]
    fn depth_jump_is_rejected() {
        let dump = "TranslationUnitDecl 0x1 <<invalid sloc>>\n    `-CompoundStmt 0x2 <col:1>\n";
        assert!(matches!(
            parse_dump(dump),
            Err(IngestionError::MisplacedNode { .. })
        ));
    }

    #[test]
    fn expression_lines() {
        let cases = [
            (
                "DeclRefExpr 0x1 <col:8> 'FILE *' lvalue ParmVar 0x2 '_p' 'FILE *'",
                "DeclRefExpr",
            ),
            ("MemberExpr 0x1 <col:8, col:12> 'int' lvalue ->_w 0x2", "MemberExpr"),
            (
                "CompoundAssignOperator 0x1 <line:5:2, col:7> 'int' '+=' ComputeLHSTy='int' ComputeResultTy='int'",
                "CompoundAssignOperator",
            ),
            (
                "ImplicitCastExpr 0x1 <col:16> 'unsigned int' <LValueToRValue> part_of_explicit_cast",
                "ImplicitCastExpr",
            ),
            (
                "StringLiteral 0x1 <col:11> 'char [7]' lvalue \"%d %s\\n\"",
                "StringLiteral",
            ),
            ("UnaryOperator 0x1 <col:3, col:4> 'int' postfix '++'", "UnaryOperator"),
            ("AlignedAttr 0x1 <col:47, col:57> aligned", "AlignedAttr"),
            ("TextComment 0x1 <col:4, col:20> Text=\" a comment\"", "TextComment"),
        ];
        for (text, kind) in cases {
            let node = parse_line(text).unwrap();
            assert_eq!(node.kind_name(), kind);
        }
        let member = parse_line("MemberExpr 0x1 <col:8, col:12> 'int' lvalue ->_w 0x2").unwrap();
        assert!(matches!(member.kind, NodeKind::MemberExpr { arrow: true, ref name, .. } if name == "_w"));
        let unary = parse_line("UnaryOperator 0x1 <col:3, col:4> 'int' postfix '++'").unwrap();
        assert!(matches!(unary.kind, NodeKind::UnaryOperator { postfix: true, ref op, .. } if op == "++"));
    }

    #[test]
    fn declaration_lines() {
        let var = parse_line("VarDecl 0x1 <col:3, col:11> col:7 used x 'int' cinit").unwrap();
        match var.kind {
            NodeKind::VarDecl {
                name,
                has_init,
                flags,
                ..
            } => {
                assert_eq!(name, "x");
                assert!(has_init);
                assert!(flags.used);
            }
            other => panic!("unexpected {:?}", other),
        }
        let func = parse_line(
            "FunctionDecl 0x1 prev 0x2 <col:1, /usr/include/sys/cdefs.h:351:63> /usr/include/stdio.h:244:6 fprintf 'int (FILE *, const char *, ...)' extern",
        )
        .unwrap();
        assert!(matches!(func.kind, NodeKind::FunctionDecl { ref name, storage: Some(_), .. } if name == "fprintf"));
        let parm = parse_line("ParmVarDecl 0x1 <col:14> col:17 'int'").unwrap();
        assert!(matches!(parm.kind, NodeKind::ParmVarDecl { name: None, .. }));
        let anon = parse_line("RecordDecl 0x1 <line:76:9, line:79:1> line:76:9 union definition").unwrap();
        assert!(matches!(anon.kind, NodeKind::RecordDecl { name: None, tag: RecordTag::Union, definition: true, .. }));
    }

    #[test]
    fn names_that_spell_flags_are_kept() {
        let var = parse_line("VarDecl 0x1 <col:3, col:10> col:7 used 'int'").unwrap();
        assert!(matches!(var.kind, NodeKind::VarDecl { ref name, ref flags, .. } if name == "used" && !flags.used));
        let var = parse_line("VarDecl 0x1 <col:3, col:10> col:7 used referenced 'int' cinit").unwrap();
        match var.kind {
            NodeKind::VarDecl { name, flags, has_init, .. } => {
                assert_eq!(name, "referenced");
                assert!(flags.used && !flags.referenced && has_init);
            }
            other => panic!("unexpected {:?}", other),
        }
        let field = parse_line("FieldDecl 0x1 <col:3, col:8> col:8 referenced implicit 'int'").unwrap();
        assert!(matches!(field.kind, NodeKind::FieldDecl { name: None, ref flags, .. } if flags.implicit));
        let record = parse_line("RecordDecl 0x1 <t.c:1:1, line:3:1> line:1:8 referenced struct used definition").unwrap();
        assert!(matches!(
            record.kind,
            NodeKind::RecordDecl { ref name, ref flags, definition: true, .. }
                if name.as_deref() == Some("used") && flags.referenced
        ));
    }
}
