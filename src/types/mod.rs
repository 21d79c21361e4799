//! Mapping of C type strings onto Go types.

mod cast;
mod descriptor;
mod error;
mod sizeof;

use std::collections::BTreeSet;

pub use cast::cast;
pub use descriptor::{TypeDescriptor, TypeKind};
pub use error::{SizeError, TypeError};
pub(crate) use error::{opaque_type, unknown_size, unresolved_type};
pub use sizeof::size_of;

/// Qualifiers which don't change the Go type.
const QUALIFIERS: [&str; 8] = [
    "const",
    "volatile",
    "restrict",
    "__restrict",
    "_Nullable",
    "_Nonnull",
    "_Null_unspecified",
    "__unaligned",
];

/// C types with a fixed Go spelling.
fn primitive(name: &str) -> Option<TypeKind> {
    use TypeKind::*;
    Some(match name {
        "_Bool" | "bool" => Primitive("bool"),
        "char" => Primitive("byte"),
        "signed char" => Primitive("int8"),
        "unsigned char" => Primitive("uint8"),
        "short" | "short int" | "signed short" | "signed short int" => Primitive("int16"),
        "unsigned short" | "unsigned short int" => Primitive("uint16"),
        "int" | "signed" | "signed int" => Primitive("int32"),
        "unsigned" | "unsigned int" => Primitive("uint32"),
        "long" | "long int" | "signed long" | "signed long int" => Primitive("int64"),
        "unsigned long" | "unsigned long int" => Primitive("uint64"),
        "long long" | "long long int" | "signed long long" | "signed long long int" => {
            Primitive("int64")
        }
        "unsigned long long" | "unsigned long long int" => Primitive("uint64"),
        "float" => Primitive("float32"),
        "double" | "long double" => Primitive("float64"),
        "void" => Void,
        "void *" => Slice(Box::new(Primitive("byte"))),
        // platform types without a Go counterpart
        "__int128" | "__builtin_va_list" | "__mbstate_t" | "__sbuf" | "struct __sbuf" => {
            Primitive("int64")
        }
        "unsigned __int128" => Primitive("uint64"),
        "__va_list_tag" | "struct __va_list_tag" | "__sFILEX" | "struct __sFILEX" => {
            Opaque("compiler internal type".into())
        }
        "FILE" | "struct _IO_FILE" | "struct __sFILE" => Shim("noarch", "File"),
        "time_t" => Shim("noarch", "TimeT"),
        _ => return None,
    })
}

/// Remove qualifiers and normalize spacing: `const char *const *` becomes `char **`.
pub fn strip_qualifiers(raw: &str) -> String {
    let spaced = raw.replace('*', " * ");
    let mut out: Vec<String> = vec![];
    for token in spaced.split_whitespace() {
        if QUALIFIERS.contains(&token) {
            continue;
        }
        match out.last_mut() {
            Some(prev) if token == "*" && prev.ends_with('*') => prev.push('*'),
            _ => out.push(token.to_string()),
        }
    }
    out.join(" ")
}

/// Split trailing `[N]` groups off an array type, outermost first.
pub(crate) fn split_array(t: &str) -> Option<(&str, Vec<Option<usize>>)> {
    let mut rest = t.trim_end();
    let mut sizes = vec![];
    while rest.ends_with(']') {
        let open = rest.rfind('[')?;
        let size = rest[open + 1..rest.len() - 1].trim();
        sizes.push(size.parse().ok());
        rest = rest[..open].trim_end();
    }
    if sizes.is_empty() {
        return None;
    }
    sizes.reverse();
    Some((rest, sizes))
}

/// Resolve a C type string.
///
/// Named types (typedefs, records) resolve only once their declaration was
/// added to `defined`.
pub fn resolve(raw: &str, defined: &BTreeSet<String>) -> Result<TypeDescriptor, TypeError> {
    let kind = resolve_kind(raw, defined)?;
    Ok(TypeDescriptor {
        kind,
        raw: raw.to_string(),
    })
}

fn resolve_kind(raw: &str, defined: &BTreeSet<String>) -> Result<TypeKind, TypeError> {
    let t = strip_qualifiers(raw);
    let t = t.as_str();
    if t.is_empty() {
        return Err(TypeError::new(raw, "empty type"));
    }

    if let Some(kind) = primitive(t) {
        return Ok(kind);
    }

    if defined.contains(t) {
        return Ok(TypeKind::Named(t.to_string()));
    }

    if t.contains("(anonymous") || t.contains("(unnamed") {
        return Ok(TypeKind::Opaque("anonymous record".into()));
    }

    for (keyword, is_union) in [("struct ", false), ("union ", true)] {
        if let Some(rest) = t.strip_prefix(keyword) {
            if rest.ends_with(']') || rest.contains('(') {
                break;
            }
            let name = rest.trim_end_matches(['*', ' ']);
            let stars = rest.len() - rest.trim_end_matches('*').len();
            let base = if let Some(kind) = primitive(name) {
                kind
            } else if defined.contains(name) {
                if is_union {
                    TypeKind::Union(name.to_string())
                } else {
                    TypeKind::Struct(name.to_string())
                }
            } else {
                return Err(TypeError::new(raw, format!("`{}{}` is not declared yet", keyword, name)));
            };
            return Ok(wrap_pointers(base, stars));
        }
    }

    if let Some(rest) = t.strip_prefix("enum ") {
        if !rest.ends_with(']') && !rest.contains('(') {
            let name = rest.trim_end_matches(['*', ' ']);
            let stars = rest.len() - rest.trim_end_matches('*').len();
            return Ok(wrap_pointers(TypeKind::Enum(name.to_string()), stars));
        }
    }

    if let Some(base) = t.strip_suffix('*') {
        if !base.ends_with(')') {
            let inner = resolve_kind(base.trim_end(), defined)?;
            return Ok(match inner {
                TypeKind::Shim(_, _) | TypeKind::Struct(_) | TypeKind::Union(_) => {
                    TypeKind::Pointer(Box::new(inner))
                }
                TypeKind::Void => TypeKind::Slice(Box::new(TypeKind::Primitive("byte"))),
                _ => TypeKind::Slice(Box::new(inner)),
            });
        }
    }

    if t.ends_with(')') {
        return Ok(TypeKind::Opaque("function pointer".into()));
    }

    if let Some((element, sizes)) = split_array(t) {
        let mut kind = resolve_kind(element, defined)?;
        for size in sizes.into_iter().rev() {
            kind = TypeKind::Array(Box::new(kind), size);
        }
        return Ok(kind);
    }

    Err(TypeError::new(raw, "unknown type"))
}

/// The first star of a record or runtime type is a Go reference, further ones are slices.
fn wrap_pointers(base: TypeKind, stars: usize) -> TypeKind {
    let mut kind = base;
    for i in 0..stars {
        let referable = matches!(
            kind,
            TypeKind::Struct(_) | TypeKind::Union(_) | TypeKind::Enum(_) | TypeKind::Shim(_, _)
        );
        kind = if i == 0 && referable {
            TypeKind::Pointer(Box::new(kind))
        } else {
            TypeKind::Slice(Box::new(kind))
        };
    }
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn go(raw: &str, defined: &[&str]) -> String {
        resolve(raw, &names(defined)).unwrap().to_string()
    }

    #[test]
    fn primitives() {
        assert_eq!(resolve("int", &names(&[])).unwrap().kind, TypeKind::Primitive("int32"));
        assert_eq!(go("unsigned long", &[]), "uint64");
        assert_eq!(go("const char", &[]), "byte");
        assert_eq!(go("_Bool", &[]), "bool");
        assert_eq!(go("void", &[]), "");
    }

    #[test]
    fn pointers_become_slices() {
        assert_eq!(go("char *", &[]), "[]byte");
        assert_eq!(go("const char *restrict", &[]), "[]byte");
        assert_eq!(go("int **", &[]), "[][]int32");
        assert_eq!(go("void *", &[]), "[]byte");
        assert_eq!(go("char *const *", &[]), "[][]byte");
        assert_eq!(go("FILE *", &[]), "*noarch.File");
    }

    #[test]
    fn arrays_keep_sizes_for_sizeof_only() {
        let d = resolve("char *[13]", &names(&[])).unwrap();
        assert_eq!(
            d.kind,
            TypeKind::Array(
                Box::new(TypeKind::Slice(Box::new(TypeKind::Primitive("byte")))),
                Some(13)
            )
        );
        assert_eq!(d.to_string(), "[][]byte");
        let d = resolve("int [2][3]", &names(&[])).unwrap();
        assert_eq!(
            d.kind,
            TypeKind::Array(
                Box::new(TypeKind::Array(Box::new(TypeKind::Primitive("int32")), Some(3))),
                Some(2)
            )
        );
        assert_eq!(go("int []", &[]), "[]int32");
    }

    #[test]
    fn records_need_declaration() {
        assert_eq!(go("struct Foo *", &["Foo"]), "*Foo");
        assert_eq!(go("struct Foo", &["Foo"]), "Foo");
        assert_eq!(go("struct Foo **", &["Foo"]), "[]*Foo");
        assert_eq!(go("union U", &["U"]), "U");
        let err = resolve("struct Foo *", &names(&[])).unwrap_err();
        assert_eq!(err.raw, "struct Foo *");
        assert_eq!(go("struct _IO_FILE *", &[]), "*noarch.File");
    }

    #[test]
    fn typedef_names_resolve_by_name() {
        assert_eq!(go("size_t", &["size_t"]), "size_t");
        assert!(resolve("size_t", &names(&[])).is_err());
        assert_eq!(go("size_t *", &["size_t"]), "[]size_t");
    }

    #[test]
    fn enums_and_opaque_shapes() {
        assert_eq!(go("enum Color", &[]), "Color");
        assert_eq!(go("enum Color *", &[]), "*Color");
        assert_eq!(go("enum Color **", &[]), "[]*Color");
        let f = resolve("int (*)(int, char *)", &names(&[])).unwrap();
        assert!(matches!(f.kind, TypeKind::Opaque(_)));
        let anon = resolve("struct (anonymous at t.c:1:9)", &names(&[])).unwrap();
        assert!(matches!(anon.kind, TypeKind::Opaque(_)));
    }

    #[test]
    fn resolution_is_deterministic() {
        let defined = names(&["Foo", "myint"]);
        for raw in ["int", "char *[13]", "struct Foo *", "myint [4]", "unsigned char **"] {
            assert_eq!(resolve(raw, &defined), resolve(raw, &defined));
        }
    }

    #[test]
    fn unknown_types_fail_with_raw_string() {
        let err = resolve("mystery_t", &names(&[])).unwrap_err();
        assert_eq!(err.raw, "mystery_t");
    }

    #[test]
    fn qualifiers_are_stripped() {
        assert_eq!(strip_qualifiers("const char *const *"), "char **");
        assert_eq!(strip_qualifiers("volatile int"), "int");
        assert_eq!(strip_qualifiers("char *__restrict"), "char *");
        assert_eq!(strip_qualifiers("char *const [3]"), "char * [3]");
        assert_eq!(strip_qualifiers("FILE*"), "FILE *");
        assert_eq!(strip_qualifiers("int (*)(int)"), "int ( * )(int)");
    }
}
