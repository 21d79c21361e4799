use std::fmt::Display;

use crate::common::go_ident;

/// Resolved Go shape of a C type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// The C type this was resolved from, qualifiers included.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Void,
    /// A Go builtin type: `int32`, `byte`, `float64`, `bool`, ...
    Primitive(&'static str),
    /// A typedef declared earlier in the translation unit.
    Named(String),
    /// Go reference `*T`, used for pointers to records and runtime types.
    Pointer(Box<TypeKind>),
    /// Go slice `[]T`, used for every other pointer.
    Slice(Box<TypeKind>),
    /// C array. The length only matters for `sizeof`, Go sees a slice.
    Array(Box<TypeKind>, Option<usize>),
    Struct(String),
    Union(String),
    Enum(String),
    /// A type provided by the runtime packages: `("noarch", "File")`.
    Shim(&'static str, &'static str),
    /// Something Go can't express, carried as `interface{}`.
    Opaque(String),
}

impl TypeKind {
    pub fn is_numeric(&self) -> bool {
        match self {
            TypeKind::Primitive(p) => *p != "bool",
            TypeKind::Enum(_) => true,
            _ => false,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, TypeKind::Primitive("bool"))
    }

    /// Slices and arrays, both are Go slices.
    pub fn is_slice(&self) -> bool {
        matches!(self, TypeKind::Slice(_) | TypeKind::Array(_, _))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeKind::Pointer(_))
    }

    /// `[]byte`, the representation of C strings.
    pub fn is_byte_slice(&self) -> bool {
        match self {
            TypeKind::Slice(inner) | TypeKind::Array(inner, _) => {
                matches!(**inner, TypeKind::Primitive("byte"))
            }
            _ => false,
        }
    }

    /// Element type of slices, arrays and references.
    pub fn element(&self) -> Option<&TypeKind> {
        match self {
            TypeKind::Pointer(inner) | TypeKind::Slice(inner) | TypeKind::Array(inner, _) => {
                Some(inner)
            }
            _ => None,
        }
    }

    /// Holds no Go pointers, slices or interfaces, so it may live in raw bytes.
    pub fn is_plain_data(&self) -> bool {
        match self {
            TypeKind::Primitive(_) | TypeKind::Enum(_) => true,
            TypeKind::Array(inner, Some(_)) => inner.is_plain_data(),
            _ => false,
        }
    }

    /// Runtime packages the Go spelling of this type refers to.
    pub fn packages(&self) -> Vec<&'static str> {
        match self {
            TypeKind::Shim(pkg, _) => vec![*pkg],
            TypeKind::Pointer(inner) | TypeKind::Slice(inner) | TypeKind::Array(inner, _) => {
                inner.packages()
            }
            _ => vec![],
        }
    }

    /// Name fragment used for conversion helpers: `Int32`, `ByteSlice`, `FooPointer`.
    pub fn helper_name(&self) -> String {
        match self {
            TypeKind::Void => "Void".into(),
            TypeKind::Primitive(p) => capitalize(p),
            TypeKind::Named(n) | TypeKind::Struct(n) | TypeKind::Union(n) | TypeKind::Enum(n) => {
                capitalize(n)
            }
            TypeKind::Pointer(inner) => format!("{}Pointer", inner.helper_name()),
            TypeKind::Slice(inner) => format!("{}Slice", inner.helper_name()),
            TypeKind::Array(inner, _) => format!("{}Array", inner.helper_name()),
            TypeKind::Shim(_, name) => capitalize(name),
            TypeKind::Opaque(_) => "Interface".into(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let s = s.trim_start_matches('_');
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Void => Ok(()),
            TypeKind::Primitive(p) => write!(f, "{}", p),
            TypeKind::Named(n) | TypeKind::Struct(n) | TypeKind::Union(n) | TypeKind::Enum(n) => {
                write!(f, "{}", go_ident(n))
            }
            TypeKind::Pointer(inner) => write!(f, "*{}", inner),
            TypeKind::Slice(inner) | TypeKind::Array(inner, _) => write!(f, "[]{}", inner),
            TypeKind::Shim(pkg, name) => write!(f, "{}.{}", pkg, name),
            TypeKind::Opaque(_) => write!(f, "interface{{}}"),
        }
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_spelling() {
        let t = TypeKind::Array(
            Box::new(TypeKind::Slice(Box::new(TypeKind::Primitive("byte")))),
            Some(13),
        );
        assert_eq!(t.to_string(), "[][]byte");
        assert_eq!(TypeKind::Pointer(Box::new(TypeKind::Struct("node".into()))).to_string(), "*node");
        assert_eq!(TypeKind::Shim("noarch", "File").to_string(), "noarch.File");
        assert_eq!(TypeKind::Void.to_string(), "");
    }

    #[test]
    fn helper_names() {
        let bytes = TypeKind::Slice(Box::new(TypeKind::Primitive("byte")));
        assert_eq!(bytes.helper_name(), "ByteSlice");
        assert_eq!(TypeKind::Primitive("int32").helper_name(), "Int32");
        assert_eq!(
            TypeKind::Pointer(Box::new(TypeKind::Struct("node".into()))).helper_name(),
            "NodePointer"
        );
    }
}
