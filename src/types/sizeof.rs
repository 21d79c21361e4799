use crate::{
    symtable::SymTable,
    types::{SizeError, split_array, strip_qualifiers},
};

/// Pointers are assumed to be 64 bits wide.
const POINTER_SIZE: usize = 8;

/// Byte size of a C type, as `sizeof` would compute it.
///
/// Records are the sum of their fields (unions the largest field) rounded up
/// to the pointer size. Function pointer shapes are counted as one byte.
pub fn size_of(st: &SymTable, c_type: &str) -> Result<usize, SizeError> {
    let t = strip_qualifiers(c_type);
    let t = t
        .strip_prefix("signed ")
        .or_else(|| t.strip_prefix("unsigned "))
        .unwrap_or(&t);

    if is_function_type(t) {
        return Ok(1);
    }

    let overflow = || SizeError::Overflow(c_type.to_string());
    if let Some((element, sizes)) = split_array(t) {
        let mut count: usize = 1;
        for size in sizes {
            let size = size.ok_or_else(|| SizeError::IncompleteArray(c_type.to_string()))?;
            count = count.checked_mul(size).ok_or_else(overflow)?;
        }
        return size_of(st, element)?.checked_mul(count).ok_or_else(overflow);
    }

    if t.ends_with('*') {
        return Ok(POINTER_SIZE);
    }

    if t.starts_with("struct ") || t.starts_with("union ") {
        let record = st
            .record(t)
            .ok_or_else(|| SizeError::UnregisteredRecord(t.to_string()))?;
        let mut total: usize = 0;
        for (_, field_type) in &record.fields {
            let n = size_of(st, field_type)?;
            total = if t.starts_with("union ") {
                total.max(n)
            } else {
                total.checked_add(n).ok_or_else(overflow)?
            };
        }
        if total % POINTER_SIZE != 0 {
            total = total
                .checked_add(POINTER_SIZE - total % POINTER_SIZE)
                .ok_or_else(overflow)?;
        }
        return Ok(total);
    }

    let size = match t {
        "char" | "void" | "bool" | "_Bool" => 1,
        "short" | "short int" => 2,
        "int" | "signed" | "unsigned" | "float" => 4,
        "long" | "long int" | "long long" | "long long int" | "double" => 8,
        "long double" | "__int128" => 16,
        _ => {
            if let Some(underlying) = st.typedef(t) {
                return size_of(st, underlying);
            }
            if t.starts_with("enum ") {
                return Ok(4);
            }
            return Err(SizeError::Unknown(c_type.to_string()));
        }
    };
    Ok(size)
}

/// A parenthesis outside an `(anonymous at ...)` record name marks a function type.
fn is_function_type(t: &str) -> bool {
    t.match_indices('(').any(|(i, _)| {
        let rest = &t[i + 1..];
        !rest.starts_with("anonymous at ") && !rest.starts_with("unnamed at ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ingest::ast::RecordTag, symtable::Record};

    fn table() -> SymTable {
        let mut st = SymTable::default();
        st.add_typedef("size_t", "unsigned long");
        st.add_record(Record {
            tag: RecordTag::Struct,
            name: "point".into(),
            fields: vec![("x".into(), "int".into()), ("y".into(), "int".into()), ("tag".into(), "char".into())],
        });
        st.add_record(Record {
            tag: RecordTag::Union,
            name: "value".into(),
            fields: vec![("i".into(), "int".into()), ("d".into(), "double".into())],
        });
        st
    }

    #[test]
    fn primitives_and_pointers() {
        let st = table();
        assert_eq!(size_of(&st, "int"), Ok(4));
        assert_eq!(size_of(&st, "unsigned char"), Ok(1));
        assert_eq!(size_of(&st, "const short"), Ok(2));
        assert_eq!(size_of(&st, "long double"), Ok(16));
        assert_eq!(size_of(&st, "int *"), Ok(8));
        assert_eq!(size_of(&st, "struct unknown *"), Ok(8));
        assert_eq!(size_of(&st, "size_t"), Ok(8));
        assert_eq!(size_of(&st, "enum color"), Ok(4));
    }

    #[test]
    fn arrays_multiply() {
        let st = table();
        assert_eq!(size_of(&st, "int [2][3]"), Ok(24));
        assert_eq!(size_of(&st, "char *const [3]"), Ok(24));
        assert_eq!(
            size_of(&st, "int []"),
            Err(SizeError::IncompleteArray("int []".into()))
        );
    }

    #[test]
    fn records_round_up() {
        let st = table();
        assert_eq!(size_of(&st, "struct point"), Ok(16));
        assert_eq!(size_of(&st, "union value"), Ok(8));
        assert_eq!(size_of(&st, "struct point [2]"), Ok(32));
        assert_eq!(
            size_of(&st, "struct C [2]"),
            Err(SizeError::UnregisteredRecord("struct C".into()))
        );
    }

    #[test]
    fn function_pointers_count_as_one() {
        let st = table();
        assert_eq!(size_of(&st, "int (*)(int)"), Ok(1));
    }

    #[test]
    fn unknown_names_fail() {
        let st = table();
        assert!(matches!(size_of(&st, "mystery_t"), Err(SizeError::Unknown(_))));
    }

    #[test]
    fn anonymous_records_are_not_function_types() {
        let mut st = table();
        let anon = "struct (anonymous at t.c:1:9)";
        assert_eq!(
            size_of(&st, anon),
            Err(SizeError::UnregisteredRecord(anon.into()))
        );
        st.add_record(Record {
            tag: RecordTag::Struct,
            name: "(anonymous at t.c:1:9)".into(),
            fields: vec![("a".into(), "double".into()), ("b".into(), "int".into())],
        });
        assert_eq!(size_of(&st, anon), Ok(16));
        assert_eq!(size_of(&st, "struct (anonymous at t.c:1:9) [3]"), Ok(48));
        assert_eq!(size_of(&st, "struct (anonymous at t.c:1:9) *"), Ok(8));
    }

    #[test]
    fn oversized_arrays_fail() {
        let st = table();
        let huge = format!("double [{}][2]", usize::MAX);
        assert_eq!(size_of(&st, &huge), Err(SizeError::Overflow(huge.clone())));
        let wide = format!("int [{}]", usize::MAX / 2);
        assert_eq!(size_of(&st, &wide), Err(SizeError::Overflow(wide.clone())));
    }
}
