//! Registries that grow while one translation unit is processed.

use std::collections::{BTreeSet, HashMap};

mod builtins;
mod functions;

pub use functions::{FunctionSignature, SignatureError, Target};

use crate::ingest::ast::RecordTag;

/// Field list of a struct or union, needed by `sizeof`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: RecordTag,
    pub name: String,
    /// Field names with their C types, in declaration order.
    pub fields: Vec<(String, String)>,
}

impl Record {
    /// Registry key: `struct point`, `union value`.
    pub fn key(&self) -> String {
        record_key(self.tag, &self.name)
    }
}

pub fn record_key(tag: RecordTag, name: &str) -> String {
    match tag {
        RecordTag::Struct => format!("struct {}", name),
        RecordTag::Union => format!("union {}", name),
    }
}

#[derive(Debug, Default)]
pub struct SymTable {
    /// Type names declared so far. Only these resolve by name.
    defined: BTreeSet<String>,
    typedefs: HashMap<String, String>,
    records: HashMap<String, Record>,
    /// Records seen only as forward declarations, in order of appearance.
    pending_records: Vec<(RecordTag, String)>,
    functions: HashMap<String, FunctionSignature>,
    /// Conversion helpers the generated code calls, like `noarch.Int32ToBool`.
    helpers: BTreeSet<String>,
    /// Unions laid out as one byte buffer shared by every member.
    shared_unions: BTreeSet<String>,
}

impl SymTable {
    /// Fresh tables with the built-in functions of the present headers.
    pub fn init(headers: &BTreeSet<String>) -> SymTable {
        let mut st = SymTable::default();
        for group in builtins::GROUPS {
            let load = match group.header {
                None => true,
                Some(h) => headers.contains(h),
            };
            if !load {
                continue;
            }
            for line in group.lines {
                match FunctionSignature::parse(line) {
                    Ok(sig) => {
                        st.functions.insert(sig.name.clone(), sig);
                    }
                    Err(e) => log::warn!("{}", e),
                }
            }
        }
        log::debug!("loaded {} built-in function definitions", st.functions.len());
        st
    }

    pub fn defined(&self) -> &BTreeSet<String> {
        &self.defined
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Mark a type name as declared. Returns `false` if it already was.
    pub fn define(&mut self, name: &str) -> bool {
        self.defined.insert(name.to_string())
    }

    pub fn add_typedef(&mut self, name: &str, c_type: &str) {
        self.typedefs.insert(name.to_string(), c_type.to_string());
    }

    pub fn typedef(&self, name: &str) -> Option<&str> {
        self.typedefs.get(name).map(String::as_str)
    }

    /// Follow typedefs down to a type which isn't one.
    pub fn underlying(&self, c_type: &str) -> String {
        let mut t = crate::types::strip_qualifiers(c_type);
        let mut seen = BTreeSet::new();
        while let Some(next) = self.typedefs.get(&t) {
            if !seen.insert(t.clone()) {
                break;
            }
            t = crate::types::strip_qualifiers(next);
        }
        t
    }

    pub fn add_record(&mut self, record: Record) {
        self.pending_records
            .retain(|(tag, name)| !(*tag == record.tag && *name == record.name));
        self.records.insert(record.key(), record);
    }

    pub fn record(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn share_union(&mut self, key: &str) {
        self.shared_unions.insert(key.to_string());
    }

    pub fn is_shared_union(&self, key: &str) -> bool {
        self.shared_unions.contains(key)
    }

    /// Remember a `struct X;` which may never get a body.
    pub fn forward_record(&mut self, tag: RecordTag, name: &str) {
        let key = record_key(tag, name);
        let known = self.pending_records.iter().any(|(t, n)| *t == tag && n == name);
        if !self.records.contains_key(&key) && !known {
            self.pending_records.push((tag, name.to_string()));
        }
    }

    /// Forward declared records which never got a definition.
    pub fn take_pending_records(&mut self) -> Vec<(RecordTag, String)> {
        std::mem::take(&mut self.pending_records)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    /// Register a function found in a declaration.
    ///
    /// A signature with a substitution is never replaced.
    pub fn add_function(&mut self, sig: FunctionSignature) -> bool {
        match self.functions.get(&sig.name) {
            Some(existing) if existing.is_substituted() => {
                log::trace!("keeping substitution of `{}`", sig.name);
                false
            }
            _ => {
                self.functions.insert(sig.name.clone(), sig);
                true
            }
        }
    }

    pub fn require_helper(&mut self, name: &str) {
        self.helpers.insert(name.to_string());
    }

    pub fn helpers(&self) -> &BTreeSet<String> {
        &self.helpers
    }
}
