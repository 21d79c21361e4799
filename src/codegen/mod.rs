//! Printing of the Go syntax tree.

mod emit;

pub use emit::emit_code;
