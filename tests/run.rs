use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::{TempDir, prelude::*};
use predicates::prelude::*;

/// Translate a checked-in dump into `dir`, returning the generated Go source.
fn translate_dump(dump: &str, dir: &TempDir) -> String {
    let out = dir.child("out.go");
    let output = cargo_bin_cmd!("ctogo")
        .arg("--from-dump")
        .arg(dump)
        .arg("-o")
        .arg(out.path())
        .output()
        .unwrap();

    std::io::stderr()
        .write_all(output.stderr.as_slice())
        .unwrap();

    assert!(output.status.code() == Some(0), "non-zero exit code");
    std::fs::read_to_string(out.path()).unwrap()
}

#[test]
fn hello_world() {
    let dir = TempDir::new().unwrap();
    let go = translate_dump("tests/ok/hello.ast", &dir);

    assert!(go.starts_with("package main\n"));
    assert!(go.contains("\"github.com/elliotchance/c2go/noarch\""));
    assert!(go.contains("\"os\""));
    assert!(go.contains("func main() {"));
    assert!(go.contains(r#"noarch.Printf([]byte("Hello, world!\n\x00"))"#));
    assert!(go.contains("os.Exit(int(0))"));
    // the prototype from stdio.h is replaced by the runtime
    assert!(!go.contains("func printf"));
}

#[test]
fn structs_loops_and_switch() {
    let dir = TempDir::new().unwrap();
    let go = translate_dump("tests/ok/shapes.ast", &dir);

    assert!(go.contains("type point struct {"));
    assert!(go.contains("func dist(p *point) int32 {"));
    assert!(go.contains("p.x - p.y"));
    assert!(go.contains("for d < 0 {"));
    assert!(go.contains("switch d {"));
    assert!(go.contains("fallthrough"));
    assert!(go.contains("return d"));
}

#[test]
fn package_name_is_configurable() {
    let dir = TempDir::new().unwrap();
    let out = dir.child("lib.go");
    cargo_bin_cmd!("ctogo")
        .args(["--from-dump", "tests/ok/shapes.ast", "-p", "shapes", "-o"])
        .arg(out.path())
        .assert()
        .success();
    out.assert(predicate::str::starts_with("package shapes\n"));
}

#[test]
fn unsupported_declaration_becomes_comment() {
    let dir = TempDir::new().unwrap();
    let out = dir.child("gnu.go");
    cargo_bin_cmd!("ctogo")
        .args(["--from-dump", "tests/ok/gnu.ast", "-o"])
        .arg(out.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("statement expression is not supported"));

    out.assert(predicate::str::contains("// ctogo: FunctionDecl at gnu.c:1:1:"));
    out.assert(predicate::str::contains("var limit int32 = 100"));
}

#[test]
fn output_defaults_to_dump_name() {
    let dir = TempDir::new().unwrap();
    dir.copy_from("tests/ok", &["hello.ast"]).unwrap();
    cargo_bin_cmd!("ctogo")
        .current_dir(dir.path())
        .args(["--from-dump", "hello.ast"])
        .assert()
        .success();
    dir.child("hello.go")
        .assert(predicate::str::contains("func main() {"));
}

#[test]
fn print_ast_only_echoes_the_dump() {
    let dir = TempDir::new().unwrap();
    dir.copy_from("tests/ok", &["hello.ast"]).unwrap();
    cargo_bin_cmd!("ctogo")
        .current_dir(dir.path())
        .args(["--print-ast", "--from-dump", "hello.ast"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("TranslationUnitDecl"));
    dir.child("hello.go").assert(predicate::path::missing());
}

#[test]
fn unknown_node_kind_fails() {
    cargo_bin_cmd!("ctogo")
        .args(["--from-dump", "tests/err/unknown_kind.ast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown node kind"))
        .stderr(predicate::str::contains("FrobnicateDecl"));
}

#[test]
fn root_must_be_translation_unit() {
    cargo_bin_cmd!("ctogo")
        .args(["--from-dump", "tests/err/not_a_unit.ast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected TranslationUnitDecl"));
}

#[test]
fn over_indented_line_fails() {
    cargo_bin_cmd!("ctogo")
        .args(["--from-dump", "tests/err/broken_prefix.ast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("deeper than its parent"));
}

#[test]
fn missing_input_fails() {
    let dir = TempDir::new().unwrap();
    cargo_bin_cmd!("ctogo")
        .current_dir(dir.path())
        .arg("nowhere.c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn input_or_dump_is_required() {
    cargo_bin_cmd!("ctogo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<INPUT>"));
}
