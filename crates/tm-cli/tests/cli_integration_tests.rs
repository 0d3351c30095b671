//! CLI integration tests for `tm migrate`, `tm status`, and `tm validate`
//!
//! Each test builds a throwaway project in a temp dir with a file-backed
//! DuckDB database so state survives between invocations.

use std::path::Path;
use std::process::{Command, Output};

/// Path to the compiled tm binary (resolved at compile time)
fn tm_bin() -> String {
    env!("CARGO_BIN_EXE_tm").to_string()
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tidemark.yml"),
        "name: shop\ndatabase:\n  type: duckdb\n  path: shop.duckdb\n",
    )
    .unwrap();
    std::fs::create_dir(dir.path().join("migrations")).unwrap();
    write(dir.path(), "V1__create_users.sql", "CREATE TABLE users (id INTEGER);");
    write(dir.path(), "V2__add_email.sql", "ALTER TABLE users ADD COLUMN email TEXT;");
    dir
}

fn write(root: &Path, file: &str, sql: &str) {
    std::fs::write(root.join("migrations").join(file), sql).unwrap();
}

fn tm(root: &Path, args: &[&str]) -> Output {
    Command::new(tm_bin())
        .args(args)
        .args(["--project-dir", &root.display().to_string()])
        .env_remove("TIDEMARK_DATABASE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tm")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

// ── tm migrate ──────────────────────────────────────────────────────────

#[test]
fn test_migrate_then_up_to_date() {
    let dir = project();

    let first = tm(dir.path(), &["migrate"]);
    assert!(first.status.success(), "{}", combined(&first));
    assert!(stdout(&first).contains("Applied 2 migration(s)"));
    assert!(dir.path().join("shop.duckdb").exists());

    let second = tm(dir.path(), &["migrate"]);
    assert!(second.status.success(), "{}", combined(&second));
    assert!(stdout(&second).contains("Database is up to date"));
}

#[test]
fn test_migrate_reports_drift() {
    let dir = project();
    assert!(tm(dir.path(), &["migrate"]).status.success());

    write(dir.path(), "V1__create_users.sql", "CREATE TABLE users (id BIGINT);");
    let output = tm(dir.path(), &["migrate"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("MG003"), "{}", combined(&output));
}

#[test]
fn test_migrate_rejects_bad_file_name() {
    let dir = project();
    write(dir.path(), "add_orders.sql", "CREATE TABLE orders (id INTEGER);");

    let output = tm(dir.path(), &["migrate"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("add_orders.sql"), "{}", combined(&output));
}

// ── tm status ───────────────────────────────────────────────────────────

#[test]
fn test_status_lists_applied_and_pending() {
    let dir = project();
    assert!(tm(dir.path(), &["migrate"]).status.success());
    write(dir.path(), "V3__create_orders.sql", "CREATE TABLE orders (id INTEGER);");

    let output = tm(dir.path(), &["status"]);
    assert!(output.status.success(), "{}", combined(&output));
    let out = stdout(&output);
    assert!(out.contains("applied"), "{out}");
    assert!(out.contains("pending"), "{out}");
    assert!(out.contains("2 applied, 1 pending"), "{out}");
}

#[test]
fn test_status_fails_on_drift() {
    let dir = project();
    assert!(tm(dir.path(), &["migrate"]).status.success());
    write(dir.path(), "V2__add_email.sql", "ALTER TABLE users ADD COLUMN mail TEXT;");

    let output = tm(dir.path(), &["status"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("drifted"));
}

// ── tm validate ─────────────────────────────────────────────────────────

#[test]
fn test_validate_never_opens_database() {
    let dir = project();
    let output = tm(dir.path(), &["validate"]);
    assert!(output.status.success(), "{}", combined(&output));
    assert!(stdout(&output).contains("2 migration(s), latest version 2"));
    assert!(!dir.path().join("shop.duckdb").exists());
}

#[test]
fn test_validate_duplicate_versions() {
    let dir = project();
    write(dir.path(), "V2__add_phone.sql", "ALTER TABLE users ADD COLUMN phone TEXT;");

    let output = tm(dir.path(), &["validate"]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("C004"), "{}", combined(&output));
}
