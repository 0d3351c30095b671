use super::*;
use std::path::PathBuf;

fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

fn migration(name: &str) -> Migration {
    Migration::parse(name, format!("-- {name}"), PathBuf::from(name)).unwrap()
}

#[test]
fn test_set_sorts_by_version() {
    let set = MigrationSet::new(vec![
        migration("V10__ten.sql"),
        migration("V2__two.sql"),
        migration("V1__one.sql"),
    ])
    .unwrap();

    let versions: Vec<u32> = set.iter().map(|m| m.version).collect();
    assert_eq!(versions, vec![1, 2, 10]);
}

#[test]
fn test_set_rejects_duplicate_versions() {
    let err = MigrationSet::new(vec![
        migration("V1__one.sql"),
        migration("V2__two.sql"),
        migration("V02__also_two.sql"),
    ])
    .unwrap_err();

    match err {
        CoreError::DuplicateVersion { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_from_version() {
    let set = MigrationSet::new(vec![
        migration("V1__one.sql"),
        migration("V2__two.sql"),
        migration("V3__three.sql"),
    ])
    .unwrap();

    let tail: Vec<u32> = set.from_version(2).iter().map(|m| m.version).collect();
    assert_eq!(tail, vec![2, 3]);
    assert!(set.from_version(9).is_empty());
}

#[test]
fn test_discover_orders_by_version() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V3__third.sql", "SELECT 3;");
    write(dir.path(), "V1__first.sql", "SELECT 1;");
    write(dir.path(), "V20__twentieth.sql", "SELECT 20;");
    write(dir.path(), "V2__second.sql", "SELECT 2;");

    let set = discover_migrations(dir.path()).unwrap();
    let versions: Vec<u32> = set.iter().map(|m| m.version).collect();
    assert_eq!(versions, vec![1, 2, 3, 20]);
}

#[test]
fn test_discover_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let set = discover_migrations(dir.path()).unwrap();
    assert!(set.is_empty());
}

#[test]
fn test_discover_skips_hidden_files_and_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__first.sql", "SELECT 1;");
    write(dir.path(), ".gitkeep", "");
    std::fs::create_dir(dir.path().join("archive")).unwrap();
    write(&dir.path().join("archive"), "not_a_migration.txt", "");

    let set = discover_migrations(dir.path()).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_discover_rejects_invalid_file_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__first.sql", "SELECT 1;");
    write(dir.path(), "create_users.sql", "CREATE TABLE users (id INT);");

    let err = discover_migrations(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidNameFormat { .. }));
}

#[test]
fn test_discover_rejects_duplicate_versions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "V1__first.sql", "SELECT 1;");
    write(dir.path(), "V001__also_first.sql", "SELECT 1;");

    let err = discover_migrations(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateVersion { version: 1, .. }));
}

#[test]
fn test_discover_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = discover_migrations(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, CoreError::MigrationsDirNotFound { .. }));
}
