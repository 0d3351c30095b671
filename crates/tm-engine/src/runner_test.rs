use super::*;
use crate::error::LedgerError;
use crate::test_utils::{Call, Fault, RecordingDatabase};
use std::path::PathBuf;
use std::sync::Arc;
use tm_db::SqlValue;

fn migration(name: &str, sql: &str) -> Migration {
    Migration::parse(name, sql, PathBuf::from(name)).unwrap()
}

async fn setup() -> (Arc<RecordingDatabase>, LedgerStore) {
    let db = RecordingDatabase::shared();
    let ledger = LedgerStore::new(db.clone(), "migrations").unwrap();
    ledger.ensure_schema().await.unwrap();
    db.clear_calls();
    (db, ledger)
}

fn users_migrations() -> Vec<Migration> {
    vec![
        migration("V1__create_users.sql", "CREATE TABLE users (id INTEGER);"),
        migration(
            "V2__add_email.sql",
            "ALTER TABLE users ADD COLUMN email TEXT;",
        ),
        migration(
            "V3__seed_users.sql",
            "INSERT INTO users VALUES (1, 'a@example.com');",
        ),
    ]
}

#[tokio::test]
async fn test_applies_in_order_and_records() {
    let (db, ledger) = setup().await;
    let pending = users_migrations();

    let applied = MigrationRunner::new(&ledger).apply_all(&pending).await.unwrap();
    assert_eq!(applied, vec![1, 2, 3]);

    let batches = db.batches();
    assert_eq!(
        batches,
        pending.iter().map(|m| m.sql().to_string()).collect::<Vec<_>>()
    );

    let entries = ledger.entries().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].name, "add email");
    assert_eq!(entries[1].content_hash, pending[1].content_hash);
    assert_eq!(db.raw_query("SELECT COUNT(*) FROM users").await, vec![vec![SqlValue::Integer(1)]]);
}

#[tokio::test]
async fn test_one_transaction_per_migration() {
    let (db, ledger) = setup().await;
    let pending = users_migrations();
    MigrationRunner::new(&ledger).apply_all(&pending).await.unwrap();

    let control: Vec<Call> = db
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Begin | Call::Commit | Call::Rollback))
        .collect();
    assert_eq!(
        control,
        vec![
            Call::Begin,
            Call::Commit,
            Call::Begin,
            Call::Commit,
            Call::Begin,
            Call::Commit
        ]
    );
}

#[tokio::test]
async fn test_empty_pending_does_nothing() {
    let (db, ledger) = setup().await;
    let applied = MigrationRunner::new(&ledger).apply_all(&[]).await.unwrap();
    assert!(applied.is_empty());
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn test_apply_failure_rolls_back_and_stops() {
    let (db, ledger) = setup().await;
    let pending = vec![
        migration("V1__create_users.sql", "CREATE TABLE users (id INTEGER);"),
        migration(
            "V2__broken.sql",
            "CREATE TABLE half_done (id INTEGER); ALTER TABLE nope ADD COLUMN x INT;",
        ),
        migration("V3__never.sql", "CREATE TABLE never (id INTEGER);"),
    ];

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::ApplyFailed { version: 2, .. }), "{err}");
    assert_eq!(db.calls().last(), Some(&Call::Rollback));

    assert_eq!(ledger.lookup(1).await.unwrap(), Some(pending[0].content_hash.clone()));
    assert_eq!(ledger.lookup(2).await.unwrap(), None);
    assert!(db.table_exists("users").await);
    assert!(!db.table_exists("half_done").await);
    assert!(!db.table_exists("never").await);
    assert!(!db.batches().iter().any(|sql| sql.contains("never")));
}

#[tokio::test]
async fn test_ledger_write_failure_rolls_back_schema_change() {
    let (db, ledger) = setup().await;
    db.fail_on(Fault::ExecuteContaining("INSERT INTO migrations".to_string()));
    let pending = vec![migration(
        "V1__create_users.sql",
        "CREATE TABLE users (id INTEGER);",
    )];

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            MigrateError::LedgerWriteFailed {
                version: 1,
                source: LedgerError::StoreUnavailable(_)
            }
        ),
        "{err}"
    );

    db.clear_faults();
    assert!(!db.table_exists("users").await);
    assert_eq!(ledger.lookup(1).await.unwrap(), None);
}

#[tokio::test]
async fn test_commit_failure_is_fatal() {
    let (db, ledger) = setup().await;
    db.fail_on(Fault::Commit);
    let pending = users_migrations();

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            MigrateError::CommitFailed {
                version: 1,
                rollback: None,
                ..
            }
        ),
        "{err}"
    );

    // Exactly one commit attempt, no retry, nothing after V1.
    let commits = db.calls().iter().filter(|c| **c == Call::Commit).count();
    assert_eq!(commits, 1);
    assert_eq!(db.batches().len(), 1);
}

#[tokio::test]
async fn test_commit_failure_keeps_rollback_error() {
    let (db, ledger) = setup().await;
    db.fail_on(Fault::Commit);
    db.fail_on(Fault::Rollback);
    let pending = users_migrations();

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    match &err {
        MigrateError::CommitFailed {
            version, rollback, ..
        } => {
            assert_eq!(*version, 1);
            assert!(matches!(rollback, Some(tm_db::DbError::TransactionError { .. })));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("rollback also failed"), "{err}");

    let rollbacks = db.calls().iter().filter(|c| **c == Call::Rollback).count();
    assert_eq!(rollbacks, 1);
}

#[tokio::test]
async fn test_rollback_failure_is_reported_once() {
    let (db, ledger) = setup().await;
    db.fail_on(Fault::Rollback);
    let pending = vec![migration("V1__broken.sql", "SELEC 1;")];

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    match err {
        MigrateError::RollbackFailed { version, cause, .. } => {
            assert_eq!(version, 1);
            assert!(matches!(*cause, MigrateError::ApplyFailed { version: 1, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    let rollbacks = db.calls().iter().filter(|c| **c == Call::Rollback).count();
    assert_eq!(rollbacks, 1);
}

#[tokio::test]
async fn test_begin_failure() {
    let (db, ledger) = setup().await;
    db.fail_on(Fault::Begin);
    let pending = users_migrations();

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::BeginFailed { version: 1, .. }));
    assert!(db.batches().is_empty());
}

#[tokio::test]
async fn test_already_recorded_later_version_is_ledger_gap() {
    let pending = users_migrations();
    // V3 recorded out of band while V2 is missing.
    let (db, ledger) = setup().await;
    ledger.record(&LedgerEntry::from(&pending[2])).await.unwrap();
    db.clear_calls();

    let err = MigrationRunner::new(&ledger)
        .apply_all(&pending)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            MigrateError::LedgerGap {
                version: 3,
                first_pending: 1
            }
        ),
        "{err}"
    );
    assert_eq!(db.batches().len(), 2);
    assert!(!db.batches().iter().any(|sql| sql.contains("INSERT INTO users")));
    assert_eq!(db.transactions_started(), 2);
}
