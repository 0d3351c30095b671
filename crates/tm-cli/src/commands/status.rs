//! Status command implementation

use anyhow::{bail, Context, Result};
use tm_core::discover_migrations;
use tm_engine::{migration_status, LedgerStore, MigrationState, MigrationStatus};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{load_project, open_database};

/// Short label and detail column for one status line
fn describe(state: &MigrationState) -> (&'static str, String) {
    match state {
        MigrationState::Applied { applied_at } => (
            "applied",
            applied_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        ),
        MigrationState::Pending => ("pending", String::new()),
        MigrationState::Drifted { recorded } => (
            "drifted",
            format!("recorded {}", recorded.chars().take(12).collect::<String>()),
        ),
        MigrationState::Missing => ("missing", "no file for recorded version".to_string()),
    }
}

fn is_clean(status: &MigrationStatus) -> bool {
    matches!(status.state, MigrationState::Applied { .. })
}

/// Execute the status command
///
/// Creates the ledger table if absent but never applies a migration.
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dir = project.migrations_dir();
    let migrations = discover_migrations(&dir)
        .with_context(|| format!("Invalid migrations in {}", dir.display()))?;

    let db = open_database(global, &project)?;
    let ledger = LedgerStore::new(db, &project.config.ledger.table)?;
    ledger.ensure_schema().await?;
    let applied = ledger.entries().await?;

    let report = migration_status(&migrations, &applied);

    println!("Migration status: {}\n", project.config.name);
    for status in report.iter().filter(|s| !args.pending || !is_clean(s)) {
        let (label, detail) = describe(&status.state);
        println!(
            "  V{:<6} {:<8} {:<40} {detail}",
            status.version, label, status.name
        );
    }

    let pending = report
        .iter()
        .filter(|s| s.state == MigrationState::Pending)
        .count();
    let broken = report
        .iter()
        .filter(|s| matches!(s.state, MigrationState::Drifted { .. } | MigrationState::Missing))
        .count();
    println!(
        "\n{} applied, {pending} pending, {broken} drifted or missing",
        report.iter().filter(|s| is_clean(s)).count()
    );

    if broken > 0 {
        bail!("{broken} applied migration(s) no longer match their files");
    }
    Ok(())
}
