//! Migrate command implementation

use anyhow::{Context, Result};
use tm_engine::MigrationService;

use crate::cli::GlobalArgs;
use crate::commands::common::{load_project, open_database};

/// Execute the migrate command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let db = open_database(global, &project)?;

    println!("Migrating project: {}\n", project.config.name);

    let service = MigrationService::initialize_with_ledger(
        db,
        project.migrations_dir(),
        &project.config.ledger.table,
    )?;
    let report = service.migrate().await.context("Migration failed")?;

    if report.is_up_to_date() {
        println!(
            "Database is up to date ({} migration(s) found)",
            report.discovered
        );
        return Ok(());
    }

    for version in &report.applied {
        println!("  ✓ V{version}");
    }
    println!("\nApplied {} migration(s)", report.applied.len());
    Ok(())
}
