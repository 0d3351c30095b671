//! Validate command implementation

use anyhow::{Context, Result};
use tm_core::discover_migrations;

use crate::cli::GlobalArgs;
use crate::commands::common::load_project;

/// Execute the validate command
///
/// Parses every migration file and checks for duplicate versions. The
/// database is never opened.
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dir = project.migrations_dir();

    println!("Validating project: {}\n", project.config.name);

    let migrations = discover_migrations(&dir)
        .with_context(|| format!("Invalid migrations in {}", dir.display()))?;

    for migration in &migrations {
        let short_hash = &migration.content_hash[..12];
        println!(
            "  V{:<6} {:<40} {short_hash}",
            migration.version, migration.name
        );
        if global.verbose {
            println!("          {}", migration.source.display());
        }
    }

    match migrations.as_slice().last() {
        Some(latest) => println!(
            "\n✓ {} migration(s), latest version {}",
            migrations.len(),
            latest.version
        ),
        None => println!("✓ (no migrations found)"),
    }
    Ok(())
}
