//! Migration directory discovery.
//!
//! Every regular file in the migrations directory must be a migration. Hidden
//! files (leading `.`) and subdirectories are skipped.

use crate::error::{CoreError, CoreResult};
use crate::migration::Migration;
use std::path::Path;

/// Migrations sorted ascending by version, with no duplicate versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Sort migrations by version and reject duplicates.
    pub fn new(mut migrations: Vec<Migration>) -> CoreResult<Self> {
        migrations.sort_by_key(|m| m.version);

        if let Some(pair) = migrations
            .windows(2)
            .find(|pair| pair[0].version == pair[1].version)
        {
            return Err(CoreError::DuplicateVersion {
                version: pair[0].version,
                first: pair[0].file_name(),
                second: pair[1].file_name(),
            });
        }

        Ok(Self { migrations })
    }

    /// All migrations in ascending version order
    pub fn as_slice(&self) -> &[Migration] {
        &self.migrations
    }

    /// Iterate in ascending version order
    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// The migrations from `version` (inclusive) onward.
    ///
    /// Returns an empty slice when no migration has that version.
    pub fn from_version(&self, version: u32) -> &[Migration] {
        match self.migrations.iter().position(|m| m.version == version) {
            Some(idx) => &self.migrations[idx..],
            None => &[],
        }
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.iter()
    }
}

/// Read every migration file in `dir` into a sorted [`MigrationSet`].
///
/// Directory enumeration order does not matter; the result is always ordered
/// by version.
pub fn discover_migrations(dir: &Path) -> CoreResult<MigrationSet> {
    if !dir.is_dir() {
        return Err(CoreError::MigrationsDirNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut migrations = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })? {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            log::debug!("Skipping hidden file {}", path.display());
            continue;
        }
        migrations.push(Migration::from_file(&path)?);
    }

    log::debug!(
        "Discovered {} migration(s) in {}",
        migrations.len(),
        dir.display()
    );
    MigrationSet::new(migrations)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
