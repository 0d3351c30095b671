//! Migration file parsing.
//!
//! A migration file is named `V<version>__<name>.sql`. The version defines the
//! apply order, the name is the display label (underscores become spaces), and
//! the SHA-256 of the body is what the ledger records for drift detection.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Regex for migration file names (built once, reused)
static FILE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn file_name_regex() -> &'static Regex {
    // ASCII classes only: `\d` and `\w` would also accept Unicode digits and letters.
    FILE_NAME_RE
        .get_or_init(|| Regex::new(r"^V([0-9]+)__([A-Za-z0-9_]+)\.sql$").expect("valid regex"))
}

/// A versioned SQL migration read from disk.
///
/// The body is read once while parsing and kept next to its checksum, so the
/// SQL that gets executed is always the SQL that was hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Version parsed from the file name; unique within a migration set
    pub version: u32,

    /// Display name (`add_email` becomes `add email`)
    pub name: String,

    /// Lowercase hex SHA-256 of the full file content
    pub content_hash: String,

    /// Where the migration was read from
    pub source: PathBuf,

    sql: String,
}

impl Migration {
    /// Parse a migration from its file identifier and body.
    ///
    /// `identifier` is the bare file name (`V1__create_users.sql`); `source`
    /// is kept only for error messages and reporting.
    pub fn parse(identifier: &str, body: impl Into<String>, source: PathBuf) -> CoreResult<Self> {
        let (version, name) = parse_identifier(identifier)?;
        let sql = body.into();
        Ok(Self {
            version,
            name,
            content_hash: compute_checksum(&sql),
            source,
            sql,
        })
    }

    /// Read and parse a migration file.
    ///
    /// The file name is validated before the body is read.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let identifier = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::InvalidNameFormat {
                file: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let (version, name) = parse_identifier(identifier)?;

        let sql = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(Self {
            version,
            name,
            content_hash: compute_checksum(&sql),
            source: path.to_path_buf(),
            sql,
        })
    }

    /// The SQL body to execute
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// File name of the source, for messages
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

impl std::fmt::Display for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{} ({})", self.version, self.name)
    }
}

/// Split `V<digits>__<word>.sql` into version and display name.
fn parse_identifier(identifier: &str) -> CoreResult<(u32, String)> {
    let invalid = |reason: &str| CoreError::InvalidNameFormat {
        file: identifier.to_string(),
        reason: reason.to_string(),
    };

    let captures = file_name_regex()
        .captures(identifier)
        .ok_or_else(|| invalid("does not match the migration naming pattern"))?;

    let digits = &captures[1];
    // The ledger stores versions in a 32-bit signed INTEGER column.
    let version = digits
        .parse::<u32>()
        .ok()
        .filter(|v| i32::try_from(*v).is_ok())
        .ok_or_else(|| invalid("version is out of range"))?;
    if version == 0 {
        return Err(invalid("version must be greater than 0"));
    }

    let name = captures[2].replace('_', " ");
    Ok((version, name))
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
