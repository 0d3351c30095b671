//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Migration file name does not follow `V<digits>__<name>.sql`
    #[error("[C003] Migration file '{file}' has an invalid name: {reason}. Expected V<version>__<name>.sql")]
    InvalidNameFormat { file: String, reason: String },

    /// C004: Two migration files share a version
    #[error("[C004] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: u32,
        first: String,
        second: String,
    },

    /// C005: Migrations directory does not exist
    #[error("[C005] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// C006: IO error with file path context
    #[error("[C006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C007: Config YAML parse error
    #[error("[C007] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
