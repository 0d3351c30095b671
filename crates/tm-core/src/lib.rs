//! tm-core - Core library for Tidemark
//!
//! This crate provides the migration file parser, content checksums,
//! migration directory discovery, and `tidemark.yml` configuration shared by
//! the engine and the CLI.

pub mod checksum;
pub mod config;
pub mod discovery;
pub mod error;
pub mod migration;

pub use checksum::compute_checksum;
pub use config::{Config, DatabaseConfig, DbType, LedgerConfig};
pub use discovery::{discover_migrations, MigrationSet};
pub use error::{CoreError, CoreResult};
pub use migration::Migration;
