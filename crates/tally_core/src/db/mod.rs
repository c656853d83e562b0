//! Storage layer: connection bootstrap, schema versioning and store errors.
//!
//! The entity graph's delete policy lives in the schema itself
//! (`migrations/0001_init.sql`): deleting a client cascades to its projects
//! and tasks, deleting a project detaches its tasks. That only holds while
//! `foreign_keys` is on, which `open_db` guarantees.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure reported by the store itself.
///
/// Callers see these unchanged. Nothing in the core retries.
#[derive(Debug)]
pub enum DbError {
    /// Any SQLite failure outside schema setup (disk, locking, constraints).
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build than this one.
    SchemaTooNew { found: u32, supported: u32 },
    /// A schema step failed; the store stays at its previous version.
    MigrationFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "store error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "store schema v{found} is newer than this build understands (v{supported})"
            ),
            Self::MigrationFailed {
                version,
                name,
                source,
            } => write!(f, "schema step v{version} ({name}) failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
