//! Ordered schema steps, tracked through `PRAGMA user_version`.
//!
//! A store at version `n` has run every step up to and including `n`.
//! Pending steps run in a single transaction, so a failing step leaves the
//! store at the version it was opened with.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "entities",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "settings",
        sql: include_str!("0002_settings.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `SchemaTooNew` when the store is ahead of this build.
/// - `MigrationFailed` naming the first step that did not apply.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > found)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        run_step(&tx, step).map_err(|source| DbError::MigrationFailed {
            version: step.version,
            name: step.name,
            source,
        })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> rusqlite::Result<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)
}
