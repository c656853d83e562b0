//! Shared unit of work for all repositories.
//!
//! # Responsibility
//! - Own the single SQLite connection and the time source.
//! - Open a transaction lazily at the first mutation.
//! - Commit (`save`) or discard (`rollback`) all pending mutations at once.
//!
//! # Invariants
//! - `has_changes()` is true exactly while a transaction is open.
//! - A failed commit leaves the transaction open; the caller owns rollback.
//! - Reads through the context observe pending, uncommitted mutations.

use crate::clock::{Clock, SystemClock};
use crate::db::migrations::latest_version;
use crate::db::{open_db_in_memory, DbResult};
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::{Connection, Params};

pub struct WorkContext {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl WorkContext {
    /// Wraps a migrated connection using the system clock.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        Self::try_with_clock(conn, SystemClock)
    }

    /// Wraps a migrated connection using a caller-provided clock.
    pub fn try_with_clock(conn: Connection, clock: impl Clock + 'static) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn,
            clock: Box::new(clock),
        })
    }

    /// Fresh in-memory store with the system clock.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Whether mutations are pending since the last commit or rollback.
    pub fn has_changes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Commits pending mutations. No-op when nothing is pending.
    pub fn save(&self) -> DbResult<()> {
        if !self.has_changes() {
            return Ok(());
        }
        match self.conn.execute_batch("COMMIT;") {
            Ok(()) => {
                info!("event=tx_commit module=repo status=ok");
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=tx_commit module=repo status=error error_code=commit_failed error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Discards pending mutations. No-op when nothing is pending.
    pub fn rollback(&self) -> DbResult<()> {
        if !self.has_changes() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        info!("event=tx_rollback module=repo status=ok");
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Opens the unit-of-work transaction unless one is already open.
    pub(crate) fn begin(&self) -> DbResult<()> {
        if self.has_changes() {
            return Ok(());
        }
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        debug!("event=tx_begin module=repo status=ok");
        Ok(())
    }

    pub(crate) fn save_unless_deferred(&self, defer_save: bool) -> DbResult<()> {
        if defer_save {
            return Ok(());
        }
        self.save()
    }

    /// Runs a mutation that must hit an existing row.
    ///
    /// Zero affected rows yields `missing()`. On that or a failed statement,
    /// a transaction opened by this call is rolled back so no empty unit of
    /// work stays pending.
    pub(crate) fn execute_existing<P: Params>(
        &self,
        sql: &str,
        params: P,
        missing: impl FnOnce() -> RepoError,
    ) -> RepoResult<()> {
        let opened_here = !self.has_changes();
        self.begin()?;
        let changed = match self.conn.execute(sql, params) {
            Ok(changed) => changed,
            Err(err) => {
                if opened_here {
                    self.rollback()?;
                }
                return Err(err.into());
            }
        };
        if changed == 0 {
            if opened_here {
                self.rollback()?;
            }
            return Err(missing());
        }
        Ok(())
    }

    /// Runs `work` inside a savepoint of the unit of work.
    ///
    /// On error only the mutations made by `work` are undone; mutations that
    /// were pending before the call stay pending. If `work` opened the
    /// transaction itself, it is rolled back entirely.
    pub(crate) fn atomically<T>(
        &self,
        name: &str,
        work: impl FnOnce() -> RepoResult<T>,
    ) -> RepoResult<T> {
        let opened_here = !self.has_changes();
        self.begin()?;
        self.conn.execute_batch(&format!("SAVEPOINT {name};"))?;
        match work() {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE {name};"))?;
                Ok(value)
            }
            Err(err) => {
                self.conn
                    .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))?;
                if opened_here {
                    self.rollback()?;
                }
                Err(err)
            }
        }
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 =
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    if !conn.is_autocommit() {
        return Err(RepoError::InvalidData(
            "connection already has an open transaction".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::WorkContext;
    use crate::repo::RepoError;
    use rusqlite::Connection;

    #[test]
    fn raw_connection_is_rejected_until_migrated() {
        let conn = Connection::open_in_memory().unwrap();
        let err = WorkContext::try_new(conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn begin_is_idempotent_and_save_closes_transaction() {
        let ctx = WorkContext::open_in_memory().unwrap();
        assert!(!ctx.has_changes());
        ctx.begin().unwrap();
        ctx.begin().unwrap();
        assert!(ctx.has_changes());
        ctx.save().unwrap();
        assert!(!ctx.has_changes());
        ctx.save().unwrap();
        ctx.rollback().unwrap();
    }

    #[test]
    fn failed_atomic_block_keeps_earlier_pending_work() {
        let ctx = WorkContext::open_in_memory().unwrap();
        ctx.begin().unwrap();
        ctx.connection()
            .execute_batch("CREATE TEMP TABLE scratch (v INTEGER); INSERT INTO scratch VALUES (1);")
            .unwrap();

        let result: Result<(), RepoError> = ctx.atomically("scratch_block", || {
            ctx.connection()
                .execute_batch("INSERT INTO scratch VALUES (2);")?;
            Err(RepoError::InvalidData("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(ctx.has_changes());

        let rows: i64 = ctx
            .connection()
            .query_row("SELECT COUNT(*) FROM scratch;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn failed_atomic_block_on_clean_context_leaves_no_changes() {
        let ctx = WorkContext::open_in_memory().unwrap();
        let result: Result<(), RepoError> = ctx.atomically("clean_block", || {
            Err(RepoError::InvalidData("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(!ctx.has_changes());
    }
}
