//! Repository layer over the shared unit of work.
//!
//! # Responsibility
//! - Provide per-entity create/update/delete with validation.
//! - Provide filtered, sorted list/count/exists queries.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Validation runs before any row is written.
//! - Every mutation runs inside the `WorkContext` transaction and is
//!   committed only when the caller does not defer the save.
//! - `list`/`count`/`exists` never fail; store errors are logged and read
//!   as "no rows".

use crate::db::DbError;
use crate::model::increment::BillingIncrement;
use crate::model::validation::ValidationError;
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod client_repo;
pub mod context;
pub mod project_repo;
pub mod settings_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity tag used in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Client,
    Project,
    Task,
    Settings,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Client => "client",
            Self::Project => "project",
            Self::Task => "task",
            Self::Settings => "settings",
        };
        f.write_str(name)
    }
}

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected before touching the store.
    Validation(ValidationError),
    /// Store-level failure, surfaced as-is.
    Persistence(DbError),
    NotFound { kind: EntityKind, id: Uuid },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted row cannot be converted into a valid entity.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    /// Returns the validation failure, if this is one.
    pub fn as_validation(&self) -> Option<ValidationError> {
        match self {
            Self::Validation(err) => Some(*err),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// Query contract shared by every entity repository.
pub trait Repository {
    type Entity;
    type Filter: Default;
    type Sort: Default + Copy;

    /// Entities matching `filter`, ordered by `sort`.
    fn list(&self, filter: &Self::Filter, sort: Self::Sort) -> Vec<Self::Entity>;

    /// Number of entities matching `filter`.
    fn count(&self, filter: &Self::Filter) -> usize;

    fn exists(&self, filter: &Self::Filter) -> bool {
        self.count(filter) > 0
    }

    fn list_all(&self) -> Vec<Self::Entity> {
        self.list(&Self::Filter::default(), Self::Sort::default())
    }
}

/// Incrementally built `WHERE` clause with positional bindings.
#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    sql: String,
    values: Vec<Value>,
}

impl WhereClause {
    pub(crate) fn and(&mut self, condition: &str) {
        self.sql.push_str(" AND ");
        self.sql.push_str(condition);
    }

    pub(crate) fn and_bound(&mut self, condition: &str, value: Value) {
        self.and(condition);
        self.values.push(value);
    }

    pub(crate) fn render(&self, select: &str, order_by: Option<&str>) -> String {
        let mut sql = format!("{select} WHERE 1 = 1{}", self.sql);
        if let Some(order_by) = order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        sql.push(';');
        sql
    }

    pub(crate) fn values(&self) -> Vec<Value> {
        self.values.clone()
    }
}

pub(crate) fn fetch_all<T>(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

pub(crate) fn fetch_optional<T>(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn fetch_count(conn: &Connection, sql: &str, values: Vec<Value>) -> RepoResult<usize> {
    let count: i64 = conn.query_row(sql, params_from_iter(values), |row| row.get(0))?;
    usize::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
}

/// Unwraps a read result, logging and defaulting on failure.
pub(crate) fn or_logged_default<T: Default>(
    kind: EntityKind,
    op: &'static str,
    result: RepoResult<T>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!("event=query_failed module=repo status=error entity={kind} op={op} error={err}");
            T::default()
        }
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_increment(value: i64, column: &'static str) -> RepoResult<BillingIncrement> {
    u32::try_from(value)
        .ok()
        .and_then(BillingIncrement::from_minutes)
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid billing increment `{value}` in {column}"))
        })
}

pub(crate) fn parse_optional_increment(
    value: Option<i64>,
    column: &'static str,
) -> RepoResult<Option<BillingIncrement>> {
    value.map(|minutes| parse_increment(minutes, column)).transpose()
}

pub(crate) fn increment_to_db(increment: Option<BillingIncrement>) -> Option<i64> {
    increment.map(|value| i64::from(value.minutes()))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
