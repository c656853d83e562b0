//! Client repository over the shared unit of work.
//!
//! # Invariants
//! - Deleting a client removes its projects and every task it owns, direct
//!   or via a project, in the same transaction.
//! - Default ordering is name ascending (case-insensitive).

use crate::model::client::{Client, ClientId, ClientUpdate, NewClient};
use crate::repo::context::WorkContext;
use crate::repo::{
    bool_to_int, fetch_all, fetch_count, fetch_optional, increment_to_db, or_logged_default,
    parse_bool, parse_optional_increment, parse_uuid, EntityKind, RepoError, RepoResult,
    Repository, WhereClause,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Row};

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    is_active,
    hourly_rate,
    billing_increment,
    notes,
    created_at,
    modified_at
FROM clients";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    pub is_active: Option<bool>,
}

impl ClientFilter {
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
        }
    }

    fn to_where(&self) -> WhereClause {
        let mut clause = WhereClause::default();
        if let Some(is_active) = self.is_active {
            clause.and_bound("is_active = ?", Value::Integer(bool_to_int(is_active)));
        }
        clause
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientSort {
    #[default]
    NameAsc,
    NameDesc,
    CreatedAtAsc,
    CreatedAtDesc,
}

impl ClientSort {
    fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "name COLLATE NOCASE ASC, created_at ASC, rowid ASC",
            Self::NameDesc => "name COLLATE NOCASE DESC, created_at ASC, rowid ASC",
            Self::CreatedAtAsc => "created_at ASC, rowid ASC",
            Self::CreatedAtDesc => "created_at DESC, rowid DESC",
        }
    }
}

pub struct ClientRepository<'ctx> {
    ctx: &'ctx WorkContext,
}

impl<'ctx> ClientRepository<'ctx> {
    pub fn new(ctx: &'ctx WorkContext) -> Self {
        Self { ctx }
    }

    /// Creates an active client with the given name.
    pub fn create_client(&self, name: &str, defer_save: bool) -> RepoResult<Client> {
        self.create_client_with(NewClient::named(name), defer_save)
    }

    /// Creates a client from full input.
    ///
    /// Validation failures leave the unit of work untouched.
    pub fn create_client_with(&self, input: NewClient, defer_save: bool) -> RepoResult<Client> {
        let mut client = Client::new(&input.name, self.ctx.now_ms())?;
        client.hourly_rate = input.hourly_rate;
        client.billing_increment = input.billing_increment;
        client.notes = input.notes;
        client.validate()?;

        self.ctx.begin()?;
        self.ctx.connection().execute(
            "INSERT INTO clients (
                id,
                name,
                is_active,
                hourly_rate,
                billing_increment,
                notes,
                created_at,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                client.id.to_string(),
                client.name.as_str(),
                bool_to_int(client.is_active),
                client.hourly_rate,
                increment_to_db(client.billing_increment),
                client.notes.as_deref(),
                client.created_at,
                client.modified_at,
            ],
        )?;
        self.ctx.save_unless_deferred(defer_save)?;

        Ok(client)
    }

    /// Applies `changes`, refreshes `modified_at`, validates and writes.
    ///
    /// Changes that leave `client` as it was write nothing. On validation
    /// failure `client` keeps the applied changes in memory and nothing is
    /// written.
    pub fn update_client(
        &self,
        client: &mut Client,
        changes: ClientUpdate,
        defer_save: bool,
    ) -> RepoResult<()> {
        let before = client.clone();
        changes.apply_to(client);
        if *client == before {
            return Ok(());
        }
        client.touch(self.ctx.now_ms());
        client.validate()?;

        self.ctx.execute_existing(
            "UPDATE clients
             SET
                name = ?2,
                is_active = ?3,
                hourly_rate = ?4,
                billing_increment = ?5,
                notes = ?6,
                modified_at = ?7
             WHERE id = ?1;",
            params![
                client.id.to_string(),
                client.name.as_str(),
                bool_to_int(client.is_active),
                client.hourly_rate,
                increment_to_db(client.billing_increment),
                client.notes.as_deref(),
                client.modified_at,
            ],
            || RepoError::not_found(EntityKind::Client, client.id),
        )?;
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }

    /// Deletes a client together with its projects and tasks.
    pub fn delete_client(&self, client: &Client, defer_save: bool) -> RepoResult<()> {
        self.ctx.execute_existing(
            "DELETE FROM clients WHERE id = ?1;",
            [client.id.to_string()],
            || RepoError::not_found(EntityKind::Client, client.id),
        )?;
        info!("event=entity_delete module=repo status=ok entity=client id={}", client.id);
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }

    pub fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        fetch_optional(
            self.ctx.connection(),
            &format!("{CLIENT_SELECT_SQL} WHERE id = ?1;"),
            vec![Value::Text(id.to_string())],
            parse_client_row,
        )
    }

    /// Loads a client, mapping absence to `NotFound`.
    pub fn require_client(&self, id: ClientId) -> RepoResult<Client> {
        self.get_client(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Client, id))
    }

    pub fn get_all_clients(&self) -> Vec<Client> {
        self.list_all()
    }

    pub fn get_active_clients(&self) -> Vec<Client> {
        self.list(&ClientFilter::active(), ClientSort::NameAsc)
    }

    pub fn has_clients(&self) -> bool {
        self.exists(&ClientFilter::default())
    }

    fn try_list(&self, filter: &ClientFilter, sort: ClientSort) -> RepoResult<Vec<Client>> {
        let clause = filter.to_where();
        fetch_all(
            self.ctx.connection(),
            &clause.render(CLIENT_SELECT_SQL, Some(sort.order_by())),
            clause.values(),
            parse_client_row,
        )
    }
}

impl Repository for ClientRepository<'_> {
    type Entity = Client;
    type Filter = ClientFilter;
    type Sort = ClientSort;

    fn list(&self, filter: &ClientFilter, sort: ClientSort) -> Vec<Client> {
        or_logged_default(EntityKind::Client, "list", self.try_list(filter, sort))
    }

    fn count(&self, filter: &ClientFilter) -> usize {
        let clause = filter.to_where();
        let result = fetch_count(
            self.ctx.connection(),
            &clause.render("SELECT COUNT(*) FROM clients", None),
            clause.values(),
        );
        or_logged_default(EntityKind::Client, "count", result)
    }
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let id_text: String = row.get("id")?;
    let client = Client {
        id: parse_uuid(&id_text, "clients.id")?,
        name: row.get("name")?,
        is_active: parse_bool(row.get("is_active")?, "clients.is_active")?,
        hourly_rate: row.get("hourly_rate")?,
        billing_increment: parse_optional_increment(
            row.get("billing_increment")?,
            "clients.billing_increment",
        )?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    client
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("client {id_text}: {err}")))?;
    Ok(client)
}
