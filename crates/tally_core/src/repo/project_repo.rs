//! Project repository over the shared unit of work.
//!
//! # Invariants
//! - A project is only created under an existing client.
//! - Deleting a project keeps its tasks and clears their `project_id`.

use crate::model::client::{Client, ClientId};
use crate::model::project::{Project, ProjectId, ProjectUpdate};
use crate::repo::context::WorkContext;
use crate::repo::{
    bool_to_int, fetch_all, fetch_count, fetch_optional, increment_to_db, or_logged_default,
    parse_bool, parse_optional_increment, parse_uuid, EntityKind, RepoError, RepoResult,
    Repository, WhereClause,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    name,
    is_active,
    hourly_rate,
    billing_increment,
    created_at,
    modified_at
FROM projects";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub client_id: Option<ClientId>,
    pub is_active: Option<bool>,
}

impl ProjectFilter {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            is_active: None,
        }
    }

    pub fn active_for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            is_active: Some(true),
        }
    }

    fn to_where(&self) -> WhereClause {
        let mut clause = WhereClause::default();
        if let Some(client_id) = self.client_id {
            clause.and_bound("client_id = ?", Value::Text(client_id.to_string()));
        }
        if let Some(is_active) = self.is_active {
            clause.and_bound("is_active = ?", Value::Integer(bool_to_int(is_active)));
        }
        clause
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectSort {
    #[default]
    NameAsc,
    NameDesc,
    CreatedAtAsc,
    CreatedAtDesc,
}

impl ProjectSort {
    fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "name COLLATE NOCASE ASC, created_at ASC, rowid ASC",
            Self::NameDesc => "name COLLATE NOCASE DESC, created_at ASC, rowid ASC",
            Self::CreatedAtAsc => "created_at ASC, rowid ASC",
            Self::CreatedAtDesc => "created_at DESC, rowid DESC",
        }
    }
}

pub struct ProjectRepository<'ctx> {
    ctx: &'ctx WorkContext,
}

impl<'ctx> ProjectRepository<'ctx> {
    pub fn new(ctx: &'ctx WorkContext) -> Self {
        Self { ctx }
    }

    /// Creates an active project owned by `client`.
    pub fn create_project(
        &self,
        client: &Client,
        name: &str,
        defer_save: bool,
    ) -> RepoResult<Project> {
        let project = Project::new(client, name, self.ctx.now_ms())?;
        project.validate()?;
        if !client_exists(self.ctx.connection(), client.id)? {
            return Err(RepoError::not_found(EntityKind::Client, client.id));
        }

        self.ctx.begin()?;
        self.ctx.connection().execute(
            "INSERT INTO projects (
                id,
                client_id,
                name,
                is_active,
                hourly_rate,
                billing_increment,
                created_at,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                project.id.to_string(),
                project.client_id.to_string(),
                project.name.as_str(),
                bool_to_int(project.is_active),
                project.hourly_rate,
                increment_to_db(project.billing_increment),
                project.created_at,
                project.modified_at,
            ],
        )?;
        self.ctx.save_unless_deferred(defer_save)?;

        Ok(project)
    }

    /// Applies `changes`, refreshes `modified_at`, validates and writes.
    ///
    /// The owning client is fixed at creation and not part of the update.
    /// An update that changes nothing writes nothing.
    pub fn update_project(
        &self,
        project: &mut Project,
        changes: ProjectUpdate,
        defer_save: bool,
    ) -> RepoResult<()> {
        let before = project.clone();
        changes.apply_to(project);
        if *project == before {
            return Ok(());
        }
        project.touch(self.ctx.now_ms());
        project.validate()?;

        self.ctx.execute_existing(
            "UPDATE projects
             SET
                name = ?2,
                is_active = ?3,
                hourly_rate = ?4,
                billing_increment = ?5,
                modified_at = ?6
             WHERE id = ?1;",
            params![
                project.id.to_string(),
                project.name.as_str(),
                bool_to_int(project.is_active),
                project.hourly_rate,
                increment_to_db(project.billing_increment),
                project.modified_at,
            ],
            || RepoError::not_found(EntityKind::Project, project.id),
        )?;
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }

    /// Deletes a project. Its tasks stay with their client, unassigned.
    pub fn delete_project(&self, project: &Project, defer_save: bool) -> RepoResult<()> {
        self.ctx.execute_existing(
            "DELETE FROM projects WHERE id = ?1;",
            [project.id.to_string()],
            || RepoError::not_found(EntityKind::Project, project.id),
        )?;
        info!(
            "event=entity_delete module=repo status=ok entity=project id={}",
            project.id
        );
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }

    pub fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        fetch_optional(
            self.ctx.connection(),
            &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
            vec![Value::Text(id.to_string())],
            parse_project_row,
        )
    }

    pub fn require_project(&self, id: ProjectId) -> RepoResult<Project> {
        self.get_project(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Project, id))
    }

    pub fn get_all_projects(&self) -> Vec<Project> {
        self.list_all()
    }

    pub fn get_projects(&self, client: &Client) -> Vec<Project> {
        self.list(&ProjectFilter::for_client(client.id), ProjectSort::NameAsc)
    }

    pub fn get_active_projects(&self, client: &Client) -> Vec<Project> {
        self.list(
            &ProjectFilter::active_for_client(client.id),
            ProjectSort::NameAsc,
        )
    }

    pub fn has_projects(&self) -> bool {
        self.exists(&ProjectFilter::default())
    }

    pub fn has_projects_for(&self, client: &Client) -> bool {
        self.exists(&ProjectFilter::for_client(client.id))
    }

    fn try_list(&self, filter: &ProjectFilter, sort: ProjectSort) -> RepoResult<Vec<Project>> {
        let clause = filter.to_where();
        fetch_all(
            self.ctx.connection(),
            &clause.render(PROJECT_SELECT_SQL, Some(sort.order_by())),
            clause.values(),
            parse_project_row,
        )
    }
}

impl Repository for ProjectRepository<'_> {
    type Entity = Project;
    type Filter = ProjectFilter;
    type Sort = ProjectSort;

    fn list(&self, filter: &ProjectFilter, sort: ProjectSort) -> Vec<Project> {
        or_logged_default(EntityKind::Project, "list", self.try_list(filter, sort))
    }

    fn count(&self, filter: &ProjectFilter) -> usize {
        let clause = filter.to_where();
        let result = fetch_count(
            self.ctx.connection(),
            &clause.render("SELECT COUNT(*) FROM projects", None),
            clause.values(),
        );
        or_logged_default(EntityKind::Project, "count", result)
    }
}

pub(crate) fn client_exists(conn: &Connection, client_id: ClientId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?1);",
        [client_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let client_text: String = row.get("client_id")?;
    let project = Project {
        id: parse_uuid(&id_text, "projects.id")?,
        client_id: parse_uuid(&client_text, "projects.client_id")?,
        name: row.get("name")?,
        is_active: parse_bool(row.get("is_active")?, "projects.is_active")?,
        hourly_rate: row.get("hourly_rate")?,
        billing_increment: parse_optional_increment(
            row.get("billing_increment")?,
            "projects.billing_increment",
        )?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    project
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("project {id_text}: {err}")))?;
    Ok(project)
}
