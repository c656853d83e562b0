//! Task repository over the shared unit of work.
//!
//! # Invariants
//! - A task always belongs to an existing client.
//! - When a task has a project, the project belongs to the task's client.
//! - Per-owner listings are newest first (`created_at DESC`).
//! - Timer fields are only written through the timer service.

use crate::model::client::{Client, ClientId};
use crate::model::project::{Project, ProjectId};
use crate::model::task::{NewTask, Task, TaskId, TaskUpdate, TimerState};
use crate::model::validation::ValidationError;
use crate::repo::context::WorkContext;
use crate::repo::project_repo::{client_exists, ProjectRepository};
use crate::repo::{
    fetch_all, fetch_count, fetch_optional, or_logged_default, parse_optional_uuid, parse_uuid,
    EntityKind, RepoError, RepoResult, Repository, WhereClause,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    project_id,
    name,
    start_time,
    end_time,
    duration_secs,
    notes,
    created_at,
    modified_at
FROM tasks";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub client_id: Option<ClientId>,
    pub project_id: Option<ProjectId>,
    /// Only tasks without a project.
    pub without_project: bool,
    pub state: Option<TimerState>,
}

impl TaskFilter {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn in_state(mut self, state: TimerState) -> Self {
        self.state = Some(state);
        self
    }

    fn to_where(&self) -> WhereClause {
        let mut clause = WhereClause::default();
        if let Some(client_id) = self.client_id {
            clause.and_bound("client_id = ?", Value::Text(client_id.to_string()));
        }
        if let Some(project_id) = self.project_id {
            clause.and_bound("project_id = ?", Value::Text(project_id.to_string()));
        }
        if self.without_project {
            clause.and("project_id IS NULL");
        }
        match self.state {
            Some(TimerState::NotStarted) => clause.and("start_time IS NULL"),
            Some(TimerState::Running) => clause.and("start_time IS NOT NULL AND end_time IS NULL"),
            Some(TimerState::Completed) => {
                clause.and("start_time IS NOT NULL AND end_time IS NOT NULL")
            }
            None => {}
        }
        clause
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSort {
    #[default]
    NameAsc,
    CreatedAtDesc,
    CreatedAtAsc,
    StartTimeDesc,
}

impl TaskSort {
    fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "name COLLATE NOCASE ASC, created_at ASC, rowid ASC",
            Self::CreatedAtDesc => "created_at DESC, rowid DESC",
            Self::CreatedAtAsc => "created_at ASC, rowid ASC",
            Self::StartTimeDesc => "start_time DESC, rowid DESC",
        }
    }
}

pub struct TaskRepository<'ctx> {
    ctx: &'ctx WorkContext,
}

impl<'ctx> TaskRepository<'ctx> {
    pub fn new(ctx: &'ctx WorkContext) -> Self {
        Self { ctx }
    }

    /// Creates a not-started task.
    ///
    /// Fails before any write when the name is blank, the client or project
    /// is missing, or the project belongs to another client.
    pub fn create_task(&self, input: NewTask, defer_save: bool) -> RepoResult<Task> {
        let mut task = Task::new(
            &input.name,
            input.client_id,
            input.project_id,
            self.ctx.now_ms(),
        )?;
        task.notes = input.notes;
        task.validate()?;
        if !client_exists(self.ctx.connection(), task.client_id)? {
            return Err(RepoError::not_found(EntityKind::Client, task.client_id));
        }
        self.ensure_project_matches(&task)?;

        self.ctx.begin()?;
        self.ctx.connection().execute(
            "INSERT INTO tasks (
                id,
                client_id,
                project_id,
                name,
                start_time,
                end_time,
                duration_secs,
                notes,
                created_at,
                modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                task.id.to_string(),
                task.client_id.to_string(),
                task.project_id.map(|id| id.to_string()),
                task.name.as_str(),
                task.start_time,
                task.end_time,
                task.duration_secs,
                task.notes.as_deref(),
                task.created_at,
                task.modified_at,
            ],
        )?;
        self.ctx.save_unless_deferred(defer_save)?;

        Ok(task)
    }

    /// Applies `changes`, refreshes `modified_at`, validates and writes.
    ///
    /// An update that changes nothing writes nothing.
    pub fn update_task(
        &self,
        task: &mut Task,
        changes: TaskUpdate,
        defer_save: bool,
    ) -> RepoResult<()> {
        let before = task.clone();
        changes.apply_to(task);
        if *task == before {
            return Ok(());
        }
        let project_changed = task.project_id != before.project_id;
        task.touch(self.ctx.now_ms());
        task.validate()?;
        if project_changed {
            self.ensure_project_matches(task)?;
        }
        self.write(task, defer_save)
    }

    /// Writes timer transitions made on `task`.
    pub(crate) fn save_timer_fields(&self, task: &mut Task, defer_save: bool) -> RepoResult<()> {
        task.touch(self.ctx.now_ms());
        task.validate()?;
        self.write(task, defer_save)
    }

    pub fn delete_task(&self, task: &Task, defer_save: bool) -> RepoResult<()> {
        self.ctx.execute_existing(
            "DELETE FROM tasks WHERE id = ?1;",
            [task.id.to_string()],
            || RepoError::not_found(EntityKind::Task, task.id),
        )?;
        info!("event=entity_delete module=repo status=ok entity=task id={}", task.id);
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }

    pub fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        fetch_optional(
            self.ctx.connection(),
            &format!("{TASK_SELECT_SQL} WHERE id = ?1;"),
            vec![Value::Text(id.to_string())],
            parse_task_row,
        )
    }

    pub fn require_task(&self, id: TaskId) -> RepoResult<Task> {
        self.get_task(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Task, id))
    }

    /// All tasks of `client`, direct or via projects, newest first.
    pub fn get_tasks_for_client(&self, client: &Client) -> Vec<Task> {
        self.list(&TaskFilter::for_client(client.id), TaskSort::CreatedAtDesc)
    }

    pub fn get_tasks_for_project(&self, project: &Project) -> Vec<Task> {
        self.list(&TaskFilter::for_project(project.id), TaskSort::CreatedAtDesc)
    }

    /// Tasks of `client` with both start and end time set.
    pub fn get_completed_tasks(&self, client: &Client) -> Vec<Task> {
        self.list(
            &TaskFilter::for_client(client.id).in_state(TimerState::Completed),
            TaskSort::CreatedAtDesc,
        )
    }

    /// Tasks of `client` not assigned to any project.
    pub fn get_unassigned_tasks(&self, client: &Client) -> Vec<Task> {
        let filter = TaskFilter {
            without_project: true,
            ..TaskFilter::for_client(client.id)
        };
        self.list(&filter, TaskSort::CreatedAtDesc)
    }

    /// Running tasks across all clients, most recently started first.
    pub fn get_running_tasks(&self) -> Vec<Task> {
        self.list(
            &TaskFilter::default().in_state(TimerState::Running),
            TaskSort::StartTimeDesc,
        )
    }

    pub fn has_tasks(&self) -> bool {
        self.exists(&TaskFilter::default())
    }

    /// Fallible lookup of a running task other than `excluded`.
    pub(crate) fn find_other_running(&self, excluded: TaskId) -> RepoResult<Option<Task>> {
        fetch_optional(
            self.ctx.connection(),
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE start_time IS NOT NULL
                   AND end_time IS NULL
                   AND id <> ?1
                 ORDER BY start_time DESC
                 LIMIT 1;"
            ),
            vec![Value::Text(excluded.to_string())],
            parse_task_row,
        )
    }

    fn ensure_project_matches(&self, task: &Task) -> RepoResult<()> {
        let Some(project_id) = task.project_id else {
            return Ok(());
        };
        let project = ProjectRepository::new(self.ctx).require_project(project_id)?;
        if project.client_id != task.client_id {
            return Err(ValidationError::ProjectClientMismatch {
                project_client: project.client_id,
                task_client: task.client_id,
            }
            .into());
        }
        Ok(())
    }

    fn write(&self, task: &Task, defer_save: bool) -> RepoResult<()> {
        self.ctx.execute_existing(
            "UPDATE tasks
             SET
                project_id = ?2,
                name = ?3,
                start_time = ?4,
                end_time = ?5,
                duration_secs = ?6,
                notes = ?7,
                modified_at = ?8
             WHERE id = ?1;",
            params![
                task.id.to_string(),
                task.project_id.map(|id| id.to_string()),
                task.name.as_str(),
                task.start_time,
                task.end_time,
                task.duration_secs,
                task.notes.as_deref(),
                task.modified_at,
            ],
            || RepoError::not_found(EntityKind::Task, task.id),
        )?;
        self.ctx.save_unless_deferred(defer_save)?;
        Ok(())
    }

    fn try_list(&self, filter: &TaskFilter, sort: TaskSort) -> RepoResult<Vec<Task>> {
        let clause = filter.to_where();
        fetch_all(
            self.ctx.connection(),
            &clause.render(TASK_SELECT_SQL, Some(sort.order_by())),
            clause.values(),
            parse_task_row,
        )
    }
}

impl Repository for TaskRepository<'_> {
    type Entity = Task;
    type Filter = TaskFilter;
    type Sort = TaskSort;

    fn list(&self, filter: &TaskFilter, sort: TaskSort) -> Vec<Task> {
        or_logged_default(EntityKind::Task, "list", self.try_list(filter, sort))
    }

    fn count(&self, filter: &TaskFilter) -> usize {
        let clause = filter.to_where();
        let result = fetch_count(
            self.ctx.connection(),
            &clause.render("SELECT COUNT(*) FROM tasks", None),
            clause.values(),
        );
        or_logged_default(EntityKind::Task, "count", result)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let client_text: String = row.get("client_id")?;
    let task = Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        client_id: parse_uuid(&client_text, "tasks.client_id")?,
        project_id: parse_optional_uuid(row.get("project_id")?, "tasks.project_id")?,
        name: row.get("name")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        duration_secs: row.get("duration_secs")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    task.validate()
        .map_err(|err| RepoError::InvalidData(format!("task {id_text}: {err}")))?;
    Ok(task)
}
