//! Coordinator over the shared unit of work.
//!
//! # Responsibility
//! - Own the `WorkContext` and hand out repositories bound to it.
//! - Provide multi-entity operations that commit or discard as one.
//!
//! # Invariants
//! - All repositories handed out share one transaction.
//! - `create_project_with_task` persists both entities or neither.

use crate::config::CoreConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::model::client::Client;
use crate::model::project::Project;
use crate::model::task::{NewTask, Task};
use crate::model::validation::normalize_name;
use crate::repo::client_repo::ClientRepository;
use crate::repo::context::WorkContext;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use crate::service::billing_service::BillingCalculator;
use crate::service::timer_service::{TimerPolicy, TimerService};
use log::info;

pub struct DataServices {
    ctx: WorkContext,
    timer_policy: TimerPolicy,
}

impl DataServices {
    pub fn new(ctx: WorkContext) -> Self {
        Self::with_policy(ctx, TimerPolicy::default())
    }

    pub fn with_policy(ctx: WorkContext, timer_policy: TimerPolicy) -> Self {
        Self { ctx, timer_policy }
    }

    /// Opens the configured store (in memory when no path is set).
    pub fn open(config: &CoreConfig) -> RepoResult<Self> {
        let conn = match config.database_path.as_deref() {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Ok(Self::with_policy(
            WorkContext::try_new(conn)?,
            config.timer_policy(),
        ))
    }

    pub fn context(&self) -> &WorkContext {
        &self.ctx
    }

    pub fn clients(&self) -> ClientRepository<'_> {
        ClientRepository::new(&self.ctx)
    }

    pub fn projects(&self) -> ProjectRepository<'_> {
        ProjectRepository::new(&self.ctx)
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(&self.ctx)
    }

    pub fn settings(&self) -> SettingsRepository<'_> {
        SettingsRepository::new(&self.ctx)
    }

    pub fn timer(&self) -> TimerService<'_> {
        TimerService::new(&self.ctx, self.timer_policy)
    }

    pub fn billing(&self) -> BillingCalculator<'_> {
        BillingCalculator::new(&self.ctx)
    }

    /// Creates a project under `client` with a first task, committed once.
    ///
    /// Both names are validated before anything is written. On any failure
    /// neither entity is persisted.
    pub fn create_project_with_task(
        &self,
        client: &Client,
        project_name: &str,
        task_name: &str,
    ) -> RepoResult<(Project, Task)> {
        normalize_name(project_name)?;
        normalize_name(task_name)?;

        let created = self.ctx.atomically("project_with_task", || {
            let project = self.projects().create_project(client, project_name, true)?;
            let task = self
                .tasks()
                .create_task(NewTask::new(task_name, client.id).in_project(project.id), true)?;
            Ok((project, task))
        })?;
        self.save()?;

        info!(
            "event=project_with_task module=service status=ok project_id={} task_id={}",
            created.0.id, created.1.id
        );
        Ok(created)
    }

    /// Commits pending changes; no-op when there are none.
    pub fn save(&self) -> RepoResult<()> {
        Ok(self.ctx.save()?)
    }

    pub fn rollback(&self) -> RepoResult<()> {
        Ok(self.ctx.rollback()?)
    }

    pub fn has_changes(&self) -> bool {
        self.ctx.has_changes()
    }
}
