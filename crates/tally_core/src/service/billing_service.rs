//! Repository-backed billing for tasks and clients.
//!
//! # Invariants
//! - Reads only; never opens the unit-of-work transaction.
//! - Missing settings are treated as defaults without creating the row.
//! - Second totals saturate at `i64::MAX`.

use crate::billing::{billable_amount, billed_seconds, BillingRates};
use crate::model::client::Client;
use crate::model::project::{Project, ProjectId};
use crate::model::settings::Settings;
use crate::model::task::{Task, TaskId};
use crate::repo::client_repo::ClientRepository;
use crate::repo::context::WorkContext;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Billing outcome for one completed task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskBill {
    pub task_id: TaskId,
    pub rates: BillingRates,
    pub billed_secs: i64,
    pub amount: f64,
}

/// Totals over a client's completed tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientBillingSummary {
    pub completed_tasks: usize,
    /// Raw tracked time.
    pub tracked_secs: i64,
    /// Tracked time after per-task rounding.
    pub billed_secs: i64,
    pub amount: f64,
}

pub struct BillingCalculator<'ctx> {
    ctx: &'ctx WorkContext,
}

impl<'ctx> BillingCalculator<'ctx> {
    pub fn new(ctx: &'ctx WorkContext) -> Self {
        Self { ctx }
    }

    /// Bills a task with rates resolved from its project, client and the
    /// settings. `None` unless the task is completed.
    pub fn bill_task(&self, task: &Task) -> RepoResult<Option<TaskBill>> {
        if !task.is_completed() {
            return Ok(None);
        }
        let client = ClientRepository::new(self.ctx).require_client(task.client_id)?;
        let project = match task.project_id {
            Some(project_id) => ProjectRepository::new(self.ctx).get_project(project_id)?,
            None => None,
        };
        let rates = BillingRates::resolve(&client, project.as_ref(), &self.settings()?);
        Ok(Some(bill(task, rates)))
    }

    /// Sums all completed tasks of `client`.
    pub fn client_summary(&self, client: &Client) -> RepoResult<ClientBillingSummary> {
        let settings = self.settings()?;
        let projects: HashMap<ProjectId, Project> = ProjectRepository::new(self.ctx)
            .get_projects(client)
            .into_iter()
            .map(|project| (project.id, project))
            .collect();

        let mut summary = ClientBillingSummary::default();
        for task in TaskRepository::new(self.ctx).get_completed_tasks(client) {
            let project = task.project_id.and_then(|id| projects.get(&id));
            let task_bill = bill(&task, BillingRates::resolve(client, project, &settings));
            summary.completed_tasks += 1;
            summary.tracked_secs = summary.tracked_secs.saturating_add(task.duration_secs);
            summary.billed_secs = summary.billed_secs.saturating_add(task_bill.billed_secs);
            summary.amount += task_bill.amount;
        }
        Ok(summary)
    }

    fn settings(&self) -> RepoResult<Settings> {
        let stored = SettingsRepository::new(self.ctx).get_settings()?;
        Ok(stored.unwrap_or_else(|| Settings::with_defaults(self.ctx.now_ms())))
    }
}

fn bill(task: &Task, rates: BillingRates) -> TaskBill {
    TaskBill {
        task_id: task.id,
        rates,
        billed_secs: billed_seconds(task.duration_secs, rates.increment),
        amount: billable_amount(task.duration_secs, rates.hourly_rate, rates.increment),
    }
}
