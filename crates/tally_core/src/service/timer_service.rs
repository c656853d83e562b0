//! Timer state machine over persisted tasks.
//!
//! # Responsibility
//! - Drive `NotStarted -> Running -> Completed` transitions on a task.
//! - Enforce the single-active-timer policy when enabled.
//! - Track UI-facing session state (selection, accumulated time) without
//!   any process-wide globals.
//!
//! # Invariants
//! - A completed task has `end_time >= start_time` and
//!   `duration_secs == (end_time - start_time) / 1000`.
//! - Transitions are committed immediately; commit errors propagate and
//!   leave the unit of work dirty, with the task matching the pending row.
//! - Rejected transitions and failed writes leave the task untouched.

use crate::model::client::ClientId;
use crate::model::project::ProjectId;
use crate::model::task::{whole_seconds_between, NewTask, Task, TaskId, TimerState};
use crate::model::validation::ValidationError;
use crate::repo::context::WorkContext;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;
use log::info;
use serde::{Deserialize, Serialize};

/// Policy knobs for timer transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPolicy {
    /// Reject starting a task while another one is running.
    pub single_active_timer: bool,
}

impl Default for TimerPolicy {
    fn default() -> Self {
        Self {
            single_active_timer: true,
        }
    }
}

/// Explicit per-UI timer session.
///
/// Holds what the user has selected and how much time the session has seen.
/// Nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerSession {
    selected_client: Option<ClientId>,
    selected_project: Option<ProjectId>,
    current_task: Option<TaskId>,
    running_since: Option<i64>,
    accumulated_secs: i64,
}

impl TimerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the selected client. Any selected project is cleared.
    pub fn select_client(&mut self, client_id: Option<ClientId>) {
        if self.selected_client != client_id {
            self.selected_project = None;
        }
        self.selected_client = client_id;
    }

    pub fn select_project(&mut self, project_id: Option<ProjectId>) {
        self.selected_project = project_id;
    }

    pub fn selected_client(&self) -> Option<ClientId> {
        self.selected_client
    }

    pub fn selected_project(&self) -> Option<ProjectId> {
        self.selected_project
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.current_task
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Seconds of completed runs in this session.
    pub fn accumulated_secs(&self) -> i64 {
        self.accumulated_secs
    }

    /// Accumulated seconds plus the live run, if any.
    pub fn elapsed_secs(&self, now_ms: i64) -> i64 {
        let live = self
            .running_since
            .map(|start| whole_seconds_between(start, now_ms))
            .unwrap_or(0);
        self.accumulated_secs + live
    }

    fn mark_started(&mut self, task: &Task) {
        self.current_task = Some(task.id);
        self.running_since = task.start_time;
    }

    fn mark_stopped(&mut self, task: &Task) {
        if self.running_since.take().is_some() {
            self.accumulated_secs += task.duration_secs;
        }
        self.current_task = Some(task.id);
    }
}

pub struct TimerService<'ctx> {
    ctx: &'ctx WorkContext,
    policy: TimerPolicy,
}

impl<'ctx> TimerService<'ctx> {
    pub fn new(ctx: &'ctx WorkContext, policy: TimerPolicy) -> Self {
        Self { ctx, policy }
    }

    /// Starts a not-started task and commits.
    ///
    /// # Errors
    /// - `TaskAlreadyRunning` / `TaskAlreadyCompleted` for the wrong state.
    /// - `AnotherTaskRunning` when the single-timer policy is on and another
    ///   task is running.
    pub fn start_timer(&self, task: &mut Task) -> RepoResult<()> {
        self.ensure_can_start(task)?;

        let previous = task.clone();
        task.start_time = Some(self.ctx.now_ms());
        self.commit_transition(task, previous)?;
        info!("event=timer_start module=timer status=ok task_id={}", task.id);
        Ok(())
    }

    /// Stops a running task, records its duration and commits.
    ///
    /// # Errors
    /// - `TaskNotRunning` when the task was never started or already stopped.
    pub fn stop_timer(&self, task: &mut Task) -> RepoResult<()> {
        let start = match (task.start_time, task.end_time) {
            (Some(start), None) => start,
            _ => return Err(ValidationError::TaskNotRunning.into()),
        };

        let previous = task.clone();
        let end = self.ctx.now_ms().max(start);
        task.end_time = Some(end);
        task.duration_secs = whole_seconds_between(start, end);
        self.commit_transition(task, previous)?;
        info!(
            "event=timer_stop module=timer status=ok task_id={} duration_secs={}",
            task.id, task.duration_secs
        );
        Ok(())
    }

    /// Starts or stops `task` and mirrors the transition into `session`.
    ///
    /// Returns the task's state after the transition.
    pub fn toggle(&self, session: &mut TimerSession, task: &mut Task) -> RepoResult<TimerState> {
        if task.is_running() {
            self.stop_timer(task)?;
            session.mark_stopped(task);
        } else {
            self.start_timer(task)?;
            session.mark_started(task);
        }
        Ok(task.timer_state())
    }

    /// Creates a task for the session's selected client and project and
    /// starts it.
    ///
    /// The task row and its start are committed together.
    pub fn start_new_task(&self, session: &mut TimerSession, name: &str) -> RepoResult<Task> {
        let client_id = session
            .selected_client()
            .ok_or(ValidationError::NoClientSelected)?;
        let mut input = NewTask::new(name, client_id);
        input.project_id = session.selected_project();

        let task = self.ctx.atomically("start_new_task", || {
            let mut task = TaskRepository::new(self.ctx).create_task(input, true)?;
            self.start_deferred(&mut task)?;
            Ok(task)
        })?;
        self.ctx.save()?;

        info!("event=timer_start module=timer status=ok task_id={}", task.id);
        session.mark_started(&task);
        Ok(task)
    }

    fn start_deferred(&self, task: &mut Task) -> RepoResult<()> {
        self.ensure_can_start(task)?;
        task.start_time = Some(self.ctx.now_ms());
        TaskRepository::new(self.ctx).save_timer_fields(task, true)
    }

    /// Writes a transition already applied to `task`, then commits.
    ///
    /// A failed write puts `previous` back. A failed commit keeps the new
    /// state, which the still-open transaction holds.
    fn commit_transition(&self, task: &mut Task, previous: Task) -> RepoResult<()> {
        if let Err(err) = TaskRepository::new(self.ctx).save_timer_fields(task, true) {
            *task = previous;
            return Err(err);
        }
        self.ctx.save()?;
        Ok(())
    }

    fn ensure_can_start(&self, task: &Task) -> RepoResult<()> {
        match task.timer_state() {
            TimerState::NotStarted => {}
            TimerState::Running => return Err(ValidationError::TaskAlreadyRunning.into()),
            TimerState::Completed => return Err(ValidationError::TaskAlreadyCompleted.into()),
        }
        if self.policy.single_active_timer {
            if let Some(other) = TaskRepository::new(self.ctx).find_other_running(task.id)? {
                return Err(ValidationError::AnotherTaskRunning(other.id).into());
            }
        }
        Ok(())
    }
}
