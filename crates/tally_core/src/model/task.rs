//! Task domain model and timer state projection.
//!
//! # Invariants
//! - `end_time` set implies `start_time` set and `end_time >= start_time`.
//! - `(start_time set, end_time unset)` means the timer is running.
//! - `duration_secs` is authoritative once `end_time` is set.

use crate::model::client::ClientId;
use crate::model::project::ProjectId;
use crate::model::validation::{normalize_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// Timer lifecycle derived from a task's start/end times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    NotStarted,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub client_id: ClientId,
    /// Cleared when the owning project is deleted.
    pub project_id: Option<ProjectId>,
    pub name: String,
    /// Epoch milliseconds.
    pub start_time: Option<i64>,
    /// Epoch milliseconds.
    pub end_time: Option<i64>,
    /// Whole seconds.
    pub duration_secs: i64,
    pub notes: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Task {
    /// Creates a not-started task stamped at `now_ms`.
    pub fn new(
        name: &str,
        client_id: ClientId,
        project_id: Option<ProjectId>,
        now_ms: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            client_id,
            project_id,
            name: normalize_name(name)?,
            start_time: None,
            end_time: None,
            duration_secs: 0,
            notes: None,
            created_at: now_ms,
            modified_at: now_ms,
        })
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.modified_at = now_ms;
    }

    pub fn timer_state(&self) -> TimerState {
        match (self.start_time, self.end_time) {
            (None, _) => TimerState::NotStarted,
            (Some(_), None) => TimerState::Running,
            (Some(_), Some(_)) => TimerState::Completed,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer_state() == TimerState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.timer_state() == TimerState::Completed
    }

    /// Seconds recorded so far, live for a running timer.
    ///
    /// Display-only; never persisted.
    pub fn elapsed_secs(&self, now_ms: i64) -> i64 {
        match (self.start_time, self.end_time) {
            (Some(start), None) => whole_seconds_between(start, now_ms),
            (Some(_), Some(_)) => self.duration_secs,
            (None, _) => 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(end) = self.end_time {
            match self.start_time {
                Some(start) if end >= start => {}
                start => {
                    return Err(ValidationError::InvalidTimeRange {
                        start,
                        end: Some(end),
                    });
                }
            }
        }
        if self.duration_secs < 0 {
            return Err(ValidationError::NegativeDuration(self.duration_secs));
        }
        Ok(())
    }
}

/// Whole seconds from `start_ms` to `end_ms`, clamped at zero.
pub fn whole_seconds_between(start_ms: i64, end_ms: i64) -> i64 {
    end_ms.saturating_sub(start_ms).max(0) / 1000
}

/// Creation input for tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub client_id: ClientId,
    pub project_id: Option<ProjectId>,
    pub notes: Option<String>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, client_id: ClientId) -> Self {
        Self {
            name: name.into(),
            client_id,
            project_id: None,
            notes: None,
        }
    }

    pub fn in_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update; `None` leaves a field unchanged.
///
/// Timer fields are owned by the timer service and not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub notes: Option<Option<String>>,
    pub duration_secs: Option<i64>,
    pub project_id: Option<Option<ProjectId>>,
}

impl TaskUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub(crate) fn apply_to(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name.trim().to_string();
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
        if let Some(duration_secs) = self.duration_secs {
            task.duration_secs = duration_secs;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{whole_seconds_between, Task, TimerState};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn task() -> Task {
        Task::new("Write report", Uuid::new_v4(), None, 1_000).unwrap()
    }

    #[test]
    fn timer_state_follows_start_and_end() {
        let mut task = task();
        assert_eq!(task.timer_state(), TimerState::NotStarted);
        task.start_time = Some(10_000);
        assert_eq!(task.timer_state(), TimerState::Running);
        task.end_time = Some(20_000);
        assert_eq!(task.timer_state(), TimerState::Completed);
    }

    #[test]
    fn validate_rejects_end_without_start_and_reversed_range() {
        let mut task = task();
        task.end_time = Some(5_000);
        assert_eq!(
            task.validate().unwrap_err(),
            ValidationError::InvalidTimeRange {
                start: None,
                end: Some(5_000)
            }
        );

        task.start_time = Some(6_000);
        assert!(matches!(
            task.validate(),
            Err(ValidationError::InvalidTimeRange { .. })
        ));

        task.start_time = Some(5_000);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn elapsed_is_live_while_running() {
        let mut task = task();
        assert_eq!(task.elapsed_secs(99_000), 0);
        task.start_time = Some(10_000);
        assert_eq!(task.elapsed_secs(12_999), 2);
        task.end_time = Some(13_000);
        task.duration_secs = 3;
        assert_eq!(task.elapsed_secs(99_000), 3);
    }

    #[test]
    fn whole_seconds_truncates_and_clamps() {
        assert_eq!(whole_seconds_between(0, 1_999), 1);
        assert_eq!(whole_seconds_between(5_000, 1_000), 0);
    }

    #[test]
    fn new_trims_name() {
        let task = Task::new("  Review  ", Uuid::new_v4(), None, 0).unwrap();
        assert_eq!(task.name, "Review");
        assert_eq!(
            Task::new("   ", Uuid::new_v4(), None, 0).unwrap_err(),
            ValidationError::EmptyName
        );
    }
}
