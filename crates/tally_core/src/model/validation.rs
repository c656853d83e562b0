//! Caller-correctable validation failures.
//!
//! Raised before anything is written to the store, so retrying with
//! corrected input is always safe.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    /// Name is blank after trimming.
    EmptyName,
    /// `stop_timer` on a task that is not running.
    TaskNotRunning,
    /// `start_timer` on a task that is already running.
    TaskAlreadyRunning,
    /// `start_timer` on a task that already has an end time.
    TaskAlreadyCompleted,
    /// Another task holds the single active timer.
    AnotherTaskRunning(Uuid),
    NegativeHourlyRate(f64),
    /// End time without start time, or end before start.
    InvalidTimeRange {
        start: Option<i64>,
        end: Option<i64>,
    },
    NegativeDuration(i64),
    /// Auto-pause threshold must be at least one minute.
    InvalidAutoPauseMinutes(u32),
    /// A session-started task needs a selected client.
    NoClientSelected,
    /// Task project belongs to a different client than the task.
    ProjectClientMismatch {
        project_client: Uuid,
        task_client: Uuid,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::TaskNotRunning => write!(f, "task timer is not running"),
            Self::TaskAlreadyRunning => write!(f, "task timer is already running"),
            Self::TaskAlreadyCompleted => write!(f, "task timer has already been stopped"),
            Self::AnotherTaskRunning(id) => write!(f, "another task timer is running: {id}"),
            Self::NegativeHourlyRate(rate) => {
                write!(f, "hourly rate must be >= 0, got {rate}")
            }
            Self::InvalidTimeRange { start, end } => write!(
                f,
                "end_time ({end:?}) requires start_time and must be >= start_time ({start:?})"
            ),
            Self::NoClientSelected => write!(f, "no client selected for the timer"),
            Self::NegativeDuration(secs) => write!(f, "duration must be >= 0, got {secs}"),
            Self::InvalidAutoPauseMinutes(minutes) => {
                write!(f, "auto-pause minutes must be >= 1, got {minutes}")
            }
            Self::ProjectClientMismatch {
                project_client,
                task_client,
            } => write!(
                f,
                "project belongs to client {project_client}, task belongs to client {task_client}"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects the result when empty.
pub fn normalize_name(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_rate(rate: Option<f64>) -> Result<(), ValidationError> {
    match rate {
        Some(value) if value.is_nan() || value < 0.0 => {
            Err(ValidationError::NegativeHourlyRate(value))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, validate_rate, ValidationError};

    #[test]
    fn normalize_name_trims_and_rejects_blank() {
        assert_eq!(normalize_name("  Acme  ").unwrap(), "Acme");
        assert_eq!(normalize_name(" \t\n").unwrap_err(), ValidationError::EmptyName);
        assert_eq!(normalize_name("").unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn validate_rate_accepts_zero_and_rejects_negative() {
        assert!(validate_rate(None).is_ok());
        assert!(validate_rate(Some(0.0)).is_ok());
        assert!(matches!(
            validate_rate(Some(-1.0)),
            Err(ValidationError::NegativeHourlyRate(_))
        ));
    }
}
