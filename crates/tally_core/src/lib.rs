//! Core domain logic for Tally, a personal time tracker.
//! This crate is the single source of truth for tracking and billing rules.

pub mod billing;
pub mod clock;
pub mod config;
pub mod db;
pub mod format;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use billing::{billable_amount, rounded_minutes, task_billable_amount, BillingRates};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use format::format_duration;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::client::{Client, ClientId, ClientUpdate, NewClient};
pub use model::increment::BillingIncrement;
pub use model::project::{Project, ProjectId, ProjectUpdate};
pub use model::settings::{Settings, SettingsUpdate};
pub use model::task::{NewTask, Task, TaskId, TaskUpdate, TimerState};
pub use model::validation::ValidationError;
pub use repo::context::WorkContext;
pub use repo::{EntityKind, RepoError, RepoResult, Repository};
pub use service::billing_service::{BillingCalculator, ClientBillingSummary, TaskBill};
pub use service::data_services::DataServices;
pub use service::timer_service::{TimerPolicy, TimerService, TimerSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
