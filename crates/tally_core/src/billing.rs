//! Billing arithmetic.
//!
//! # Responsibility
//! - Round tracked time up to the billing increment.
//! - Resolve the effective rate and increment for a task.
//!
//! # Invariants
//! - Any non-zero duration bills at least one increment.
//! - Zero or negative durations bill nothing.
//! - Rate and increment each resolve project -> client -> settings.

use crate::model::client::Client;
use crate::model::increment::BillingIncrement;
use crate::model::project::Project;
use crate::model::settings::Settings;
use crate::model::task::Task;
use serde::{Deserialize, Serialize};

/// Effective billing inputs for one task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingRates {
    pub hourly_rate: f64,
    pub increment: BillingIncrement,
}

impl BillingRates {
    pub fn resolve(client: &Client, project: Option<&Project>, settings: &Settings) -> Self {
        let hourly_rate = project
            .and_then(|project| project.hourly_rate)
            .or(client.hourly_rate)
            .unwrap_or(settings.default_hourly_rate);
        let increment = project
            .and_then(|project| project.billing_increment)
            .or(client.billing_increment)
            .unwrap_or(settings.default_billing_increment);
        Self {
            hourly_rate,
            increment,
        }
    }
}

/// `duration_secs` rounded up to a whole number of increments, in seconds.
///
/// Saturates at `i64::MAX` when the last increment would not fit.
pub fn billed_seconds(duration_secs: i64, increment: BillingIncrement) -> i64 {
    if duration_secs <= 0 {
        return 0;
    }
    let step = increment.seconds();
    let steps = duration_secs / step + i64::from(duration_secs % step != 0);
    steps.saturating_mul(step)
}

/// Billed minutes after rounding up to `increment`.
pub fn rounded_minutes(duration_secs: i64, increment: BillingIncrement) -> i64 {
    billed_seconds(duration_secs, increment) / 60
}

/// Amount owed for `duration_secs` at `hourly_rate`.
///
/// 37 minutes at 15-minute increments and 100/h bills 45 minutes: 75.0.
pub fn billable_amount(duration_secs: i64, hourly_rate: f64, increment: BillingIncrement) -> f64 {
    let minutes = rounded_minutes(duration_secs, increment);
    if minutes == 0 {
        return 0.0;
    }
    minutes as f64 / 60.0 * hourly_rate
}

/// Amount for a completed task; `None` while it is not completed.
pub fn task_billable_amount(task: &Task, rates: &BillingRates) -> Option<f64> {
    task.is_completed()
        .then(|| billable_amount(task.duration_secs, rates.hourly_rate, rates.increment))
}
