//! Installation-wide settings singleton.
//!
//! # Invariants
//! - Exactly one settings row exists once created.
//! - `auto_pause_minutes >= 1`.

use crate::model::increment::BillingIncrement;
use crate::model::validation::{validate_rate, ValidationError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOURLY_RATE: f64 = 100.0;
pub const DEFAULT_AUTO_PAUSE_MINUTES: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub default_hourly_rate: f64,
    pub default_billing_increment: BillingIncrement,
    pub auto_pause_enabled: bool,
    pub auto_pause_minutes: u32,
    /// Opaque to the core; owned by the notification collaborator.
    pub notification_settings: Option<Vec<u8>>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Settings {
    /// Documented defaults: auto-pause off, 15 minute threshold, 100.0/h,
    /// 10 minute increment.
    pub fn with_defaults(now_ms: i64) -> Self {
        Self {
            default_hourly_rate: DEFAULT_HOURLY_RATE,
            default_billing_increment: BillingIncrement::TenMinutes,
            auto_pause_enabled: false,
            auto_pause_minutes: DEFAULT_AUTO_PAUSE_MINUTES,
            notification_settings: None,
            created_at: now_ms,
            modified_at: now_ms,
        }
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.modified_at = now_ms;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_rate(Some(self.default_hourly_rate))?;
        if self.auto_pause_minutes == 0 {
            return Err(ValidationError::InvalidAutoPauseMinutes(0));
        }
        Ok(())
    }

    /// Whether an idle period since `last_activity_ms` should stop the timer.
    ///
    /// Pure policy signal; the caller decides when to ask and what to stop.
    pub fn auto_pause_due(&self, last_activity_ms: i64, now_ms: i64) -> bool {
        if !self.auto_pause_enabled {
            return false;
        }
        let threshold_ms = i64::from(self.auto_pause_minutes) * 60_000;
        now_ms - last_activity_ms >= threshold_ms
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub default_hourly_rate: Option<f64>,
    pub default_billing_increment: Option<BillingIncrement>,
    pub auto_pause_enabled: Option<bool>,
    pub auto_pause_minutes: Option<u32>,
    pub notification_settings: Option<Option<Vec<u8>>>,
}

impl SettingsUpdate {
    pub(crate) fn apply_to(self, settings: &mut Settings) {
        if let Some(rate) = self.default_hourly_rate {
            settings.default_hourly_rate = rate;
        }
        if let Some(increment) = self.default_billing_increment {
            settings.default_billing_increment = increment;
        }
        if let Some(enabled) = self.auto_pause_enabled {
            settings.auto_pause_enabled = enabled;
        }
        if let Some(minutes) = self.auto_pause_minutes {
            settings.auto_pause_minutes = minutes;
        }
        if let Some(blob) = self.notification_settings {
            settings.notification_settings = blob;
        }
    }
}
