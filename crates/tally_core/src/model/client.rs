//! Client domain model.
//!
//! # Invariants
//! - `id` and `created_at` never change after construction.
//! - `name` is trimmed and non-empty once validated.
//! - `hourly_rate`, when set, is >= 0.

use crate::model::increment::BillingIncrement;
use crate::model::validation::{normalize_name, validate_rate, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ClientId = Uuid;

/// Billing party owning projects and tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub is_active: bool,
    /// Falls back to the settings default when `None`.
    pub hourly_rate: Option<f64>,
    /// Falls back to the settings default when `None`.
    pub billing_increment: Option<BillingIncrement>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Client {
    /// Creates an active client stamped at `now_ms`.
    pub fn new(name: &str, now_ms: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_name(name)?,
            is_active: true,
            hourly_rate: None,
            billing_increment: None,
            notes: None,
            created_at: now_ms,
            modified_at: now_ms,
        })
    }

    /// Refreshes `modified_at`. Called by every mutating repository method.
    pub fn touch(&mut self, now_ms: i64) {
        self.modified_at = now_ms;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_rate(self.hourly_rate)
    }
}

/// Creation input for clients beyond the bare name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewClient {
    pub name: String,
    pub hourly_rate: Option<f64>,
    pub billing_increment: Option<BillingIncrement>,
    pub notes: Option<String>,
}

impl NewClient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update; `None` leaves a field unchanged.
///
/// Nested options clear the field with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub hourly_rate: Option<Option<f64>>,
    pub billing_increment: Option<Option<BillingIncrement>>,
    pub notes: Option<Option<String>>,
}

impl ClientUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Applies present fields to `client`. Names are trimmed, not validated.
    pub(crate) fn apply_to(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name.trim().to_string();
        }
        if let Some(is_active) = self.is_active {
            client.is_active = is_active;
        }
        if let Some(hourly_rate) = self.hourly_rate {
            client.hourly_rate = hourly_rate;
        }
        if let Some(billing_increment) = self.billing_increment {
            client.billing_increment = billing_increment;
        }
        if let Some(notes) = self.notes {
            client.notes = notes;
        }
    }
}
