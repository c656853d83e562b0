//! Project domain model.
//!
//! # Invariants
//! - A project always belongs to exactly one client.
//! - `hourly_rate` and `billing_increment` override the client's values.

use crate::model::client::{Client, ClientId};
use crate::model::increment::BillingIncrement;
use crate::model::validation::{normalize_name, validate_rate, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub client_id: ClientId,
    pub name: String,
    pub is_active: bool,
    pub hourly_rate: Option<f64>,
    pub billing_increment: Option<BillingIncrement>,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Project {
    /// Creates an active project owned by `client`, stamped at `now_ms`.
    pub fn new(client: &Client, name: &str, now_ms: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            client_id: client.id,
            name: normalize_name(name)?,
            is_active: true,
            hourly_rate: None,
            billing_increment: None,
            created_at: now_ms,
            modified_at: now_ms,
        })
    }

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

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub hourly_rate: Option<Option<f64>>,
    pub billing_increment: Option<Option<BillingIncrement>>,
}

impl ProjectUpdate {
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

    pub(crate) fn apply_to(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name.trim().to_string();
        }
        if let Some(is_active) = self.is_active {
            project.is_active = is_active;
        }
        if let Some(hourly_rate) = self.hourly_rate {
            project.hourly_rate = hourly_rate;
        }
        if let Some(billing_increment) = self.billing_increment {
            project.billing_increment = billing_increment;
        }
    }
}
