//! Entity model for the client/project/task graph.
//!
//! # Responsibility
//! - Define the persisted record types and their field invariants.
//! - Stamp identity and timestamps explicitly at construction.
//!
//! # Invariants
//! - Relationships are id references; collections are queried, never stored.
//! - Deleting a client cascades to its projects and tasks; deleting a
//!   project only clears `Task::project_id`. Both are enforced by the store.

pub mod client;
pub mod increment;
pub mod project;
pub mod settings;
pub mod task;
pub mod validation;
