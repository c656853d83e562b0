//! Use-case services on top of the repositories.
//!
//! # Responsibility
//! - Coordinate repository calls that span several entities.
//! - Run the timer state machine and billing summaries.
//! - Keep callers decoupled from storage details.

pub mod billing_service;
pub mod data_services;
pub mod timer_service;
