//! Service layer for reminder orchestration.
//!
//! This module contains the service layer that sits between the repository
//! operations and the HTTP API. Services run the dispatch cycle: match the
//! current minute against the schedule, query outstanding attendance, render
//! and send notifications, and append audit records.

pub mod audit;

pub mod dispatcher;

pub mod reminder;

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;

pub use audit::AuditLog;
pub use dispatcher::{dispatch, DispatchReport, SendPacer, SleepPacer};
pub use reminder::{run_cycle, run_cycle_at, CycleOutcome};
