//! Public API surface for the Rust backend.
//!
//! This file consolidates the identifier newtypes and re-exports the domain
//! types consumed by the repository layer and the HTTP API.

pub use crate::models::absence::AbsenceGroup;
pub use crate::models::absence::AbsentIntern;
pub use crate::models::absence::AbsentInternRow;
pub use crate::models::schedule::AttendanceQuery;
pub use crate::models::schedule::ReminderTarget;
pub use crate::models::schedule::ScheduleSettings;
pub use crate::models::schedule::ScheduledTask;
pub use crate::models::schedule::SlotConfig;
pub use crate::models::schedule::SlotKey;
pub use crate::models::user::AttendanceRecord;
pub use crate::models::user::Role;
pub use crate::models::user::Unit;
pub use crate::models::user::User;
pub use crate::services::dispatcher::DispatchReport;

use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier (database primary key).
///
/// Interns, supervisors and administrators share one id space; the row's
/// role discriminator tells them apart.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub i64);

/// Organizational unit identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        UserId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl UnitId {
    pub fn new(value: i64) -> Self {
        UnitId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        UserId(value)
    }
}

impl From<i64> for UnitId {
    fn from(value: i64) -> Self {
        UnitId(value)
    }
}
