//! Data Transfer Objects for the HTTP API.
//!
//! The schedule settings travel as their domain type; everything else here
//! wraps service results into stable response shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Domain types the handlers serve directly
pub use crate::api::{
    AbsenceGroup, AbsentIntern, AttendanceQuery, DispatchReport, ReminderTarget, ScheduleSettings,
    SlotConfig, SlotKey,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Response of the reminder trigger endpoint.
///
/// A no-op run carries only `success` and `message`; a dispatched run
/// carries the matched task and the send counters instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    /// Always true for a completed cycle, dispatched or not
    pub success: bool,
    /// Set when the cycle was a no-op
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Matched slot, when one fired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<SlotKey>,
    /// Attendance query the slot ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<AttendanceQuery>,
    /// Notifications delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent: Option<u32>,
    /// Notifications attempted but refused by the transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<u32>,
}

impl TriggerResponse {
    pub fn no_op(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            task: None,
            query: None,
            sent: None,
            failed: None,
        }
    }

    pub fn dispatched(slot: SlotKey, query: AttendanceQuery, report: DispatchReport) -> Self {
        Self {
            success: true,
            message: None,
            task: Some(slot),
            query: Some(query),
            sent: Some(report.sent),
            failed: Some(report.failed),
        }
    }
}

/// Query parameters for the absence preview endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AbsencesQuery {
    /// Which outstanding event to list (default: `check_in_outstanding`)
    #[serde(default)]
    pub query: Option<AttendanceQuery>,
}

/// Absence preview response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsencesResponse {
    /// Query the preview ran
    pub query: AttendanceQuery,
    /// Zone-local date the preview is for
    pub date: NaiveDate,
    /// Absent interns grouped by supervisor
    pub groups: Vec<AbsenceGroup>,
    /// Total absent interns across all groups
    pub total_absent: usize,
}
