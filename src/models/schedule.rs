//! Reminder schedule configuration and matcher output types.
//!
//! The schedule is a single record with three named slots. Administrators
//! replace it wholesale through the settings endpoint; every dispatch cycle
//! reads it fresh.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three reminder slots, in matching priority order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    CheckIn,
    Break,
    CheckOut,
}

impl SlotKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKey::CheckIn => "check_in",
            SlotKey::Break => "break",
            SlotKey::CheckOut => "check_out",
        }
    }

    /// The attendance query a slot fires. The midday break reminder is a
    /// second nudge about an unfulfilled check-in, not a distinct event.
    pub fn query(&self) -> AttendanceQuery {
        match self {
            SlotKey::CheckIn | SlotKey::Break => AttendanceQuery::CheckInOutstanding,
            SlotKey::CheckOut => AttendanceQuery::CheckOutOutstanding,
        }
    }

    /// Message title used by the dispatcher.
    pub fn title(&self) -> &'static str {
        match self {
            SlotKey::CheckIn => "Check-in Reminder",
            SlotKey::Break => "Break Reminder",
            SlotKey::CheckOut => "Check-out Reminder",
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience a slot's notification is sent to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderTarget {
    Participant,
    Supervisor,
}

impl ReminderTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderTarget::Participant => "participant",
            ReminderTarget::Supervisor => "supervisor",
        }
    }
}

impl fmt::Display for ReminderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which attendance event is outstanding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceQuery {
    /// Active interns with no check-in recorded today.
    CheckInOutstanding,
    /// Active interns with a check-in today but no check-out.
    CheckOutOutstanding,
}

impl AttendanceQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceQuery::CheckInOutstanding => "check_in_outstanding",
            AttendanceQuery::CheckOutOutstanding => "check_out_outstanding",
        }
    }
}

impl fmt::Display for AttendanceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one reminder slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Time of day the slot fires, as "HH:MM" in the deployment zone.
    pub time: String,
    /// Disabled slots never match, even on an exact time hit.
    pub enabled: bool,
    /// Audience for the slot's notification.
    pub target: ReminderTarget,
    /// Custom message body included in every notification.
    pub message: String,
}

impl SlotConfig {
    pub fn new(
        time: impl Into<String>,
        enabled: bool,
        target: ReminderTarget,
        message: impl Into<String>,
    ) -> Self {
        Self {
            time: time.into(),
            enabled,
            target,
            message: message.into(),
        }
    }

    /// Validate that `time` is a well-formed "HH:MM" value.
    pub fn validate(&self) -> Result<(), String> {
        if is_valid_hhmm(&self.time) {
            Ok(())
        } else {
            Err(format!(
                "Invalid slot time '{}': expected HH:MM (00:00-23:59)",
                self.time
            ))
        }
    }
}

/// The singleton reminder schedule record.
///
/// Field order matches matching priority: `check_in` first, then `break`,
/// then `check_out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    pub check_in: SlotConfig,
    pub r#break: SlotConfig,
    pub check_out: SlotConfig,
}

impl ScheduleSettings {
    /// Slots paired with their keys, in matching priority order.
    pub fn slots(&self) -> [(SlotKey, &SlotConfig); 3] {
        [
            (SlotKey::CheckIn, &self.check_in),
            (SlotKey::Break, &self.r#break),
            (SlotKey::CheckOut, &self.check_out),
        ]
    }

    pub fn slot(&self, key: SlotKey) -> &SlotConfig {
        match key {
            SlotKey::CheckIn => &self.check_in,
            SlotKey::Break => &self.r#break,
            SlotKey::CheckOut => &self.check_out,
        }
    }

    /// Validate every slot's time field.
    pub fn validate(&self) -> Result<(), String> {
        for (key, slot) in self.slots() {
            slot.validate().map_err(|e| format!("{}: {}", key, e))?;
        }
        Ok(())
    }
}

/// Matcher output: the one slot selected for this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub slot: SlotKey,
    pub query: AttendanceQuery,
    pub target: ReminderTarget,
    pub message: String,
}

fn is_valid_hhmm(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return false;
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return false;
    }
    let hours: u8 = match hours.parse() {
        Ok(v) => v,
        Err(_) => return false,
    };
    let minutes: u8 = match minutes.parse() {
        Ok(v) => v,
        Err(_) => return false,
    };
    hours < 24 && minutes < 60
}
