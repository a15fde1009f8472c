//! Notification dispatch for a matched reminder task.
//!
//! Renders one message per recipient and pushes it through the configured
//! transport, pausing between consecutive sends. The two audiences differ in
//! shape: participants each get a personal nudge, supervisors get one
//! message per group with a numbered roster of their absent interns.
//!
//! A recipient without a messaging handle is skipped, and a transport
//! failure is counted, logged and stepped over. Neither aborts the batch;
//! the only error this module surfaces is a repository failure while
//! resolving handles.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use log::warn;

use crate::api::{AbsenceGroup, AbsentIntern, AttendanceQuery, ReminderTarget, ScheduledTask};
use crate::db::repository::{RepositoryResult, UserRepository};
use crate::services::audit::AuditLog;
use crate::transport::{MessageFormat, MessageTransport};

/// Pause between consecutive participant sends.
pub const PARTICIPANT_SEND_GAP: Duration = Duration::from_millis(300);
/// Pause between consecutive supervisor sends.
pub const SUPERVISOR_SEND_GAP: Duration = Duration::from_millis(500);

/// Aggregate outcome of one dispatch batch.
///
/// `sent + failed` equals the number of recipients that had a messaging
/// handle; `skipped` counts the ones that did not. API responses expose
/// only `sent` and `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Throttle between consecutive sends.
///
/// The messaging API rate-limits per bot token, so the gap between sends is
/// a load-shaping requirement, not an implementation detail. Tests inject a
/// recording pacer to assert the gaps without slowing the suite down.
#[async_trait]
pub trait SendPacer: Send + Sync {
    async fn pause(&self, gap: Duration);
}

/// Production pacer backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepPacer;

#[async_trait]
impl SendPacer for SleepPacer {
    async fn pause(&self, gap: Duration) {
        tokio::time::sleep(gap).await;
    }
}

/// Send the matched task's notifications to every resolvable recipient.
///
/// `groups` is the grouped absence data for the task's query; `now` is the
/// zone-local instant stamped into message bodies.
pub async fn dispatch<R>(
    task: &ScheduledTask,
    groups: &[AbsenceGroup],
    users: &R,
    transport: &dyn MessageTransport,
    pacer: &dyn SendPacer,
    now: DateTime<Tz>,
    audit: &AuditLog,
) -> RepositoryResult<DispatchReport>
where
    R: UserRepository + ?Sized,
{
    match task.target {
        ReminderTarget::Participant => {
            dispatch_to_participants(task, groups, users, transport, pacer, now, audit).await
        }
        ReminderTarget::Supervisor => {
            dispatch_to_supervisors(task, groups, users, transport, pacer, now, audit).await
        }
    }
}

async fn dispatch_to_participants<R>(
    task: &ScheduledTask,
    groups: &[AbsenceGroup],
    users: &R,
    transport: &dyn MessageTransport,
    pacer: &dyn SendPacer,
    now: DateTime<Tz>,
    audit: &AuditLog,
) -> RepositoryResult<DispatchReport>
where
    R: UserRepository + ?Sized,
{
    let mut report = DispatchReport::default();

    for group in groups {
        for intern in &group.absent_interns {
            let handle = match users.find_user(intern.intern_id).await? {
                Some(user) => user.telegram_username.filter(|h| !h.trim().is_empty()),
                None => None,
            };
            let Some(handle) = handle else {
                report.skipped += 1;
                audit.record(&format!(
                    "skipped {}: no messaging handle",
                    intern.intern_name
                ));
                continue;
            };

            if report.sent + report.failed > 0 {
                pacer.pause(PARTICIPANT_SEND_GAP).await;
            }

            let body = render_participant_message(task, intern, now);
            deliver(transport, &handle, task, &body, &mut report, audit).await;
        }
    }

    Ok(report)
}

async fn dispatch_to_supervisors<R>(
    task: &ScheduledTask,
    groups: &[AbsenceGroup],
    users: &R,
    transport: &dyn MessageTransport,
    pacer: &dyn SendPacer,
    now: DateTime<Tz>,
    audit: &AuditLog,
) -> RepositoryResult<DispatchReport>
where
    R: UserRepository + ?Sized,
{
    let mut report = DispatchReport::default();

    for group in groups {
        let handle = match users.find_user(group.supervisor_id).await? {
            Some(user) => user.telegram_username.filter(|h| !h.trim().is_empty()),
            None => None,
        };
        let Some(handle) = handle else {
            report.skipped += 1;
            audit.record(&format!(
                "skipped supervisor {}: no messaging handle",
                group.supervisor_name
            ));
            continue;
        };

        if report.sent + report.failed > 0 {
            pacer.pause(SUPERVISOR_SEND_GAP).await;
        }

        let body = render_supervisor_message(task, group, now);
        deliver(transport, &handle, task, &body, &mut report, audit).await;
    }

    Ok(report)
}

/// One send attempt. Updates the report; never propagates transport errors.
async fn deliver(
    transport: &dyn MessageTransport,
    handle: &str,
    task: &ScheduledTask,
    body: &str,
    report: &mut DispatchReport,
    audit: &AuditLog,
) {
    match transport
        .send(handle, task.slot.title(), body, MessageFormat::Plain)
        .await
    {
        Ok(()) => {
            report.sent += 1;
            audit.record(&format!("sent {} reminder to {}", task.slot, handle));
        }
        Err(e) => {
            report.failed += 1;
            warn!("Sending {} reminder to {} failed: {}", task.slot, handle, e);
            audit.record(&format!(
                "failed to send {} reminder to {}: {}",
                task.slot, handle, e
            ));
        }
    }
}

fn render_participant_message(
    task: &ScheduledTask,
    intern: &AbsentIntern,
    now: DateTime<Tz>,
) -> String {
    format!(
        "Hi {},\n\n{}\n\n{}\nSent at {}",
        intern.intern_name,
        task.message,
        query_instruction(task.query),
        format_timestamp(now)
    )
}

fn render_supervisor_message(task: &ScheduledTask, group: &AbsenceGroup, now: DateTime<Tz>) -> String {
    let roster = group
        .absent_interns
        .iter()
        .enumerate()
        .map(|(index, intern)| {
            format!(
                "{}. {} ({})",
                index + 1,
                intern.intern_name,
                intern.unit_name.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n{}\n\n{}\nSent at {}",
        roster_heading(task.query),
        roster,
        task.message,
        format_timestamp(now)
    )
}

fn query_instruction(query: AttendanceQuery) -> &'static str {
    match query {
        AttendanceQuery::CheckInOutstanding => {
            "Please check in through the attendance page as soon as you start your day."
        }
        AttendanceQuery::CheckOutOutstanding => {
            "Please check out through the attendance page before you leave."
        }
    }
}

fn roster_heading(query: AttendanceQuery) -> &'static str {
    match query {
        AttendanceQuery::CheckInOutstanding => "Interns without a check-in today:",
        AttendanceQuery::CheckOutOutstanding => "Interns without a check-out today:",
    }
}

/// Timestamp line suffix, zone-local with the zone abbreviation.
fn format_timestamp(now: DateTime<Tz>) -> String {
    now.format("%d/%m/%Y %H:%M %Z").to_string()
}
