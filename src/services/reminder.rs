//! One full reminder cycle: match, query, dispatch, audit.
//!
//! This is the function behind the trigger endpoint. Every invocation reads
//! the schedule fresh, asks the matcher whether the current minute selects a
//! slot, and either dispatches notifications or reports a no-op. Matching is
//! exact-minute, so the external scheduler must call in every minute it
//! cares about; a missed minute is a missed slot for that day.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::api::ScheduledTask;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::db::services;
use crate::scheduler;
use crate::services::audit::AuditLog;
use crate::services::dispatcher::{self, DispatchReport, SendPacer};
use crate::transport::MessageTransport;

/// What a cycle did. Both no-op variants are successes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No schedule record exists yet.
    NotConfigured,
    /// No enabled slot matched the current minute (weekends included).
    NoTask { time_label: String },
    /// A slot matched and its notifications were dispatched.
    Dispatched {
        task: ScheduledTask,
        report: DispatchReport,
    },
}

/// Run a cycle against the current wall clock in `tz`.
pub async fn run_cycle<R>(
    repo: &R,
    transport: &dyn MessageTransport,
    pacer: &dyn SendPacer,
    tz: Tz,
    audit: &AuditLog,
) -> RepositoryResult<CycleOutcome>
where
    R: FullRepository + ?Sized,
{
    let now = Utc::now().with_timezone(&tz);
    run_cycle_at(repo, transport, pacer, now, audit).await
}

/// Run a cycle at an explicit zone-local instant.
///
/// Split out from [`run_cycle`] so tests can pin the clock.
pub async fn run_cycle_at<R>(
    repo: &R,
    transport: &dyn MessageTransport,
    pacer: &dyn SendPacer,
    now: DateTime<Tz>,
    audit: &AuditLog,
) -> RepositoryResult<CycleOutcome>
where
    R: FullRepository + ?Sized,
{
    let time_label = scheduler::current_time_label(&now);
    audit.record(&format!("cycle started at {}", time_label));

    let Some(settings) = services::get_schedule_settings(repo).await? else {
        audit.record("no reminder schedule configured");
        return Ok(CycleOutcome::NotConfigured);
    };

    let Some(task) = scheduler::match_slot(&settings, &now) else {
        audit.record(&format!("no task scheduled for {}", time_label));
        return Ok(CycleOutcome::NoTask { time_label });
    };
    audit.record(&format!(
        "matched {} (query {}, target {})",
        task.slot, task.query, task.target
    ));

    let groups = services::absence_groups(repo, task.query, now.date_naive()).await?;
    let absent_total: usize = groups.iter().map(|g| g.absent_interns.len()).sum();
    audit.record(&format!(
        "{} absent interns across {} supervisors",
        absent_total,
        groups.len()
    ));

    let report = dispatcher::dispatch(&task, &groups, repo, transport, pacer, now, audit).await?;
    audit.record(&format!(
        "{} dispatch finished: {} sent, {} failed, {} skipped",
        task.slot, report.sent, report.failed, report.skipped
    ));

    Ok(CycleOutcome::Dispatched { task, report })
}
