//! High-level database service functions.
//!
//! These functions wrap the repository traits with cross-cutting rules
//! (validation, grouping) and are generic over the backend, so handlers and
//! the reminder pipeline work identically against Postgres or the in-memory
//! repository.

use chrono::NaiveDate;

use crate::api::{AbsenceGroup, AttendanceQuery, ScheduleSettings};
use crate::db::repository::{
    AttendanceRepository, FullRepository, RepositoryError, RepositoryResult, SettingsRepository,
};

/// Fetch the reminder schedule settings, if configured.
pub async fn get_schedule_settings<R>(repo: &R) -> RepositoryResult<Option<ScheduleSettings>>
where
    R: SettingsRepository + ?Sized,
{
    repo.get_schedule_settings().await
}

/// Validate and store the reminder schedule settings, replacing any previous
/// configuration wholesale.
pub async fn store_schedule_settings<R>(
    repo: &R,
    settings: &ScheduleSettings,
) -> RepositoryResult<()>
where
    R: SettingsRepository + ?Sized,
{
    settings.validate().map_err(RepositoryError::validation)?;
    repo.put_schedule_settings(settings).await
}

/// Query absent interns for `date` and group them by supervisor.
///
/// Supervisors with no absent interns do not appear in the result.
pub async fn absence_groups<R>(
    repo: &R,
    query: AttendanceQuery,
    date: NaiveDate,
) -> RepositoryResult<Vec<AbsenceGroup>>
where
    R: AttendanceRepository + ?Sized,
{
    let rows = repo.absent_interns(query, date).await?;
    Ok(AbsenceGroup::from_rows(rows))
}

/// Check backend connectivity.
pub async fn health_check<R>(repo: &R) -> RepositoryResult<bool>
where
    R: FullRepository + ?Sized,
{
    repo.health_check().await
}
