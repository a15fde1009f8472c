//! Repository trait definitions.
//!
//! These traits define the storage interface consumed by the reminder
//! pipeline. Implementations must be `Send + Sync` to work with async Rust;
//! the in-memory and Postgres backends live under `db::repositories`.

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::api::{
    AbsentInternRow, AttendanceQuery, AttendanceRecord, ScheduleSettings, Unit, User, UserId,
};

/// Repository trait for the reminder schedule settings singleton.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Fetch the settings record.
    ///
    /// # Returns
    /// * `Ok(None)` when the schedule has never been configured
    /// * `Ok(Some(settings))` otherwise
    /// * `Err(RepositoryError)` if the operation fails
    async fn get_schedule_settings(&self) -> RepositoryResult<Option<ScheduleSettings>>;

    /// Replace the settings record wholesale. No history is retained.
    async fn put_schedule_settings(&self, settings: &ScheduleSettings) -> RepositoryResult<()>;
}

/// Repository trait for user and unit lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id.
    ///
    /// # Returns
    /// * `Ok(None)` when no such row exists
    /// * `Err(RepositoryError)` if the operation fails
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// List active interns, ordered by id.
    async fn list_active_interns(&self) -> RepositoryResult<Vec<User>>;

    /// Insert or replace a user row.
    async fn upsert_user(&self, user: &User) -> RepositoryResult<()>;

    /// Insert or replace an organizational unit.
    async fn upsert_unit(&self, unit: &Unit) -> RepositoryResult<()>;
}

/// Repository trait for attendance records and absence queries.
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Active interns with an assigned supervisor who have not completed
    /// the queried attendance event on `date`.
    ///
    /// Rows are denormalized with supervisor and unit names and ordered by
    /// supervisor id, then intern id.
    async fn absent_interns(
        &self,
        query: AttendanceQuery,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<AbsentInternRow>>;

    /// Fetch one user's attendance record for `date`.
    async fn find_attendance(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<AttendanceRecord>>;

    /// Record a check-in for the user on `date`. A check-in that already
    /// exists for that date is left untouched.
    async fn record_check_in(
        &self,
        user_id: UserId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Record a check-out for the user on `date`.
    async fn record_check_out(
        &self,
        user_id: UserId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
}

/// Combined repository interface used by the service layer.
#[async_trait]
pub trait FullRepository:
    SettingsRepository + UserRepository + AttendanceRepository + std::fmt::Debug
{
    /// Verify the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
