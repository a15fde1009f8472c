//! In-memory repository implementation.
//!
//! Backs the repository traits with plain `HashMap`s behind a
//! `parking_lot::RwLock`. Used for unit tests and for local development
//! without a PostgreSQL instance; all data is lost on shutdown.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::api::{
    AbsentInternRow, AttendanceQuery, AttendanceRecord, Role, ScheduleSettings, Unit, User, UserId,
};
use crate::db::repository::{
    AttendanceRepository, FullRepository, RepositoryError, RepositoryResult, SettingsRepository,
    UserRepository,
};

#[derive(Debug, Default)]
struct Store {
    settings: Option<ScheduleSettings>,
    users: HashMap<i64, User>,
    units: HashMap<i64, Unit>,
    attendance: HashMap<(i64, NaiveDate), AttendanceRecord>,
}

/// In-memory implementation of the repository traits.
#[derive(Debug, Default)]
pub struct LocalRepository {
    inner: RwLock<Store>,
}

impl LocalRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn attendance_outstanding(
        store: &Store,
        query: AttendanceQuery,
        user_id: i64,
        date: NaiveDate,
    ) -> bool {
        let record = store.attendance.get(&(user_id, date));
        match query {
            AttendanceQuery::CheckInOutstanding => {
                record.is_none_or(|r| r.check_in_at.is_none())
            }
            AttendanceQuery::CheckOutOutstanding => {
                record.is_some_and(|r| r.check_in_at.is_some() && r.check_out_at.is_none())
            }
        }
    }
}

#[async_trait]
impl SettingsRepository for LocalRepository {
    async fn get_schedule_settings(&self) -> RepositoryResult<Option<ScheduleSettings>> {
        Ok(self.inner.read().settings.clone())
    }

    async fn put_schedule_settings(&self, settings: &ScheduleSettings) -> RepositoryResult<()> {
        self.inner.write().settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.inner.read().users.get(&id.value()).cloned())
    }

    async fn list_active_interns(&self) -> RepositoryResult<Vec<User>> {
        let store = self.inner.read();
        let mut interns: Vec<User> = store
            .users
            .values()
            .filter(|u| u.role == Role::Intern && u.active)
            .cloned()
            .collect();
        interns.sort_by_key(|u| u.id.value());
        Ok(interns)
    }

    async fn upsert_user(&self, user: &User) -> RepositoryResult<()> {
        self.inner
            .write()
            .users
            .insert(user.id.value(), user.clone());
        Ok(())
    }

    async fn upsert_unit(&self, unit: &Unit) -> RepositoryResult<()> {
        self.inner
            .write()
            .units
            .insert(unit.id.value(), unit.clone());
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for LocalRepository {
    async fn absent_interns(
        &self,
        query: AttendanceQuery,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<AbsentInternRow>> {
        let store = self.inner.read();
        let mut rows: Vec<AbsentInternRow> = store
            .users
            .values()
            .filter(|u| u.role == Role::Intern && u.active)
            .filter_map(|intern| {
                let supervisor_id = intern.supervisor_id?;
                let supervisor = store.users.get(&supervisor_id.value())?;
                if !Self::attendance_outstanding(&store, query, intern.id.value(), date) {
                    return None;
                }
                let unit_name = intern
                    .unit_id
                    .and_then(|uid| store.units.get(&uid.value()))
                    .map(|unit| unit.name.clone());
                Some(AbsentInternRow {
                    intern_id: intern.id,
                    intern_name: intern.name.clone(),
                    supervisor_id,
                    supervisor_name: supervisor.name.clone(),
                    unit_name,
                })
            })
            .collect();
        rows.sort_by_key(|row| (row.supervisor_id, row.intern_id));
        Ok(rows)
    }

    async fn find_attendance(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<AttendanceRecord>> {
        Ok(self
            .inner
            .read()
            .attendance
            .get(&(user_id.value(), date))
            .copied())
    }

    async fn record_check_in(
        &self,
        user_id: UserId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut store = self.inner.write();
        if !store.users.contains_key(&user_id.value()) {
            return Err(RepositoryError::not_found(format!(
                "User {} does not exist",
                user_id
            )));
        }
        let record = store
            .attendance
            .entry((user_id.value(), date))
            .or_insert_with(|| AttendanceRecord {
                user_id,
                date,
                check_in_at: None,
                check_out_at: None,
            });
        // First check-in wins; repeated calls on the same day are no-ops.
        if record.check_in_at.is_none() {
            record.check_in_at = Some(at);
        }
        Ok(())
    }

    async fn record_check_out(
        &self,
        user_id: UserId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut store = self.inner.write();
        if !store.users.contains_key(&user_id.value()) {
            return Err(RepositoryError::not_found(format!(
                "User {} does not exist",
                user_id
            )));
        }
        let record = store
            .attendance
            .entry((user_id.value(), date))
            .or_insert_with(|| AttendanceRecord {
                user_id,
                date,
                check_in_at: None,
                check_out_at: None,
            });
        record.check_out_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
