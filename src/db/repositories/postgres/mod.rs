//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//! The schema is created by the embedded migrations on startup.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::api::{
    AbsentInternRow, AttendanceQuery, AttendanceRecord, Role, ScheduleSettings, Unit, UnitId,
    User, UserId,
};
use crate::db::repository::{
    AttendanceRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    SettingsRepository, UserRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// The settings table is a singleton; this is its only row id.
const SETTINGS_ROW_ID: i32 = 1;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// Attendance writes reference the users table; a foreign key violation means
/// the user does not exist.
fn map_attendance_error(err: diesel::result::Error) -> RepositoryError {
    if let diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) =
        err
    {
        return RepositoryError::not_found_with_context(
            "User does not exist",
            ErrorContext::new("record_attendance").with_details(info.message().to_string()),
        );
    }
    map_diesel_error(err)
}

fn row_to_user(row: UserRow) -> RepositoryResult<User> {
    let role = row.role.parse::<Role>().map_err(|e| {
        RepositoryError::internal_with_context(
            e,
            ErrorContext::new("row_to_user")
                .with_entity("user")
                .with_entity_id(row.id),
        )
    })?;

    Ok(User {
        id: UserId(row.id),
        name: row.name,
        telegram_username: row.telegram_username,
        role,
        supervisor_id: row.supervisor_id.map(UserId),
        unit_id: row.unit_id.map(UnitId),
        active: row.active,
    })
}

fn user_to_row(user: &User) -> NewUserRow {
    NewUserRow {
        id: user.id.value(),
        name: user.name.clone(),
        telegram_username: user.telegram_username.clone(),
        role: user.role.as_str().to_string(),
        supervisor_id: user.supervisor_id.map(|id| id.value()),
        unit_id: user.unit_id.map(|id| id.value()),
        active: user.active,
    }
}

#[async_trait]
impl SettingsRepository for PostgresRepository {
    async fn get_schedule_settings(&self) -> RepositoryResult<Option<ScheduleSettings>> {
        let row = self
            .with_conn(|conn| {
                reminder_settings::table
                    .find(SETTINGS_ROW_ID)
                    .select(ReminderSettingsRow::as_select())
                    .first::<ReminderSettingsRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)
            })
            .await?;

        match row {
            None => Ok(None),
            Some(row) => serde_json::from_value(row.slots).map(Some).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Failed to parse stored slot configuration: {}", e),
                    ErrorContext::new("get_schedule_settings").with_entity("reminder_settings"),
                )
            }),
        }
    }

    async fn put_schedule_settings(&self, settings: &ScheduleSettings) -> RepositoryResult<()> {
        let slots = serde_json::to_value(settings).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Failed to serialize slot configuration: {}", e),
                ErrorContext::new("put_schedule_settings").with_entity("reminder_settings"),
            )
        })?;
        let updated_at = Utc::now();

        self.with_conn(move |conn| {
            let row = NewReminderSettingsRow {
                id: SETTINGS_ROW_ID,
                slots,
                updated_at,
            };
            diesel::insert_into(reminder_settings::table)
                .values(&row)
                .on_conflict(reminder_settings::id)
                .do_update()
                .set((
                    reminder_settings::slots.eq(excluded(reminder_settings::slots)),
                    reminder_settings::updated_at.eq(excluded(reminder_settings::updated_at)),
                ))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let row = self
            .with_conn(move |conn| {
                users::table
                    .find(id.value())
                    .select(UserRow::as_select())
                    .first::<UserRow>(conn)
                    .optional()
                    .map_err(map_diesel_error)
            })
            .await?;

        row.map(row_to_user).transpose()
    }

    async fn list_active_interns(&self) -> RepositoryResult<Vec<User>> {
        let rows = self
            .with_conn(|conn| {
                users::table
                    .filter(users::role.eq(Role::Intern.as_str()))
                    .filter(users::active.eq(true))
                    .order(users::id.asc())
                    .select(UserRow::as_select())
                    .load::<UserRow>(conn)
                    .map_err(map_diesel_error)
            })
            .await?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn upsert_user(&self, user: &User) -> RepositoryResult<()> {
        let row = user_to_row(user);
        self.with_conn(move |conn| {
            diesel::insert_into(users::table)
                .values(&row)
                .on_conflict(users::id)
                .do_update()
                .set((
                    users::name.eq(excluded(users::name)),
                    users::telegram_username.eq(excluded(users::telegram_username)),
                    users::role.eq(excluded(users::role)),
                    users::supervisor_id.eq(excluded(users::supervisor_id)),
                    users::unit_id.eq(excluded(users::unit_id)),
                    users::active.eq(excluded(users::active)),
                ))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn upsert_unit(&self, unit: &Unit) -> RepositoryResult<()> {
        let row = NewUnitRow {
            id: unit.id.value(),
            name: unit.name.clone(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(units::table)
                .values(&row)
                .on_conflict(units::id)
                .do_update()
                .set(units::name.eq(excluded(units::name)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl AttendanceRepository for PostgresRepository {
    async fn absent_interns(
        &self,
        query: AttendanceQuery,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<AbsentInternRow>> {
        self.with_conn(move |conn| {
            // Interns left-joined against their attendance row for the day;
            // the outstanding condition is evaluated in SQL.
            let base = users::table
                .left_join(
                    attendance_records::table.on(attendance_records::user_id
                        .eq(users::id)
                        .and(attendance_records::date.eq(date))),
                )
                .filter(users::role.eq(Role::Intern.as_str()))
                .filter(users::active.eq(true))
                .filter(users::supervisor_id.is_not_null());

            let interns: Vec<(i64, String, Option<i64>, Option<i64>)> = match query {
                AttendanceQuery::CheckInOutstanding => base
                    .filter(attendance_records::check_in_at.is_null())
                    .select((users::id, users::name, users::supervisor_id, users::unit_id))
                    .order((users::supervisor_id.asc(), users::id.asc()))
                    .load(conn)
                    .map_err(map_diesel_error)?,
                AttendanceQuery::CheckOutOutstanding => base
                    .filter(attendance_records::check_in_at.is_not_null())
                    .filter(attendance_records::check_out_at.is_null())
                    .select((users::id, users::name, users::supervisor_id, users::unit_id))
                    .order((users::supervisor_id.asc(), users::id.asc()))
                    .load(conn)
                    .map_err(map_diesel_error)?,
            };

            let supervisor_ids: Vec<i64> = interns.iter().filter_map(|r| r.2).collect();
            let supervisor_names: HashMap<i64, String> = users::table
                .filter(users::id.eq_any(&supervisor_ids))
                .select((users::id, users::name))
                .load::<(i64, String)>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .collect();

            let unit_ids: Vec<i64> = interns.iter().filter_map(|r| r.3).collect();
            let unit_names: HashMap<i64, String> = units::table
                .filter(units::id.eq_any(&unit_ids))
                .select((units::id, units::name))
                .load::<(i64, String)>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .collect();

            let mut rows = Vec::with_capacity(interns.len());
            for (intern_id, intern_name, supervisor_id, unit_id) in interns {
                let Some(supervisor_id) = supervisor_id else {
                    continue;
                };
                // Dangling supervisor reference: skip rather than fail the query.
                let Some(supervisor_name) = supervisor_names.get(&supervisor_id) else {
                    continue;
                };
                rows.push(AbsentInternRow {
                    intern_id: UserId(intern_id),
                    intern_name,
                    supervisor_id: UserId(supervisor_id),
                    supervisor_name: supervisor_name.clone(),
                    unit_name: unit_id.and_then(|id| unit_names.get(&id).cloned()),
                });
            }
            Ok(rows)
        })
        .await
    }

    async fn find_attendance(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<AttendanceRecord>> {
        self.with_conn(move |conn| {
            let row = attendance_records::table
                .filter(attendance_records::user_id.eq(user_id.value()))
                .filter(attendance_records::date.eq(date))
                .select(AttendanceRecordRow::as_select())
                .first::<AttendanceRecordRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;

            Ok(row.map(|r| AttendanceRecord {
                user_id: UserId(r.user_id),
                date: r.date,
                check_in_at: r.check_in_at,
                check_out_at: r.check_out_at,
            }))
        })
        .await
    }

    async fn record_check_in(
        &self,
        user_id: UserId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let updated = diesel::update(
                attendance_records::table
                    .filter(attendance_records::user_id.eq(user_id.value()))
                    .filter(attendance_records::date.eq(date))
                    .filter(attendance_records::check_in_at.is_null()),
            )
            .set(attendance_records::check_in_at.eq(at))
            .execute(conn)
            .map_err(map_diesel_error)?;

            if updated == 0 {
                // Either no row for the day yet, or a check-in already exists.
                // do_nothing keeps the first check-in.
                let row = NewAttendanceRecordRow {
                    user_id: user_id.value(),
                    date,
                    check_in_at: Some(at),
                    check_out_at: None,
                };
                diesel::insert_into(attendance_records::table)
                    .values(&row)
                    .on_conflict((attendance_records::user_id, attendance_records::date))
                    .do_nothing()
                    .execute(conn)
                    .map_err(map_attendance_error)?;
            }
            Ok(())
        })
        .await
    }

    async fn record_check_out(
        &self,
        user_id: UserId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let row = NewAttendanceRecordRow {
                user_id: user_id.value(),
                date,
                check_in_at: None,
                check_out_at: Some(at),
            };
            diesel::insert_into(attendance_records::table)
                .values(&row)
                .on_conflict((attendance_records::user_id, attendance_records::date))
                .do_update()
                .set(attendance_records::check_out_at.eq(at))
                .execute(conn)
                .map_err(map_attendance_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }
}
