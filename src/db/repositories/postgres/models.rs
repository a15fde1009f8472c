use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{attendance_records, reminder_settings, units, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub telegram_username: Option<String>,
    pub role: String,
    pub supervisor_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub active: bool,
}

// Ids are assigned by the application, not by a sequence, so the insert
// struct carries the primary key.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: i64,
    pub name: String,
    pub telegram_username: Option<String>,
    pub role: String,
    pub supervisor_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Some fields used only for database operations
pub struct UnitRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = units)]
pub struct NewUnitRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = attendance_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Some fields used only for database operations
pub struct AttendanceRecordRow {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub check_in_at: Option<DateTime<Utc>>,
    pub check_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attendance_records)]
pub struct NewAttendanceRecordRow {
    pub user_id: i64,
    pub date: NaiveDate,
    pub check_in_at: Option<DateTime<Utc>>,
    pub check_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reminder_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Some fields used only for database operations
pub struct ReminderSettingsRow {
    pub id: i32,
    pub slots: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reminder_settings)]
pub struct NewReminderSettingsRow {
    pub id: i32,
    pub slots: Value,
    pub updated_at: DateTime<Utc>,
}
