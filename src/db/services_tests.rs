use chrono::NaiveDate;

use crate::api::{
    AttendanceQuery, ReminderTarget, Role, ScheduleSettings, SlotConfig, Unit, UnitId, User, UserId,
};
use crate::db::repositories::LocalRepository;
use crate::db::repository::{AttendanceRepository, RepositoryError, UserRepository};
use crate::db::services;

fn sample_settings() -> ScheduleSettings {
    ScheduleSettings {
        check_in: SlotConfig::new("08:00", true, ReminderTarget::Participant, "Check in please"),
        r#break: SlotConfig::new("12:00", false, ReminderTarget::Participant, "Break time"),
        check_out: SlotConfig::new("17:00", true, ReminderTarget::Supervisor, "Wrap up"),
    }
}

fn intern(id: i64, name: &str, supervisor: i64) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        telegram_username: Some(format!("intern{}", id)),
        role: Role::Intern,
        supervisor_id: Some(UserId(supervisor)),
        unit_id: Some(UnitId(1)),
        active: true,
    }
}

fn supervisor(id: i64, name: &str) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        telegram_username: Some(format!("supervisor{}", id)),
        role: Role::Supervisor,
        supervisor_id: None,
        unit_id: None,
        active: true,
    }
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let repo = LocalRepository::new();

    assert!(services::get_schedule_settings(&repo)
        .await
        .unwrap()
        .is_none());

    let settings = sample_settings();
    services::store_schedule_settings(&repo, &settings)
        .await
        .unwrap();

    let stored = services::get_schedule_settings(&repo)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, settings);
}

#[tokio::test]
async fn test_store_rejects_invalid_time() {
    let repo = LocalRepository::new();
    let mut settings = sample_settings();
    settings.check_out.time = "25:00".to_string();

    let err = services::store_schedule_settings(&repo, &settings)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));

    // Nothing was written
    assert!(services::get_schedule_settings(&repo)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_absence_groups_omit_empty_supervisors() {
    let repo = LocalRepository::new();
    let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();

    repo.upsert_unit(&Unit {
        id: UnitId(1),
        name: "Engineering".to_string(),
    })
    .await
    .unwrap();
    repo.upsert_user(&supervisor(100, "Sari")).await.unwrap();
    repo.upsert_user(&supervisor(200, "Budi")).await.unwrap();
    repo.upsert_user(&intern(1, "Ana", 100)).await.unwrap();
    repo.upsert_user(&intern(2, "Dewi", 200)).await.unwrap();

    // Dewi checks in, leaving only Ana outstanding.
    repo.record_check_in(UserId(2), date, chrono::Utc::now())
        .await
        .unwrap();

    let groups = services::absence_groups(&repo, AttendanceQuery::CheckInOutstanding, date)
        .await
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].supervisor_id, UserId(100));
    assert_eq!(groups[0].absent_interns.len(), 1);
    assert_eq!(groups[0].absent_interns[0].intern_name, "Ana");
}

#[tokio::test]
async fn test_health_check() {
    let repo = LocalRepository::new();
    assert!(services::health_check(&repo).await.unwrap());
}
