use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;
use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::api::{
    AbsenceGroup, AbsentIntern, ReminderTarget, Role, ScheduledTask, SlotKey, User, UserId,
};
use crate::db::repositories::LocalRepository;
use crate::db::repository::UserRepository;
use crate::services::audit::AuditLog;
use crate::services::dispatcher::{
    dispatch, PARTICIPANT_SEND_GAP, SUPERVISOR_SEND_GAP, SendPacer,
};
use crate::transport::{MessageFormat, MessageTransport, TransportError};

const ZONE: Tz = chrono_tz::Asia::Jakarta;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SentMessage {
    recipient: String,
    title: String,
    body: String,
}

#[derive(Default)]
struct MockTransport {
    fail_recipients: Vec<String>,
    sends: Mutex<Vec<SentMessage>>,
}

impl MockTransport {
    fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_recipients: recipients.iter().map(|r| r.to_string()).collect(),
            sends: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<SentMessage> {
        self.sends.lock().clone()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(
        &self,
        recipient: &str,
        title: &str,
        body: &str,
        _format: MessageFormat,
    ) -> Result<(), TransportError> {
        if self.fail_recipients.iter().any(|r| r == recipient) {
            return Err(TransportError::Api("chat not found".to_string()));
        }
        self.sends.lock().push(SentMessage {
            recipient: recipient.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

#[async_trait]
impl SendPacer for RecordingPacer {
    async fn pause(&self, gap: Duration) {
        self.pauses.lock().push(gap);
    }
}

fn task(slot: SlotKey, target: ReminderTarget) -> ScheduledTask {
    ScheduledTask {
        slot,
        query: slot.query(),
        target,
        message: "Custom reminder text".to_string(),
    }
}

fn user(id: i64, name: &str, role: Role, handle: Option<&str>) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        telegram_username: handle.map(|h| h.to_string()),
        role,
        supervisor_id: (role == Role::Intern).then_some(UserId(100)),
        unit_id: None,
        active: true,
    }
}

fn absent(id: i64, name: &str, unit: Option<&str>) -> AbsentIntern {
    AbsentIntern {
        intern_id: UserId(id),
        intern_name: name.to_string(),
        unit_name: unit.map(|u| u.to_string()),
    }
}

fn group(supervisor_id: i64, supervisor_name: &str, interns: Vec<AbsentIntern>) -> AbsenceGroup {
    AbsenceGroup {
        supervisor_id: UserId(supervisor_id),
        supervisor_name: supervisor_name.to_string(),
        absent_interns: interns,
    }
}

async fn repo_with(users: Vec<User>) -> LocalRepository {
    let repo = LocalRepository::new();
    for u in &users {
        repo.upsert_user(u).await.unwrap();
    }
    repo
}

fn wednesday_morning() -> chrono::DateTime<Tz> {
    ZONE.with_ymd_and_hms(2025, 9, 3, 8, 0, 0).unwrap()
}

#[tokio::test]
async fn test_participant_messages_rendered_per_intern() {
    let repo = repo_with(vec![
        user(1, "Ana", Role::Intern, Some("ana_h")),
        user(2, "Budi", Role::Intern, Some("budi_h")),
    ])
    .await;
    let groups = vec![group(
        100,
        "Citra",
        vec![absent(1, "Ana", None), absent(2, "Budi", None)],
    )];
    let transport = MockTransport::default();
    let pacer = RecordingPacer::default();
    let task = task(SlotKey::CheckIn, ReminderTarget::Participant);

    let report = dispatch(
        &task,
        &groups,
        &repo,
        &transport,
        &pacer,
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].recipient, "ana_h");
    assert_eq!(sent[0].title, "Check-in Reminder");
    assert!(sent[0].body.starts_with("Hi Ana,"));
    assert!(sent[0].body.contains("Custom reminder text"));
    assert!(sent[0].body.contains("check in"));
    assert!(sent[0].body.contains("Sent at 03/09/2025 08:00 WIB"));
    assert!(sent[1].body.starts_with("Hi Budi,"));
}

#[tokio::test]
async fn test_check_out_instruction_differs() {
    let repo = repo_with(vec![user(1, "Ana", Role::Intern, Some("ana_h"))]).await;
    let groups = vec![group(100, "Citra", vec![absent(1, "Ana", None)])];
    let transport = MockTransport::default();
    let task = task(SlotKey::CheckOut, ReminderTarget::Participant);

    let report = dispatch(
        &task,
        &groups,
        &repo,
        &transport,
        &RecordingPacer::default(),
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 1);
    let sent = transport.sent();
    assert_eq!(sent[0].title, "Check-out Reminder");
    assert!(sent[0].body.contains("check out"));
}

#[tokio::test]
async fn test_missing_handle_is_skipped_silently() {
    let repo = repo_with(vec![
        user(1, "Ana", Role::Intern, Some("ana_h")),
        user(2, "Budi", Role::Intern, None),
        user(3, "Dewi", Role::Intern, Some("  ")),
    ])
    .await;
    let groups = vec![group(
        100,
        "Citra",
        vec![
            absent(1, "Ana", None),
            absent(2, "Budi", None),
            absent(3, "Dewi", None),
        ],
    )];
    let transport = MockTransport::default();

    let report = dispatch(
        &task(SlotKey::CheckIn, ReminderTarget::Participant),
        &groups,
        &repo,
        &transport,
        &RecordingPacer::default(),
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    // Blank handles count as missing, same as None.
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn test_transport_failure_does_not_abort_batch() {
    let repo = repo_with(vec![
        user(1, "Ana", Role::Intern, Some("ana_h")),
        user(2, "Budi", Role::Intern, Some("budi_h")),
        user(3, "Dewi", Role::Intern, Some("dewi_h")),
    ])
    .await;
    let groups = vec![group(
        100,
        "Citra",
        vec![
            absent(1, "Ana", None),
            absent(2, "Budi", None),
            absent(3, "Dewi", None),
        ],
    )];
    let transport = MockTransport::failing_for(&["budi_h"]);

    let report = dispatch(
        &task(SlotKey::CheckIn, ReminderTarget::Participant),
        &groups,
        &repo,
        &transport,
        &RecordingPacer::default(),
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);
    // Every recipient with a handle was attempted.
    assert_eq!(report.sent + report.failed, 3);
    let recipients: Vec<_> = transport.sent().into_iter().map(|s| s.recipient).collect();
    assert_eq!(recipients, vec!["ana_h", "dewi_h"]);
}

#[tokio::test]
async fn test_pacing_between_participant_sends_only() {
    let repo = repo_with(vec![
        user(1, "Ana", Role::Intern, None),
        user(2, "Budi", Role::Intern, Some("budi_h")),
        user(3, "Dewi", Role::Intern, Some("dewi_h")),
        user(4, "Eka", Role::Intern, Some("eka_h")),
    ])
    .await;
    let groups = vec![group(
        100,
        "Citra",
        vec![
            absent(1, "Ana", None),
            absent(2, "Budi", None),
            absent(3, "Dewi", None),
            absent(4, "Eka", None),
        ],
    )];
    let transport = MockTransport::failing_for(&["dewi_h"]);
    let pacer = RecordingPacer::default();

    let report = dispatch(
        &task(SlotKey::CheckIn, ReminderTarget::Participant),
        &groups,
        &repo,
        &transport,
        &pacer,
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    // Three attempts (one failing), so two gaps. The leading skip adds none.
    assert_eq!(report.sent + report.failed, 3);
    let pauses = pacer.pauses.lock().clone();
    assert_eq!(pauses, vec![PARTICIPANT_SEND_GAP, PARTICIPANT_SEND_GAP]);
}

#[tokio::test]
async fn test_supervisor_roster_numbered_with_unit_fallback() {
    let repo = repo_with(vec![user(100, "Citra", Role::Supervisor, Some("citra_h"))]).await;
    let groups = vec![group(
        100,
        "Citra",
        vec![
            absent(1, "Ana", Some("Engineering")),
            absent(2, "Budi", None),
        ],
    )];
    let transport = MockTransport::default();

    let report = dispatch(
        &task(SlotKey::CheckIn, ReminderTarget::Supervisor),
        &groups,
        &repo,
        &transport,
        &RecordingPacer::default(),
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 1);
    let sent = transport.sent();
    assert_eq!(sent[0].recipient, "citra_h");
    assert!(sent[0].body.contains("Interns without a check-in today:"));
    assert!(sent[0].body.contains("1. Ana (Engineering)\n2. Budi (-)"));
    assert!(sent[0].body.contains("Custom reminder text"));
}

#[tokio::test]
async fn test_supervisor_pacing_and_skip() {
    let repo = repo_with(vec![
        user(100, "Citra", Role::Supervisor, None),
        user(200, "Farah", Role::Supervisor, Some("farah_h")),
        user(300, "Gita", Role::Supervisor, Some("gita_h")),
    ])
    .await;
    let groups = vec![
        group(100, "Citra", vec![absent(1, "Ana", None)]),
        group(200, "Farah", vec![absent(2, "Budi", None)]),
        group(300, "Gita", vec![absent(3, "Dewi", None)]),
    ];
    let transport = MockTransport::default();
    let pacer = RecordingPacer::default();

    let report = dispatch(
        &task(SlotKey::CheckIn, ReminderTarget::Supervisor),
        &groups,
        &repo,
        &transport,
        &pacer,
        wednesday_morning(),
        &AuditLog::disabled(ZONE),
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(pacer.pauses.lock().clone(), vec![SUPERVISOR_SEND_GAP]);
}
