//! Shared fixtures for the integration tests: scoped environment editing,
//! a recording mock transport and a no-sleep pacer.

#![allow(dead_code)] // Each integration test binary uses a different subset.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex as DataMutex;

use ims_rust::api::{Role, Unit, UnitId, User, UserId};
use ims_rust::services::dispatcher::SendPacer;
use ims_rust::transport::{MessageFormat, MessageTransport, TransportError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// One message captured by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub title: String,
    pub body: String,
}

/// Transport that records successful sends and fails for chosen recipients.
#[derive(Default)]
pub struct MockTransport {
    fail_recipients: Vec<String>,
    sends: DataMutex<Vec<SentMessage>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_recipients: recipients.iter().map(|r| r.to_string()).collect(),
            sends: DataMutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
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

/// Pacer that records requested gaps instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    pauses: DataMutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

#[async_trait]
impl SendPacer for RecordingPacer {
    async fn pause(&self, gap: Duration) {
        self.pauses.lock().push(gap);
    }
}

/// Intern fixture with a messaging handle.
pub fn intern(id: i64, name: &str, supervisor: i64, handle: Option<&str>) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        telegram_username: handle.map(|h| h.to_string()),
        role: Role::Intern,
        supervisor_id: Some(UserId(supervisor)),
        unit_id: None,
        active: true,
    }
}

/// Supervisor fixture.
pub fn supervisor(id: i64, name: &str, handle: Option<&str>) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        telegram_username: handle.map(|h| h.to_string()),
        role: Role::Supervisor,
        supervisor_id: None,
        unit_id: None,
        active: true,
    }
}

/// Unit fixture.
pub fn unit(id: i64, name: &str) -> Unit {
    Unit {
        id: UnitId(id),
        name: name.to_string(),
    }
}
