//! Append-only audit log for dispatch cycles.
//!
//! Every cycle appends human-readable lines to a plain text file, one line
//! per event: cycle start, matched task, per-recipient skips and failures,
//! and the final sent/failed totals. The file is the operational paper
//! trail for "did the 08:00 reminder actually go out"; nothing in the
//! system reads it back.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use chrono_tz::Tz;
use log::warn;

/// Appends timestamped records to a text file.
///
/// Cloning is cheap; handles share the path and zone. A log constructed
/// with [`AuditLog::disabled`] swallows every record, which keeps call
/// sites free of `if let Some(audit)` chains.
///
/// Writes are best-effort: an unwritable file logs a warning and the
/// dispatch cycle carries on.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: Option<PathBuf>,
    tz: Tz,
}

impl AuditLog {
    /// Audit log writing to `path`, timestamping in `tz`.
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: Some(path.into()),
            tz,
        }
    }

    /// Audit log that discards every record.
    pub fn disabled(tz: Tz) -> Self {
        Self { path: None, tz }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append one record, prefixed with the current zone-local timestamp.
    pub fn record(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let timestamp = Utc::now().with_timezone(&self.tz);
        let line = format!(
            "[{}] {}\n",
            timestamp.format("%Y-%m-%d %H:%M:%S %Z"),
            message
        );
        if let Err(e) = append_line(path, &line) {
            warn!("Failed to write audit record to {}: {}", path.display(), e);
        }
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: Tz = chrono_tz::Asia::Jakarta;

    #[test]
    fn test_appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let audit = AuditLog::new(&path, ZONE);

        audit.record("cycle started");
        audit.record("2 sent, 0 failed");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("cycle started"));
        assert!(lines[0].contains("WIB"));
        assert!(lines[1].ends_with("2 sent, 0 failed"));
    }

    #[test]
    fn test_disabled_log_never_writes() {
        let audit = AuditLog::disabled(ZONE);
        assert!(!audit.is_enabled());
        audit.record("should vanish");
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let audit = AuditLog::new("/nonexistent-dir/audit.log", ZONE);
        audit.record("write fails silently");
    }
}
