//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::repository::FullRepository;
use crate::services::audit::AuditLog;
use crate::services::dispatcher::{SendPacer, SleepPacer};
use crate::transport::MessageTransport;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Outbound messaging transport
    pub transport: Arc<dyn MessageTransport>,
    /// Pause between consecutive sends
    pub pacer: Arc<dyn SendPacer>,
    /// Append-only dispatch audit log
    pub audit: AuditLog,
    /// Server-level settings
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create application state with the production pacer.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        transport: Arc<dyn MessageTransport>,
        config: AppConfig,
    ) -> Self {
        let audit = match &config.audit_log_path {
            Some(path) => AuditLog::new(path, config.timezone),
            None => AuditLog::disabled(config.timezone),
        };
        Self {
            repository,
            transport,
            pacer: Arc::new(SleepPacer),
            audit,
            config: Arc::new(config),
        }
    }

    /// Replace the pacer. Tests use this to avoid real sleeps.
    pub fn with_pacer(mut self, pacer: Arc<dyn SendPacer>) -> Self {
        self.pacer = pacer;
        self
    }
}
