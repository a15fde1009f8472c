//! Application configuration from environment variables.
//!
//! Repository selection and Postgres pooling have their own configuration
//! paths under `db`; this covers everything else the server needs: the
//! deployment time zone, the trigger token, the audit log location and the
//! messaging credentials.

use chrono_tz::Tz;

/// Zone used when `IMS_TIMEZONE` is unset. All schedule matching and
/// message timestamps are local to this zone.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;

/// Server-level settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IANA zone the schedule is interpreted in.
    pub timezone: Tz,
    /// Bearer token for the trigger and settings endpoints. Empty means
    /// only loopback callers are accepted.
    pub api_token: String,
    /// Audit log file path; `None` disables audit logging.
    pub audit_log_path: Option<String>,
    /// Bot token for the messaging API. Empty disables real sends.
    pub telegram_bot_token: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            api_token: String::new(),
            audit_log_path: None,
            telegram_bot_token: String::new(),
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `IMS_TIMEZONE`: IANA zone name (default: `Asia/Jakarta`)
    /// - `IMS_API_TOKEN`: Bearer token for authenticated endpoints
    ///   (default: empty, loopback-only access)
    /// - `IMS_AUDIT_LOG`: Audit log file path (default: disabled)
    /// - `TELEGRAM_BOT_TOKEN`: Messaging bot token (default: empty,
    ///   sends disabled)
    pub fn from_env() -> Result<Self, String> {
        let timezone = match std::env::var("IMS_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|_| format!("IMS_TIMEZONE is not a valid IANA zone: '{}'", name))?,
            Err(_) => DEFAULT_TIMEZONE,
        };

        let api_token = std::env::var("IMS_API_TOKEN").unwrap_or_default();

        let audit_log_path = std::env::var("IMS_AUDIT_LOG")
            .ok()
            .filter(|p| !p.trim().is_empty());

        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();

        Ok(Self {
            timezone,
            api_token,
            audit_log_path,
            telegram_bot_token,
        })
    }
}
