//! Schedule matching against the configured reminder slots.
//!
//! The matcher is a pure function over the settings record and a zone-local
//! clock reading; callers load the settings and decide what to do with the
//! selected task. Matching rules:
//!
//! 1. Saturdays and Sundays never match (weekend suppression).
//! 2. The current time is compared at minute resolution ("HH:MM"); a slot
//!    fires only during the exact minute its configured time matches.
//! 3. Slots are tested in priority order `check_in`, `break`, `check_out`;
//!    the first enabled slot with a matching time wins, so at most one task
//!    is produced per invocation.
//!
//! Because matching is exact-minute equality, an invoking scheduler that
//! skips a minute (a cadence longer than one minute, or clock drift across
//! the minute boundary) silently misses that slot for the day. There is no
//! catch-up window; cadence is the external scheduler's responsibility.

use chrono::{DateTime, Datelike, Weekday};
use chrono_tz::Tz;

use crate::api::{ScheduleSettings, ScheduledTask};


/// Select at most one slot for the given zone-local instant.
///
/// Returns `None` on weekends, when no enabled slot's time equals the
/// current minute, and callers must treat that as a normal no-op.
pub fn match_slot(settings: &ScheduleSettings, now: &DateTime<Tz>) -> Option<ScheduledTask> {
    if is_weekend(now.weekday()) {
        return None;
    }

    let current = current_time_label(now);
    for (key, slot) in settings.slots() {
        if slot.enabled && slot.time == current {
            return Some(ScheduledTask {
                slot: key,
                query: key.query(),
                target: slot.target,
                message: slot.message.clone(),
            });
        }
    }
    None
}

/// The instant formatted as "HH:MM", as used for matching, no-op responses
/// and audit lines.
pub fn current_time_label(now: &DateTime<Tz>) -> String {
    now.format("%H:%M").to_string()
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}
