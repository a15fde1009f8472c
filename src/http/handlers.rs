//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use super::dto::{AbsencesQuery, AbsencesResponse, HealthResponse, TriggerResponse};
use super::error::AppError;
use super::state::AppState;
use crate::api::{AttendanceQuery, ScheduleSettings};
use crate::db::services as db_services;
use crate::services::reminder::{self, CycleOutcome};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Reminder Trigger
// =============================================================================

/// GET /v1/reminders/run
///
/// Run one dispatch cycle against the current minute. The external scheduler
/// calls this every minute; off-schedule calls are successful no-ops.
pub async fn run_reminders(State(state): State<AppState>) -> HandlerResult<TriggerResponse> {
    let outcome = reminder::run_cycle(
        state.repository.as_ref(),
        state.transport.as_ref(),
        state.pacer.as_ref(),
        state.config.timezone,
        &state.audit,
    )
    .await?;

    let response = match outcome {
        CycleOutcome::NotConfigured => {
            TriggerResponse::no_op("Reminder schedule is not configured")
        }
        CycleOutcome::NoTask { time_label } => {
            TriggerResponse::no_op(format!("No task scheduled for {}", time_label))
        }
        CycleOutcome::Dispatched { task, report } => {
            TriggerResponse::dispatched(task.slot, task.query, report)
        }
    };
    Ok(Json(response))
}

// =============================================================================
// Schedule Settings
// =============================================================================

/// GET /v1/reminders/settings
///
/// Current reminder schedule. 404 until an administrator stores one.
pub async fn get_settings(State(state): State<AppState>) -> HandlerResult<ScheduleSettings> {
    match db_services::get_schedule_settings(state.repository.as_ref()).await? {
        Some(settings) => Ok(Json(settings)),
        None => Err(AppError::NotFound(
            "Reminder schedule is not configured".to_string(),
        )),
    }
}

/// POST /v1/reminders/settings
///
/// Replace the schedule wholesale. Partial updates are not supported; the
/// admin UI always submits all three slots.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<ScheduleSettings>,
) -> HandlerResult<ScheduleSettings> {
    db_services::store_schedule_settings(state.repository.as_ref(), &settings).await?;
    Ok(Json(settings))
}

// =============================================================================
// Absence Preview
// =============================================================================

/// GET /v1/reminders/absences
///
/// Preview today's grouped absences without sending anything. Useful for
/// checking what a dispatch cycle would act on.
pub async fn list_absences(
    State(state): State<AppState>,
    Query(params): Query<AbsencesQuery>,
) -> HandlerResult<AbsencesResponse> {
    let query = params.query.unwrap_or(AttendanceQuery::CheckInOutstanding);
    let date = Utc::now().with_timezone(&state.config.timezone).date_naive();

    let groups = db_services::absence_groups(state.repository.as_ref(), query, date).await?;
    let total_absent = groups.iter().map(|g| g.absent_interns.len()).sum();

    Ok(Json(AbsencesResponse {
        query,
        date,
        groups,
        total_absent,
    }))
}
