//! Notification dispatch endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{DeliveryLogEntry, SendNotificationRequest};
use domain::services::DispatchOutcome;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::middleware::record_dispatch_outcome;

/// Dispatch one notification.
///
/// POST /api/notifications/send
///
/// 201 with the terminal log entry when the send was attempted, whether it
/// was delivered or not. 403 with the deny reason when preferences refuse it.
pub async fn send_notification(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SendNotificationRequest>,
) -> Result<(StatusCode, Json<DeliveryLogEntry>), ApiError> {
    let SendNotificationRequest {
        user_id,
        notification_type,
        channel,
        content,
    } = request;

    let outcome = state
        .engine
        .dispatch(&user_id, notification_type, channel, content)
        .await?;

    match outcome {
        DispatchOutcome::Attempted(entry) => {
            record_dispatch_outcome(entry.status.as_str(), channel, notification_type);
            Ok((StatusCode::CREATED, Json(entry)))
        }
        DispatchOutcome::Denied(denied) => {
            record_dispatch_outcome("denied", channel, notification_type);
            Err(ApiError::Denied(denied.reason))
        }
    }
}

/// List a user's delivery log entries in creation order.
///
/// GET /api/notifications/:user_id/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<DeliveryLogEntry>>, ApiError> {
    let logs = state.engine.list_logs(&user_id).await?;
    Ok(Json(logs))
}
