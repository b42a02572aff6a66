//! Preference record endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    CreatePreferenceRequest, DeletePreferenceResponse, UpdatePreferenceRequest, UserPreference,
};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;

/// Create the preference record of a user.
///
/// POST /api/preferences
pub async fn create_preference(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreatePreferenceRequest>,
) -> Result<(StatusCode, Json<UserPreference>), ApiError> {
    let preference = UserPreference::from_request(request, Utc::now());
    let created = state.preferences().create(preference).await?;

    info!(user_id = %created.user_id, "Preference record created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch the preference record of a user.
///
/// GET /api/preferences/:user_id
pub async fn get_preference(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPreference>, ApiError> {
    let preference = state
        .preferences()
        .get(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No preference for user {} on file", user_id)))?;

    Ok(Json(preference))
}

/// Merge the provided fields into a user's record.
///
/// PATCH /api/preferences/:user_id
pub async fn update_preference(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePreferenceRequest>,
) -> Result<Json<UserPreference>, ApiError> {
    let updated = state.preferences().update(&user_id, &request).await?;

    info!(user_id = %user_id, "Preference record updated");

    Ok(Json(updated))
}

/// Remove a user's record. Idempotent.
///
/// DELETE /api/preferences/:user_id
pub async fn delete_preference(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeletePreferenceResponse>, ApiError> {
    let deleted = state.preferences().delete(&user_id).await?;

    let message = if deleted {
        info!(user_id = %user_id, "Preference record deleted");
        format!("Preferences for user {} deleted", user_id)
    } else {
        format!("No preferences on file for user {}; nothing to delete", user_id)
    };

    Ok(Json(DeletePreferenceResponse { message, deleted }))
}
