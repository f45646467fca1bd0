//! Staff endpoints for the matchmaking workflow: viewing grouped waitlist
//! demand, forming pairings, and confirming classes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::auth::StaffAuth;
use crate::matchmaking::{self, MatchmakingError, PairingRequest};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Converts a workflow error to an API response.
pub fn matchmaking_error_to_response(error: MatchmakingError) -> Response {
    let status = match &error {
        MatchmakingError::Validation { .. } => StatusCode::BAD_REQUEST,
        MatchmakingError::NotFound { .. } => StatusCode::NOT_FOUND,
        MatchmakingError::AlreadyInState { .. } => StatusCode::CONFLICT,
        MatchmakingError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if error.is_warning() {
        return (
            status,
            Json(json!({ "warning": error.to_string() })),
        )
            .into_response();
    }
    ApiErrorType::from((status, error.to_string().as_str(), None)).into_response()
}

/// GET /matchmaking/groups
/// Unassigned waitlist entries grouped by (date, time, venue).
pub async fn get_waitlist_groups(
    State(s): State<Arc<AppState>>,
    Extension(_staff): Extension<StaffAuth>,
) -> Response {
    info!("GET /matchmaking/groups");

    match matchmaking::group_pending_entries(&s.db) {
        Ok(groups) => (StatusCode::OK, Json(groups)).into_response(),
        Err(e) => matchmaking_error_to_response(e),
    }
}

/// POST /matchmaking/pairings
/// Forms a confirmed class from 2-4 waiting students and notifies them.
pub async fn post_create_pairing(
    State(s): State<Arc<AppState>>,
    Extension(staff): Extension<StaffAuth>,
    Json(req): Json<PairingRequest>,
) -> Response {
    info!(
        "POST /matchmaking/pairings ({} players at venue {})",
        req.student_ids.len(),
        req.venue_id
    );

    match matchmaking::create_pairing_from_waitlist(&s.db, &s.dispatcher, &staff, &req) {
        Ok(outcome) => {
            let message = if outcome.notifications.failed == 0 {
                format!(
                    "Pairing created for {} players; all notifications sent",
                    req.student_ids.len()
                )
            } else {
                format!(
                    "Pairing created for {} players; {} notifications sent, {} failed",
                    req.student_ids.len(),
                    outcome.notifications.sent,
                    outcome.notifications.failed
                )
            };
            (
                StatusCode::CREATED,
                Json(json!({ "message": message, "outcome": outcome })),
            )
                .into_response()
        }
        Err(e) => matchmaking_error_to_response(e),
    }
}

/// POST /classes/:class_id/confirm
/// Confirms a class and notifies its pairing members.
pub async fn post_confirm_class(
    Path(class_id): Path<i64>,
    State(s): State<Arc<AppState>>,
    Extension(staff): Extension<StaffAuth>,
) -> Response {
    info!("POST /classes/{class_id}/confirm");

    match matchmaking::confirm_class(&s.db, &s.dispatcher, &staff, class_id) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": format!(
                    "Class confirmed; {} notifications sent, {} failed",
                    outcome.notifications.sent, outcome.notifications.failed
                ),
                "outcome": outcome,
            })),
        )
            .into_response(),
        Err(e) => matchmaking_error_to_response(e),
    }
}
