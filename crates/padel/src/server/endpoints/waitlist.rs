use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::auth::StaffAuth;
use crate::db::UserRecord;
use crate::matchmaking;
use crate::server::endpoints::pairing::matchmaking_error_to_response;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct JoinWaitlistRequest {
    pub venue_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub description: String,
}

/// POST /waitlist
/// Queues the authenticated user for a slot.
pub async fn post_waitlist_entry(
    State(s): State<Arc<AppState>>,
    Extension(user): Extension<UserRecord>,
    Json(req): Json<JoinWaitlistRequest>,
) -> Response {
    info!("POST /waitlist (user {})", user.user_id);

    match s.db.get_venue(req.venue_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return ApiErrorType::from((StatusCode::NOT_FOUND, "Venue not found", None))
                .into_response()
        }
        Err(e) => {
            return ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to look up venue",
                Some(e.to_string()),
            ))
            .into_response()
        }
    }

    match s.db.create_waitlist_entry(
        user.user_id,
        req.venue_id,
        req.date,
        req.time,
        &req.description,
    ) {
        Ok(entry_id) => (
            StatusCode::CREATED,
            Json(json!({ "entry_id": entry_id })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to join the waiting list",
            Some(e.to_string()),
        ))
        .into_response(),
    }
}

/// GET /waitlist
/// The authenticated user's own entries, newest slot first.
pub async fn get_my_waitlist(
    State(s): State<Arc<AppState>>,
    Extension(user): Extension<UserRecord>,
) -> Response {
    info!("GET /waitlist (user {})", user.user_id);

    match s.db.entries_for_user(user.user_id) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch waitlist entries",
            Some(e.to_string()),
        ))
        .into_response(),
    }
}

/// DELETE /waitlist/:entry_id
/// Staff cancellation: deletes the entry and emails the student.
pub async fn delete_waitlist_entry(
    Path(entry_id): Path<i64>,
    State(s): State<Arc<AppState>>,
    Extension(staff): Extension<StaffAuth>,
) -> Response {
    info!("DELETE /waitlist/{entry_id}");

    match matchmaking::cancel_waitlist_entry(&s.db, &s.dispatcher, &staff, entry_id) {
        Ok(outcome) => {
            let message = if outcome.notification_delivered {
                "Waitlist entry cancelled and the student was notified"
            } else {
                "Waitlist entry cancelled but the notification email failed"
            };
            (
                StatusCode::OK,
                Json(json!({
                    "message": message,
                    "entry_id": outcome.entry_id,
                    "notification_delivered": outcome.notification_delivered,
                })),
            )
                .into_response()
        }
        Err(e) => matchmaking_error_to_response(e),
    }
}
