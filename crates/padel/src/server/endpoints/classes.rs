//! Staff endpoints for standalone classes and class membership.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::auth::StaffAuth;
use crate::matchmaking::{self, ClassRequest};
use crate::server::endpoints::pairing::matchmaking_error_to_response;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct AddStudentRequest {
    pub student_id: i64,
}

/// POST /classes
/// Creates an unconfirmed class; students are attached afterwards.
pub async fn post_create_class(
    State(s): State<Arc<AppState>>,
    Extension(staff): Extension<StaffAuth>,
    Json(req): Json<ClassRequest>,
) -> Response {
    info!("POST /classes ({} {})", req.date, req.time);

    match matchmaking::create_class(&s.db, &staff, &req) {
        Ok(class) => (StatusCode::CREATED, Json(class)).into_response(),
        Err(e) => matchmaking_error_to_response(e),
    }
}

/// POST /classes/:class_id/students
/// Adds a student to the class's pairing.
pub async fn post_add_student(
    Path(class_id): Path<i64>,
    State(s): State<Arc<AppState>>,
    Extension(staff): Extension<StaffAuth>,
    Json(req): Json<AddStudentRequest>,
) -> Response {
    info!("POST /classes/{class_id}/students ({})", req.student_id);

    match matchmaking::add_student_to_class(&s.db, &staff, class_id, req.student_id) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("{} added to the class", outcome.student.first_name),
                "outcome": outcome,
            })),
        )
            .into_response(),
        Err(e) => matchmaking_error_to_response(e),
    }
}

/// DELETE /classes/:class_id/students/:student_id
/// Removes a student from the class's pairing.
pub async fn delete_remove_student(
    Path((class_id, student_id)): Path<(i64, i64)>,
    State(s): State<Arc<AppState>>,
    Extension(staff): Extension<StaffAuth>,
) -> Response {
    info!("DELETE /classes/{class_id}/students/{student_id}");

    match matchmaking::remove_student_from_class(&s.db, &staff, class_id, student_id) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("{} removed from the class", outcome.student.first_name),
                "outcome": outcome,
            })),
        )
            .into_response(),
        Err(e) => matchmaking_error_to_response(e),
    }
}
