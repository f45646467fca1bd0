use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::auth::{self, AuthError, StudentRegistration};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /login
/// Resolves credentials (username or email) to a bearer token.
pub async fn post_login(
    State(s): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    info!("POST /login");

    let user = match auth::authenticate(&s.db, &req.username, &req.password) {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            return ApiErrorType::from((
                StatusCode::UNAUTHORIZED,
                "Invalid username/email or password",
                None,
            ))
            .into_response()
        }
        Err(e) => {
            return ApiErrorType::from((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed",
                Some(e.to_string()),
            ))
            .into_response()
        }
    };

    match auth::open_session(&s.db, &user) {
        Ok(token) => (
            StatusCode::OK,
            Json(json!({
                "token": token,
                "user_id": user.user_id,
                "role": user.role,
            })),
        )
            .into_response(),
        Err(e) => ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to open session",
            Some(e.to_string()),
        ))
        .into_response(),
    }
}

/// POST /register
/// Student self-registration.
pub async fn post_register(
    State(s): State<Arc<AppState>>,
    Json(req): Json<StudentRegistration>,
) -> Response {
    info!("POST /register ({})", req.username);

    match auth::register_student(&s.db, &req) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(AuthError::Validation { message }) => {
            ApiErrorType::from((StatusCode::BAD_REQUEST, message.as_str(), None)).into_response()
        }
        Err(e) => ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Registration failed",
            Some(e.to_string()),
        ))
        .into_response(),
    }
}
