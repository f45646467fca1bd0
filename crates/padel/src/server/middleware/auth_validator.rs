//! Bearer-token middleware for authenticated and staff routes.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::auth::{self, AuthError, StaffAuth};
use crate::db::UserRecord;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn resolve_user(state: &Arc<AppState>, req: &Request) -> Result<UserRecord, Response> {
    let Some(token) = bearer_token(req) else {
        return Err(ApiErrorType::from((
            StatusCode::UNAUTHORIZED,
            "Missing bearer token",
            None,
        ))
        .into_response());
    };
    match auth::session_user(&state.db, &token) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiErrorType::from((
            StatusCode::UNAUTHORIZED,
            "Invalid or expired session",
            None,
        ))
        .into_response()),
        Err(e) => Err(ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to resolve session",
            Some(e.to_string()),
        ))
        .into_response()),
    }
}

/// Requires any authenticated user; inserts their record as an extension.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(response) => response,
    }
}

/// Requires an authenticated instructor; inserts the staff capability.
pub async fn require_staff(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match StaffAuth::for_instructor(user) {
        Ok(staff) => {
            req.extensions_mut().insert(staff);
            next.run(req).await
        }
        Err(AuthError::Forbidden) => ApiErrorType::from((
            StatusCode::FORBIDDEN,
            "Instructor role required",
            None,
        ))
        .into_response(),
        Err(e) => ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authorization failed",
            Some(e.to_string()),
        ))
        .into_response(),
    }
}
