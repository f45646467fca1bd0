use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{middleware as mw, Router};

use crate::server::endpoints::{auth, classes, pairing, status, waitlist};
use crate::server::middleware::auth_validator;
use crate::types::AppState;

mod endpoints;
mod middleware;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Public endpoints
    let public_router = Router::new()
        .route("/health", get(status::get_health))
        .route("/register", post(auth::post_register))
        .route("/login", post(auth::post_login));

    // Endpoints for any authenticated user
    let user_router = Router::new()
        .route(
            "/waitlist",
            post(waitlist::post_waitlist_entry).get(waitlist::get_my_waitlist),
        )
        .layer(mw::from_fn_with_state(
            app_state.clone(),
            auth_validator::require_user,
        ));

    // Staff endpoints require the instructor capability
    let staff_router = Router::new()
        .route("/matchmaking/groups", get(pairing::get_waitlist_groups))
        .route("/matchmaking/pairings", post(pairing::post_create_pairing))
        .route("/classes", post(classes::post_create_class))
        .route("/classes/:class_id/confirm", post(pairing::post_confirm_class))
        .route("/classes/:class_id/students", post(classes::post_add_student))
        .route(
            "/classes/:class_id/students/:student_id",
            delete(classes::delete_remove_student),
        )
        .route("/waitlist/:entry_id", delete(waitlist::delete_waitlist_entry))
        .layer(mw::from_fn_with_state(
            app_state.clone(),
            auth_validator::require_staff,
        ));

    Router::new()
        .merge(public_router)
        .merge(user_router)
        .merge(staff_router)
        .with_state(app_state)
}
