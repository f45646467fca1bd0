//! Shared application state.

use crate::db::ClubDbManager;
use crate::notify::NotificationDispatcher;

/// State handed to every request handler.
pub struct AppState {
    pub db: ClubDbManager,
    pub dispatcher: NotificationDispatcher,
}
