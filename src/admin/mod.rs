//! Staff-only HTML console for user records.

use crate::state::AppState;
use axum::Router;

pub mod forms;
pub mod handlers;
pub mod render;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
