use crate::state::AppState;
use axum::Router;

pub mod extractors;
pub mod handlers;
pub mod repo;

pub use repo::AuthToken;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::token_routes())
}
