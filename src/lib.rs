pub mod admin;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
pub mod tokens;
pub mod users;

pub use app::build_app;
pub use state::AppState;
