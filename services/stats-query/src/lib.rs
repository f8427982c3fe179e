pub mod auth;
pub mod config;
pub mod errors;
pub mod query;
pub mod routes;
pub mod state;

pub use config::Config;
pub use errors::{ApiError, ErrorCode};
pub use state::AppState;
