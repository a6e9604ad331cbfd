pub mod health;
pub mod status;

use axum::{
    routing::{get, post},
    Router,
};

use crate::prep::handlers as prep;
use crate::sheets::handlers as sheets;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/status", get(status::status_handler))
        // Prep API
        .route("/api/v1/prep", post(prep::handle_prepare))
        // Email capture
        .route("/api/v1/email", post(sheets::handle_save_email))
        .route("/api/v1/sheets/check", get(sheets::handle_check_connection))
        .with_state(state)
}
