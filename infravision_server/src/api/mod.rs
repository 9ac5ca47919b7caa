//! HTTP routes.

pub mod complaint;
pub mod health;
pub mod pdf;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::get_health))
        .route("/api/complaint-pdf", post(pdf::complaint_pdf))
        .route("/api/generate-complaint", post(complaint::generate_complaint))
        .route("/api/complaint/generate", post(complaint::generate_complaint))
        .route("/api/chat-help", post(complaint::chat_help))
        .route("/api/complaint/chat-help", post(complaint::chat_help))
}
