//! Service banner and health check.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Banner {
    pub message: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started.
    pub uptime: f64,
}

/// Handler for `GET /`
pub async fn root() -> Json<Banner> {
    Json(Banner {
        message: "InfraVision Backend Server",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        timestamp: Utc::now(),
        uptime: state.uptime_seconds(),
    })
}
