//! InfraVision HTTP API: complaint generation through Gemini, a chat
//! assistant and PDF export of the finished letter.

pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod prompts;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use gemini::{GeminiClient, GenerationError, InlineImage, TextGenerator};
pub use state::AppState;

/// Routes with the default 10 MiB body limit and no CORS.
pub fn router(state: AppState) -> Router {
    build(state, 10 * 1024 * 1024, None)
}

/// The full application as configured.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    build(state, config.body_limit, Some(cors_layer(&config.cors_origins)))
}

fn build(state: AppState, body_limit: usize, cors: Option<CorsLayer>) -> Router {
    let router = api::routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);
    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS for the configured origins; `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
