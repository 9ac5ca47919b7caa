use std::sync::Arc;
use std::time::Instant;

use complaint_pdf_rust::ComplaintRenderer;

use crate::gemini::TextGenerator;

/// Shared handler state. Cloned per request; everything inside is shared.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<ComplaintRenderer>,
    pub generator: Arc<dyn TextGenerator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(renderer: ComplaintRenderer, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            renderer: Arc::new(renderer),
            generator,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
