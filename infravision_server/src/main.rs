use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use complaint_pdf_rust::{find_assets_font_dir, ComplaintRenderer, FontCatalog};
use infravision_server::{app, AppState, GeminiClient, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ServerConfig::parse();

    let font_dir = if config.font_dir.is_dir() {
        Some(config.font_dir.clone())
    } else {
        find_assets_font_dir()
    };
    let catalog = match font_dir {
        Some(dir) => {
            log::info!("loading fonts from {}", dir.display());
            FontCatalog::from_dir(&dir)
        }
        None => {
            log::warn!(
                "font directory {} not found, only the built-in Helvetica is available",
                config.font_dir.display()
            );
            FontCatalog::builtin()
        }
    };
    let languages: Vec<String> = catalog
        .registered_languages()
        .iter()
        .map(|lang| lang.tag().to_string())
        .collect();
    log::info!("script fonts registered for: [{}]", languages.join(", "));
    let renderer = ComplaintRenderer::new(catalog.install());

    let gemini = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
        config.gemini_timeout(),
    )
    .context("failed to build Gemini client")?;
    if !gemini.has_api_key() {
        log::warn!("GEMINI_API_KEY is not set; complaint generation and chat help will fail");
    }

    let state = AppState::new(renderer, Arc::new(gemini));
    let app = app(state, &config);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    log::info!("InfraVision server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
