mod config;
mod handlers;
mod models;
mod services;
mod web; // Upload form + JSON endpoint

#[cfg(feature = "web-server")]
use web::server::create_router;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use handlers::FoodAnalyzer;
use services::{GeminiService, VisionService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables first so RUST_LOG from .env applies
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting Food Analyzer...");

    let config = Config::from_env()?;

    if config.api_key.is_present() {
        log::info!("✅ GEMINI_API_KEY loaded");
    } else {
        log::warn!("⚠️ GEMINI_API_KEY not set, every analysis will return a configuration error");
    }

    match config.request_timeout {
        Some(timeout) => log::info!("⏱️ Gemini request timeout: {}s", timeout.as_secs()),
        None => log::info!("⏱️ No Gemini request timeout configured"),
    }

    let gemini: Arc<dyn VisionService> = Arc::new(GeminiService::from_config(&config)?);
    log::info!("✅ Gemini service initialized with model: {}", config.model);

    let analyzer = Arc::new(FoodAnalyzer::new(config.api_key.clone(), gemini));

    #[cfg(feature = "web-server")]
    {
        let app = create_router(analyzer.clone(), config.max_upload_bytes);

        let listener = tokio::net::TcpListener::bind(&config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

        log::info!("🌐 Food Analyzer listening on http://{}", config.bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Web server failed")?;
    }

    #[cfg(not(feature = "web-server"))]
    {
        log::info!("🧪 Built without web-server, analyzer ready for model {}", analyzer.model());
        shutdown_signal().await;
    }

    log::info!("🛑 Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for shutdown signal: {}", e);
    }
}
