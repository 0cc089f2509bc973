use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use api::{AppConfig, AppState, LogFormat, Metrics, build_router};
use diligence::{RedFlagDetector, SimulatedVerifier};
use model::{CredentialResolver, FileSettingsStore, GeminiClient, GenerativeModel};
use orchestrator::Orchestrator;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api=debug,orchestrator=debug,tower_http=info,info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.server.log_format);
    tracing::info!(model = %config.gemini.model, "Configuration loaded");

    let settings = FileSettingsStore::open(config.storage.settings_path.clone())?;
    let credentials = CredentialResolver::from_env(Arc::new(settings));
    if credentials.resolve().is_err() {
        tracing::warn!("No Gemini API key configured; set one via PUT /api/settings/api-key");
    }

    let model: Arc<dyn GenerativeModel> =
        Arc::new(GeminiClient::new(config.gemini.clone(), credentials.clone()));
    let detector = RedFlagDetector::new(model.clone(), Arc::new(SimulatedVerifier::new()))
        .with_max_rounds(config.diligence.max_verification_rounds);
    let orchestrator = Orchestrator::with_detector(model, detector);

    let bind_addr = config.server.bind_addr.clone();
    let state = AppState {
        orchestrator,
        credentials,
        metrics: Metrics::new(),
        config: Arc::new(config),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
