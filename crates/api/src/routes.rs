use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};
use ingest::PitchDeck;
use model::{API_KEY_SETTING, CredentialResolver, CredentialSource};
use orchestrator::{AttemptOutcome, Orchestrator, SessionSnapshot};
use synthesis::{ChatTurn, MEMO_MIME_TYPE, export_memo, memo_file_name};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub credentials: CredentialResolver,
    pub metrics: Arc<Metrics>,
    pub config: Arc<AppConfig>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
    credential: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeAccepted {
    pub epoch: u64,
    pub doc_id: String,
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoResponse {
    pub memo: String,
    pub file_name: String,
}

#[derive(Serialize)]
struct ExportResponse {
    path: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyRequest {
    api_key: String,
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/analyze", post(analyze_deck))
        .route("/api/analysis/latest", get(latest_analysis))
        .route("/api/memo", post(generate_memo))
        .route("/api/memo/download", get(download_memo))
        .route("/api/memo/export", post(export_latest_memo))
        .route("/api/chat", post(send_chat))
        .route("/api/settings/api-key", put(set_api_key).delete(clear_api_key))
        .route("/api/metrics", get(get_metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let credential = match state.credentials.resolve_with_source() {
        Ok((_, CredentialSource::Settings)) => "settings",
        Ok((_, CredentialSource::Environment)) => "environment",
        Err(_) => "missing",
    };
    Json(HealthResponse {
        status: "ok",
        model: state.config.gemini.model.clone(),
        credential,
    })
}

async fn analyze_deck(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AnalyzeAccepted>), ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("deck.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    let orchestrator = state.orchestrator.clone();
    let epoch = orchestrator.begin_upload(Some(file_name.clone())).await;
    state.metrics.record_attempt();

    let deck = match PitchDeck::from_bytes(file_name, bytes) {
        Ok(deck) => deck,
        Err(e) => {
            let outcome = orchestrator.reject_upload(epoch, &e).await;
            state
                .metrics
                .record_outcome(&outcome, std::time::Duration::ZERO, 0);
            return Err(ApiError::InvalidDeck(e));
        }
    };

    let accepted = AnalyzeAccepted {
        epoch,
        doc_id: deck.doc_id.clone(),
        file_name: deck.file_name.clone(),
    };
    tracing::info!(epoch, doc_id = %accepted.doc_id, bytes = deck.size(), "Deck accepted");

    let metrics = state.metrics.clone();
    tokio::spawn(async move {
        let timer = TimedOperation::start();
        let outcome = orchestrator.run_attempt(epoch, deck).await;

        let enrichment_failures = if outcome == AttemptOutcome::Ready {
            let snapshot = orchestrator.snapshot().await;
            if snapshot.epoch == epoch {
                usize::from(snapshot.competitor_error.is_some())
                    + usize::from(snapshot.red_flags_error.is_some())
            } else {
                0
            }
        } else {
            0
        };
        metrics.record_outcome(&outcome, timer.elapsed(), enrichment_failures);
    });

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

async fn latest_analysis(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

async fn generate_memo(State(state): State<AppState>) -> Result<Json<MemoResponse>, ApiError> {
    let result = state.orchestrator.generate_memo().await;
    state.metrics.record_memo(result.is_ok());
    let memo = result?;

    let snapshot = state.orchestrator.snapshot().await;
    Ok(Json(MemoResponse {
        file_name: export_name(&snapshot),
        memo,
    }))
}

async fn download_memo(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.orchestrator.snapshot().await;
    let memo = snapshot
        .memo
        .clone()
        .ok_or_else(|| ApiError::NotFound("No memo has been generated".to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", export_name(&snapshot));
    Ok((
        [
            (header::CONTENT_TYPE, MEMO_MIME_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        memo,
    ))
}

async fn export_latest_memo(
    State(state): State<AppState>,
) -> Result<Json<ExportResponse>, ApiError> {
    let snapshot = state.orchestrator.snapshot().await;
    let (Some(memo), Some(analysis)) = (&snapshot.memo, &snapshot.analysis) else {
        return Err(ApiError::NotFound("No memo has been generated".to_string()));
    };

    let path = export_memo(&state.config.storage.export_dir, &analysis.company_name, memo).await?;
    Ok(Json(ExportResponse {
        path: path.display().to_string(),
    }))
}

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let turn = state.orchestrator.send_chat(&req.message).await?;
    state.metrics.record_chat_turn(turn.failed());
    Ok(Json(turn))
}

async fn set_api_key(
    State(state): State<AppState>,
    Json(req): Json<ApiKeyRequest>,
) -> Result<StatusCode, ApiError> {
    let key = req.api_key.trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("apiKey must not be empty".to_string()));
    }
    state.credentials.settings().set(API_KEY_SETTING, key)?;
    tracing::info!("API key saved to settings");
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_api_key(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.credentials.settings().remove(API_KEY_SETTING)?;
    tracing::info!("API key removed from settings");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

fn export_name(snapshot: &SessionSnapshot) -> String {
    let company = snapshot
        .analysis
        .as_ref()
        .map(|a| a.company_name.as_str())
        .unwrap_or("company");
    memo_file_name(company, chrono::Utc::now().date_naive())
}
