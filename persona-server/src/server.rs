use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use persona_rag::{
    PersonaPipeline, groq::GroqChatModel, huggingface::HuggingFaceEmbeddingProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::{AppConfig, ServerConfig},
    error::{ApiError, QUESTION_REQUIRED},
};

/// Answer returned when the model produced no text.
pub const NO_ANSWER: &str = "No answer found";

/// Shared, read-only application context handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PersonaPipeline>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("pipeline", &self.pipeline).finish()
    }
}

impl AppState {
    pub fn new(pipeline: PersonaPipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }

    /// Build the hosted providers and index the configured document.
    ///
    /// Fails if the document cannot be loaded, chunked or embedded; the
    /// server must not start without an index.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let embedder = HuggingFaceEmbeddingProvider::new(config.hf_token.clone())?
            .with_model(config.embedding_model.clone(), config.embedding_dimensions);
        let chat_model =
            GroqChatModel::new(config.groq_api_key.clone())?.with_model(config.chat_model.clone());

        let pipeline = PersonaPipeline::builder()
            .config(config.rag.clone())
            .embedding_provider(Arc::new(embedder))
            .chat_model(Arc::new(chat_model))
            .build_from_pdf(&config.document_path)
            .await
            .with_context(|| {
                format!("failed to index document {}", config.document_path.display())
            })?;

        Ok(Self::new(pipeline))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for persona-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("persona-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "persona-server",
        "chunks": state.pipeline.index().len(),
    }))
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

    let question = request
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation(QUESTION_REQUIRED.to_string()))?;

    let answer = state.pipeline.answer(question).await?;

    let text = if answer.text.trim().is_empty() {
        NO_ANSWER.to_string()
    } else {
        answer.text
    };

    Ok(Json(AskResponse { answer: text }))
}
