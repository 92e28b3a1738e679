use std::{net::SocketAddr, path::Path, sync::Arc};

use {
    axum::{
        Json, Router,
        extract::State,
        routing::{get, post},
    },
    serde::Deserialize,
    tower_http::{
        cors::{Any, CorsLayer},
        services::ServeDir,
    },
    tracing::{info, warn},
};

use {
    parley_config::ParleyConfig,
    parley_providers::{GeminiProvider, OpenAiImageProvider, gemini, model},
    parley_sessions::{SessionStore, StoreLimits, spawn_sweeper},
};

use crate::{chat, error::GatewayError, state::AppState};

/// Returned by the image endpoint whenever the upstream call fails.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/512x300?text=Image+Error";

const DEFAULT_SESSION_ID: &str = "default";
const DEFAULT_TEST_QUESTION: &str = "Hello!";
const PREVIEW_CHARS: usize = 50;

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: AppState, uploads_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(ask_handler))
        .route("/clear-session", post(clear_session_handler))
        .route("/debug-sessions", get(debug_sessions_handler))
        .route("/test-model", post(test_model_handler))
        .route("/generate-image", post(generate_image_handler))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(cors)
        .with_state(state)
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the gateway HTTP server. Blocks until the listener fails.
pub async fn start_gateway(config: &ParleyConfig) -> anyhow::Result<()> {
    let gemini_cfg = &config.providers.gemini;
    let api_key = gemini_cfg
        .resolve_api_key("GEMINI_API_KEY")
        .ok_or_else(|| anyhow::anyhow!("no Gemini API key (set GEMINI_API_KEY or providers.gemini.api_key)"))?;
    let text: Arc<dyn parley_providers::TextProvider> = Arc::new(GeminiProvider::with_options(
        api_key,
        gemini_cfg
            .model
            .clone()
            .unwrap_or_else(|| gemini::DEFAULT_MODEL.into()),
        gemini_cfg
            .base_url
            .clone()
            .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.into()),
    ));

    let image: Option<Arc<dyn parley_providers::ImageProvider>> = match config
        .providers
        .openai
        .resolve_api_key("OPENAI_API_KEY")
    {
        Some(key) => {
            let base = config
                .providers
                .openai
                .base_url
                .clone()
                .unwrap_or_else(|| parley_providers::openai_image::DEFAULT_BASE_URL.into());
            Some(Arc::new(OpenAiImageProvider::with_base_url(key, base)))
        },
        None => {
            warn!("no OpenAI API key; image generation will return placeholders");
            None
        },
    };

    let sessions = Arc::new(SessionStore::new(StoreLimits {
        max_history: config.sessions.max_history,
        idle_expiry: config.sessions.idle_expiry(),
    }));
    let _sweeper = spawn_sweeper(&sessions, config.sessions.sweep_interval());

    let uploads_dir = &config.gateway.uploads_dir;
    std::fs::create_dir_all(uploads_dir)?;

    let state = AppState::new(Arc::clone(&sessions), Arc::clone(&text), image.clone());
    let app = build_app(state, uploads_dir);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(version = env!("CARGO_PKG_VERSION"), %addr, "parley gateway listening");
    info!(text = text.name(), image = image.as_ref().map(|p| p.name()), "providers configured");

    axum::serve(listener, app).await?;
    Ok(())
}

// ── Request bodies ───────────────────────────────────────────────────────────

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

#[derive(Deserialize)]
struct AskRequest {
    question: Option<String>,
    #[serde(default = "default_session_id", rename = "sessionId")]
    session_id: String,
}

#[derive(Deserialize)]
struct ClearRequest {
    #[serde(default = "default_session_id", rename = "sessionId")]
    session_id: String,
}

#[derive(Deserialize, Default)]
struct TestRequest {
    question: Option<String>,
}

#[derive(Deserialize)]
struct ImageRequest {
    prompt: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn ask_handler(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let question = req
        .question
        .as_deref()
        .filter(|q| !q.is_empty())
        .ok_or_else(|| GatewayError::Validation("question is required".into()))?;

    info!(session = %req.session_id, "question received");
    let reply = chat::ask(&state.sessions, state.text.as_ref(), &req.session_id, question).await?;
    Ok(Json(serde_json::json!({ "reply": reply })))
}

async fn clear_session_handler(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Json<serde_json::Value> {
    info!(session = %req.session_id, "clearing session");
    state.sessions.clear(&req.session_id).await;
    Json(serde_json::json!({ "success": true }))
}

async fn debug_sessions_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshots = state.sessions.list().await;
    let mut sessions = serde_json::Map::new();
    for snap in &snapshots {
        sessions.insert(
            snap.id.clone(),
            serde_json::json!({
                "historyLength": snap.history_len,
                "lastActivity": snap.last_activity.to_rfc3339(),
                "lastMessagePreview": snap
                    .last_text
                    .as_deref()
                    .map(preview)
                    .unwrap_or_else(|| "No messages".into()),
            }),
        );
    }
    Json(serde_json::json!({
        "totalSessions": snapshots.len(),
        "sessions": sessions,
    }))
}

async fn test_model_handler(
    State(state): State<AppState>,
    Json(req): Json<TestRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let question = req
        .question
        .unwrap_or_else(|| DEFAULT_TEST_QUESTION.to_string());

    let raw = state
        .text
        .generate(vec![model::content("user", &question)])
        .await
        .map_err(|e| GatewayError::Upstream(e.to_string()))?;

    let reply = model::extract_text(&raw);
    Ok(Json(serde_json::json!({ "reply": reply, "raw": raw })))
}

async fn generate_image_handler(
    State(state): State<AppState>,
    Json(req): Json<ImageRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let prompt = req
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| GatewayError::Validation("prompt is required".into()))?;

    let image_url = match &state.image {
        Some(provider) => match provider.generate(&prompt).await {
            Ok(url) => url,
            // Deliberate: upstream image failures become a placeholder
            // success, never an error response.
            Err(e) => {
                warn!(error = %e, "image generation failed, returning placeholder");
                PLACEHOLDER_IMAGE_URL.to_string()
            },
        },
        None => PLACEHOLDER_IMAGE_URL.to_string(),
    };

    Ok(Json(serde_json::json!({ "imageUrl": image_url })))
}

/// First `PREVIEW_CHARS` characters of the latest message, with a trailing
/// ellipsis marker.
fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{head}...")
}
