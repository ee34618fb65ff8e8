use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, get_service, post},
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::llm::{ChatCompletionsGenerator, EchoGenerator, ReplyGenerator};
use crate::session::{DEFAULT_SESSION_ID, SessionStore};

/// Reply sent back for a message that is empty after trimming.
pub const EMPTY_MESSAGE_REPLY: &str = "Please say something!";

/// Effectively "no timeout" while keeping a single middleware type.
const DISABLED_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Build the shared state from configuration.
///
/// Uses the chat completions generator when an LLM base URL is configured,
/// and the echo generator otherwise.
pub fn build_state(config: Arc<AppConfig>) -> AppState {
    let generator: Arc<dyn ReplyGenerator> = match config.llm.settings() {
        Some(settings) => {
            info!(
                name: "llm.config.loaded",
                base_url = %settings.base_url,
                model = %settings.model,
                provider = ?settings.provider,
                "LLM configuration loaded"
            );
            Arc::new(ChatCompletionsGenerator::new(settings))
        }
        None => {
            warn!(
                name: "llm.config.missing",
                "No LLM base URL configured; replies will echo the user"
            );
            Arc::new(EchoGenerator)
        }
    };

    let sessions = SessionStore::with_settings(
        config.conversation.history_limit,
        config.conversation.system_prompt.clone(),
    );

    AppState {
        generator,
        sessions,
        config,
    }
}

/// Build the application router for the given state.
pub fn build_router(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.server.static_dir);
    let timeout_duration = state
        .config
        .resilience
        .request_timeout()
        .unwrap_or(DISABLED_TIMEOUT);

    Router::new()
        .route(
            "/",
            get_service(ServeFile::new(static_dir.join("index.html"))),
        )
        .nest_service("/static", ServeDir::new(&static_dir))
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config));
    spawn_session_sweeper(&state.sessions, &config);

    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Periodically drop sessions that have been idle past the configured timeout.
fn spawn_session_sweeper(sessions: &SessionStore, config: &AppConfig) -> JoinHandle<()> {
    let sessions = sessions.clone();
    let timeout = config.conversation.session_timeout();
    let mut interval = tokio::time::interval(config.conversation.cleanup_interval());

    tokio::spawn(async move {
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired_with_timeout(timeout);
            if removed > 0 {
                info!(name: "session.expired", removed, "Expired idle sessions");
            }
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message content.
    #[serde(default)]
    pub message: String,
    /// Optional session ID (the shared default conversation if absent).
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response from the chat endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    /// Text shown as the bot message.
    pub reply: String,
}

/// Error body for failed requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// POST /chat - Reply to one user message.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, (StatusCode, Json<ErrorBody>)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Ok(Json(ChatReply {
            reply: EMPTY_MESSAGE_REPLY.to_string(),
        }));
    }

    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID);
    let session = state.sessions.get_or_create(session_id);

    info!(
        name: "chat.request",
        session_id = %session.id(),
        chars = message.chars().count(),
        "Received chat message"
    );

    session.add_user_message(message);

    match state.generator.generate(&session.turns_with_system()).await {
        Ok(reply) => {
            session.add_assistant_message(reply.clone());
            Ok(Json(ChatReply { reply }))
        }
        Err(e) => {
            tracing::error!(
                name: "chat.reply.failed",
                session_id = %session.id(),
                error = %e,
                "Reply generation failed"
            );
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: format!("Reply generation failed: {e}"),
                }),
            ))
        }
    }
}

/// GET /health - Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_session_timeout(secs: u64) -> AppConfig {
        let mut config = AppConfig::load_from_args(["axum-chat-widget"]).unwrap();
        config.conversation.session_timeout_secs = secs;
        config
    }

    #[tokio::test]
    async fn test_sweeper_drops_idle_sessions() {
        let sessions = SessionStore::new();
        let _ = sessions.create();
        let _ = sessions.create();
        std::thread::sleep(Duration::from_millis(5));

        let sweeper = spawn_session_sweeper(&sessions, &config_with_session_timeout(0));
        for _ in 0..100 {
            if sessions.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweeper.abort();

        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_keeps_active_sessions() {
        let sessions = SessionStore::new();
        let session = sessions.create();

        let sweeper = spawn_session_sweeper(&sessions, &config_with_session_timeout(60));
        // The first tick fires immediately; give it a chance to run.
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert_eq!(sessions.list_ids(), vec![session.id().to_string()]);
    }
}
