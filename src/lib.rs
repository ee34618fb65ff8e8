//! Axum chat widget
//!
//! A minimal chat widget and the backend it talks to: the widget reads user
//! input, appends it to an append-only transcript, posts it to `/chat`, and
//! renders the reply.
//!
//! # Architecture
//!
//! - **Widget**: `ChatWidget` over pluggable transcript, input and transport
//! - **Server**: Axum-based HTTP server with the `/chat` endpoint and the widget page
//! - **Reply generation**: OpenAI-compatible chat completions, or an echo fallback
//!
//! # Modules
//!
//! - [`widget`]: widget core, transcript views and HTTP transport
//! - [`console`]: terminal front end for the widget
//! - [`llm`]: reply generators
//! - [`session`]: conversation history store
//! - [`server`]: router and handlers
//! - [`config`]: layered configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod console;
pub mod llm;
pub mod server;
pub mod session;
pub mod widget;

use std::sync::Arc;

use crate::config::AppConfig;
use llm::ReplyGenerator;
use session::SessionStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Produces replies to user messages.
    pub generator: Arc<dyn ReplyGenerator>,
    /// Conversation histories.
    pub sessions: SessionStore,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish()
    }
}
