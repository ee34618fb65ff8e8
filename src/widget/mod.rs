//! Chat widget core.
//!
//! The widget binds three externally owned elements (a transcript view, a text
//! input and a send control) and exposes a single behavior: submit the current
//! input and display the reply.
//!
//! # Architecture
//!
//! - [`TranscriptView`]: append-only list of rendered [`Message`]s
//! - [`InputField`]: the text field the user types into
//! - [`ChatTransport`]: one request/reply exchange with the backend
//! - [`ChatWidget`]: glues the three together
//!
//! Every accepted submission spawns its own task. Nothing coordinates
//! overlapping submissions, so replies land in the order their requests
//! resolve, not the order they were sent.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_chat_widget::widget::{
//!     ChatWidget, LineInput, MemoryTranscript, WidgetEvent,
//!     transport::HttpTransport,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let widget = ChatWidget::new(
//!     Arc::new(MemoryTranscript::new()),
//!     Arc::new(LineInput::new()),
//!     Arc::new(HttpTransport::new("http://127.0.0.1:3000")?),
//! );
//!
//! widget.input().set_value("Hello!");
//! if let Some(pending) = widget.handle_event(&WidgetEvent::Click) {
//!     pending.await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod transcript;
pub mod transport;

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

pub use transcript::{ConsoleTranscript, MemoryTranscript};
pub use transport::{ChatTransport, RequestFailure};

/// Prefix prepended to the description of a failed request.
pub const ERROR_PREFIX: &str = "Error: ";

/// Key that commits the input field.
pub const COMMIT_KEY: &str = "Enter";

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Typed by the user.
    User,
    /// Produced by the backend (replies and request failures).
    Bot,
}

impl Origin {
    /// Style class used when rendering a block of this origin.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single transcript entry. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Plain text content.
    pub text: String,
    /// Author classification.
    pub origin: Origin,
}

impl Message {
    /// A message typed by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::User,
        }
    }

    /// A message produced by the backend.
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Bot,
        }
    }

    /// The bot entry shown when a request fails.
    #[must_use]
    pub fn failure(err: &RequestFailure) -> Self {
        Self::bot(format!("{ERROR_PREFIX}{err}"))
    }
}

/// Append-only view that displays the transcript.
///
/// Implementations render each message as an opaque block of plain text,
/// classified by [`Origin`].
pub trait TranscriptView: Send + Sync {
    /// Append one rendered block at the end of the view.
    fn append(&self, message: Message);

    /// Move the view so the newest block is visible.
    fn scroll_to_latest(&self);
}

/// The text field the user types into.
pub trait InputField: Send + Sync {
    /// Current raw value.
    fn value(&self) -> String;

    /// Empty the field.
    fn clear(&self);
}

/// Plain in-memory input field.
#[derive(Debug, Default)]
pub struct LineInput {
    value: Mutex<String>,
}

impl LineInput {
    /// Create an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current value, as typing would.
    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = value.into();
    }
}

impl InputField for LineInput {
    fn value(&self) -> String {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        self.value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

/// UI activations the widget listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The send control was clicked.
    Click,
    /// A key was pressed while the input had focus.
    KeyDown {
        /// Key name, e.g. `"Enter"`.
        key: String,
    },
}

impl WidgetEvent {
    /// Key press helper.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::KeyDown { key: key.into() }
    }

    /// Whether this activation should submit the input.
    #[must_use]
    pub fn is_submit(&self) -> bool {
        match self {
            Self::Click => true,
            Self::KeyDown { key } => key == COMMIT_KEY,
        }
    }
}

/// Mediates between user input, the backend and the transcript.
pub struct ChatWidget<V, I, T> {
    transcript: Arc<V>,
    input: Arc<I>,
    transport: Arc<T>,
}

impl<V, I, T> fmt::Debug for ChatWidget<V, I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatWidget").finish_non_exhaustive()
    }
}

impl<V, I, T> Clone for ChatWidget<V, I, T> {
    fn clone(&self) -> Self {
        Self {
            transcript: Arc::clone(&self.transcript),
            input: Arc::clone(&self.input),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<V, I, T> ChatWidget<V, I, T>
where
    V: TranscriptView + 'static,
    I: InputField,
    T: ChatTransport + 'static,
{
    /// Bind the widget to its elements and backend.
    pub fn new(transcript: Arc<V>, input: Arc<I>, transport: Arc<T>) -> Self {
        Self {
            transcript,
            input,
            transport,
        }
    }

    /// The bound transcript view.
    pub fn transcript(&self) -> &Arc<V> {
        &self.transcript
    }

    /// The bound input field.
    pub fn input(&self) -> &Arc<I> {
        &self.input
    }

    /// Route a UI activation. Click and the commit key submit; anything else
    /// is ignored.
    pub fn handle_event(&self, event: &WidgetEvent) -> Option<JoinHandle<()>> {
        if event.is_submit() {
            self.submit()
        } else {
            None
        }
    }

    /// Submit the current input.
    ///
    /// Whitespace-only input is a no-op and returns `None`. Otherwise the user
    /// message is appended and the input cleared before this returns, and the
    /// request runs on a spawned task whose handle is returned. The task
    /// appends exactly one bot message: the reply, or the failure text.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self) -> Option<JoinHandle<()>> {
        let raw = self.input.value();
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_owned();

        append(&*self.transcript, Message::user(text.clone()));
        self.input.clear();

        let transcript = Arc::clone(&self.transcript);
        let transport = Arc::clone(&self.transport);
        Some(tokio::spawn(async move {
            let message = match transport.send(&text).await {
                Ok(reply) => Message::bot(reply),
                Err(err) => {
                    debug!(name: "widget.request.failed", error = %err, "Chat request failed");
                    Message::failure(&err)
                }
            };
            append(&*transcript, message);
        }))
    }
}

fn append<V: TranscriptView + ?Sized>(view: &V, message: Message) {
    view.append(message);
    view.scroll_to_latest();
}
