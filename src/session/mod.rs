//! Conversation session management.
//!
//! In-memory storage of the backend's conversation history. Requests without
//! a session id share the [`DEFAULT_SESSION_ID`] conversation.
//!
//! # Architecture
//!
//! - [`Session`]: a single conversation and its turns
//! - [`SessionStore`]: thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use axum_chat_widget::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! session.add_user_message("Hello!");
//!
//! assert_eq!(session.turns().len(), 1);
//! ```

mod thread;

pub use thread::{DEFAULT_SESSION_ID, DEFAULT_SESSION_TIMEOUT, Session, SessionStore};
