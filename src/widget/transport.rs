//! Request/reply exchange with the chat backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Path the widget posts to, relative to the backend base URL.
pub const CHAT_PATH: &str = "/chat";

/// Any failure of a chat request.
///
/// Transport errors, error statuses and undecodable bodies all collapse into
/// this one type. `Display` yields the bare description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// The request could not be sent or its response could not be read.
    #[error("{0}")]
    Transport(String),

    /// The response body carried an `error` instead of a `reply`, or was not
    /// a JSON object with a `reply` field.
    #[error("{0}")]
    Decode(String),
}

impl From<reqwest::Error> for RequestFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RequestFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Request body sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatPayload {
    /// The trimmed user text.
    pub message: String,
}

/// Response body expected from the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyPayload {
    /// Text to display as the bot message.
    pub reply: String,
}

/// Either shape the backend answers with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseBody {
    Reply { reply: String },
    Error { error: String },
}

/// Decode a response body into the reply text.
///
/// An `{"error": ...}` body fails with the server's own description; any
/// other body without `reply` fails with the JSON decoder's message.
pub fn decode_reply(body: &[u8]) -> Result<String, RequestFailure> {
    match serde_json::from_slice::<ResponseBody>(body) {
        Ok(ResponseBody::Reply { reply }) => Ok(reply),
        Ok(ResponseBody::Error { error }) => Err(RequestFailure::Decode(error)),
        // Untagged errors carry no detail; the plain reply decode does.
        Err(_) => serde_json::from_slice::<ReplyPayload>(body)
            .map(|p| p.reply)
            .map_err(RequestFailure::from),
    }
}

/// One request/reply exchange.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `message` and return the backend's reply text.
    async fn send(&self, message: &str) -> Result<String, RequestFailure>;
}

/// JSON-over-HTTP transport.
///
/// Posts `{"message": ...}` to the chat endpoint with a JSON content type
/// and decodes `{"reply": ...}` from the body. No timeout is applied and the
/// HTTP status is not inspected; the body alone decides success.
///
/// The endpoint is always `/chat` on the base URL's origin: any path in the
/// base URL is replaced, as a browser resolves `fetch("/chat")`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Transport targeting `/chat` on the origin of `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Transport targeting `/chat` on the origin of `base_url`, with a custom
    /// reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(base_url.as_ref())?.join(CHAT_PATH)?;
        Ok(Self { endpoint, http })
    }

    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, message: &str) -> Result<String, RequestFailure> {
        let payload = ChatPayload {
            message: message.to_string(),
        };

        tracing::debug!(
            name: "widget.request.sent",
            endpoint = %self.endpoint,
            "Posting chat message"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;

        let body = response.bytes().await?;
        decode_reply(&body)
    }
}
