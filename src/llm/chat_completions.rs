//! `OpenAI` Chat Completions API generator.
//!
//! Sends the whole conversation to `/v1/chat/completions` in one
//! non-streaming request and returns the first choice's message content.

use serde_json::Value;

use super::{LlmSettings, ReplyGenerator, Turn};

/// Generator backed by an OpenAI-compatible Chat Completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsGenerator {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsGenerator")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .field("provider", &self.settings.provider)
            .finish()
    }
}

impl ChatCompletionsGenerator {
    /// Create a new generator with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Settings this generator was built with.
    #[must_use]
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    fn request_body(&self, history: &[Turn]) -> Value {
        serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "messages": history,
            "temperature": self.settings.temperature,
            "top_p": self.settings.top_p,
            "max_tokens": self.settings.max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl ReplyGenerator for ChatCompletionsGenerator {
    async fn generate(&self, history: &[Turn]) -> anyhow::Result<String> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);

        let mut rb = self.http.post(&url).json(&self.request_body(history));
        if let Some(k) = &self.settings.api_key {
            rb = if self.settings.provider.uses_api_key_header() {
                rb.header("api-key", k.as_str())
            } else {
                rb.bearer_auth(k)
            };
        }

        let resp = rb.send().await?.error_for_status()?;
        let v: Value = resp.json().await?;

        let content = v["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("completion response has no message content"))?;

        tracing::debug!(
            name: "llm.completion.received",
            model = %self.settings.model,
            finish_reason = ?v["choices"][0]["finish_reason"].as_str(),
            "Completion received"
        );

        Ok(content.trim().to_string())
    }
}
