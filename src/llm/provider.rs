//! Provider detection and endpoint URLs.

/// Default Azure `OpenAI` API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Supported LLM providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name (required for Azure)
        deployment_name: String,
        /// API version (e.g., "2024-08-01-preview")
        api_version: String,
    },
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Together AI (together.ai, together.xyz)
    TogetherAI,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible provider (Ollama, vLLM, llama.cpp, ...)
    Generic,
}

impl Provider {
    /// Detect provider from base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axum_chat_widget::llm::Provider;
    ///
    /// let provider = Provider::detect_from_url("https://api.openai.com");
    /// assert_eq!(provider, Provider::OpenAI);
    /// ```
    #[must_use]
    pub fn detect_from_url(base_url: &str) -> Self {
        let lower = base_url.to_lowercase();

        if lower.contains("azure.com") {
            Self::AzureOpenAI {
                deployment_name: String::new(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            }
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("together.ai") || lower.contains("together.xyz") {
            Self::TogetherAI
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Fill in the Azure deployment details, if this is an Azure provider.
    #[must_use]
    pub fn with_azure_deployment(self, deployment: Option<String>, version: Option<String>) -> Self {
        match (self, deployment) {
            (Self::AzureOpenAI { api_version, .. }, Some(deployment_name)) => Self::AzureOpenAI {
                deployment_name,
                api_version: version.unwrap_or(api_version),
            },
            (other, _) => other,
        }
    }

    /// Build the chat completions URL for this provider.
    ///
    /// Azure routes by deployment rather than by model.
    #[must_use]
    pub fn build_chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => {
                format!(
                    "{base}/openai/deployments/{deployment_name}/chat/completions?api-version={api_version}"
                )
            }
            _ => format!("{base}/v1/chat/completions"),
        }
    }

    /// Whether the API key goes in an `api-key` header instead of bearer auth.
    #[must_use]
    pub fn uses_api_key_header(&self) -> bool {
        matches!(self, Self::AzureOpenAI { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_openai() {
        let provider = Provider::detect_from_url("https://api.openai.com");
        assert_eq!(provider, Provider::OpenAI);
    }

    #[test]
    fn test_detect_azure() {
        let provider = Provider::detect_from_url("https://my-resource.openai.azure.com");
        assert!(matches!(provider, Provider::AzureOpenAI { .. }));
        assert!(provider.uses_api_key_header());
    }

    #[test]
    fn test_detect_openrouter_and_groq() {
        assert_eq!(
            Provider::detect_from_url("https://openrouter.ai/api"),
            Provider::OpenRouter
        );
        assert_eq!(
            Provider::detect_from_url("https://api.groq.com/openai"),
            Provider::Groq
        );
    }

    #[test]
    fn test_detect_local_is_generic() {
        let provider = Provider::detect_from_url("http://localhost:11434");
        assert_eq!(provider, Provider::Generic);
        assert!(!provider.uses_api_key_header());
    }

    #[test]
    fn test_build_url_openai() {
        let url = Provider::OpenAI.build_chat_url("https://api.openai.com/");
        assert_eq!(url, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_build_url_azure() {
        let provider = Provider::detect_from_url("https://my-resource.openai.azure.com")
            .with_azure_deployment(Some("gpt-4".to_string()), None);
        let url = provider.build_chat_url("https://my-resource.openai.azure.com");
        assert_eq!(
            url,
            "https://my-resource.openai.azure.com/openai/deployments/gpt-4/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn test_azure_deployment_ignored_for_other_providers() {
        let provider = Provider::Groq.with_azure_deployment(Some("x".to_string()), None);
        assert_eq!(provider, Provider::Groq);
    }
}
