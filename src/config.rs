//! Layered configuration.
//!
//! Priority, lowest to highest: built-in defaults, YAML config file,
//! `CHAT_`-prefixed environment (`CHAT_SERVER__PORT=8000`), the plain
//! `LLM_*` / `AZURE_*` variables, then CLI flags (which also read their own
//! env vars through clap).

use std::env;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::llm::{LlmSettings, Provider};
use crate::session::DEFAULT_SESSION_TIMEOUT;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "HOST", global = true)]
    pub host: Option<String>,

    /// Disable the server-side request timeout
    #[arg(long, env = "TIMEOUT_DISABLED", global = true)]
    pub timeout_disabled: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the chat backend and serve the widget page (default)
    Serve,
    /// Chat with a running backend from the terminal
    Chat {
        /// Base URL of the backend
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub conversation: ConversationConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory holding the widget page and its assets.
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Unset or empty selects the offline echo generator.
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub azure_deployment: Option<String>,
    pub azure_api_version: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversationConfig {
    /// Turns kept per session; `0` keeps everything.
    pub history_limit: usize,
    pub system_prompt: Option<String>,
    pub session_timeout_secs: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::load_from_cli(&cli)
    }

    pub fn load_from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.static_dir", "static")?
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.temperature", 0.7)?
            .set_default("llm.top_p", 0.95)?
            .set_default("llm.max_tokens", 500)?
            .set_default("conversation.history_limit", 20)?
            .set_default(
                "conversation.session_timeout_secs",
                DEFAULT_SESSION_TIMEOUT.as_secs(),
            )?
            .set_default("conversation.cleanup_interval_secs", 60)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_secs", 30)?;

        // 2. Config file: explicit path must exist, ./config.yaml is optional
        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path).required(true)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
            }
            None => {}
        }

        // 3. Prefixed environment, e.g. CHAT_LLM__BASE_URL
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Conventional LLM variables
        for (var, key) in [
            ("LLM_BASE_URL", "llm.base_url"),
            ("LLM_MODEL", "llm.model"),
            ("LLM_API_KEY", "llm.api_key"),
            ("AZURE_DEPLOYMENT_NAME", "llm.azure_deployment"),
            ("AZURE_API_VERSION", "llm.azure_api_version"),
        ] {
            if let Ok(val) = env::var(var) {
                if !val.trim().is_empty() {
                    builder = builder.set_override(key, val)?;
                }
            }
        }

        // 5. CLI flags (and the env vars clap maps onto them)
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Address the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl LlmConfig {
    /// Connection settings, or `None` when no base URL is configured.
    #[must_use]
    pub fn settings(&self) -> Option<LlmSettings> {
        let base_url = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())?
            .to_string();

        let provider = Provider::detect_from_url(&base_url)
            .with_azure_deployment(self.azure_deployment.clone(), self.azure_api_version.clone());

        Some(LlmSettings {
            base_url,
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: self.model.clone(),
            provider,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        })
    }
}

impl ConversationConfig {
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl ResilienceConfig {
    /// Server-side request timeout; `None` when disabled.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (!self.timeout_disabled).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
