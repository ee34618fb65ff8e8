use axum_chat_widget::config::{AppConfig, Command};
use axum_chat_widget::session::DEFAULT_SESSION_TIMEOUT;
use serial_test::serial;
use std::env;
use std::fs;

const BIN: &str = "axum-chat-widget";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("CHAT_SERVER__PORT");
        env::remove_var("CHAT_CONVERSATION__HISTORY_LIMIT");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("HOST");
        env::remove_var("TIMEOUT_DISABLED");
        env::remove_var("LLM_BASE_URL");
        env::remove_var("LLM_MODEL");
        env::remove_var("LLM_API_KEY");
        env::remove_var("AZURE_DEPLOYMENT_NAME");
        env::remove_var("AZURE_API_VERSION");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.conversation.history_limit, 20);
    assert_eq!(config.llm.max_tokens, 500);
    assert_eq!(config.conversation.session_timeout(), DEFAULT_SESSION_TIMEOUT);
    assert!(config.llm.base_url.is_none());
    assert!(config.llm.settings().is_none());
    assert!(config.resilience.request_timeout().is_some());
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "9090");
        env::set_var("CHAT_CONVERSATION__HISTORY_LIMIT", "4");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.conversation.history_limit, 4);

    clear_env_vars();
}

#[test]
#[serial]
fn test_llm_env_selects_chat_completions() {
    clear_env_vars();
    unsafe {
        env::set_var("LLM_BASE_URL", "https://api.groq.com/openai");
        env::set_var("LLM_MODEL", "llama-3.1-8b-instant");
        env::set_var("LLM_API_KEY", "secret");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    let settings = config.llm.settings().expect("base url configured");
    assert_eq!(settings.model, "llama-3.1-8b-instant");
    assert_eq!(settings.api_key.as_deref(), Some("secret"));
    assert_eq!(
        settings.provider,
        axum_chat_widget::llm::Provider::Groq
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_win() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([
        BIN,
        "--port",
        "8081",
        "--timeout-disabled",
        "true",
        "serve",
    ])
    .expect("Failed to load config");
    assert_eq!(config.server.port, 8081);
    assert!(config.resilience.request_timeout().is_none());

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("chat.yaml");
    fs::write(
        &file_path,
        r#"
server:
  port: 7070
conversation:
  system_prompt: "You are a friendly bot."
"#,
    )
    .expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var
    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(
        config.conversation.system_prompt.as_deref(),
        Some("You are a friendly bot.")
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "/nonexistent/chat.yaml"]);
    assert!(result.is_err());
}

#[test]
fn test_chat_subcommand_parses() {
    use axum_chat_widget::config::Cli;
    use clap::Parser;

    let cli = Cli::try_parse_from([BIN, "chat", "--url", "http://10.0.0.2:3000"]).unwrap();
    assert_eq!(
        cli.command,
        Some(Command::Chat {
            url: "http://10.0.0.2:3000".to_string()
        })
    );

    let cli = Cli::try_parse_from([BIN]).unwrap();
    assert!(cli.command.is_none());
}
