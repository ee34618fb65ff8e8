//! Axum chat widget server
//!
//! Entry point: `serve` runs the `/chat` backend and the widget page,
//! `chat` drives the widget from the terminal against a running backend.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use axum_chat_widget::config::{AppConfig, Cli, Command};
use axum_chat_widget::widget::transport::HttpTransport;
use axum_chat_widget::{console, server};
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();

    // Logs go to stderr so the terminal transcript on stdout stays clean.
    let default_level = match cli.command {
        Some(Command::Chat { .. }) => "warn",
        _ => "info",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = match AppConfig::load_from_cli(&cli) {
                Ok(c) => Arc::new(c),
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    std::process::exit(1);
                }
            };
            server::start_server(config).await
        }
        Command::Chat { url } => {
            let transport = HttpTransport::new(&url)?;
            info!(
                name: "console.started",
                endpoint = %transport.endpoint(),
                "Terminal chat started"
            );
            let widget = console::stdout_widget(transport);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let submitted = console::run(stdin, &widget).await?;
            info!(name: "console.finished", submitted, "Terminal chat finished");
            Ok(())
        }
    }
}
