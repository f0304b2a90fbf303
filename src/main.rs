// src/main.rs
use crate::config::AppConfig;
use crate::connectors::rest::ScreenerClient;
use crate::connectors::traits::ScreenerApi;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod connectors;
mod error;
mod screener;
mod tui;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Load Configuration
    let config = AppConfig::new()?;

    // 2. Logging goes to a daily file; the terminal belongs to the UI
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "screener.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "bist_screener=info".into()))
        .init();

    info!(
        "Starting console: api={} strategy={} watchlist={}",
        config.api_url, config.strategy, config.watchlist
    );

    // 3. Initialize Components
    let client = ScreenerClient::new(&config.api_url, config.timeout(), config.user_id)?;
    let api: Arc<dyn ScreenerApi> = Arc::new(client);

    // 4. Create Channels
    let (ui_tx, ui_rx) = mpsc::channel(100);

    // 5. Run the console
    tui::run(config, api, ui_tx, ui_rx).await
}
