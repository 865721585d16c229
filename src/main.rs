use std::io::{self, Stdout};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use crossterm::cursor::{Hide, Show};
use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use headcord::infrastructure::{
    AppConfig, CliArgs, DiscordRestClient, GatewayClient, GatewayClientConfig, StorageManager,
};
use headcord::presentation::{App, Backend, Screen};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn restore_terminal(app: &mut App<Stdout>) -> Result<()> {
    app.finish()?;
    disable_raw_mode()?;
    execute!(io::stdout(), Show)?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(version = headcord::VERSION, "Starting headcord");

    let token = args
        .token()
        .map(str::to_string)
        .ok_or_else(|| eyre!("no token given: pass it as an argument or set DISCORD_TOKEN"))?;

    let rest = Arc::new(DiscordRestClient::new(token.clone())?);
    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    tokio::spawn(Backend::new(rest, backend_rx, action_tx).run());

    let gateway = GatewayClient::new(
        GatewayClientConfig::default()
            .with_url(config.gateway.url.clone())
            .with_compression(config.gateway.compress),
    )
    .start(&token);

    let (width, height) = terminal::size()?;
    let screen = Screen::new(io::stdout(), width, height, config.ui.max_messages);
    let mut app = App::new(screen, &config.ui, backend_tx, action_rx);

    enable_raw_mode()?;
    execute!(io::stdout(), Hide)?;

    let result = app.run(gateway, EventStream::new()).await;

    restore_terminal(&mut app)?;
    info!("Exiting");

    result
}
