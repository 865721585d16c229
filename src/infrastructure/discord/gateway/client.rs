use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::connection::{GatewayConnection, WebSocketConnection};
use super::constants::{COMMAND_CHANNEL_CAPACITY, GATEWAY_URL};
use super::error::GatewayResult;
use super::events::{GatewayCommand, GatewayEventKind, SessionEnd};
use super::heartbeat::random_jitter;
use super::session::GatewaySession;

#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    pub url: String,
    pub compress: bool,
    /// Fixed first-heartbeat jitter. Drawn at random when unset.
    pub jitter: Option<f64>,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            url: GATEWAY_URL.to_string(),
            compress: false,
            jitter: None,
        }
    }
}

impl GatewayClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    #[must_use]
    pub const fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[must_use]
    pub const fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }
}

/// Both ends the app holds on a running session.
pub struct GatewayHandle {
    pub events: mpsc::UnboundedReceiver<GatewayEventKind>,
    pub commands: mpsc::Sender<GatewayCommand>,
    pub task: JoinHandle<GatewayResult<SessionEnd>>,
}

pub struct GatewayClient {
    config: GatewayClientConfig,
}

impl GatewayClient {
    #[must_use]
    pub const fn new(config: GatewayClientConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayClientConfig {
        &self.config
    }

    /// Opens a websocket session on a new task.
    #[must_use]
    pub fn start(&self, token: &str) -> GatewayHandle {
        let connection = Box::new(WebSocketConnection::new(self.config.compress));
        self.start_with(connection, token)
    }

    /// Runs a session over the given transport on a new task.
    #[must_use]
    pub fn start_with(&self, connection: Box<dyn GatewayConnection>, token: &str) -> GatewayHandle {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let jitter = self.config.jitter.unwrap_or_else(random_jitter);

        let session = GatewaySession::new(
            connection,
            token.to_string(),
            self.config.url.clone(),
            jitter,
            event_tx,
            command_rx,
        );

        info!(url = %self.config.url, "Starting gateway session");
        let task = tokio::spawn(session.run());

        GatewayHandle {
            events,
            commands,
            task,
        }
    }
}
