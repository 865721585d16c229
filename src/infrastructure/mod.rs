//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Discord API client.
pub mod discord;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageManager};
pub use discord::{
    DiscordRestClient, GatewayClient, GatewayClientConfig, GatewayCommand, GatewayEventKind,
    GatewayHandle, SessionEnd,
};
