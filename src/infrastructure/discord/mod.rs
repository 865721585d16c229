//! Discord API client.

mod client;
mod dto;
pub mod gateway;

pub use client::{DISCORD_API_BASE, DiscordRestClient};
pub use gateway::{
    GatewayClient, GatewayClientConfig, GatewayCommand, GatewayError, GatewayEventKind,
    GatewayHandle, SessionEnd,
};
