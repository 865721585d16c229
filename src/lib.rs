//! Headcord - a headless Discord gateway client for the terminal.
//!
//! Connects to the gateway, keeps the session alive, builds a local model of
//! guilds, channels and users from dispatches, and renders the focused
//! channel into a scrollback above a single input line.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Event application, message formatting and command interpretation.
pub mod application;
/// Entities, gateway event data, ports and errors.
pub mod domain;
/// Configuration, gateway session and REST client.
pub mod infrastructure;
/// Terminal renderer, key mapping and the app loop.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "headcord";
