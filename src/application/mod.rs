//! Application layer: event application, formatting and command handling.

/// Pure services over the domain model.
pub mod services;

pub use services::{Effect, MessageFormatter, apply_event, format_log, interpret};
