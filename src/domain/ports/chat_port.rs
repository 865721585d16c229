//! Outbound chat operations served by the REST API.

use async_trait::async_trait;

use crate::domain::entities::{ChannelId, Message};
use crate::domain::errors::RestError;

/// Port for posting messages and reading channel history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    /// Posts `content` to the channel.
    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), RestError>;

    /// Fetches up to `limit` recent messages, newest first.
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<Message>, RestError>;
}
