//! Discord REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use tracing::{debug, warn};

use super::dto::{CreateMessageRequest, ErrorResponse, MessageDto};
use crate::domain::entities::{ChannelId, Message};
use crate::domain::errors::RestError;
use crate::domain::ports::ChatPort;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v9";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated REST client for posting messages and reading history.
pub struct DiscordRestClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DiscordRestClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, RestError> {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, RestError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RestError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn messages_url(&self, channel_id: ChannelId) -> String {
        format!("{}/channels/{channel_id}/messages", self.base_url)
    }

    async fn check(response: Response) -> Result<Response, RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let retry_after_ms = parsed
            .as_ref()
            .and_then(|error| error.retry_after)
            .map(|seconds| (seconds * 1000.0) as u64);
        let message = parsed.map_or(body, |error| error.message);

        warn!(status = status.as_u16(), message = %message, "REST request failed");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RestError::RateLimited {
                retry_after_ms: retry_after_ms.unwrap_or(5000),
            });
        }
        Err(RestError::from_status(status.as_u16(), &message, retry_after_ms))
    }

    fn transport_error(error: &reqwest::Error) -> RestError {
        if error.is_timeout() {
            RestError::network("request timed out")
        } else if error.is_connect() {
            RestError::network("failed to connect to Discord")
        } else {
            RestError::network(error.to_string())
        }
    }
}

#[async_trait]
impl ChatPort for DiscordRestClient {
    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<(), RestError> {
        debug!(channel_id = %channel_id, len = content.len(), "Posting message");

        let response = self
            .client
            .post(self.messages_url(channel_id))
            .header(header::AUTHORIZATION, &self.token)
            .json(&CreateMessageRequest { content })
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<Message>, RestError> {
        debug!(channel_id = %channel_id, limit, "Fetching channel history");

        let response = self
            .client
            .get(self.messages_url(channel_id))
            .header(header::AUTHORIZATION, &self.token)
            .query(&[("limit", limit.clamp(1, 100))])
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let dtos: Vec<MessageDto> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| RestError::decode(e.to_string()))?;

        let mut messages = Vec::with_capacity(dtos.len());
        for dto in dtos {
            match dto.into_event() {
                Ok(event) => messages.push(event.message),
                Err(e) => warn!(error = %e, "Skipping malformed history message"),
            }
        }
        Ok(messages)
    }
}
