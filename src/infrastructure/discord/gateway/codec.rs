use flate2::{Decompress, FlushDecompress, Status};
use serde_json::Value;
use tracing::warn;

use super::constants::ZLIB_SUFFIX;
use super::error::{GatewayError, GatewayResult};
use super::payloads::{GatewayPayload, HelloPayload, ReadyPayload};
use crate::domain::events::{DispatchEvent, ReadyEvent};
use crate::infrastructure::discord::dto::{MessageDto, UserDto};

const CHUNK_SIZE: usize = 32 * 1024;
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Inflates a zlib-stream transport. One inflater lives for the whole
/// connection; a frame is complete once the sync-flush suffix arrives.
pub struct GatewayCodec {
    inflater: Decompress,
    pending: Vec<u8>,
}

impl GatewayCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            pending: Vec::with_capacity(4096),
        }
    }

    /// Buffers `data` and returns the decoded text once a full frame is in.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::CompressionError` for corrupt or oversized input.
    pub fn decode_binary(&mut self, data: &[u8]) -> GatewayResult<Option<String>> {
        self.pending.extend_from_slice(data);

        if !self.pending.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let text = self.inflate();
        self.pending.clear();
        text.map(Some)
    }

    fn inflate(&mut self) -> GatewayResult<String> {
        let mut output = Vec::with_capacity(CHUNK_SIZE);
        let mut consumed = 0;

        loop {
            if output.len() == output.capacity() {
                if output.len() >= MAX_FRAME_SIZE {
                    return Err(GatewayError::compression("frame exceeds maximum size"));
                }
                output.reserve(CHUNK_SIZE);
            }

            let before = self.inflater.total_in();
            let status = self
                .inflater
                .decompress_vec(&self.pending[consumed..], &mut output, FlushDecompress::Sync)
                .map_err(|e| GatewayError::compression(e.to_string()))?;
            consumed += usize::try_from(self.inflater.total_in() - before).unwrap_or(0);

            let input_done = consumed >= self.pending.len();
            let output_full = output.len() == output.capacity();
            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError if input_done && !output_full => break,
                Status::Ok | Status::BufError => {}
            }
        }

        String::from_utf8(output).map_err(|e| GatewayError::compression(format!("invalid UTF-8: {e}")))
    }

    pub fn reset(&mut self) {
        self.inflater.reset(true);
        self.pending.clear();
    }
}

impl Default for GatewayCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns frame text and dispatch bodies into typed values.
pub struct EventParser;

impl EventParser {
    /// # Errors
    ///
    /// Returns `GatewayError::SerializationError` when the text is not a frame.
    pub fn parse_payload(json: &str) -> GatewayResult<GatewayPayload> {
        serde_json::from_str(json).map_err(|e| GatewayError::serialization(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns `GatewayError::SerializationError` when the interval is missing.
    pub fn parse_hello(data: Value) -> GatewayResult<HelloPayload> {
        serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("failed to parse Hello: {e}")))
    }

    /// Decodes a dispatch body. Unrecognized event types are returned as
    /// `DispatchEvent::Unknown` rather than failing.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::SerializationError` when a known event is missing
    /// a required field.
    pub fn parse_dispatch(event_type: &str, data: Value) -> GatewayResult<DispatchEvent> {
        match event_type {
            "READY" => Self::parse_ready(data),
            "MESSAGE_CREATE" => Self::parse_message_create(data),
            _ => Ok(DispatchEvent::Unknown {
                event_type: event_type.to_string(),
            }),
        }
    }

    fn parse_ready(data: Value) -> GatewayResult<DispatchEvent> {
        let ready: ReadyPayload = serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("failed to parse Ready: {e}")))?;

        let user = ready.user.into_user()?;
        let mut users = ready
            .users
            .into_iter()
            .map(UserDto::into_user)
            .collect::<Result<Vec<_>, _>>()?;

        let mut private_channels = Vec::with_capacity(ready.private_channels.len());
        for channel in ready.private_channels {
            let (entry, inline) = channel.into_private_channel()?;
            users.extend(inline);
            private_channels.push(entry);
        }

        // Unavailable guilds arrive as bare `{id, unavailable}` stubs.
        let guilds = ready
            .guilds
            .into_iter()
            .filter_map(|guild| {
                let id = guild.id;
                guild
                    .into_guild()
                    .inspect_err(|e| {
                        warn!(guild_id = ?id, error = %e, "Skipping guild in READY");
                    })
                    .ok()
            })
            .collect();

        Ok(DispatchEvent::Ready(ReadyEvent {
            user,
            users,
            private_channels,
            guilds,
        }))
    }

    fn parse_message_create(data: Value) -> GatewayResult<DispatchEvent> {
        let dto: MessageDto = serde_json::from_value(data).map_err(|e| {
            GatewayError::serialization(format!("failed to parse MESSAGE_CREATE: {e}"))
        })?;
        Ok(DispatchEvent::MessageCreate(dto.into_event()?))
    }
}
