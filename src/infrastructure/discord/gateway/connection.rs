use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use super::codec::{EventParser, GatewayCodec};
use super::constants::{CONNECTION_TIMEOUT, gateway_url};
use super::error::{GatewayError, GatewayResult};
use super::payloads::GatewayPayload;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

/// A duplex frame transport.
///
/// `receive` must be cancel safe: the session polls it inside `select!`.
#[async_trait]
pub trait GatewayConnection: Send + Sync {
    /// # Errors
    ///
    /// Returns `GatewayError::ConnectionFailed` when the connection cannot be opened.
    async fn connect(&mut self, url: &str) -> GatewayResult<()>;

    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    async fn disconnect(&mut self) -> GatewayResult<()>;

    /// # Errors
    ///
    /// Returns an error if the frame cannot be serialized or written.
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;

    /// Waits for the next decoded frame. A close frame from the server is
    /// reported as `GatewayError::ConnectionClosed`.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection closes or a frame cannot be decoded.
    async fn receive(&mut self) -> GatewayResult<GatewayPayload>;

    fn is_connected(&self) -> bool;
}

pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    codec: GatewayCodec,
    compress: bool,
    connected: bool,
}

impl WebSocketConnection {
    #[must_use]
    pub fn new(compress: bool) -> Self {
        Self {
            writer: None,
            reader: None,
            codec: GatewayCodec::new(),
            compress,
            connected: false,
        }
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, url: &str) -> GatewayResult<()> {
        let url = gateway_url(url, self.compress);
        debug!(url = %url, "Opening gateway connection");

        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(url.as_str()))
            .await
            .map_err(|_| GatewayError::connection_failed("timed out"))?
            .map_err(|e| GatewayError::connection_failed(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.connected = true;
        self.codec.reset();

        Ok(())
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.connected = false;
        self.codec.reset();
        debug!("WebSocket connection closed");
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or(GatewayError::NotConnected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::serialization(e.to_string()))?;
        trace!(op = payload.op, "Sending frame");

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::websocket(e.to_string()))
    }

    async fn receive(&mut self) -> GatewayResult<GatewayPayload> {
        let reader = self.reader.as_mut().ok_or(GatewayError::NotConnected)?;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Some(json) = self.codec.decode_binary(&data)? {
                        return EventParser::parse_payload(&json);
                    }
                }
                Some(Ok(WsMessage::Text(text))) => {
                    return EventParser::parse_payload(&text);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.connected = false;
                    let (code, reason) = frame.map_or_else(
                        || (1000, "normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );
                    return Err(GatewayError::ConnectionClosed { code, reason });
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(GatewayError::websocket(e.to_string()));
                }
                None => {
                    self.connected = false;
                    return Err(GatewayError::websocket("stream ended"));
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
