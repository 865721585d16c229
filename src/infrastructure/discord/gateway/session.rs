use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::codec::EventParser;
use super::connection::GatewayConnection;
use super::constants::GatewayOpcode;
use super::error::{GatewayError, GatewayResult};
use super::events::{GatewayCommand, GatewayEventKind, SessionEnd};
use super::heartbeat::Heartbeat;
use super::payloads::GatewayPayload;
use super::state::{ConnectionState, GatewayState};

/// Credential and resume bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    token: String,
    sequence: Option<u64>,
}

impl SessionInfo {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            sequence: None,
        }
    }

    /// Records the sequence number of a frame. Frames without one leave the
    /// last seen value in place.
    pub const fn update_sequence(&mut self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence = Some(seq);
        }
    }

    #[must_use]
    pub const fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Owns the connection and runs the identify handshake, the heartbeat
/// schedule and frame dispatch on a single task.
pub struct GatewaySession {
    connection: Box<dyn GatewayConnection>,
    state: GatewayState,
    info: SessionInfo,
    url: String,
    jitter: f64,
    event_tx: mpsc::UnboundedSender<GatewayEventKind>,
    command_rx: mpsc::Receiver<GatewayCommand>,
}

impl GatewaySession {
    #[must_use]
    pub fn new(
        connection: Box<dyn GatewayConnection>,
        token: String,
        url: String,
        jitter: f64,
        event_tx: mpsc::UnboundedSender<GatewayEventKind>,
        command_rx: mpsc::Receiver<GatewayCommand>,
    ) -> Self {
        Self {
            connection,
            state: GatewayState::new(),
            info: SessionInfo::new(token),
            url,
            jitter,
            event_tx,
            command_rx,
        }
    }

    /// Runs until the app closes the session, the server closes the
    /// connection, or an error ends it.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ConnectionFailed` when the connection cannot be
    /// opened, a transport error when it drops, and any protocol error that is
    /// not confined to a single dispatch.
    pub async fn run(mut self) -> GatewayResult<SessionEnd> {
        let result = self.run_until_closed().await;

        self.state.transition_to(ConnectionState::Closed);
        if self.connection.is_connected() {
            let _ = self.connection.disconnect().await;
        }

        match result {
            Err(GatewayError::ConnectionClosed { code, reason }) => {
                info!(code, reason = %reason, "Gateway closed the connection");
                Ok(SessionEnd::Remote { code, reason })
            }
            other => other,
        }
    }

    async fn run_until_closed(&mut self) -> GatewayResult<SessionEnd> {
        self.connect().await?;
        let interval_ms = self.await_hello().await?;
        self.identify().await?;

        let mut heartbeat = Heartbeat::start(interval_ms, self.jitter);
        debug!(
            first_delay_ms = heartbeat.first_delay().as_millis(),
            interval_ms, "Heartbeat scheduled"
        );

        loop {
            tokio::select! {
                biased;

                command = self.command_rx.recv() => match command {
                    Some(GatewayCommand::Send(payload)) => self.connection.send(&payload).await?,
                    Some(GatewayCommand::Close) | None => {
                        info!("Closing gateway session");
                        return Ok(SessionEnd::Local);
                    }
                },

                () = heartbeat.tick() => self.send_heartbeat().await?,

                frame = self.connection.receive() => self.handle_frame(frame?).await?,
            }
        }
    }

    async fn connect(&mut self) -> GatewayResult<()> {
        self.state.transition_to(ConnectionState::Connecting);
        self.connection.connect(&self.url).await?;
        self.state.transition_to(ConnectionState::AwaitingHello);
        Ok(())
    }

    async fn await_hello(&mut self) -> GatewayResult<u64> {
        let frame = self.connection.receive().await?;
        self.info.update_sequence(frame.s);

        let opcode = frame.opcode();
        if opcode != Some(GatewayOpcode::Hello) {
            return Err(GatewayError::UnexpectedOpcode { opcode });
        }

        let hello = EventParser::parse_hello(frame.d)?;
        debug!(interval_ms = hello.heartbeat_interval, "Received Hello");

        self.emit(GatewayEventKind::HelloReceived {
            heartbeat_interval_ms: hello.heartbeat_interval,
        });
        Ok(hello.heartbeat_interval)
    }

    async fn identify(&mut self) -> GatewayResult<()> {
        self.state.transition_to(ConnectionState::Identifying);

        let payload = GatewayPayload::identify(self.info.token());
        self.connection.send(&payload).await?;

        self.state.transition_to(ConnectionState::Ready);
        self.emit(GatewayEventKind::Identified);
        Ok(())
    }

    async fn send_heartbeat(&mut self) -> GatewayResult<()> {
        let sequence = self.info.sequence();
        self.connection
            .send(&GatewayPayload::heartbeat(sequence))
            .await?;
        self.state.record_heartbeat_sent();
        debug!(sequence = ?sequence, "Sent heartbeat");
        Ok(())
    }

    async fn handle_frame(&mut self, frame: GatewayPayload) -> GatewayResult<()> {
        self.info.update_sequence(frame.s);

        match frame.opcode() {
            Some(GatewayOpcode::Dispatch) => {
                if let Some(event_type) = frame.t.as_deref() {
                    trace!(event = event_type, seq = ?frame.s, "Raw dispatch received");
                    self.dispatch(event_type, frame.d);
                }
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                self.send_heartbeat().await?;
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                if let Some(latency_ms) = self.state.record_heartbeat_ack() {
                    debug!(latency_ms, "Heartbeat acknowledged");
                }
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                self.emit(GatewayEventKind::SessionInvalidated {
                    reason: "gateway requested a reconnect".to_string(),
                });
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = frame.d.as_bool().unwrap_or(false);
                warn!(resumable, "Session invalidated");
                self.emit(GatewayEventKind::SessionInvalidated {
                    reason: "session invalidated by gateway".to_string(),
                });
            }
            opcode => {
                debug!(op = frame.op, opcode = ?opcode, "Ignoring frame");
            }
        }

        Ok(())
    }

    fn dispatch(&self, event_type: &str, data: Value) {
        match EventParser::parse_dispatch(event_type, data) {
            Ok(event) => {
                debug!(event = event_type, "Dispatching event");
                self.emit(GatewayEventKind::Dispatch(event));
            }
            Err(e) => {
                warn!(event = event_type, error = %e, "Discarding malformed dispatch");
            }
        }
    }

    fn emit(&self, event: GatewayEventKind) {
        if self.event_tx.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::Instant;

    use super::*;
    use crate::domain::events::DispatchEvent;

    /// In-memory transport driven by channels.
    struct ChannelConnection {
        incoming: mpsc::UnboundedReceiver<GatewayPayload>,
        outgoing: mpsc::UnboundedSender<GatewayPayload>,
        refuse: bool,
        connected: bool,
    }

    #[async_trait]
    impl GatewayConnection for ChannelConnection {
        async fn connect(&mut self, _url: &str) -> GatewayResult<()> {
            if self.refuse {
                return Err(GatewayError::connection_failed("refused"));
            }
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> GatewayResult<()> {
            self.connected = false;
            Ok(())
        }

        async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
            self.outgoing
                .send(payload.clone())
                .map_err(|_| GatewayError::websocket("peer gone"))
        }

        async fn receive(&mut self) -> GatewayResult<GatewayPayload> {
            self.incoming
                .recv()
                .await
                .ok_or_else(|| GatewayError::ConnectionClosed {
                    code: 1000,
                    reason: "closed".to_string(),
                })
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    struct Harness {
        server: mpsc::UnboundedSender<GatewayPayload>,
        sent: mpsc::UnboundedReceiver<GatewayPayload>,
        events: mpsc::UnboundedReceiver<GatewayEventKind>,
        commands: mpsc::Sender<GatewayCommand>,
    }

    fn harness(jitter: f64, refuse: bool) -> (Harness, GatewaySession) {
        let (server, incoming) = mpsc::unbounded_channel();
        let (outgoing, sent) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (commands, command_rx) = mpsc::channel(8);

        let connection = ChannelConnection {
            incoming,
            outgoing,
            refuse,
            connected: false,
        };
        let session = GatewaySession::new(
            Box::new(connection),
            "token".to_string(),
            "wss://example.invalid".to_string(),
            jitter,
            event_tx,
            command_rx,
        );

        (
            Harness {
                server,
                sent,
                events,
                commands,
            },
            session,
        )
    }

    fn frame(value: serde_json::Value) -> GatewayPayload {
        serde_json::from_value(value).unwrap()
    }

    fn hello(interval: u64) -> GatewayPayload {
        frame(json!({ "op": 10, "d": { "heartbeat_interval": interval } }))
    }

    fn dispatch(event_type: &str, seq: u64) -> GatewayPayload {
        frame(json!({ "op": 0, "t": event_type, "s": seq, "d": {} }))
    }

    #[test]
    fn test_sequence_never_overwritten_with_null() {
        let mut info = SessionInfo::new("token");
        assert_eq!(info.sequence(), None);

        info.update_sequence(Some(5));
        assert_eq!(info.sequence(), Some(5));
        info.update_sequence(None);
        assert_eq!(info.sequence(), Some(5));
        info.update_sequence(Some(7));
        assert_eq!(info.sequence(), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_schedule_carries_latest_sequence() {
        let (mut h, session) = harness(0.25, false);
        let task = tokio::spawn(session.run());
        let start = Instant::now();

        h.server.send(hello(40_000)).unwrap();
        let identify = h.sent.recv().await.unwrap();
        assert_eq!(identify.op, 2);
        assert_eq!(identify.d["token"], "token");

        h.server.send(dispatch("TYPING_START", 5)).unwrap();
        let first = h.sent.recv().await.unwrap();
        assert_eq!(first.op, 1);
        assert_eq!(first.d, json!(5));
        assert_eq!(start.elapsed(), Duration::from_millis(10_000));

        h.server.send(frame(json!({ "op": 11 }))).unwrap();
        let second = h.sent.recv().await.unwrap();
        assert_eq!(second.d, json!(5));
        assert_eq!(start.elapsed(), Duration::from_millis(50_000));

        h.server.send(dispatch("TYPING_START", 7)).unwrap();
        let third = h.sent.recv().await.unwrap();
        assert_eq!(third.d, json!(7));
        assert_eq!(start.elapsed(), Duration::from_millis(90_000));

        h.commands.send(GatewayCommand::Close).await.unwrap();
        assert_eq!(task.await.unwrap().unwrap(), SessionEnd::Local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_heartbeat_is_null_without_dispatches() {
        let (mut h, session) = harness(0.5, false);
        let task = tokio::spawn(session.run());

        h.server.send(hello(1_000)).unwrap();
        assert_eq!(h.sent.recv().await.unwrap().op, 2);

        let beat = h.sent.recv().await.unwrap();
        assert_eq!(beat.op, 1);
        assert!(beat.d.is_null());

        drop(h.commands);
        assert_eq!(task.await.unwrap().unwrap(), SessionEnd::Local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_request_is_answered_immediately() {
        let (mut h, session) = harness(0.99, false);
        let task = tokio::spawn(session.run());
        let start = Instant::now();

        h.server.send(hello(40_000)).unwrap();
        h.sent.recv().await.unwrap();

        h.server.send(dispatch("TYPING_START", 3)).unwrap();
        h.server.send(frame(json!({ "op": 1, "d": null }))).unwrap();
        let beat = h.sent.recv().await.unwrap();
        assert_eq!(beat.op, 1);
        assert_eq!(beat.d, json!(3));
        assert_eq!(start.elapsed(), Duration::ZERO);

        h.commands.send(GatewayCommand::Close).await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_session_is_surfaced_without_ending() {
        let (mut h, session) = harness(0.5, false);
        let task = tokio::spawn(session.run());

        h.server.send(hello(40_000)).unwrap();
        h.server.send(frame(json!({ "op": 9, "d": false }))).unwrap();
        h.server.send(frame(json!({ "op": 7 }))).unwrap();

        assert!(matches!(
            h.events.recv().await,
            Some(GatewayEventKind::HelloReceived {
                heartbeat_interval_ms: 40_000
            })
        ));
        assert!(matches!(h.events.recv().await, Some(GatewayEventKind::Identified)));
        assert!(matches!(
            h.events.recv().await,
            Some(GatewayEventKind::SessionInvalidated { .. })
        ));
        assert!(matches!(
            h.events.recv().await,
            Some(GatewayEventKind::SessionInvalidated { .. })
        ));
        assert!(!task.is_finished());

        h.commands
            .send(GatewayCommand::Send(GatewayPayload::heartbeat(Some(1))))
            .await
            .unwrap();
        h.sent.recv().await.unwrap();
        assert_eq!(h.sent.recv().await.unwrap().d, json!(1));

        h.commands.send(GatewayCommand::Close).await.unwrap();
        assert_eq!(task.await.unwrap().unwrap(), SessionEnd::Local);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_dispatch_is_discarded() {
        let (mut h, session) = harness(0.5, false);
        let task = tokio::spawn(session.run());

        h.server.send(hello(40_000)).unwrap();
        h.server
            .send(frame(json!({
                "op": 0, "t": "MESSAGE_CREATE", "s": 1,
                "d": { "channel_id": "1", "author": { "id": "2", "username": "x" } }
            })))
            .unwrap();
        h.server.send(dispatch("GUILD_UPDATE", 2)).unwrap();

        h.events.recv().await.unwrap();
        h.events.recv().await.unwrap();
        let next = h.events.recv().await.unwrap();
        assert!(matches!(
            next,
            GatewayEventKind::Dispatch(DispatchEvent::Unknown { ref event_type }) if event_type == "GUILD_UPDATE"
        ));

        drop(h.server);
        assert_eq!(
            task.await.unwrap().unwrap(),
            SessionEnd::Remote {
                code: 1000,
                reason: "closed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let (_h, session) = harness(0.5, true);
        let result = session.run().await;
        assert!(matches!(result, Err(ref e) if e.is_connect_failure()));
    }

    #[tokio::test]
    async fn test_unexpected_first_frame_is_fatal() {
        let (h, session) = harness(0.5, false);
        h.server.send(dispatch("READY", 1)).unwrap();
        let result = session.run().await;
        assert!(matches!(
            result,
            Err(GatewayError::UnexpectedOpcode {
                opcode: Some(GatewayOpcode::Dispatch)
            })
        ));
    }
}
