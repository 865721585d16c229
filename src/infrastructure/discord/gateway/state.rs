use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    AwaitingHello,
    Identifying,
    Ready,
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::AwaitingHello => write!(f, "awaiting hello"),
            Self::Identifying => write!(f, "identifying"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Connection lifecycle plus the outstanding heartbeat.
#[derive(Debug, Default)]
pub struct GatewayState {
    connection: ConnectionState,
    last_heartbeat_sent: Option<Instant>,
}

impl GatewayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn transition_to(&mut self, next: ConnectionState) {
        tracing::debug!(from = %self.connection, to = %next, "Gateway state transition");
        self.connection = next;
        if matches!(next, ConnectionState::Closed | ConnectionState::Disconnected) {
            self.last_heartbeat_sent = None;
        }
    }

    pub fn record_heartbeat_sent(&mut self) {
        self.last_heartbeat_sent = Some(Instant::now());
    }

    /// Records an acknowledgement and returns the round trip, if a heartbeat
    /// was outstanding.
    pub fn record_heartbeat_ack(&mut self) -> Option<u64> {
        let sent = self.last_heartbeat_sent.take()?;
        Some(u64::try_from(sent.elapsed().as_millis()).unwrap_or(u64::MAX))
    }
}
