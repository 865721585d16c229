use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::entities::{ChannelId, Message};
use crate::domain::ports::ChatPort;

/// Results reported back to the app loop.
#[derive(Debug)]
pub enum BackendAction {
    MessageSendFailed {
        channel_id: ChannelId,
        error: String,
    },
    HistoryLoaded {
        channel_id: ChannelId,
        messages: Vec<Message>,
    },
    HistoryFailed {
        channel_id: ChannelId,
        error: String,
    },
}

/// Work the app hands off so slow HTTP round trips never block input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    SendMessage {
        channel_id: ChannelId,
        content: String,
    },
    FetchHistory {
        channel_id: ChannelId,
        limit: u8,
    },
}

pub struct Backend {
    chat: Arc<dyn ChatPort>,
    command_rx: mpsc::UnboundedReceiver<BackendCommand>,
    action_tx: mpsc::UnboundedSender<BackendAction>,
}

impl Backend {
    pub fn new(
        chat: Arc<dyn ChatPort>,
        command_rx: mpsc::UnboundedReceiver<BackendCommand>,
        action_tx: mpsc::UnboundedSender<BackendAction>,
    ) -> Self {
        Self {
            chat,
            command_rx,
            action_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Backend worker started");
        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command).await;
        }
        info!("Backend worker stopped");
    }

    async fn handle_command(&self, command: BackendCommand) {
        match command {
            BackendCommand::SendMessage {
                channel_id,
                content,
            } => match self.chat.send_message(channel_id, &content).await {
                Ok(()) => {
                    debug!(channel_id = %channel_id, "Message sent");
                }
                Err(e) => {
                    warn!(channel_id = %channel_id, error = %e, "Failed to send message");
                    let _ = self.action_tx.send(BackendAction::MessageSendFailed {
                        channel_id,
                        error: e.to_string(),
                    });
                }
            },
            BackendCommand::FetchHistory { channel_id, limit } => {
                match self.chat.fetch_messages(channel_id, limit).await {
                    Ok(messages) => {
                        debug!(channel_id = %channel_id, count = messages.len(), "Loaded history");
                        let _ = self.action_tx.send(BackendAction::HistoryLoaded {
                            channel_id,
                            messages,
                        });
                    }
                    Err(e) => {
                        warn!(channel_id = %channel_id, error = %e, "Failed to load history");
                        let _ = self.action_tx.send(BackendAction::HistoryFailed {
                            channel_id,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}
