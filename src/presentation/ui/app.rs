use std::io::{self, Write};
use std::time::Duration;

use color_eyre::eyre::eyre;
use crossterm::event::Event;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use super::backend::{BackendAction, BackendCommand};
use super::screen::Screen;
use crate::application::services::{Effect, MessageFormatter, apply_event, interpret};
use crate::domain::entities::{ClientUser, Message};
use crate::infrastructure::config::UiConfig;
use crate::infrastructure::discord::gateway::{
    GatewayCloseCode, GatewayCommand, GatewayEventKind, GatewayHandle, GatewayResult, SessionEnd,
};
use crate::presentation::events::{KeyAction, map_key};

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

enum Outcome {
    Local,
    Ended(Result<GatewayResult<SessionEnd>, JoinError>),
}

/// Owns the screen and the client model, and drives them from terminal,
/// gateway and backend events.
pub struct App<W: Write> {
    screen: Screen<W>,
    formatter: MessageFormatter,
    client: Option<ClientUser>,
    backend_tx: mpsc::UnboundedSender<BackendCommand>,
    action_rx: mpsc::UnboundedReceiver<BackendAction>,
    scroll_step: isize,
}

impl<W: Write> App<W> {
    pub fn new(
        screen: Screen<W>,
        ui: &UiConfig,
        backend_tx: mpsc::UnboundedSender<BackendCommand>,
        action_rx: mpsc::UnboundedReceiver<BackendAction>,
    ) -> Self {
        let formatter = MessageFormatter::new(ui.timestamp_format.clone());
        let mut screen = screen;
        screen.set_continuation_indent(formatter.prefix_width());
        Self {
            screen,
            formatter,
            client: None,
            backend_tx,
            action_rx,
            scroll_step: isize::try_from(ui.scroll_step.max(1)).unwrap_or(1),
        }
    }

    /// Runs until the user leaves or the session ends.
    ///
    /// Prints exactly one "connection closed" notice on every path.
    ///
    /// # Errors
    /// Returns an error if the terminal fails or the session ends with an
    /// unexpected protocol error.
    pub async fn run<S>(&mut self, gateway: GatewayHandle, mut terminal: S) -> color_eyre::Result<()>
    where
        S: Stream<Item = io::Result<Event>> + Unpin,
    {
        let GatewayHandle {
            mut events,
            commands,
            mut task,
        } = gateway;

        self.screen.init()?;
        self.screen.log("attempting connection")?;

        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        let mut terminal_open = true;

        let outcome = loop {
            tokio::select! {
                biased;

                _ = &mut interrupt => {
                    info!("Interrupt received");
                    break Outcome::Local;
                }

                Some(event) = events.recv() => {
                    self.handle_gateway_event(event)?;
                }

                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action)?;
                }

                next = terminal.next(), if terminal_open => match next {
                    Some(Ok(event)) => {
                        if self.handle_terminal_event(event)? == Flow::Exit {
                            break Outcome::Local;
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Terminal input failed");
                        self.screen.log("connection closed")?;
                        return Err(e.into());
                    }
                    None => {
                        warn!("Terminal input closed");
                        terminal_open = false;
                    }
                },

                joined = &mut task => {
                    break Outcome::Ended(joined);
                }
            }
        };

        let joined = match outcome {
            Outcome::Local => {
                let _ = commands.try_send(GatewayCommand::Close);
                drop(commands);
                if let Ok(joined) = tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await {
                    joined
                } else {
                    warn!("Session did not close in time, aborting");
                    task.abort();
                    Ok(Ok(SessionEnd::Local))
                }
            }
            Outcome::Ended(joined) => joined,
        };

        self.finish_session(joined)
    }

    fn finish_session(
        &mut self,
        joined: Result<GatewayResult<SessionEnd>, JoinError>,
    ) -> color_eyre::Result<()> {
        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Session task failed");
                self.screen.log("connection closed")?;
                return Err(eyre!("session task failed: {e}"));
            }
        };

        match result {
            Ok(SessionEnd::Local) => info!("Session closed locally"),
            Ok(SessionEnd::Remote { code, reason }) => {
                info!(code, reason = %reason, "Session closed by gateway");
                if let Some(close) = GatewayCloseCode::from_u16(code) {
                    self.screen
                        .log(&format!("gateway closed the session: {}", close.description()))?;
                }
            }
            Err(e) if e.is_connect_failure() => {
                warn!(error = %e, "Connection failed");
                self.screen.log("connection failed")?;
            }
            Err(e) if e.is_transport_loss() => {
                warn!(error = %e, "Connection lost");
                self.screen.log("connection lost")?;
            }
            Err(e) => {
                error!(error = %e, "Session failed");
                self.screen.log("connection closed")?;
                return Err(e.into());
            }
        }

        self.screen.log("connection closed")?;
        Ok(())
    }

    fn handle_gateway_event(&mut self, event: GatewayEventKind) -> io::Result<()> {
        match event {
            GatewayEventKind::HelloReceived {
                heartbeat_interval_ms,
            } => {
                debug!(heartbeat_interval_ms, "Hello received");
                self.screen.log("connection successful")
            }
            GatewayEventKind::Identified => self.screen.log("authentication successful"),
            GatewayEventKind::Dispatch(dispatch) => {
                let was_ready = self.client.is_some();
                let message = apply_event(&mut self.client, dispatch);
                if !was_ready && self.client.is_some() {
                    self.screen.log("ready!")?;
                }
                match message {
                    Some(message) => self.append_message(&message),
                    None => Ok(()),
                }
            }
            GatewayEventKind::SessionInvalidated { reason } => {
                warn!(reason = %reason, "Session invalidated");
                self.screen.log(&format!("disconnected: {reason}"))
            }
        }
    }

    fn handle_action(&mut self, action: BackendAction) -> io::Result<()> {
        match action {
            BackendAction::MessageSendFailed { error, .. } => self
                .screen
                .log(&format!("failed to send message: {error}")),
            BackendAction::HistoryLoaded {
                channel_id,
                messages,
            } => {
                let focused = self
                    .client
                    .as_ref()
                    .is_some_and(|client| client.is_focused(channel_id));
                if !focused {
                    debug!(channel_id = %channel_id, "History for unfocused channel, dropping");
                    return Ok(());
                }
                for message in messages.iter().rev() {
                    self.append_message(message)?;
                }
                Ok(())
            }
            BackendAction::HistoryFailed { error, .. } => self
                .screen
                .log(&format!("failed to load history: {error}")),
        }
    }

    fn handle_terminal_event(&mut self, event: Event) -> io::Result<Flow> {
        match event {
            Event::Key(key) => match map_key(key) {
                Some(action) => self.handle_key(action),
                None => Ok(Flow::Continue),
            },
            Event::Resize(width, height) => {
                self.screen.resize(width, height)?;
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Continue),
        }
    }

    fn handle_key(&mut self, action: KeyAction) -> io::Result<Flow> {
        match action {
            KeyAction::Insert(c) => self.screen.edit(|input| input.insert(c))?,
            KeyAction::Backspace => self.screen.edit(|input| input.backspace())?,
            KeyAction::Delete => self.screen.edit(|input| input.delete())?,
            KeyAction::Left => self.screen.edit(|input| input.move_left())?,
            KeyAction::Right => self.screen.edit(|input| input.move_right())?,
            KeyAction::Home => self.screen.edit(|input| input.move_home())?,
            KeyAction::End => self.screen.edit(|input| input.move_end())?,
            KeyAction::ScrollUp => self.screen.scroll(-self.scroll_step)?,
            KeyAction::ScrollDown => self.screen.scroll(self.scroll_step)?,
            KeyAction::PageUp => self.screen.scroll_pages(-1)?,
            KeyAction::PageDown => self.screen.scroll_pages(1)?,
            KeyAction::Interrupt => return Ok(Flow::Exit),
            KeyAction::Submit => {
                let line = self.screen.commit()?;
                return self.run_line(&line);
            }
        }
        Ok(Flow::Continue)
    }

    fn run_line(&mut self, line: &str) -> io::Result<Flow> {
        let mut flow = Flow::Continue;
        for effect in interpret(line, self.client.as_mut()) {
            match effect {
                Effect::Log(text) => self.screen.log(&text)?,
                Effect::SendChat { channel, text } => {
                    self.dispatch(BackendCommand::SendMessage {
                        channel_id: channel,
                        content: text,
                    })?;
                }
                Effect::FetchHistory { channel, limit } => {
                    self.dispatch(BackendCommand::FetchHistory {
                        channel_id: channel,
                        limit,
                    })?;
                }
                Effect::Exit => flow = Flow::Exit,
            }
        }
        Ok(flow)
    }

    fn dispatch(&mut self, command: BackendCommand) -> io::Result<()> {
        if self.backend_tx.send(command).is_err() {
            warn!("Backend worker is gone");
            return self.screen.log("request could not be sent");
        }
        Ok(())
    }

    fn append_message(&mut self, message: &Message) -> io::Result<()> {
        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };
        let line = self.formatter.format(message, client);
        self.screen.append(line)
    }

    /// Restores the terminal layout. Call once after `run`.
    ///
    /// # Errors
    /// Returns IO error if writing to the terminal fails.
    pub fn finish(&mut self) -> io::Result<()> {
        self.screen.finish()
    }

    pub fn into_writer(self) -> W {
        self.screen.into_writer()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use futures_util::stream;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::domain::entities::{
        Channel, ChannelId, ChannelKind, Guild, MessageId, Participant, User,
    };
    use crate::domain::events::{DispatchEvent, ReadyEvent};
    use crate::infrastructure::discord::gateway::GatewayError;

    struct Harness {
        app: App<Vec<u8>>,
        backend_rx: mpsc::UnboundedReceiver<BackendCommand>,
        _action_tx: mpsc::UnboundedSender<BackendAction>,
    }

    fn harness() -> Harness {
        let (backend_tx, backend_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screen = Screen::new(Vec::new(), 80, 40, 50);
        Harness {
            app: App::new(screen, &UiConfig::default(), backend_tx, action_rx),
            backend_rx,
            _action_tx: action_tx,
        }
    }

    fn ready() -> GatewayEventKind {
        let guild = Guild::new(
            1,
            "guild",
            vec![
                Channel::new(10, ChannelKind::Text)
                    .with_guild(1)
                    .with_name("general"),
            ],
        );
        GatewayEventKind::Dispatch(DispatchEvent::Ready(ReadyEvent {
            user: User::new(42, "me"),
            users: vec![],
            private_channels: vec![],
            guilds: vec![guild],
        }))
    }

    fn keys(text: &str) -> Vec<io::Result<Event>> {
        text.chars()
            .map(|c| {
                let code = if c == '\n' {
                    KeyCode::Enter
                } else {
                    KeyCode::Char(c)
                };
                Ok(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            })
            .collect()
    }

    fn handle(
        events: Vec<GatewayEventKind>,
        end: GatewayResult<SessionEnd>,
    ) -> (GatewayHandle, mpsc::Receiver<GatewayCommand>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        for event in events {
            event_tx.send(event).unwrap();
        }
        let (command_tx, command_rx) = mpsc::channel(64);
        let task = tokio::spawn(async move { end });
        (
            GatewayHandle {
                events: event_rx,
                commands: command_tx,
                task,
            },
            command_rx,
        )
    }

    fn output(app: App<Vec<u8>>) -> String {
        String::from_utf8(app.into_writer()).unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_notices_and_single_close_notice() {
        let Harness { mut app, .. } = harness();
        let (gateway, _commands) = handle(
            vec![
                GatewayEventKind::HelloReceived {
                    heartbeat_interval_ms: 41250,
                },
                GatewayEventKind::Identified,
                ready(),
            ],
            Ok(SessionEnd::Remote {
                code: 1000,
                reason: "bye".into(),
            }),
        );

        assert_ok!(app.run(gateway, stream::pending()).await);

        let output = output(app);
        assert!(output.contains("attempting connection"));
        assert!(output.contains("connection successful"));
        assert!(output.contains("authentication successful"));
        assert!(output.contains("ready!"));
        assert_eq!(output.matches("connection closed").count(), 1);
    }

    #[tokio::test]
    async fn test_exit_command_closes_session() {
        let Harness { mut app, .. } = harness();
        let (event_tx, events) = mpsc::unbounded_channel::<GatewayEventKind>();
        let (commands, mut command_rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            let _keep_open = event_tx;
            match command_rx.recv().await {
                Some(GatewayCommand::Close) | None => Ok(SessionEnd::Local),
                Some(GatewayCommand::Send(_)) => Err(GatewayError::protocol("unexpected send")),
            }
        });
        let gateway = GatewayHandle {
            events,
            commands,
            task,
        };

        let terminal = stream::iter(keys("//exit\n")).chain(stream::pending());
        assert_ok!(app.run(gateway, terminal).await);

        assert_eq!(output(app).matches("connection closed").count(), 1);
    }

    #[tokio::test]
    async fn test_ctrl_c_key_interrupts() {
        let Harness { mut app, .. } = harness();
        let (gateway, _commands) = handle(vec![], Ok(SessionEnd::Local));
        let (_keep, events) = mpsc::unbounded_channel();
        let gateway = GatewayHandle { events, ..gateway };

        let interrupt = Ok(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        let terminal = stream::iter(vec![interrupt]).chain(stream::pending());
        assert_ok!(app.run(gateway, terminal).await);

        assert_eq!(output(app).matches("connection closed").count(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let Harness { mut app, .. } = harness();
        let (gateway, _commands) =
            handle(vec![], Err(GatewayError::connection_failed("refused")));

        assert_ok!(app.run(gateway, stream::pending()).await);

        let output = output(app);
        assert!(output.contains("connection failed"));
        assert_eq!(output.matches("connection closed").count(), 1);
    }

    #[tokio::test]
    async fn test_authentication_close_code_is_described() {
        let Harness { mut app, .. } = harness();
        let (gateway, _commands) = handle(
            vec![],
            Ok(SessionEnd::Remote {
                code: 4004,
                reason: "Authentication failed.".into(),
            }),
        );

        assert_ok!(app.run(gateway, stream::pending()).await);

        let output = output(app);
        assert!(output.contains(GatewayCloseCode::AuthenticationFailed.description()));
        assert_eq!(output.matches("connection closed").count(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_protocol_error_is_fatal() {
        let Harness { mut app, .. } = harness();
        let (gateway, _commands) = handle(vec![], Err(GatewayError::protocol("boom")));

        let result = app.run(gateway, stream::pending()).await;

        assert_err!(result);
        assert_eq!(output(app).matches("connection closed").count(), 1);
    }

    #[tokio::test]
    async fn test_chat_line_goes_to_backend() {
        let Harness {
            mut app,
            mut backend_rx,
            ..
        } = harness();
        let (event_tx, events) = mpsc::unbounded_channel();
        event_tx.send(ready()).unwrap();
        let (commands, mut command_rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            let _keep_open = event_tx;
            command_rx.recv().await;
            Ok::<_, GatewayError>(SessionEnd::Local)
        });
        let gateway = GatewayHandle {
            events,
            commands,
            task,
        };

        let terminal = stream::iter(keys("//pc 0 0\nhi\n//e\n")).chain(stream::pending());
        assert_ok!(app.run(gateway, terminal).await);

        assert_eq!(
            backend_rx.try_recv().unwrap(),
            BackendCommand::SendMessage {
                channel_id: ChannelId(10),
                content: "hi".into(),
            }
        );
        assert!(output(app).contains("now focused on"));
    }

    #[test]
    fn test_wrap_indent_follows_timestamp_format() {
        assert_eq!(harness().app.screen.pane().indent(), 11);

        let (backend_tx, _backend_rx) = mpsc::unbounded_channel();
        let (_action_tx, action_rx) = mpsc::unbounded_channel();
        let ui = UiConfig {
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            ..UiConfig::default()
        };
        let app = App::new(Screen::new(Vec::new(), 80, 40, 50), &ui, backend_tx, action_rx);
        assert_eq!(app.screen.pane().indent(), 22);
    }

    #[test]
    fn test_history_is_appended_oldest_first() {
        let Harness { mut app, .. } = harness();
        app.handle_gateway_event(ready()).unwrap();
        app.run_line("//pc 0 0").unwrap();

        let author = Participant::User(User::new(7, "pal"));
        let message = |id: u64, text: &str| {
            Message::new(MessageId(id), ChannelId(10), author.clone(), text, Utc::now())
        };
        app.handle_action(BackendAction::HistoryLoaded {
            channel_id: ChannelId(10),
            messages: vec![message(2, "newer"), message(1, "older")],
        })
        .unwrap();

        let output = output(app);
        let older = output.find("older").unwrap();
        let newer = output.find("newer").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_history_for_other_channel_is_dropped() {
        let Harness { mut app, .. } = harness();
        app.handle_gateway_event(ready()).unwrap();

        let author = Participant::User(User::new(7, "pal"));
        app.handle_action(BackendAction::HistoryLoaded {
            channel_id: ChannelId(10),
            messages: vec![Message::new(
                MessageId(1),
                ChannelId(10),
                author,
                "unseen",
                Utc::now(),
            )],
        })
        .unwrap();

        assert!(!output(app).contains("unseen"));
    }

    #[test]
    fn test_send_failure_is_logged() {
        let Harness { mut app, .. } = harness();
        app.handle_action(BackendAction::MessageSendFailed {
            channel_id: ChannelId(1),
            error: "missing permissions".into(),
        })
        .unwrap();
        assert!(output(app).contains("failed to send message: missing permissions"));
    }
}
