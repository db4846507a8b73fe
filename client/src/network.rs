use crate::config::ClientConfig;
use crate::input::InputManager;
use crate::notify::Notification;
use crate::session::{ConnectionState, Session};
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{encode_client_message, ProtocolError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::{interval, interval_at, sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid server address: {0:?}")]
    InvalidAddress(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("giving up after {0} reconnect attempts")]
    ReconnectsExhausted(u32),
}

/// Accepts `host:port` or a full `ws://` / `wss://` URL.
pub fn server_url(addr: &str) -> Result<String, NetworkError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(NetworkError::InvalidAddress(addr.to_string()));
    }
    if addr.starts_with("ws://") || addr.starts_with("wss://") {
        Ok(addr.to_string())
    } else if addr.contains("://") {
        Err(NetworkError::InvalidAddress(addr.to_string()))
    } else {
        Ok(format!("ws://{}", addr))
    }
}

pub struct Client {
    url: String,
    session: Session,
    input: InputManager,
    fake_ping_ms: u64,
}

impl Client {
    pub fn new(
        server_addr: &str,
        config: ClientConfig,
        input: InputManager,
        fake_ping_ms: u64,
    ) -> Result<Self, NetworkError> {
        Ok(Client {
            url: server_url(server_addr)?,
            session: Session::new(config),
            input,
            fake_ping_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Connects and serves until reconnects run out. Never returns `Ok` while
    /// reconnects are unlimited.
    pub async fn run(&mut self) -> Result<(), NetworkError> {
        let reconnect_delay = self.session.config().reconnect_delay;
        let max_reconnects = self.session.config().max_reconnects;
        let mut attempts: u32 = 0;

        loop {
            self.session.on_connecting();
            info!("Connecting to {}...", self.url);

            let result = self.connect_and_serve().await;
            let was_connected = self.session.connection_state() == ConnectionState::Connected;
            match result {
                Ok(()) => info!("Connection closed by server"),
                Err(e) => warn!("Connection error: {}", e),
            }
            self.session.on_disconnected();

            if was_connected {
                attempts = 0;
            }
            if let Some(max) = max_reconnects {
                if attempts >= max {
                    error!("Giving up on {}", self.url);
                    return Err(NetworkError::ReconnectsExhausted(max));
                }
            }
            attempts += 1;

            info!("Reconnecting in {}ms", reconnect_delay.as_millis());
            sleep(reconnect_delay).await;
        }
    }

    async fn connect_and_serve(&mut self) -> Result<(), NetworkError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        self.session.on_connected(Instant::now());
        self.flush(&mut sink).await?;

        let frame = self.session.config().frame_interval;
        let ping = self.session.config().ping_interval;
        let mut frame_interval = interval(frame);
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ping_interval = interval_at(tokio::time::Instant::now() + ping, ping);

        loop {
            tokio::select! {
                message = stream.next() => {
                    let Some(message) = message else {
                        return Ok(());
                    };
                    match message? {
                        Message::Text(text) => {
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }
                            self.session.handle_frame(&text, Instant::now());
                        }
                        Message::Close(frame) => {
                            debug!("Close frame: {:?}", frame);
                            return Ok(());
                        }
                        Message::Binary(data) => {
                            debug!("Ignoring {} byte binary frame", data.len());
                        }
                        _ => {}
                    }
                },

                _ = frame_interval.tick() => {
                    let now = Instant::now();
                    self.input.update(&mut self.session, now);
                    self.session.tick(now);
                },

                _ = ping_interval.tick() => {
                    self.session.send_ping(Instant::now());
                },
            }

            self.flush(&mut sink).await?;
            self.report_notifications();
        }
    }

    async fn flush<S>(&mut self, sink: &mut S) -> Result<(), NetworkError>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        for message in self.session.drain_outbound() {
            let text = encode_client_message(&message)?;
            if self.fake_ping_ms > 0 {
                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
            }
            sink.send(Message::Text(text)).await?;
        }
        Ok(())
    }

    fn report_notifications(&mut self) {
        for notification in self.session.drain_notifications() {
            match notification {
                Notification::ChatReceived { sender, text } => info!("[chat] {}: {}", sender, text),
                Notification::LevelUp { level } => match level {
                    Some(level) => info!("Reached level {}", level),
                    None => info!("Level up!"),
                },
                Notification::PortalUsed { portal_id } => info!("Using portal {}", portal_id),
                other => debug!("{:?}", other),
            }
        }
    }
}
