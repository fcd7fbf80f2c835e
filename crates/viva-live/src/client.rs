//! Live streaming WebSocket client.

use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use viva_protocols::wire::{
    ClientContent, ClientMessage, Content, MediaChunk, Part, RealtimeInput, ServerMessage, Setup,
};
use viva_protocols::LiveError;

use crate::close::{classify_close, CloseCategory};
use crate::config::LiveConfig;
use crate::events::{ConnectionState, LiveEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Close code used when the transport errors without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// State shared between the client handle and its background tasks.
struct Shared {
    config: LiveConfig,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    state: parking_lot::RwLock<ConnectionState>,
    events: mpsc::UnboundedSender<LiveEvent>,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }
}

/// Client for one live streaming session.
///
/// Owns the connection lifecycle: `connect()` performs a bounded-wait
/// connect plus setup handshake, spawns the receive/reconnect supervisor
/// and the heartbeat, and from then on inbound frames arrive on the event
/// channel obtained from [`LiveClient::take_events`].
pub struct LiveClient {
    shared: Arc<Shared>,
    events: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<LiveEvent>>>,
    supervisor: parking_lot::Mutex<Option<JoinHandle<()>>>,
    heartbeat: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl LiveClient {
    /// Create a client. No connection is made until [`connect`].
    ///
    /// [`connect`]: LiveClient::connect
    pub fn new(config: LiveConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                config,
                sink: tokio::sync::Mutex::new(None),
                state: parking_lot::RwLock::new(ConnectionState::Disconnected),
                events: events_tx,
            }),
            events: parking_lot::Mutex::new(Some(events_rx)),
            supervisor: parking_lot::Mutex::new(None),
            heartbeat: parking_lot::Mutex::new(None),
        }
    }

    /// Take the event receiver. Yields `Some` exactly once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<LiveEvent>> {
        self.events.lock().take()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Establish the connection and start the session.
    ///
    /// Only valid while disconnected. The connect itself is bounded by
    /// `config.connect_timeout`; exceeding it fails the call without
    /// entering the close/reconnect path.
    pub async fn connect(&self) -> Result<(), LiveError> {
        if self.shared.state() != ConnectionState::Disconnected {
            return Err(LiveError::InvalidState(format!(
                "connect() requires a disconnected client (state: {:?})",
                self.shared.state()
            )));
        }
        self.shared.set_state(ConnectionState::Connecting);

        let source = match Self::open(&self.shared).await {
            Ok(source) => source,
            Err(e) => {
                self.shared.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        let supervisor = {
            let shared = self.shared.clone();
            tokio::spawn(async move {
                Self::supervise(shared, source).await;
            })
        };
        *self.supervisor.lock() = Some(supervisor);

        let heartbeat = {
            let shared = self.shared.clone();
            tokio::spawn(async move {
                Self::heartbeat_loop(shared).await;
            })
        };
        *self.heartbeat.lock() = Some(heartbeat);

        Ok(())
    }

    /// Send one audio chunk. Dropped with a warning if not connected.
    pub async fn send_audio(&self, mime_type: &str, chunk: &[u8]) -> Result<(), LiveError> {
        use base64::Engine;
        if self.shared.state() != ConnectionState::Connected {
            warn!("send_audio while not connected; chunk dropped");
            return Ok(());
        }
        let envelope = ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![MediaChunk {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(chunk),
            }],
        });
        self.send_envelope(&envelope).await
    }

    /// Send one complete text turn. Dropped with a warning if not
    /// connected.
    pub async fn send_text(&self, text: &str) -> Result<(), LiveError> {
        if self.shared.state() != ConnectionState::Connected {
            warn!("send_text while not connected; text dropped");
            return Ok(());
        }
        let envelope = ClientMessage::ClientContent(ClientContent {
            turns: vec![Content::text("user", text)],
            turn_complete: true,
        });
        self.send_envelope(&envelope).await
    }

    /// Close the connection and stop the background tasks.
    pub async fn disconnect(&self) {
        if let Some(handle) = self.supervisor.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.heartbeat.lock().take() {
            handle.abort();
        }

        if let Some(mut sink) = self.shared.sink.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
        }
        self.shared.set_state(ConnectionState::Closed);
        let _ = self.shared.events.send(LiveEvent::Disconnected {
            code: 1000,
            reason: "client disconnect".to_string(),
            category: CloseCategory::Normal,
        });
        debug!("Live client disconnected");
    }

    async fn send_envelope(&self, envelope: &ClientMessage) -> Result<(), LiveError> {
        let json = serde_json::to_string(envelope)?;
        trace!("live send: {}", json);

        let mut guard = self.shared.sink.lock().await;
        match guard.as_mut() {
            Some(sink) => sink
                .send(Message::Text(json.into()))
                .await
                .map_err(|e| LiveError::WebSocket(e.to_string())),
            None => {
                warn!("Socket not open; outbound frame dropped");
                Ok(())
            }
        }
    }

    /// Open the socket, send the setup handshake, install the sink.
    async fn open(shared: &Arc<Shared>) -> Result<WsSource, LiveError> {
        let url = shared.config.url();
        let timeout = shared.config.connect_timeout;

        let (stream, _) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(&url))
            .await
            .map_err(|_| LiveError::Timeout(timeout.as_secs()))?
            .map_err(|e| LiveError::ConnectionFailed(e.to_string()))?;

        let (mut sink, source) = stream.split();

        let setup = ClientMessage::Setup(Setup {
            model: shared.config.model.clone(),
            generation_config: shared.config.generation_config.clone(),
            system_instruction: shared.config.system_content(),
        });
        let json = serde_json::to_string(&setup)?;
        sink.send(Message::Text(json.into()))
            .await
            .map_err(|e| LiveError::WebSocket(e.to_string()))?;

        *shared.sink.lock().await = Some(sink);
        shared.set_state(ConnectionState::Connected);
        let _ = shared.events.send(LiveEvent::Connected);
        debug!("Live session connected: model={}", shared.config.model);

        Ok(source)
    }

    /// Read frames until the connection ends, then classify the close and
    /// either reconnect with backoff or stop.
    async fn supervise(shared: Arc<Shared>, mut source: WsSource) {
        loop {
            let (code, reason) = Self::read_loop(&shared, &mut source).await;
            shared.sink.lock().await.take();

            let disposition = classify_close(code, &reason);
            if !disposition.retryable {
                let state = if disposition.category == CloseCategory::Normal {
                    ConnectionState::Closed
                } else {
                    ConnectionState::Failed
                };
                shared.set_state(state);
                let _ = shared.events.send(LiveEvent::Disconnected {
                    code,
                    reason,
                    category: disposition.category,
                });
                return;
            }

            shared.set_state(ConnectionState::Connecting);
            warn!(
                "Connection lost (code {}, {:?}); reconnecting",
                code, disposition.category
            );

            let max_attempts = shared.config.reconnect.max_attempts;
            let mut reconnected = false;
            for attempt in 0..max_attempts {
                let delay = shared.config.reconnect.delay_for_attempt(attempt);
                debug!("Reconnect attempt {}/{} in {:?}", attempt + 1, max_attempts, delay);
                tokio::time::sleep(delay).await;

                match Self::open(&shared).await {
                    Ok(new_source) => {
                        source = new_source;
                        reconnected = true;
                        break;
                    }
                    Err(e) => warn!("Reconnect attempt {} failed: {}", attempt + 1, e),
                }
            }

            if !reconnected {
                error!("Reconnect attempts exhausted after {}", max_attempts);
                shared.set_state(ConnectionState::Failed);
                let _ = shared.events.send(LiveEvent::Error(LiveError::ReconnectExhausted {
                    attempts: max_attempts,
                }));
                let _ = shared.events.send(LiveEvent::Disconnected {
                    code,
                    reason,
                    category: disposition.category,
                });
                return;
            }
        }
    }

    async fn read_loop(shared: &Arc<Shared>, source: &mut WsSource) -> (u16, String) {
        while let Some(msg) = source.next().await {
            match msg {
                Ok(Message::Text(text)) => Self::dispatch_frame(&shared.events, text.as_str()),
                Ok(Message::Close(frame)) => {
                    debug!("Close frame received: {:?}", frame);
                    return match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.to_string()),
                        None => (ABNORMAL_CLOSURE, String::new()),
                    };
                }
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    return (ABNORMAL_CLOSURE, e.to_string());
                }
            }
        }
        (ABNORMAL_CLOSURE, "connection reset".to_string())
    }

    /// Parse one inbound frame and dispatch the matching events.
    ///
    /// Malformed frames surface as [`LiveEvent::Error`] without closing
    /// the connection.
    pub(crate) fn dispatch_frame(events: &mpsc::UnboundedSender<LiveEvent>, text: &str) {
        trace!("live recv: {}", text);

        let msg: ServerMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Unparseable frame: {}", e);
                let _ = events.send(LiveEvent::Error(LiveError::Frame(e.to_string())));
                return;
            }
        };

        if msg.setup_complete.is_some() {
            let _ = events.send(LiveEvent::SetupComplete);
        }

        if let Some(content) = msg.server_content {
            let parts = content
                .model_turn
                .as_ref()
                .map(|turn| turn.parts.clone())
                .unwrap_or_default();
            let turn_complete = content.turn_complete;

            let _ = events.send(LiveEvent::Content(content));
            for part in parts {
                match part {
                    Part::Text { text } => {
                        let _ = events.send(LiveEvent::TextResponse(text));
                    }
                    Part::InlineData { inline_data } => {
                        let _ = events.send(LiveEvent::AudioResponse {
                            mime_type: inline_data.mime_type,
                            data: inline_data.data,
                        });
                    }
                }
            }
            if turn_complete {
                let _ = events.send(LiveEvent::TurnComplete);
            }
        }

        if let Some(tool_call) = msg.tool_call {
            let _ = events.send(LiveEvent::ToolCall(tool_call.function_calls));
        }

        if let Some(cancellation) = msg.tool_call_cancellation {
            let _ = events.send(LiveEvent::ToolCallCancellation(cancellation.ids));
        }
    }

    /// Periodic keepalive, sent only while connected. A missing or closed
    /// socket skips the tick silently.
    async fn heartbeat_loop(shared: Arc<Shared>) {
        let mut ticker = tokio::time::interval(shared.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match shared.state() {
                ConnectionState::Closed | ConnectionState::Failed => return,
                ConnectionState::Connected => {}
                _ => continue,
            }

            let mut guard = shared.sink.lock().await;
            if let Some(sink) = guard.as_mut() {
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    debug!("Heartbeat skipped: {}", e);
                }
            }
        }
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if let Some(handle) = self.supervisor.lock().take() {
            handle.abort();
        }
        if let Some(handle) = self.heartbeat.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
