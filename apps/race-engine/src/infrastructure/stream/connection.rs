//! Stream Connection
//!
//! Owns one realtime subscription to a market-data channel: connect,
//! subscribe, keepalive, reconnect-with-backoff, and scoped teardown. The
//! socket is exclusively owned by this connection; ownership transfers only
//! through `cleanup()` followed by a fresh `connect()` on a new instance.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ExchangeProfile, FrameKind, KeepaliveFrame, MarketTransport, TransportSink, TransportSource,
    WireFrame,
};
use crate::domain::{Channel, ConnectionState, RawMessage};

use super::codec::JsonCodec;
use super::heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};

/// Errors that end a connection attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    /// Subscription acknowledgement did not arrive in time.
    #[error("subscription acknowledgement timed out")]
    Timeout,

    /// Transport-level failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The exchange rejected the subscription.
    #[error("subscription rejected: {0}")]
    SubscriptionRejected(String),

    /// Ephemeral access token could not be issued.
    #[error("token issuance failed: {0}")]
    TokenIssuance(String),

    /// The reconnect bound was exhausted.
    #[error("reconnect attempts exhausted")]
    ReconnectExhausted,

    /// The connection was already torn down.
    #[error("connection closed")]
    Closed,
}

/// What to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSpec {
    /// Exchange symbol.
    pub symbol: String,
    /// Market-data channel.
    pub channel: Channel,
}

/// Connection tuning.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Bound on the wait for the subscription acknowledgement.
    pub ack_timeout: Duration,
    /// Capacity of the frame channel handed to the consumer.
    pub frame_buffer: usize,
    /// Heartbeat tuning.
    pub heartbeat: HeartbeatConfig,
    /// Reconnect tuning.
    pub reconnect: ReconnectConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(5),
            frame_buffer: 1024,
            heartbeat: HeartbeatConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// One realtime market-data connection.
pub struct StreamConnection {
    profile: Arc<dyn ExchangeProfile>,
    transport: Arc<dyn MarketTransport>,
    config: ConnectionConfig,
    state: Arc<RwLock<ConnectionState>>,
    fatal: Arc<RwLock<Option<ConnectionError>>>,
    cancel: CancellationToken,
    frames: Option<mpsc::Receiver<RawMessage>>,
    reader: Option<JoinHandle<()>>,
}

impl StreamConnection {
    /// Create a connection in the `Disconnected` state.
    #[must_use]
    pub fn new(
        profile: Arc<dyn ExchangeProfile>,
        transport: Arc<dyn MarketTransport>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            profile,
            transport,
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            fatal: Arc::new(RwLock::new(None)),
            cancel: CancellationToken::new(),
            frames: None,
            reader: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// The fatal condition that ended the stream, if any.
    ///
    /// Set when the background read loop gives up for good, e.g. after the
    /// reconnect bound is exhausted mid-stream.
    #[must_use]
    pub fn fatal_error(&self) -> Option<ConnectionError> {
        self.fatal.read().clone()
    }

    /// Resolve the endpoint, dial, subscribe, and wait (bounded) for the
    /// acknowledgement, then start the background read loop.
    ///
    /// All faults come back as typed `ConnectionError`s; nothing is thrown
    /// past this boundary.
    pub async fn connect(&mut self, spec: SubscriptionSpec) -> Result<(), ConnectionError> {
        if self.state().is_closed() {
            return Err(ConnectionError::Closed);
        }
        *self.state.write() = ConnectionState::Connecting;

        let established = establish(
            self.profile.as_ref(),
            self.transport.as_ref(),
            &spec,
            self.config.ack_timeout,
        )
        .await;

        let (link, buffered) = match established {
            Ok(pair) => pair,
            Err(e) => {
                *self.state.write() = ConnectionState::Disconnected;
                return Err(e);
            }
        };

        *self.state.write() = if buffered.is_empty() {
            ConnectionState::Subscribed
        } else {
            ConnectionState::Streaming
        };

        let (tx, rx) = mpsc::channel(self.config.frame_buffer);
        for raw in buffered {
            // Capacity is fresh; the pre-ack backlog is at most one frame.
            let _ = tx.try_send(raw);
        }

        let reader = ReadLoop {
            profile: Arc::clone(&self.profile),
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            spec,
            state: Arc::clone(&self.state),
            fatal: Arc::clone(&self.fatal),
            cancel: self.cancel.clone(),
            codec: JsonCodec::new(),
            tx,
        };
        self.reader = Some(tokio::spawn(reader.run(link)));
        self.frames = Some(rx);

        Ok(())
    }

    /// Take the single-consumer data-frame stream.
    ///
    /// Control frames never appear here; the stream ends when the connection
    /// closes or reconnects are exhausted.
    #[must_use]
    pub fn receive(&mut self) -> Option<mpsc::Receiver<RawMessage>> {
        self.frames.take()
    }

    /// Tear the connection down on every exit path. Idempotent.
    pub async fn cleanup(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.reader.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.frames = None;
        *self.state.write() = ConnectionState::Closed;
    }
}

/// An established link with any data frames seen before the explicit
/// acknowledgement.
type Established = (
    (Box<dyn TransportSink>, Box<dyn TransportSource>),
    Vec<RawMessage>,
);

/// Dial, subscribe, and wait for the acknowledgement.
///
/// A data frame arriving before the explicit acknowledgement is proof of a
/// live subscription; it is buffered for the consumer rather than lost.
async fn establish(
    profile: &dyn ExchangeProfile,
    transport: &dyn MarketTransport,
    spec: &SubscriptionSpec,
    ack_timeout: Duration,
) -> Result<Established, ConnectionError> {
    let endpoint = profile
        .resolve_endpoint()
        .await
        .map_err(|e| ConnectionError::TokenIssuance(e.to_string()))?;

    let (mut sink, mut source) = transport
        .connect(&endpoint)
        .await
        .map_err(|e| ConnectionError::Transport(e.to_string()))?;

    let payload = profile.subscribe_payload(&spec.symbol, spec.channel);
    sink.send(WireFrame::Text(payload))
        .await
        .map_err(|e| ConnectionError::Transport(e.to_string()))?;

    let codec = JsonCodec::new();
    let wait = tokio::time::timeout(ack_timeout, async {
        loop {
            let frame = match source.next_frame().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(ConnectionError::Transport(e.to_string())),
                None => {
                    return Err(ConnectionError::Transport(
                        "link ended during subscribe".to_string(),
                    ));
                }
            };
            match frame {
                WireFrame::Text(text) => {
                    let value = match codec.decode(&text) {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping malformed frame during subscribe");
                            continue;
                        }
                    };
                    match profile.classify(&value) {
                        FrameKind::SubscriptionAck => return Ok(Vec::new()),
                        FrameKind::SubscriptionRejected(reason) => {
                            return Err(ConnectionError::SubscriptionRejected(reason));
                        }
                        FrameKind::Data => return Ok(vec![RawMessage::new(value)]),
                        FrameKind::Pong | FrameKind::Other => {}
                    }
                }
                WireFrame::Ping(data) => {
                    sink.send(WireFrame::Pong(data))
                        .await
                        .map_err(|e| ConnectionError::Transport(e.to_string()))?;
                }
                WireFrame::Close => {
                    return Err(ConnectionError::Transport(
                        "server closed during subscribe".to_string(),
                    ));
                }
                WireFrame::Binary(_) | WireFrame::Pong(_) => {}
            }
        }
    })
    .await;

    match wait {
        Ok(Ok(buffered)) => Ok(((sink, source), buffered)),
        Ok(Err(e)) => {
            sink.close().await;
            Err(e)
        }
        Err(_elapsed) => {
            sink.close().await;
            Err(ConnectionError::Timeout)
        }
    }
}

/// Why one pump pass over a link ended.
enum PumpExit {
    Cancelled,
    ConsumerGone,
    ConnectionLost(String),
}

/// Background task owning the link: forwards data frames, answers pings,
/// drives the heartbeat duty, and reconnects with backoff when the link
/// drops.
struct ReadLoop {
    profile: Arc<dyn ExchangeProfile>,
    transport: Arc<dyn MarketTransport>,
    config: ConnectionConfig,
    spec: SubscriptionSpec,
    state: Arc<RwLock<ConnectionState>>,
    fatal: Arc<RwLock<Option<ConnectionError>>>,
    cancel: CancellationToken,
    codec: JsonCodec,
    tx: mpsc::Sender<RawMessage>,
}

impl ReadLoop {
    async fn run(self, link: (Box<dyn TransportSink>, Box<dyn TransportSource>)) {
        let (mut sink, mut source) = link;
        let mut policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            let exit = self.pump(sink.as_mut(), source.as_mut()).await;
            sink.close().await;

            let reason = match exit {
                PumpExit::Cancelled | PumpExit::ConsumerGone => return,
                PumpExit::ConnectionLost(reason) => reason,
            };

            tracing::warn!(
                exchange = self.profile.name(),
                symbol = %self.spec.symbol,
                %reason,
                "connection lost"
            );
            *self.state.write() = ConnectionState::Reconnecting;

            match self.reconnect(&mut policy).await {
                Some((new_sink, new_source)) => {
                    sink = new_sink;
                    source = new_source;
                }
                None => return,
            }
        }
    }

    /// Re-establish with backoff. `None` when cancelled or exhausted; the
    /// frame sender drops with `self`, ending the consumer's stream.
    async fn reconnect(
        &self,
        policy: &mut ReconnectPolicy,
    ) -> Option<(Box<dyn TransportSink>, Box<dyn TransportSource>)> {
        loop {
            let Some(delay) = policy.next_delay() else {
                tracing::error!(
                    exchange = self.profile.name(),
                    symbol = %self.spec.symbol,
                    attempts = policy.attempts(),
                    "reconnect attempts exhausted"
                );
                *self.fatal.write() = Some(ConnectionError::ReconnectExhausted);
                *self.state.write() = ConnectionState::Closed;
                return None;
            };

            tracing::info!(
                attempt = policy.attempts(),
                delay_ms = delay.as_millis(),
                "reconnecting"
            );
            tokio::select! {
                () = self.cancel.cancelled() => return None,
                () = tokio::time::sleep(delay) => {}
            }

            match establish(
                self.profile.as_ref(),
                self.transport.as_ref(),
                &self.spec,
                self.config.ack_timeout,
            )
            .await
            {
                Ok((link, buffered)) => {
                    policy.reset();
                    *self.state.write() = ConnectionState::Subscribed;
                    for raw in buffered {
                        if self.forward(raw).await.is_err() {
                            return None;
                        }
                    }
                    return Some(link);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "reconnect attempt failed");
                }
            }
        }
    }

    /// Pump one link until it fails, the consumer goes away, or teardown.
    async fn pump(&self, sink: &mut dyn TransportSink, source: &mut dyn TransportSource) -> PumpExit {
        let hb_state = Arc::new(HeartbeatState::new());
        let hb_cancel = self.cancel.child_token();
        let (hb_tx, mut hb_rx) = mpsc::channel::<HeartbeatEvent>(4);
        let manager = HeartbeatManager::new(
            self.config.heartbeat.clone(),
            Arc::clone(&hb_state),
            hb_tx,
            hb_cancel.clone(),
        );
        let hb_handle = tokio::spawn(manager.run());

        let exit = self.pump_inner(sink, source, &hb_state, &mut hb_rx).await;

        hb_cancel.cancel();
        let _ = hb_handle.await;
        exit
    }

    async fn pump_inner(
        &self,
        sink: &mut dyn TransportSink,
        source: &mut dyn TransportSource,
        hb_state: &HeartbeatState,
        hb_rx: &mut mpsc::Receiver<HeartbeatEvent>,
    ) -> PumpExit {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return PumpExit::Cancelled,

                event = hb_rx.recv() => match event {
                    Some(HeartbeatEvent::SendPing) => {
                        hb_state.mark_ping_sent();
                        let frame = match self.profile.keepalive_frame() {
                            KeepaliveFrame::ProtocolPing => WireFrame::Ping(Vec::new()),
                            KeepaliveFrame::Text(text) => WireFrame::Text(text),
                        };
                        if let Err(e) = sink.send(frame).await {
                            return PumpExit::ConnectionLost(format!("keepalive send: {e}"));
                        }
                    }
                    Some(HeartbeatEvent::Timeout) => {
                        return PumpExit::ConnectionLost("heartbeat timeout".to_string());
                    }
                    None => {
                        // Duty exited on its own; keep pumping frames.
                    }
                },

                frame = source.next_frame() => match frame {
                    Some(Ok(WireFrame::Text(text))) => {
                        hb_state.record_ack();
                        match self.handle_text(&text).await {
                            Ok(()) => {}
                            Err(exit) => return exit,
                        }
                    }
                    Some(Ok(WireFrame::Pong(_))) => {
                        hb_state.record_ack();
                    }
                    Some(Ok(WireFrame::Ping(data))) => {
                        hb_state.record_ack();
                        if let Err(e) = sink.send(WireFrame::Pong(data)).await {
                            return PumpExit::ConnectionLost(format!("pong send: {e}"));
                        }
                    }
                    Some(Ok(WireFrame::Close)) => {
                        return PumpExit::ConnectionLost("server close frame".to_string());
                    }
                    Some(Ok(WireFrame::Binary(_))) => {
                        hb_state.record_ack();
                    }
                    Some(Err(e)) => {
                        return PumpExit::ConnectionLost(e.to_string());
                    }
                    None => {
                        return PumpExit::ConnectionLost("stream ended".to_string());
                    }
                },
            }
        }
    }

    /// Decode and route one text frame.
    async fn handle_text(&self, text: &str) -> Result<(), PumpExit> {
        let value = match self.codec.decode(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed frame");
                return Ok(());
            }
        };

        match self.profile.classify(&value) {
            FrameKind::Data => {
                if self.state().is_subscribed() {
                    *self.state.write() = ConnectionState::Streaming;
                }
                self.forward(RawMessage::new(value)).await
            }
            FrameKind::SubscriptionRejected(reason) => {
                tracing::warn!(%reason, "subscription rejected mid-stream");
                Ok(())
            }
            FrameKind::SubscriptionAck | FrameKind::Pong | FrameKind::Other => Ok(()),
        }
    }

    async fn forward(&self, raw: RawMessage) -> Result<(), PumpExit> {
        self.tx.send(raw).await.map_err(|_| PumpExit::ConsumerGone)
    }

    fn state(&self) -> ConnectionState {
        *self.state.read()
    }
}
