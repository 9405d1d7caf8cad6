//! Market Transport Port (Driven Port)
//!
//! The raw frame-oriented transport underneath a stream connection. A
//! connect yields a write half and a read half so the read loop can await
//! inbound frames while keepalives go out. The production implementation is
//! a WebSocket client; tests substitute channel-backed fakes.

use async_trait::async_trait;

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Dial failed.
    #[error("transport connect failed: {0}")]
    Connect(String),

    /// Read or write failed on an established link.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// The link is closed.
    #[error("transport closed")]
    Closed,
}

/// One frame on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Protocol ping.
    Ping(Vec<u8>),
    /// Protocol pong.
    Pong(Vec<u8>),
    /// Close frame.
    Close,
}

/// Write half of an established link.
#[async_trait]
pub trait TransportSink: Send {
    /// Send one frame.
    async fn send(&mut self, frame: WireFrame) -> Result<(), TransportError>;

    /// Close the link. Safe to call on an already-closed link.
    async fn close(&mut self);
}

/// Read half of an established link.
#[async_trait]
pub trait TransportSource: Send {
    /// Receive the next frame. `None` when the link has ended.
    async fn next_frame(&mut self) -> Option<Result<WireFrame, TransportError>>;
}

/// An established link: write half plus read half.
///
/// Exactly one connection owns a link at a time; ownership transfers only
/// through teardown followed by a fresh `connect`.
pub type TransportLink = (Box<dyn TransportSink>, Box<dyn TransportSource>);

/// Factory for links.
#[async_trait]
pub trait MarketTransport: Send + Sync {
    /// Dial the endpoint and return an established link.
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError>;
}
