//! WebSocket Transport Adapter
//!
//! tokio-tungstenite implementation of the market transport port.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::application::ports::{
    MarketTransport, TransportError, TransportLink, TransportSink, TransportSource, WireFrame,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production WebSocket transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl WsTransport {
    /// Create a transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MarketTransport for WsTransport {
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (write, read) = stream.split();
        Ok((Box::new(WsSink { write }), Box::new(WsSource { read })))
    }
}

fn to_message(frame: WireFrame) -> Message {
    match frame {
        WireFrame::Text(text) => Message::Text(text.into()),
        WireFrame::Binary(data) => Message::Binary(data.into()),
        WireFrame::Ping(data) => Message::Ping(data.into()),
        WireFrame::Pong(data) => Message::Pong(data.into()),
        WireFrame::Close => Message::Close(None),
    }
}

fn from_message(message: Message) -> Option<WireFrame> {
    match message {
        Message::Text(text) => Some(WireFrame::Text(text.to_string())),
        Message::Binary(data) => Some(WireFrame::Binary(data.to_vec())),
        Message::Ping(data) => Some(WireFrame::Ping(data.to_vec())),
        Message::Pong(data) => Some(WireFrame::Pong(data.to_vec())),
        Message::Close(_) => Some(WireFrame::Close),
        // Raw frames are not surfaced by tungstenite on read.
        Message::Frame(_) => None,
    }
}

struct WsSink {
    write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, frame: WireFrame) -> Result<(), TransportError> {
        self.write
            .send(to_message(frame))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.write.close().await;
    }
}

struct WsSource {
    read: SplitStream<WsStream>,
}

#[async_trait]
impl TransportSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<WireFrame, TransportError>> {
        loop {
            match self.read.next().await? {
                Ok(message) => match from_message(message) {
                    Some(frame) => return Some(Ok(frame)),
                    None => continue,
                },
                Err(e) => return Some(Err(TransportError::Io(e.to_string()))),
            }
        }
    }
}
