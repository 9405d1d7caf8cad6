//! Shared fixtures: a scripted exchange profile, a channel-backed transport,
//! and a scripted order gateway.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc;

use race_engine::{
    Channel, ExchangeProfile, FrameKind, KeepaliveFrame, MarketTransport, OrderAck, OrderError,
    OrderGateway, OrderIntent, ProfileError, SizeAndPrecision, SizingPolicy, TransportError,
    TransportLink, TransportSink, TransportSource, WireFrame,
};

/// Minimal exchange dialect: `sub:<symbol>` subscribes, `{"event":"ack"}`
/// acknowledges, frames carrying `price` are data.
pub struct StubProfile;

#[async_trait]
impl ExchangeProfile for StubProfile {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn resolve_endpoint(&self) -> Result<String, ProfileError> {
        Ok("ws://stub".to_string())
    }

    fn subscribe_payload(&self, symbol: &str, _channel: Channel) -> String {
        format!("sub:{symbol}")
    }

    fn classify(&self, payload: &serde_json::Value) -> FrameKind {
        if payload.get("price").is_some() {
            return FrameKind::Data;
        }
        match payload.get("event").and_then(|v| v.as_str()) {
            Some("ack") => FrameKind::SubscriptionAck,
            Some("rejected") => FrameKind::SubscriptionRejected("rejected".to_string()),
            _ => FrameKind::Other,
        }
    }

    fn keepalive_frame(&self) -> KeepaliveFrame {
        KeepaliveFrame::Text("ping".to_string())
    }

    fn extract_price(&self, _channel: Channel, payload: &serde_json::Value) -> Option<Decimal> {
        payload.get("price")?.as_str()?.parse().ok()
    }
}

pub type FrameSender = mpsc::UnboundedSender<Result<WireFrame, TransportError>>;

pub struct FakeSink {
    feedback: FrameSender,
    ack_on_subscribe: bool,
}

#[async_trait]
impl TransportSink for FakeSink {
    async fn send(&mut self, frame: WireFrame) -> Result<(), TransportError> {
        if self.ack_on_subscribe {
            if let WireFrame::Text(text) = &frame {
                if text.starts_with("sub:") {
                    let _ = self
                        .feedback
                        .send(Ok(WireFrame::Text(json!({"event": "ack"}).to_string())));
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) {}
}

pub struct FakeSource {
    inbound: mpsc::UnboundedReceiver<Result<WireFrame, TransportError>>,
}

#[async_trait]
impl TransportSource for FakeSource {
    async fn next_frame(&mut self) -> Option<Result<WireFrame, TransportError>> {
        self.inbound.recv().await
    }
}

/// Hands out pre-scripted links in order; fails once the queue is empty.
pub struct QueueTransport {
    links: Mutex<VecDeque<TransportLink>>,
}

impl QueueTransport {
    pub fn new(links: Vec<TransportLink>) -> Self {
        Self {
            links: Mutex::new(links.into_iter().collect()),
        }
    }

    /// A transport that can never connect.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl MarketTransport for QueueTransport {
    async fn connect(&self, _url: &str) -> Result<TransportLink, TransportError> {
        match self.links.lock().pop_front() {
            Some(link) => Ok(link),
            None => Err(TransportError::Connect("no link scripted".to_string())),
        }
    }
}

/// Build one scripted link; the returned sender feeds inbound frames.
pub fn scripted_link(ack_on_subscribe: bool) -> (TransportLink, FrameSender) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = FakeSink {
        feedback: tx.clone(),
        ack_on_subscribe,
    };
    let source = FakeSource { inbound: rx };
    ((Box::new(sink), Box::new(source)), tx)
}

/// A data frame carrying one price.
pub fn price_frame(price: &str) -> Result<WireFrame, TransportError> {
    Ok(WireFrame::Text(json!({"price": price}).to_string()))
}

/// Sizing fixed to one tier, wide open.
pub struct FixedSizing {
    pub size: Decimal,
    pub price_decimals: u32,
}

impl SizingPolicy for FixedSizing {
    fn size_and_precision(&self, _price: Decimal) -> SizeAndPrecision {
        SizeAndPrecision {
            size: self.size,
            price_decimals: self.price_decimals,
        }
    }

    fn min_notional(&self) -> Decimal {
        Decimal::ONE
    }
}

/// Gateway scripted per call index: `false` entries fail.
pub struct ScriptedGateway {
    script: Vec<bool>,
    calls: Mutex<Vec<OrderIntent>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<bool>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn all_succeed() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<OrderIntent> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl OrderGateway for ScriptedGateway {
    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, OrderError> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(intent.clone());
            calls.len() - 1
        };
        match self.script.get(index) {
            Some(false) => Err(OrderError::Rejected {
                reason: "scripted rejection".to_string(),
            }),
            _ => Ok(OrderAck {
                order_id: format!("ord-{index}"),
            }),
        }
    }

    async fn cancel_order(&self, _symbol: &str, _order_id: &str) -> Result<(), OrderError> {
        Ok(())
    }
}

/// Helper building a shared profile handle.
pub fn stub_profile() -> Arc<dyn ExchangeProfile> {
    Arc::new(StubProfile)
}
