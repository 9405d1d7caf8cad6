//! Stream Infrastructure
//!
//! The realtime market-data connection: frame codec, heartbeat duty,
//! bounded reconnect policy, the tungstenite transport adapter, and the
//! connection lifecycle itself.

pub mod codec;
pub mod connection;
pub mod heartbeat;
pub mod reconnect;
pub mod ws;

pub use codec::{CodecError, JsonCodec};
pub use connection::{ConnectionConfig, ConnectionError, StreamConnection, SubscriptionSpec};
pub use heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use ws::WsTransport;
