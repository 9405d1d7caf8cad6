//! Exchange Profiles
//!
//! One small adapter object per exchange: endpoint resolution and token
//! issuance, subscription topic naming, ack/pong recognition, keepalive
//! construction, and payload field extraction. The orchestration logic
//! never branches on the exchange; everything exchange-specific lives here.

pub mod bitget;
pub mod gate;
pub mod kucoin;

use std::sync::Arc;

use crate::application::ports::ExchangeProfile;

pub use bitget::BitgetProfile;
pub use gate::GateProfile;
pub use kucoin::KucoinProfile;

/// Supported exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeId {
    /// Bitget spot.
    #[default]
    Bitget,
    /// KuCoin spot.
    Kucoin,
    /// Gate.io spot.
    Gate,
}

impl ExchangeId {
    /// Parse an exchange name, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bitget" => Some(Self::Bitget),
            "kucoin" => Some(Self::Kucoin),
            "gate" | "gateio" | "gate.io" => Some(Self::Gate),
            _ => None,
        }
    }

    /// Canonical exchange name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bitget => "bitget",
            Self::Kucoin => "kucoin",
            Self::Gate => "gate",
        }
    }

    /// Build the profile adapter for this exchange.
    #[must_use]
    pub fn profile(&self) -> Arc<dyn ExchangeProfile> {
        match self {
            Self::Bitget => Arc::new(BitgetProfile::new()),
            Self::Kucoin => Arc::new(KucoinProfile::new()),
            Self::Gate => Arc::new(GateProfile::new()),
        }
    }
}
