//! Release Events
//!
//! A release event is a scheduled instant at which a new tradable symbol
//! becomes active on an exchange. Events are supplied by an external
//! discovery collaborator and are immutable once accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled listing going live at a known future instant.
///
/// One event drives exactly one capture-and-race run; the record is consumed
/// read-only and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    /// Exchange symbol of the pair going live.
    pub symbol: String,
    /// The instant the pair becomes tradable.
    pub target_instant: DateTime<Utc>,
    /// Tag identifying the discovery source that produced this event.
    pub discovered_from: String,
}

impl ReleaseEvent {
    /// Create a new release event.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        target_instant: DateTime<Utc>,
        discovered_from: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            target_instant,
            discovered_from: discovered_from.into(),
        }
    }

    /// Whether the target instant has already passed.
    ///
    /// A late-discovered event is still runnable; the capture window degrades
    /// to "first tick after now".
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.target_instant <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn event_is_past() {
        let now = Utc::now();
        let future = ReleaseEvent::new("NEWUSDT", now + TimeDelta::seconds(30), "announcement");
        let past = ReleaseEvent::new("NEWUSDT", now - TimeDelta::seconds(30), "announcement");

        assert!(!future.is_past(now));
        assert!(past.is_past(now));
    }

    #[test]
    fn event_serde_round_trip() {
        let event = ReleaseEvent::new("NEWUSDT", Utc::now(), "calendar-feed");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ReleaseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
