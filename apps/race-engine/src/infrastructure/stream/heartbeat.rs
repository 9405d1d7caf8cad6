//! Heartbeat Duty
//!
//! Issues a keepalive on a fixed period as a background task and flags the
//! connection for reconnect once two consecutive heartbeats go
//! unacknowledged.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Configuration for the heartbeat duty.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Period between keepalive frames.
    pub interval: Duration,
    /// Consecutive unacknowledged heartbeats tolerated before the
    /// connection is considered dead.
    pub max_missed: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_missed: 2,
        }
    }
}

/// Events emitted by the heartbeat duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatEvent {
    /// Request to send a keepalive frame.
    SendPing,
    /// Too many consecutive heartbeats unacknowledged; reconnect.
    Timeout,
}

/// Acknowledgement state shared between the duty and the read loop.
#[derive(Debug, Default)]
pub struct HeartbeatState {
    outstanding: AtomicU32,
}

impl HeartbeatState {
    /// Create fresh state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outstanding: AtomicU32::new(0),
        }
    }

    /// Record inbound activity; any frame from the server counts as an
    /// acknowledgement of liveness.
    pub fn record_ack(&self) {
        self.outstanding.store(0, Ordering::SeqCst);
    }

    /// Record that a keepalive was sent without an acknowledgement since the
    /// previous one.
    pub fn mark_ping_sent(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Keepalives currently unacknowledged.
    #[must_use]
    pub fn outstanding(&self) -> u32 {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Reset for a fresh connection.
    pub fn reset(&self) {
        self.outstanding.store(0, Ordering::SeqCst);
    }
}

/// Background task driving the keepalive period.
pub struct HeartbeatManager {
    config: HeartbeatConfig,
    state: Arc<HeartbeatState>,
    event_tx: mpsc::Sender<HeartbeatEvent>,
    cancel: CancellationToken,
}

impl HeartbeatManager {
    /// Create a manager.
    #[must_use]
    pub const fn new(
        config: HeartbeatConfig,
        state: Arc<HeartbeatState>,
        event_tx: mpsc::Sender<HeartbeatEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            state,
            event_tx,
            cancel,
        }
    }

    /// Run until cancelled or a timeout is detected.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("heartbeat duty cancelled");
                    return;
                }
                _ = interval.tick() => {
                    if self.state.outstanding() >= self.config.max_missed {
                        tracing::warn!(
                            missed = self.state.outstanding(),
                            "heartbeat timeout, flagging reconnect"
                        );
                        let _ = self.event_tx.send(HeartbeatEvent::Timeout).await;
                        return;
                    }
                    if self.event_tx.send(HeartbeatEvent::SendPing).await.is_err() {
                        tracing::debug!("heartbeat channel closed");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_counts_consecutive_misses() {
        let state = HeartbeatState::new();
        state.mark_ping_sent();
        state.mark_ping_sent();
        assert_eq!(state.outstanding(), 2);

        state.record_ack();
        assert_eq!(state.outstanding(), 0);
    }

    #[tokio::test]
    async fn manager_emits_ping_events() {
        let state = Arc::new(HeartbeatState::new());
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let manager = HeartbeatManager::new(
            HeartbeatConfig {
                interval: Duration::from_millis(20),
                max_missed: 2,
            },
            state,
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(manager.run());

        let event = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, HeartbeatEvent::SendPing);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn manager_times_out_after_two_misses() {
        let state = Arc::new(HeartbeatState::new());
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let manager = HeartbeatManager::new(
            HeartbeatConfig {
                interval: Duration::from_millis(10),
                max_missed: 2,
            },
            Arc::clone(&state),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(manager.run());

        // Never acknowledge; count pings until the duty gives up.
        let mut pings = 0;
        loop {
            let event = tokio::time::timeout(Duration::from_millis(500), rx.recv())
                .await
                .unwrap()
                .unwrap();
            match event {
                HeartbeatEvent::SendPing => {
                    state.mark_ping_sent();
                    pings += 1;
                }
                HeartbeatEvent::Timeout => break,
            }
        }

        assert_eq!(pings, 2);
        handle.await.unwrap();
        cancel.cancel();
    }

    #[tokio::test]
    async fn manager_keeps_going_while_acknowledged() {
        let state = Arc::new(HeartbeatState::new());
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let manager = HeartbeatManager::new(
            HeartbeatConfig {
                interval: Duration::from_millis(10),
                max_missed: 2,
            },
            Arc::clone(&state),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(manager.run());

        for _ in 0..5 {
            let event = tokio::time::timeout(Duration::from_millis(500), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event, HeartbeatEvent::SendPing);
            state.mark_ping_sent();
            state.record_ack();
        }

        cancel.cancel();
        handle.await.unwrap();
    }
}
