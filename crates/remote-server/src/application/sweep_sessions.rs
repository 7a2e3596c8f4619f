//! InactivitySweeper: periodic eviction of idle sessions.
//!
//! Runs on a fixed interval that is independent of traffic.  The first tick
//! fires one full interval after the server starts, never immediately.

use std::time::{Duration, Instant};

use remote_core::protocol::messages::error_text;
use remote_core::{ServerMessage, SessionStore};
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::warn;

use super::dispatch::Action;

/// Evicts sessions idle for longer than the configured timeout.
#[derive(Debug, Clone, Copy)]
pub struct InactivitySweeper {
    timeout: Duration,
    period: Duration,
}

impl InactivitySweeper {
    pub fn new(timeout: Duration, period: Duration) -> Self {
        Self { timeout, period }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the tick source for the server loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn ticker(&self) -> Interval {
        let start = tokio::time::Instant::now() + self.period;
        let mut ticker = interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Removes every session idle for longer than the timeout at `now` and
    /// returns a best-effort expiry notice for each evicted endpoint.
    pub fn sweep(&self, sessions: &mut SessionStore, now: Instant) -> Vec<Action> {
        sessions
            .evict_idle(now, self.timeout)
            .into_iter()
            .map(|session| {
                warn!(
                    endpoint = %session.endpoint,
                    idle_secs = session.idle_for(now).as_secs(),
                    "session expired due to inactivity"
                );
                Action::Send {
                    to: session.endpoint,
                    message: ServerMessage::error(error_text::SESSION_EXPIRED),
                }
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn endpoint() -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 7], 40000))
    }

    #[test]
    fn test_sweep_evicts_idle_session_and_notifies_it() {
        // Arrange
        let sweeper = InactivitySweeper::new(Duration::from_secs(600), Duration::from_secs(60));
        let mut store = SessionStore::default();
        let t0 = Instant::now();
        store.authenticate(endpoint(), t0).unwrap();

        // Act
        let actions = sweeper.sweep(&mut store, t0 + Duration::from_secs(601));

        // Assert
        assert!(store.is_empty());
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            Action::Send {
                to,
                message: ServerMessage::Error { message, .. },
            } => {
                assert_eq!(*to, endpoint());
                assert_eq!(message, error_text::SESSION_EXPIRED);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_sweep_keeps_recently_active_session() {
        let sweeper = InactivitySweeper::new(Duration::from_secs(600), Duration::from_secs(60));
        let mut store = SessionStore::default();
        let t0 = Instant::now();
        store.authenticate(endpoint(), t0).unwrap();

        let actions = sweeper.sweep(&mut store, t0 + Duration::from_secs(599));

        assert!(actions.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_full_period() {
        // Arrange
        let sweeper = InactivitySweeper::new(Duration::from_secs(600), Duration::from_secs(60));
        let started = tokio::time::Instant::now();
        let mut ticker = sweeper.ticker();

        // Act
        ticker.tick().await;

        // Assert: with the clock paused, time auto-advances exactly to the tick
        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }
}
