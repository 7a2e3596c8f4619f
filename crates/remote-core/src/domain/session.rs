//! Per-endpoint sessions and the single-session policy.
//!
//! A [`Session`] exists only for an endpoint that has presented the correct
//! pairing code.  The [`SessionStore`] is the sole owner of all sessions; the
//! server's event loop owns the store, so no locking is needed.
//!
//! # Lifecycle
//!
//! ```text
//!                 AUTH(valid)
//! Unauthenticated ───────────► Authenticated ──┐ any accepted message
//!        ▲                         │   ▲       │ refreshes last_activity_at
//!        │   DISCONNECT            │   └───────┘
//!        │   inactivity eviction   │
//!        └── shutdown ─────────────┘
//! ```
//!
//! At most one endpoint is authenticated at a time.  What happens when a
//! second endpoint presents a valid code is decided by [`SessionPolicy`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a valid AUTH from a second endpoint is treated while a session is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPolicy {
    /// Keep the existing session; the newcomer is refused.
    #[default]
    Reject,
    /// Drop the existing session and authenticate the newcomer.
    Replace,
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(SessionPolicy::Reject),
            "replace" => Ok(SessionPolicy::Replace),
            other => Err(format!(
                "unknown session policy '{other}' (expected 'reject' or 'replace')"
            )),
        }
    }
}

/// Errors returned by [`SessionStore::authenticate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Another endpoint holds the only session slot and the policy is
    /// [`SessionPolicy::Reject`].
    #[error("session slot is held by {holder}")]
    SlotTaken { holder: SocketAddr },
}

/// What a successful [`SessionStore::authenticate`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthGrant {
    /// A new session was created for a previously unknown endpoint.
    Created,
    /// The endpoint already had a session; its activity time was reset.
    Refreshed,
    /// The listed sessions were dropped to make room for the new one.
    Replaced { previous: Vec<SocketAddr> },
}

/// Authenticated state bound to one client endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub endpoint: SocketAddr,
    pub authenticated: bool,
    pub authenticated_at: Instant,
    pub last_activity_at: Instant,
}

impl Session {
    fn new(endpoint: SocketAddr, now: Instant) -> Self {
        Self {
            endpoint,
            authenticated: true,
            authenticated_at: now,
            last_activity_at: now,
        }
    }

    /// Time since the last accepted message, saturating at zero if `now` is
    /// earlier than the recorded activity.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity_at)
    }
}

/// Owner of every live [`Session`], keyed by endpoint.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SocketAddr, Session>,
    policy: SessionPolicy,
}

impl SessionStore {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            sessions: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Records a successful pairing-code check for `endpoint`.
    ///
    /// The caller has already verified the code; this only applies the
    /// single-session policy and updates the store.
    ///
    /// # Errors
    ///
    /// [`SessionError::SlotTaken`] if another endpoint is authenticated and
    /// the policy is [`SessionPolicy::Reject`].  The store is unchanged.
    pub fn authenticate(
        &mut self,
        endpoint: SocketAddr,
        now: Instant,
    ) -> Result<AuthGrant, SessionError> {
        if let Some(existing) = self.sessions.get_mut(&endpoint) {
            existing.last_activity_at = now;
            return Ok(AuthGrant::Refreshed);
        }

        let others: Vec<SocketAddr> = self.sessions.keys().copied().collect();
        if others.is_empty() {
            self.sessions.insert(endpoint, Session::new(endpoint, now));
            return Ok(AuthGrant::Created);
        }

        match self.policy {
            SessionPolicy::Reject => Err(SessionError::SlotTaken { holder: others[0] }),
            SessionPolicy::Replace => {
                self.sessions.clear();
                self.sessions.insert(endpoint, Session::new(endpoint, now));
                Ok(AuthGrant::Replaced { previous: others })
            }
        }
    }

    pub fn is_authenticated(&self, endpoint: &SocketAddr) -> bool {
        self.sessions
            .get(endpoint)
            .is_some_and(|session| session.authenticated)
    }

    /// Sets `last_activity_at = now` for `endpoint`.  Returns `false` if the
    /// endpoint has no session.
    pub fn touch(&mut self, endpoint: &SocketAddr, now: Instant) -> bool {
        match self.sessions.get_mut(endpoint) {
            Some(session) => {
                session.last_activity_at = now;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, endpoint: &SocketAddr) -> Option<&Session> {
        self.sessions.get(endpoint)
    }

    /// Removes the session for `endpoint`.  Removing an unknown endpoint is a
    /// no-op that returns `None`.
    pub fn remove(&mut self, endpoint: &SocketAddr) -> Option<Session> {
        self.sessions.remove(endpoint)
    }

    /// Removes and returns every session idle for strictly longer than
    /// `timeout` at `now`.
    pub fn evict_idle(&mut self, now: Instant, timeout: Duration) -> Vec<Session> {
        let expired: Vec<SocketAddr> = self
            .sessions
            .values()
            .filter(|session| session.idle_for(now) > timeout)
            .map(|session| session.endpoint)
            .collect();

        expired
            .iter()
            .filter_map(|endpoint| self.sessions.remove(endpoint))
            .collect()
    }

    /// Removes and returns all sessions.  Used on shutdown.
    pub fn drain(&mut self) -> Vec<Session> {
        self.sessions.drain().map(|(_, session)| session).collect()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &SocketAddr> {
        self.sessions.keys()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
