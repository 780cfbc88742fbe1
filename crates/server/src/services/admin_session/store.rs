//! Storage for admin sessions.
//!
//! The guard only talks to [`SessionStore`]; [`InMemorySessionStore`] is the
//! process-local implementation. Its sessions are lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// An active admin session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    /// When the token was minted.
    pub issued_at: DateTime<Utc>,
    /// Last successful authorization; the expiry window slides from here.
    pub last_seen: DateTime<Utc>,
}

impl AdminSession {
    /// A session minted at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            issued_at: now,
            last_seen: now,
        }
    }

    /// Whether the session has been idle longer than `timeout` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now.signed_duration_since(self.last_seen) > timeout
    }
}

/// Keyed session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by token.
    async fn get(&self, token: &str) -> Option<AdminSession>;

    /// Insert or replace a session.
    async fn put(&self, token: &str, session: AdminSession);

    /// Slide an active session's window to `now` in one step.
    ///
    /// Returns the refreshed session, or `None` if the token is unknown or
    /// expired. An expired session is evicted. A token that is gone is never
    /// recreated.
    async fn touch(
        &self,
        token: &str,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Option<AdminSession>;

    /// Remove a session, returning whether it existed.
    async fn remove(&self, token: &str) -> bool;

    /// Evict every session expired at `now`, returning how many were removed.
    async fn sweep(&self, now: DateTime<Utc>, timeout: Duration) -> usize;

    /// Number of stored sessions, expired or not.
    async fn len(&self) -> usize;

    /// Whether the store holds no sessions.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Session store backed by a concurrent in-memory map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, AdminSession>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> Option<AdminSession> {
        self.sessions.get(token).map(|entry| *entry.value())
    }

    async fn put(&self, token: &str, session: AdminSession) {
        self.sessions.insert(token.to_string(), session);
    }

    async fn touch(
        &self,
        token: &str,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Option<AdminSession> {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            if !entry.is_expired(now, timeout) {
                entry.last_seen = now.max(entry.last_seen);
                return Some(*entry);
            }
        }
        self.sessions
            .remove_if(token, |_, session| session.is_expired(now, timeout));
        None
    }

    async fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    async fn sweep(&self, now: DateTime<Utc>, timeout: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, timeout));
        before.saturating_sub(self.sessions.len())
    }

    async fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();

        assert!(store.get("t").await.is_none());
        store.put("t", AdminSession::new(now)).await;
        assert_eq!(store.get("t").await, Some(AdminSession::new(now)));
        assert!(store.remove("t").await);
        assert!(!store.remove("t").await);
    }

    #[tokio::test]
    async fn test_sweep_only_evicts_expired() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let timeout = Duration::hours(24);

        store.put("old", AdminSession::new(now - Duration::hours(25))).await;
        store.put("fresh", AdminSession::new(now - Duration::hours(1))).await;

        assert_eq!(store.sweep(now, timeout).await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_touch_slides_window() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let timeout = Duration::hours(24);
        store.put("t", AdminSession::new(now)).await;

        let later = now + Duration::hours(1);
        let session = store.touch("t", later, timeout).await;
        assert_eq!(session.map(|s| s.last_seen), Some(later));
        assert_eq!(store.get("t").await.map(|s| s.last_seen), Some(later));
    }

    #[tokio::test]
    async fn test_touch_never_recreates_missing_token() {
        let store = InMemorySessionStore::new();
        assert!(store.touch("gone", Utc::now(), Duration::hours(24)).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_touch_evicts_expired() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.put("old", AdminSession::new(now - Duration::hours(25))).await;

        assert!(store.touch("old", now, Duration::hours(24)).await.is_none());
        assert!(store.get("old").await.is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let timeout = Duration::hours(24);
        let session = AdminSession::new(now);

        assert!(!session.is_expired(now + timeout, timeout));
        assert!(session.is_expired(now + timeout + Duration::seconds(1), timeout));
    }
}
