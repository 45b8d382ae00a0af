//! Server-side session data keyed by the session cookie value.
//!
//! Entries are created on first write, so anonymous requests that never
//! touch their session leave nothing behind. Idle entries expire after the
//! store's TTL and are dropped by [`SessionStore::purge_expired`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// Matches the two-week cookie age of the web sessions.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }
}

#[derive(Debug, Clone)]
struct SessionData {
    visits: u64,
    notices: Vec<Notice>,
    last_seen: Instant,
}

impl Default for SessionData {
    fn default() -> Self {
        Self { visits: 0, notices: Vec::new(), last_seen: Instant::now() }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionData>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self { Self::with_ttl(DEFAULT_SESSION_TTL) }
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { inner: Arc::new(DashMap::new()), ttl }
    }

    /// Mint an unused key. Nothing is stored until the session is written.
    pub fn new_key() -> String { Uuid::new_v4().simple().to_string() }

    /// True for a stored session that has not outlived the TTL.
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .get(key)
            .map(|d| d.last_seen.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }

    /// Count one more visit; the first call for a session yields 1.
    pub fn bump_visits(&self, key: &str) -> u64 {
        let mut entry = self.inner.entry(key.to_string()).or_default();
        entry.visits += 1;
        entry.last_seen = Instant::now();
        entry.visits
    }

    pub fn visits(&self, key: &str) -> u64 {
        self.inner.get(key).map(|d| d.visits).unwrap_or(0)
    }

    pub fn push_notice(&self, key: &str, notice: Notice) {
        let mut entry = self.inner.entry(key.to_string()).or_default();
        entry.notices.push(notice);
        entry.last_seen = Instant::now();
    }

    /// Drain queued notices; a second call returns nothing.
    pub fn take_notices(&self, key: &str) -> Vec<Notice> {
        self.inner
            .get_mut(key)
            .map(|mut d| {
                d.last_seen = Instant::now();
                std::mem::take(&mut d.notices)
            })
            .unwrap_or_default()
    }

    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }

    /// Drop every session idle for longer than the TTL; returns how many went.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        let ttl = self.ttl;
        self.inner.retain(|_, d| d.last_seen.elapsed() < ttl);
        before.saturating_sub(self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visit_is_one() {
        let store = SessionStore::new();
        let key = SessionStore::new_key();
        assert_eq!(store.visits(&key), 0);
        assert_eq!(store.bump_visits(&key), 1);
        assert_eq!(store.bump_visits(&key), 2);
    }

    #[test]
    fn notices_are_drained_once() {
        let store = SessionStore::new();
        let key = SessionStore::new_key();
        store.push_notice(&key, Notice::success("Car saved"));
        assert_eq!(store.take_notices(&key), vec![Notice::success("Car saved")]);
        assert!(store.take_notices(&key).is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = SessionStore::new_key();
        let b = SessionStore::new_key();
        store.bump_visits(&a);
        store.bump_visits(&a);
        assert_eq!(store.bump_visits(&b), 1);
        store.remove(&a);
        assert!(!store.contains(&a));
        assert!(store.contains(&b));
    }

    #[test]
    fn reads_do_not_allocate_sessions() {
        let store = SessionStore::new();
        for _ in 0..100 {
            let key = SessionStore::new_key();
            assert!(!store.contains(&key));
            assert_eq!(store.visits(&key), 0);
            assert!(store.take_notices(&key).is_empty());
        }
        assert!(store.is_empty());
    }

    #[test]
    fn idle_sessions_expire_and_are_purged() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        let key = SessionStore::new_key();
        store.bump_visits(&key);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&key));
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());

        let live = SessionStore::new();
        let key = SessionStore::new_key();
        live.push_notice(&key, Notice::success("kept"));
        assert_eq!(live.purge_expired(), 0);
        assert!(live.contains(&key));
    }
}
