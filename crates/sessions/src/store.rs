use std::collections::HashMap;

use {
    chrono::{DateTime, Duration, Utc},
    serde::{Deserialize, Serialize},
    tokio::sync::RwLock,
    tracing::debug,
};

// ── Turns ────────────────────────────────────────────────────────────────────

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Session {
    history: Vec<Turn>,
    last_activity: DateTime<Utc>,
}

impl Session {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            history: Vec::new(),
            last_activity: now,
        }
    }
}

/// Read-only view of one session for inspection endpoints.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: String,
    pub history_len: usize,
    pub last_activity: DateTime<Utc>,
    /// Text of the most recent turn, if any.
    pub last_text: Option<String>,
}

/// Retention limits for the store.
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    /// Raw history entries kept per session; the oldest are dropped first.
    /// Truncation operates on entries, not user/model pairs, so a pair may
    /// be split at the boundary.
    pub max_history: usize,
    /// Idle time after which a session is eligible for sweeping.
    pub idle_expiry: Duration,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_history: 20,
            idle_expiry: Duration::minutes(30),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// In-memory session map, constructed once at startup and shared via `Arc`.
///
/// No per-session serialization is enforced: a handler snapshots history
/// and appends later, so two concurrent requests for the same id may
/// interleave between read and write. Accepted limitation.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    limits: StoreLimits,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

impl SessionStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            limits,
        }
    }

    /// Ensure a session exists for `id`, creating an empty one if unseen.
    /// Does not update `last_activity` for an existing session.
    pub async fn get_or_create(&self, id: &str) {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(id) {
            debug!(session = id, "created new session");
            sessions.insert(id.to_string(), Session::empty(Utc::now()));
        }
    }

    /// Set `last_activity` to now.
    pub async fn touch(&self, id: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.last_activity = Utc::now();
        }
    }

    /// Append one turn, keeping only the most recent `max_history` entries.
    /// Creates the session if absent (a sweep may have removed it while a
    /// request against the same id was in flight).
    pub async fn append_turn(&self, id: &str, role: Role, text: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::empty(Utc::now()));
        session.history.push(Turn::new(role, text));
        let len = session.history.len();
        if len > self.limits.max_history {
            session.history.drain(..len - self.limits.max_history);
        }
    }

    /// Cloned history snapshot; empty if the session does not exist.
    pub async fn history(&self, id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    /// Remove a session. No-op if absent.
    pub async fn clear(&self, id: &str) {
        if self.sessions.write().await.remove(id).is_some() {
            debug!(session = id, "cleared session");
        }
    }

    /// Remove every session idle longer than `idle_expiry` as of `now`.
    /// Returns the number of sessions removed.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_activity <= self.limits.idle_expiry);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Snapshots of all sessions, for the debug endpoint.
    pub async fn list(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, s)| SessionSnapshot {
                id: id.clone(),
                history_len: s.history.len(),
                last_activity: s.last_activity,
                last_text: s.history.last().map(|t| t.text.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unseen_id_yields_empty_history() {
        let store = SessionStore::default();
        store.get_or_create("s1").await;
        assert!(store.history("s1").await.is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn history_truncates_to_most_recent() {
        let store = SessionStore::new(StoreLimits {
            max_history: 20,
            ..StoreLimits::default()
        });
        for i in 0..25 {
            store.append_turn("s1", Role::User, format!("msg-{i}")).await;
        }
        let history = store.history("s1").await;
        assert_eq!(history.len(), 20);
        // Most recent 20 entries, in original order.
        assert_eq!(history[0].text, "msg-5");
        assert_eq!(history[19].text, "msg-24");
    }

    #[tokio::test]
    async fn truncation_may_split_a_pair() {
        let store = SessionStore::new(StoreLimits {
            max_history: 3,
            ..StoreLimits::default()
        });
        store.append_turn("s1", Role::User, "q1").await;
        store.append_turn("s1", Role::Model, "a1").await;
        store.append_turn("s1", Role::User, "q2").await;
        store.append_turn("s1", Role::Model, "a2").await;
        let history = store.history("s1").await;
        // "q1" dropped; window starts mid-pair with the model reply.
        assert_eq!(history[0], Turn::new(Role::Model, "a1"));
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn clear_absent_is_noop() {
        let store = SessionStore::default();
        store.clear("never-seen").await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn clear_removes_session() {
        let store = SessionStore::default();
        store.append_turn("s1", Role::User, "hi").await;
        store.clear("s1").await;
        assert!(store.history("s1").await.is_empty());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let store = SessionStore::default();
        store.get_or_create("old").await;
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        store.get_or_create("fresh").await;

        // A clock just past "old" + 30min expires "old" but not "fresh",
        // which was created ~200ms later.
        let cutoff = Utc::now() + Duration::minutes(30) - Duration::milliseconds(100);
        assert_eq!(store.sweep(cutoff).await, 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.list().await[0].id, "fresh");

        // Well past both: everything goes.
        assert_eq!(store.sweep(Utc::now() + Duration::minutes(31)).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_expiry_is_strictly_greater_than_threshold() {
        let store = SessionStore::default();
        store.get_or_create("s1").await;
        let created = store.list().await[0].last_activity;

        // Exactly 30 minutes idle is not yet expired.
        assert_eq!(store.sweep(created + Duration::minutes(30)).await, 0);
        assert_eq!(store.len().await, 1);

        // One tick past the threshold is.
        let just_past = created + Duration::minutes(30) + Duration::milliseconds(1);
        assert_eq!(store.sweep(just_past).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn touch_defers_expiry() {
        let store = SessionStore::default();
        store.get_or_create("s1").await;
        store.touch("s1").await;
        assert_eq!(store.sweep(Utc::now() + Duration::minutes(29)).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_reports_preview() {
        let store = SessionStore::default();
        store.append_turn("s1", Role::User, "question").await;
        store.append_turn("s1", Role::Model, "answer").await;
        let list = store.list().await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "s1");
        assert_eq!(list[0].history_len, 2);
        assert_eq!(list[0].last_text.as_deref(), Some("answer"));
    }
}
