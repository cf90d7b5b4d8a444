//! In-process session registry.
//!
//! Maps an opaque session identifier to an authenticated context so cart
//! operations can be attributed to a user without re-authenticating on every
//! call. Sessions are short-lived: expiry is enforced lazily at read time,
//! with an optional periodic [`sweep`](SessionRegistry::sweep) to bound
//! memory.
//!
//! Absence and expiry are indistinguishable to callers - `resolve` answers
//! "not found" for both, so the registry never discloses whether a session
//! ever existed.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

use nextshop_core::UserId;

/// An authenticated context correlating a caller's calls with a prior login.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque identifier the caller supplies on subsequent calls.
    pub session_id: String,
    /// Authenticated user's id.
    pub user_id: UserId,
    /// Authenticated user's name.
    pub username: String,
    /// Upstream credential token obtained at login.
    pub token: SecretString,
    /// Creation time; age beyond the registry's TTL means expiry.
    pub created_at: DateTime<Utc>,
}

/// Registry of live sessions, keyed by opaque session id.
pub struct SessionRegistry {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    /// Create a registry whose sessions expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Store a session, stamping the current time as creation time.
    /// Overwrites any prior session under the same id.
    pub fn create(&self, session_id: String, user_id: UserId, username: String, token: SecretString) {
        self.create_at(session_id, user_id, username, token, Utc::now());
    }

    /// Return the session if present and not expired.
    ///
    /// A session observed to be expired is removed as a side effect; the
    /// caller sees it as absent.
    #[must_use]
    pub fn resolve(&self, session_id: &str) -> Option<Session> {
        self.resolve_at(session_id, Utc::now())
    }

    /// Unconditional removal.
    pub fn destroy(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.remove(session_id);
    }

    /// Remove every expired session, returning how many were purged.
    ///
    /// Expiry is already enforced at read time; this exists only to bound
    /// memory held by sessions that are never looked up again.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Number of stored sessions, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.len()
    }

    /// Whether the registry holds no sessions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Internal clocked variants. Taking `now` explicitly keeps expiry
    // behavior deterministic under test.

    fn create_at(
        &self,
        session_id: String,
        user_id: UserId,
        username: String,
        token: SecretString,
        now: DateTime<Utc>,
    ) {
        let session = Session {
            session_id: session_id.clone(),
            user_id,
            username,
            token,
            created_at: now,
        };
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.insert(session_id, session);
    }

    fn resolve_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let session = sessions.get(session_id)?;
        if self.is_expired(session, now) {
            sessions.remove(session_id);
            return None;
        }
        Some(session.clone())
    }

    fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        before - sessions.len()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.created_at >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Duration::hours(24))
    }

    fn token() -> SecretString {
        SecretString::from("jwt-token")
    }

    #[test]
    fn test_create_then_resolve() {
        let registry = registry();
        registry.create("s1".to_string(), UserId::new(1), "johnd".to_string(), token());

        let session = registry.resolve("s1").expect("session should resolve");
        assert_eq!(session.user_id, UserId::new(1));
        assert_eq!(session.username, "johnd");
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        assert!(registry().resolve("nope").is_none());
    }

    #[test]
    fn test_create_overwrites_prior_session() {
        let registry = registry();
        registry.create("s1".to_string(), UserId::new(1), "johnd".to_string(), token());
        registry.create("s1".to_string(), UserId::new(2), "kevinryan".to_string(), token());

        let session = registry.resolve("s1").expect("session should resolve");
        assert_eq!(session.user_id, UserId::new(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_destroy_removes_session() {
        let registry = registry();
        registry.create("s1".to_string(), UserId::new(1), "johnd".to_string(), token());
        registry.destroy("s1");
        assert!(registry.resolve("s1").is_none());
    }

    #[test]
    fn test_session_resolvable_just_before_ttl() {
        let registry = registry();
        let created = Utc::now();
        registry.create_at("s1".to_string(), UserId::new(1), "johnd".to_string(), token(), created);

        let almost = created + Duration::hours(23) + Duration::minutes(59);
        assert!(registry.resolve_at("s1", almost).is_some());
    }

    #[test]
    fn test_session_expired_just_after_ttl() {
        let registry = registry();
        let created = Utc::now();
        registry.create_at("s1".to_string(), UserId::new(1), "johnd".to_string(), token(), created);

        let past = created + Duration::hours(24) + Duration::minutes(1);
        assert!(registry.resolve_at("s1", past).is_none());
        // Expiry at read time also removed the entry.
        assert!(registry.is_empty());
    }

    #[test]
    fn test_expired_resolve_indistinguishable_from_absent() {
        let registry = registry();
        let created = Utc::now();
        registry.create_at("gone".to_string(), UserId::new(1), "johnd".to_string(), token(), created);

        let past = created + Duration::hours(25);
        assert_eq!(
            registry.resolve_at("gone", past).is_none(),
            registry.resolve_at("never-existed", past).is_none()
        );
    }

    #[test]
    fn test_sweep_purges_only_expired() {
        let registry = registry();
        let created = Utc::now();
        registry.create_at("old".to_string(), UserId::new(1), "johnd".to_string(), token(), created);
        registry.create_at(
            "new".to_string(),
            UserId::new(2),
            "kevinryan".to_string(),
            token(),
            created + Duration::hours(20),
        );

        let purged = registry.sweep_at(created + Duration::hours(24));
        assert_eq!(purged, 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve_at("new", created + Duration::hours(24)).is_some());
    }
}
