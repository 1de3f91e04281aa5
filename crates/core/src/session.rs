//! Bearer-token sessions.

use crate::constants::DEFAULT_SESSION_IDLE_SECS;
use crate::user_id::UserId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: UserId,
    pub issued_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn idle_since(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        (now - self.last_seen)
            .to_std()
            .is_ok_and(|idle| idle >= idle_timeout)
    }
}

/// Maps opaque tokens to signed-in accounts.
///
/// A session ends when it is revoked or when it has not been resolved for longer than the
/// idle timeout. Expired entries are dropped as they are found and by [`Self::prune_expired`].
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Start a session for `user` and return its token.
    pub fn issue(&self, user: &UserId) -> String {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &UserId, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions().insert(
            token.clone(),
            Session {
                user: user.clone(),
                issued_at: now,
                last_seen: now,
            },
        );
        token
    }

    /// The live session behind `token`. Resolving counts as activity.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        self.resolve_at(token, Utc::now())
    }

    fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.sessions();
        if sessions.get(token)?.idle_since(now, self.idle_timeout) {
            sessions.remove(token);
            tracing::debug!("session expired after idle timeout");
            return None;
        }
        let session = sessions.get_mut(token)?;
        session.last_seen = now;
        Some(session.clone())
    }

    /// Whether `token` names a live session, without counting as activity.
    pub fn is_active(&self, token: &str) -> bool {
        self.sessions()
            .get(token)
            .is_some_and(|s| !s.idle_since(Utc::now(), self.idle_timeout))
    }

    /// End a session. Returns the session that was removed, if any.
    pub fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions().remove(token)
    }

    /// End every session belonging to `user`.
    pub fn revoke_user(&self, user: &UserId) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, s| &s.user != user);
        before - sessions.len()
    }

    /// Drop every session idle past the timeout. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now())
    }

    fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, s| !s.idle_since(now, self.idle_timeout));
        before - sessions.len()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_resolve_until_revoked() {
        let registry = SessionRegistry::new();
        let user = UserId::new();
        let token = registry.issue(&user);

        assert_eq!(registry.resolve(&token).unwrap().user, user);
        assert!(registry.revoke(&token).is_some());
        assert!(registry.resolve(&token).is_none());
        assert!(registry.revoke(&token).is_none());
    }

    #[test]
    fn tokens_are_distinct_per_sign_in() {
        let registry = SessionRegistry::new();
        let user = UserId::new();
        let first = registry.issue(&user);
        let second = registry.issue(&user);

        assert_ne!(first, second);
        assert_eq!(registry.revoke_user(&user), 2);
        assert!(registry.resolve(&first).is_none());
    }

    #[test]
    fn idle_session_stops_resolving_and_is_removed() {
        let registry = SessionRegistry::with_idle_timeout(Duration::from_secs(60));
        let start = Utc::now();
        let token = registry.issue_at(&UserId::new(), start);

        let later = start + chrono::Duration::seconds(61);
        assert!(registry.resolve_at(&token, later).is_none());
        assert!(registry.revoke(&token).is_none());
    }

    #[test]
    fn resolving_keeps_a_session_alive() {
        let registry = SessionRegistry::with_idle_timeout(Duration::from_secs(60));
        let start = Utc::now();
        let token = registry.issue_at(&UserId::new(), start);

        let step = chrono::Duration::seconds(45);
        let seen = registry.resolve_at(&token, start + step).unwrap();
        assert_eq!(seen.issued_at, start);
        assert_eq!(seen.last_seen, start + step);
        assert!(registry.resolve_at(&token, start + step * 2).is_some());
    }

    #[test]
    fn prune_drops_only_idle_sessions() {
        let registry = SessionRegistry::with_idle_timeout(Duration::from_secs(60));
        let start = Utc::now();
        let stale = registry.issue_at(&UserId::new(), start);
        let fresh = registry.issue_at(&UserId::new(), start + chrono::Duration::seconds(50));

        assert_eq!(registry.prune_expired_at(start + chrono::Duration::seconds(70)), 1);
        assert!(registry.revoke(&stale).is_none());
        assert!(registry.revoke(&fresh).is_some());
    }
}
