use reqwest::cookie::Jar;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Opaque cookie-affinity handle produced by the HTTP transport.
///
/// Cloning a session shares its cookie jar.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    jar: Arc<Jar>,
}

impl Session {
    /// Start a fresh session with an empty cookie jar.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            jar: Arc::new(Jar::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

/// Domain-keyed cache of live sessions.
///
/// The store never creates sessions; it keeps the one returned by the most
/// recent successful fetch to each domain. `put` replaces, so there is at
/// most one session per domain.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .cloned()
    }

    pub fn put(&self, domain: &str, session: Session) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = sessions.insert(domain.to_string(), session) {
            tracing::trace!(domain, replaced = %previous.id, "replaced session");
        }
    }

    pub fn remove(&self, domain: &str) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(domain)
    }

    /// Drop every cached session.
    pub fn clear(&self) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(count = sessions.len(), "clearing sessions");
        sessions.clear();
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let store = SessionStore::new();
        assert!(store.get("example.com").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_replaces() {
        let store = SessionStore::new();
        let first = Session::new();
        let second = Session::new();

        store.put("example.com", first.clone());
        store.put("example.com", second.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("example.com").map(|s| s.id()), Some(second.id()));
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_clear_and_remove() {
        let store = SessionStore::new();
        store.put("a.example", Session::new());
        store.put("b.example", Session::new());

        assert!(store.remove("a.example").is_some());
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
