//! In-memory session store.
//!
//! Single-process keyed storage for sessions. The controller holds this
//! behind the `SessionStore` port, so a multi-process deployment can swap in
//! an external keyed store without touching session logic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::TriageSession;
use crate::domain::ports::SessionStore;

/// Session store backed by an in-memory map.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, TriageSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: TriageSession) -> DomainResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(TriageError::Validation(format!(
                "session {} already exists",
                session.id
            )));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<TriageSession>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn update(&self, session: TriageSession) -> DomainResult<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(TriageError::SessionNotFound(session.id)),
        }
    }

    async fn remove(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PatientContext;

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let store = InMemorySessionStore::new();
        let session = TriageSession::new(PatientContext::new("fever"));
        let id = session.id;

        store.insert(session).await.unwrap();
        let fetched = store.get(id).await.unwrap().expect("session present");
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.patient.chief_complaint, "fever");
    }

    #[tokio::test]
    async fn test_double_insert_rejected() {
        let store = InMemorySessionStore::new();
        let session = TriageSession::new(PatientContext::new("fever"));
        store.insert(session.clone()).await.unwrap();
        assert!(store.insert(session).await.is_err());
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let store = InMemorySessionStore::new();
        let session = TriageSession::new(PatientContext::new("fever"));
        let err = store.update(session).await.unwrap_err();
        assert!(matches!(err, TriageError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_discards_state() {
        let store = InMemorySessionStore::new();
        let session = TriageSession::new(PatientContext::new("fever"));
        let id = session.id;
        store.insert(session).await.unwrap();

        assert!(store.remove(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
        assert!(!store.remove(id).await.unwrap());
    }
}
