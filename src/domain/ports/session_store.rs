//! Session store port.
//!
//! Session state lives behind an explicit store handle passed into the
//! controller. The in-memory implementation covers a single process; a keyed
//! external store can replace it without touching the controller.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::TriageSession;

/// Keyed storage for triage sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a newly created session.
    async fn insert(&self, session: TriageSession) -> DomainResult<()>;

    /// Fetch a session by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<TriageSession>>;

    /// Persist the updated state of an existing session.
    async fn update(&self, session: TriageSession) -> DomainResult<()>;

    /// Discard a session without finalizing it. Returns false if the id was
    /// unknown.
    async fn remove(&self, id: Uuid) -> DomainResult<bool>;
}
