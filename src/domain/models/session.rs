//! Domain models for triage session management.
//!
//! Sessions own the ordered conversation history and the lifecycle state of
//! one triage encounter. A session is mutated only by the request handling
//! its current turn; callers must serialize turns per session id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::result::TriageAssessment;

/// Session lifecycle status.
///
/// Transitions ACTIVE -> COMPLETE exactly once; COMPLETE is terminal and no
/// further messages are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is gathering information and accepting messages.
    Active,
    /// Assessment finalized; session history is immutable.
    Complete,
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single conversation message. Ordering within a session is the
/// conversation ordering and is semantically significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Patient intake information supplied once at session creation.
///
/// Read-only for the engine; any correction happens through the intake layer
/// before a session starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub medical_history: String,
    pub chief_complaint: String,
}

impl PatientContext {
    pub fn new(chief_complaint: impl Into<String>) -> Self {
        Self {
            chief_complaint: chief_complaint.into(),
            ..Self::default()
        }
    }

    /// Render the intake fields for inclusion in a system instruction.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        if !self.name.is_empty() {
            lines.push(format!("Name: {}", self.name));
        }
        if let Some(age) = self.age {
            lines.push(format!("Age: {age}"));
        }
        if !self.gender.is_empty() {
            lines.push(format!("Gender: {}", self.gender));
        }
        if !self.medical_history.is_empty() {
            lines.push(format!("Medical history: {}", self.medical_history));
        }
        lines.push(format!("Chief complaint: {}", self.chief_complaint));
        lines.join("\n")
    }
}

/// One triage encounter: patient context, conversation history, and (once
/// complete) the final assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageSession {
    pub id: Uuid,
    pub patient: PatientContext,
    /// Append-only conversation history.
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub status: SessionStatus,
    /// Present if and only if `status == Complete`.
    pub result: Option<TriageAssessment>,
}

impl TriageSession {
    pub fn new(patient: PatientContext) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient,
            messages: Vec::new(),
            created_at: now,
            last_updated_at: now,
            status: SessionStatus::Active,
            result: None,
        }
    }

    /// Whether the session can still accept conversation messages.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Append a message to the history. The history is append-only; messages
    /// are never reordered or removed.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.last_updated_at = Utc::now();
    }

    /// Number of user turns taken so far.
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// The full conversation text (user and assistant turns), used for
    /// deterministic keyword scanning.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Transition to COMPLETE and store the final assessment.
    ///
    /// Errors with `SessionComplete` if the session already finished; the
    /// transition happens exactly once.
    pub fn complete(&mut self, result: TriageAssessment) -> DomainResult<()> {
        if self.status == SessionStatus::Complete {
            return Err(TriageError::SessionComplete(self.id));
        }
        self.status = SessionStatus::Complete;
        self.result = Some(result);
        self.last_updated_at = Utc::now();
        Ok(())
    }
}
