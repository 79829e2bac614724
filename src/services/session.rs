//! Triage session controller.
//!
//! The state machine at the core of the engine: owns conversation history,
//! retrieves grounding context each turn, drives the generation provider,
//! runs completion analysis, and finalizes the structured assessment. A
//! session accepts at most one in-flight turn at a time; callers serialize
//! `submit_message` per session id.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainResult, TriageError};
use crate::domain::models::{
    Message, PatientContext, SessionConfig, TriageAssessment, TriageSession,
};
use crate::domain::ports::{GenerationProvider, SessionStore};
use crate::services::analysis::CompletionAnalyzer;
use crate::services::formatter::ResultFormatter;
use crate::services::retrieval::RetrievalEngine;

/// Fixed safety policy embedded in every system instruction.
const SAFETY_POLICY: &str = "\
You are a medical triage assistant conducting a symptom interview.

Rules you must always follow:
- Never assert or suggest a diagnosis; you assess urgency only.
- If anything indicates a life-threatening condition, escalate immediately \
and advise calling emergency services.
- Classify urgency into exactly one of: EMERGENCY, URGENT, SEMI_URGENT, \
NON_URGENT.
- Ground your questions and guidance in the reference material provided \
below when it is relevant; do not invent medical facts beyond it.
- Ask one focused follow-up question at a time, in plain language.";

/// Reply shown when the generation provider is unavailable for a turn.
const APOLOGY_REPLY: &str = "I'm sorry - I'm having trouble processing that right now. \
     Could you say that again in a moment?";

/// Outcome of one `submit_message` call.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant utterance to show the user.
    pub reply: String,
    /// Whether the session finalized on this turn.
    pub complete: bool,
    /// The assessment, present when `complete` is true.
    pub result: Option<TriageAssessment>,
}

/// Outcome of `create_session`.
#[derive(Debug, Clone)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub opening_question: String,
}

/// Multi-turn triage conversation controller.
pub struct TriageController {
    store: Arc<dyn SessionStore>,
    retrieval: Arc<RetrievalEngine>,
    generator: Arc<dyn GenerationProvider>,
    analyzer: CompletionAnalyzer,
    config: SessionConfig,
}

impl TriageController {
    pub fn new(
        store: Arc<dyn SessionStore>,
        retrieval: Arc<RetrievalEngine>,
        generator: Arc<dyn GenerationProvider>,
        config: SessionConfig,
    ) -> Self {
        let analyzer = CompletionAnalyzer::new(Arc::clone(&generator));
        Self {
            store,
            retrieval,
            generator,
            analyzer,
            config,
        }
    }

    /// Start a new session and produce the opening question.
    ///
    /// The session is created even if the opening generation call fails;
    /// in that case a canned question referencing the chief complaint is
    /// used and the degradation is logged.
    pub async fn create_session(&self, patient: PatientContext) -> DomainResult<SessionCreated> {
        if patient.chief_complaint.trim().is_empty() {
            return Err(TriageError::Validation(
                "chief complaint must not be empty".to_string(),
            ));
        }

        let mut session = TriageSession::new(patient);
        let system_prompt = Self::system_prompt(&session.patient, "");
        session.append_message(Message::system(system_prompt.clone()));

        let intake = Message::user(format!(
            "Patient intake:\n{}\n\nPlease ask your first triage question.",
            session.patient.summary()
        ));

        let opening_question = match self
            .generator
            .generate(&system_prompt, std::slice::from_ref(&intake))
            .await
        {
            Ok(question) => question,
            Err(err) => {
                tracing::warn!(
                    session_id = %session.id,
                    "Opening question generation failed, using canned question: {err}"
                );
                format!(
                    "I'm sorry you're dealing with \"{}\". To get started: when did this \
                     begin, and how severe is it right now?",
                    session.patient.chief_complaint
                )
            }
        };

        session.append_message(Message::assistant(opening_question.clone()));
        let session_id = session.id;
        self.store.insert(session).await?;

        tracing::info!(session_id = %session_id, "Created triage session");
        Ok(SessionCreated {
            session_id,
            opening_question,
        })
    }

    /// Process one user turn.
    ///
    /// Appends the user message, refreshes the grounding context, generates
    /// the next assistant utterance, and runs completion analysis. Returns
    /// either the next question or, once the analysis signals completion
    /// (or the turn ceiling is hit), the final assessment.
    pub async fn submit_message(
        &self,
        session_id: Uuid,
        user_text: &str,
    ) -> DomainResult<TurnOutcome> {
        if user_text.trim().is_empty() {
            return Err(TriageError::Validation(
                "message must not be empty".to_string(),
            ));
        }

        let mut session = self
            .store
            .get(session_id)
            .await?
            .ok_or(TriageError::SessionNotFound(session_id))?;

        if !session.is_active() {
            return Err(TriageError::SessionComplete(session_id));
        }

        session.append_message(Message::user(user_text));

        // The system instruction is refreshed per turn so later turns get
        // better-targeted context.
        let retrieved = self
            .retrieval
            .retrieve(user_text, &session.messages, None)
            .await;
        let snippets = self.retrieval.truncate_to_budget(&retrieved);
        let context_block = RetrievalEngine::format_context(&snippets);
        let system_prompt = Self::system_prompt(&session.patient, &context_block);

        let (reply, degraded) = match self
            .generator
            .generate(&system_prompt, &session.messages)
            .await
        {
            Ok(reply) => (reply, false),
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    "Generation failed after retries, degrading turn: {err}"
                );
                (APOLOGY_REPLY.to_string(), true)
            }
        };
        session.append_message(Message::assistant(reply.clone()));

        let at_ceiling = session.user_turns() >= self.config.max_user_turns;

        // A turn whose generation already failed skips analysis unless the
        // ceiling forces finalization anyway.
        let outcome = if degraded && !at_ceiling {
            self.store.update(session).await?;
            return Ok(TurnOutcome {
                reply,
                complete: false,
                result: None,
            });
        } else {
            self.analyzer.analyze(&session).await
        };

        let result = if outcome.can_complete {
            outcome
                .draft
                .as_ref()
                .map(|draft| ResultFormatter::format(draft, outcome.floor, &snippets))
        } else {
            None
        };

        let result = match (result, at_ceiling) {
            (Some(assessment), _) => Some(assessment),
            (None, true) => {
                tracing::info!(
                    session_id = %session_id,
                    "Turn ceiling of {} reached, forcing finalization",
                    self.config.max_user_turns
                );
                match &outcome.draft {
                    // The model produced a usable draft without a completion
                    // signal; finalize from it rather than discarding it.
                    Some(draft) if draft.urgency_level.is_some() => {
                        Some(ResultFormatter::format(draft, outcome.floor, &snippets))
                    }
                    _ => Some(ResultFormatter::forced(
                        outcome.missing_information.clone(),
                        outcome.floor,
                        &snippets,
                    )),
                }
            }
            (None, false) => None,
        };

        match result {
            Some(assessment) => {
                session.complete(assessment.clone())?;
                self.store.update(session).await?;
                tracing::info!(
                    session_id = %session_id,
                    urgency = %assessment.urgency_level,
                    "Session finalized"
                );
                Ok(TurnOutcome {
                    reply,
                    complete: true,
                    result: Some(assessment),
                })
            }
            None => {
                self.store.update(session).await?;
                Ok(TurnOutcome {
                    reply,
                    complete: false,
                    result: None,
                })
            }
        }
    }

    /// Fetch the final assessment, or `None` while the session is active.
    pub async fn get_result(&self, session_id: Uuid) -> DomainResult<Option<TriageAssessment>> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or(TriageError::SessionNotFound(session_id))?;
        Ok(session.result)
    }

    /// Discard a session without finalizing a result.
    pub async fn abandon(&self, session_id: Uuid) -> DomainResult<()> {
        if self.store.remove(session_id).await? {
            tracing::info!(session_id = %session_id, "Session abandoned");
            Ok(())
        } else {
            Err(TriageError::SessionNotFound(session_id))
        }
    }

    fn system_prompt(patient: &PatientContext, context_block: &str) -> String {
        let mut prompt = format!("{SAFETY_POLICY}\n\nPatient intake:\n{}", patient.summary());
        if !context_block.is_empty() {
            prompt.push_str("\n\nReference material:\n");
            prompt.push_str(context_block);
        }
        prompt
    }

    /// The retrieval engine behind this controller; exposed for the debug
    /// CLI.
    pub fn retrieval_engine(&self) -> &RetrievalEngine {
        self.retrieval.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockEmbeddingProvider, MockGenerationProvider, MockReply};
    use crate::domain::models::RetrievalConfig;
    use crate::domain::ports::EmbeddingProvider;
    use crate::infrastructure::store::InMemorySessionStore;
    use crate::infrastructure::vector::VectorIndex;

    fn controller_with(generator: Arc<MockGenerationProvider>) -> TriageController {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(8));
        let retrieval = Arc::new(RetrievalEngine::new(
            embedder,
            Arc::new(VectorIndex::new(8)),
            RetrievalConfig::default(),
        ));
        TriageController::new(
            Arc::new(InMemorySessionStore::new()),
            retrieval,
            generator,
            SessionConfig::default(),
        )
    }

    fn incomplete_analysis() -> MockReply {
        MockReply::text(r#"{"can_complete": false, "missing_information": ["duration"]}"#)
    }

    fn complete_analysis(urgency: &str) -> MockReply {
        MockReply::text(format!(
            r#"{{
                "can_complete": true,
                "urgency_level": "{urgency}",
                "recommended_action": "Seek care",
                "timeframe": "Within hours",
                "reasoning": "test",
                "missing_information": [],
                "warning_signs": []
            }}"#
        ))
    }

    #[tokio::test]
    async fn test_create_session_rejects_empty_complaint() {
        let controller = controller_with(Arc::new(MockGenerationProvider::new()));
        let err = controller
            .create_session(PatientContext::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_session_canned_question_on_failure() {
        let generator = Arc::new(MockGenerationProvider::with_script([MockReply::failure(
            "exhausted",
        )]));
        let controller = controller_with(generator);

        let created = controller
            .create_session(PatientContext::new("chest pain"))
            .await
            .unwrap();
        assert!(created.opening_question.contains("chest pain"));
    }

    #[tokio::test]
    async fn test_submit_to_unknown_session() {
        let controller = controller_with(Arc::new(MockGenerationProvider::new()));
        let err = controller
            .submit_message(Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_full_turn_then_completion() {
        let generator = Arc::new(MockGenerationProvider::with_script([
            MockReply::text("When did the pain start?"),
            MockReply::text("How severe is it on a scale of 1 to 10?"),
            incomplete_analysis(),
            MockReply::text("Thank you, finalizing."),
            complete_analysis("URGENT"),
        ]));
        let controller = controller_with(generator);

        let created = controller
            .create_session(PatientContext::new("stomach pain"))
            .await
            .unwrap();
        assert_eq!(created.opening_question, "When did the pain start?");

        let turn = controller
            .submit_message(created.session_id, "It started last night")
            .await
            .unwrap();
        assert!(!turn.complete);
        assert!(turn.result.is_none());

        let turn = controller
            .submit_message(created.session_id, "It's about a seven")
            .await
            .unwrap();
        assert!(turn.complete);
        let result = turn.result.expect("result present");
        assert_eq!(result.urgency_level.to_string(), "URGENT");

        // get_result returns the stored assessment afterwards
        let stored = controller.get_result(created.session_id).await.unwrap();
        assert!(stored.is_some());

        // Further submissions fail without mutating state
        let err = controller
            .submit_message(created.session_id, "one more thing")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::SessionComplete(_)));
    }

    #[tokio::test]
    async fn test_degraded_turn_keeps_session_active() {
        let generator = Arc::new(MockGenerationProvider::with_script([
            MockReply::text("Opening question?"),
            MockReply::failure("provider down"),
        ]));
        let controller = controller_with(generator);

        let created = controller
            .create_session(PatientContext::new("rash"))
            .await
            .unwrap();
        let turn = controller
            .submit_message(created.session_id, "it itches")
            .await
            .unwrap();

        assert!(!turn.complete);
        assert_eq!(turn.reply, APOLOGY_REPLY);
        assert!(controller
            .get_result(created.session_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_turn_ceiling_forces_finalization() {
        let generator = Arc::new(MockGenerationProvider::new());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(8));
        let retrieval = Arc::new(RetrievalEngine::new(
            embedder,
            Arc::new(VectorIndex::new(8)),
            RetrievalConfig::default(),
        ));
        let controller = TriageController::new(
            Arc::new(InMemorySessionStore::new()),
            retrieval,
            Arc::clone(&generator) as Arc<dyn GenerationProvider>,
            SessionConfig { max_user_turns: 2 },
        );

        generator.push(MockReply::text("Opening question?"));
        let created = controller
            .create_session(PatientContext::new("mild headache"))
            .await
            .unwrap();

        generator.push(MockReply::text("Tell me more."));
        generator.push(incomplete_analysis());
        let turn = controller
            .submit_message(created.session_id, "started today")
            .await
            .unwrap();
        assert!(!turn.complete);

        generator.push(MockReply::text("Anything else?"));
        generator.push(incomplete_analysis());
        let turn = controller
            .submit_message(created.session_id, "no other symptoms")
            .await
            .unwrap();

        assert!(turn.complete);
        let result = turn.result.expect("forced result");
        assert_eq!(result.urgency_level.to_string(), "SEMI_URGENT");
        assert!(result
            .missing_information
            .iter()
            .any(|note| note.contains("maximum interview length")));
    }

    #[tokio::test]
    async fn test_abandon_discards_without_result() {
        let generator = Arc::new(MockGenerationProvider::with_script([MockReply::text(
            "Opening question?",
        )]));
        let controller = controller_with(generator);

        let created = controller
            .create_session(PatientContext::new("cough"))
            .await
            .unwrap();
        controller.abandon(created.session_id).await.unwrap();

        let err = controller
            .get_result(created.session_id)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::SessionNotFound(_)));

        let err = controller.abandon(created.session_id).await.unwrap_err();
        assert!(matches!(err, TriageError::SessionNotFound(_)));
    }
}
