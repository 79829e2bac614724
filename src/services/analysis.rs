//! Completion analysis.
//!
//! After each turn the analyzer asks the model whether enough information
//! has been gathered to finalize, expecting a fixed-shape JSON answer. A
//! malformed or failed analysis is a soft failure: the session stays active
//! and the caller sees a fallback outcome, never an error.

use serde::Deserialize;
use std::sync::Arc;

use crate::domain::models::{TriageSession, UrgencyLevel};
use crate::domain::ports::GenerationProvider;
use crate::services::vocabulary;

/// Note recorded when the analysis call itself could not produce a usable
/// answer.
pub const ANALYSIS_UNAVAILABLE: &str = "analysis unavailable";

/// The fixed shape requested from the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftAssessment {
    #[serde(default)]
    pub can_complete: bool,
    #[serde(default)]
    pub urgency_level: Option<String>,
    #[serde(default)]
    pub recommended_action: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub missing_information: Vec<String>,
    #[serde(default)]
    pub warning_signs: Vec<String>,
}

/// Result of one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    /// Whether the model judged the interview complete.
    pub can_complete: bool,
    /// The model's structured answer, absent on soft failure.
    pub draft: Option<DraftAssessment>,
    /// The deterministic urgency floor derived from the conversation text,
    /// independent of model output.
    pub floor: Option<UrgencyLevel>,
    /// Missing-information notes, from the model or from the fallback.
    pub missing_information: Vec<String>,
}

impl AnalysisOutcome {
    fn fallback(floor: Option<UrgencyLevel>) -> Self {
        Self {
            can_complete: false,
            draft: None,
            floor,
            missing_information: vec![ANALYSIS_UNAVAILABLE.to_string()],
        }
    }
}

const ANALYSIS_INSTRUCTION: &str = r#"Review the triage conversation so far and decide whether enough information has been gathered to finalize an urgency assessment.

Respond with a JSON object of exactly this shape:
{
  "can_complete": true or false,
  "urgency_level": "EMERGENCY" | "URGENT" | "SEMI_URGENT" | "NON_URGENT",
  "recommended_action": "specific action the patient should take",
  "timeframe": "timeframe for seeking care",
  "reasoning": "clinical reasoning for the classification",
  "missing_information": ["information still needed, if any"],
  "warning_signs": ["symptoms that would warrant upgrading urgency"]
}

Set can_complete to false if key information (onset, severity, duration, relevant history) is still missing. Never assert a diagnosis. When in doubt, assign the higher urgency level.

IMPORTANT: Output ONLY the JSON object, no other text."#;

/// Decides after each turn whether the session can finalize.
pub struct CompletionAnalyzer {
    generator: Arc<dyn GenerationProvider>,
}

impl CompletionAnalyzer {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self { generator }
    }

    /// Run one analysis pass over the session.
    ///
    /// The deterministic urgency floor is always computed from the
    /// transcript, even when the model call fails, so forced finalization
    /// still honors it.
    pub async fn analyze(&self, session: &TriageSession) -> AnalysisOutcome {
        let floor = vocabulary::urgency_floor(&session.transcript());

        let value = match self
            .generator
            .generate_structured("", &session.messages, ANALYSIS_INSTRUCTION)
            .await
        {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(session_id = %session.id, "Completion analysis failed: {err}");
                return AnalysisOutcome::fallback(floor);
            }
        };

        let draft: DraftAssessment = match serde_json::from_value(value) {
            Ok(draft) => draft,
            Err(err) => {
                tracing::warn!(
                    session_id = %session.id,
                    "Completion analysis returned an unexpected shape: {err}"
                );
                return AnalysisOutcome::fallback(floor);
            }
        };

        AnalysisOutcome {
            can_complete: draft.can_complete,
            missing_information: draft.missing_information.clone(),
            draft: Some(draft),
            floor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockGenerationProvider, MockReply};
    use crate::domain::models::{Message, PatientContext};

    fn session_with(user_text: &str) -> TriageSession {
        let mut session = TriageSession::new(PatientContext::new("test complaint"));
        session.append_message(Message::user(user_text));
        session
    }

    #[tokio::test]
    async fn test_parses_complete_answer() {
        let generator = Arc::new(MockGenerationProvider::with_script([MockReply::text(
            r#"{
                "can_complete": true,
                "urgency_level": "URGENT",
                "recommended_action": "Visit urgent care",
                "timeframe": "Within hours",
                "reasoning": "Persistent severe symptoms",
                "missing_information": [],
                "warning_signs": ["fainting"]
            }"#,
        )]));
        let analyzer = CompletionAnalyzer::new(generator);

        let outcome = analyzer.analyze(&session_with("bad stomach ache")).await;
        assert!(outcome.can_complete);
        let draft = outcome.draft.expect("draft present");
        assert_eq!(draft.urgency_level.as_deref(), Some("URGENT"));
        assert_eq!(draft.warning_signs, vec!["fainting"]);
    }

    #[tokio::test]
    async fn test_unparseable_output_soft_fails() {
        let generator = Arc::new(MockGenerationProvider::with_script([MockReply::text(
            "I would rather chat about this.",
        )]));
        let analyzer = CompletionAnalyzer::new(generator);

        let outcome = analyzer.analyze(&session_with("mild cough")).await;
        assert!(!outcome.can_complete);
        assert!(outcome.draft.is_none());
        assert_eq!(outcome.missing_information, vec![ANALYSIS_UNAVAILABLE]);
    }

    #[tokio::test]
    async fn test_provider_failure_soft_fails() {
        let generator =
            Arc::new(MockGenerationProvider::with_script([MockReply::failure("503")]));
        let analyzer = CompletionAnalyzer::new(generator);

        let outcome = analyzer.analyze(&session_with("mild cough")).await;
        assert!(!outcome.can_complete);
        assert_eq!(outcome.missing_information, vec![ANALYSIS_UNAVAILABLE]);
    }

    #[tokio::test]
    async fn test_floor_computed_even_on_failure() {
        let generator =
            Arc::new(MockGenerationProvider::with_script([MockReply::failure("503")]));
        let analyzer = CompletionAnalyzer::new(generator);

        let outcome = analyzer.analyze(&session_with("I can't breathe")).await;
        assert_eq!(outcome.floor, Some(UrgencyLevel::Urgent));
    }
}
