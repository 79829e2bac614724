//! Final triage assessment models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Urgency classification for a completed triage encounter.
///
/// Variants are ordered by severity so that a deterministic safety floor can
/// be applied with `max`: `Unknown < NonUrgent < SemiUrgent < Urgent <
/// Emergency`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    /// The assessment could not determine an urgency class.
    Unknown,
    /// Routine care within days.
    NonUrgent,
    /// Medical attention needed the same day.
    SemiUrgent,
    /// Prompt medical attention within hours.
    Urgent,
    /// Immediate medical attention, minutes matter.
    Emergency,
}

impl UrgencyLevel {
    /// Default care timeframe wording for this level, used when the model
    /// output does not supply one.
    pub fn default_timeframe(self) -> &'static str {
        match self {
            UrgencyLevel::Emergency => "Immediately - call emergency services now",
            UrgencyLevel::Urgent => "Within the next few hours",
            UrgencyLevel::SemiUrgent => "Today - same-day medical attention",
            UrgencyLevel::NonUrgent => "Within the next few days",
            UrgencyLevel::Unknown => "As soon as you can consult a clinician",
        }
    }

    /// Raise this level to at least `floor`.
    pub fn raised_to(self, floor: UrgencyLevel) -> UrgencyLevel {
        self.max(floor)
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrgencyLevel::Emergency => "EMERGENCY",
            UrgencyLevel::Urgent => "URGENT",
            UrgencyLevel::SemiUrgent => "SEMI_URGENT",
            UrgencyLevel::NonUrgent => "NON_URGENT",
            UrgencyLevel::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A reference text excerpt that grounded the final assessment, kept for
/// auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// True when the excerpt was cut to fit the context budget.
    #[serde(default)]
    pub truncated: bool,
}

/// The structured output of a completed triage session.
///
/// Created exactly once per session, at completion, and immutable afterward.
/// This is guidance about urgency and next steps, never a diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub urgency_level: UrgencyLevel,
    /// Specific action the patient should take.
    pub recommended_action: String,
    /// Timeframe for seeking care.
    pub timeframe: String,
    /// Explanation for the classification.
    pub reasoning: String,
    /// Information the conversation did not manage to gather.
    #[serde(default)]
    pub missing_information: Vec<String>,
    /// Symptoms that would warrant upgrading the urgency.
    #[serde(default)]
    pub warning_signs: Vec<String>,
    /// Statement about the limits of automated triage.
    pub disclaimer: String,
    /// Reference excerpts used in the final turn.
    #[serde(default)]
    pub sources: Vec<SourceAttribution>,
}

impl TriageAssessment {
    /// A conservative assessment used when finalization is forced without a
    /// confident completion signal.
    pub fn safe_default(
        urgency_level: UrgencyLevel,
        missing_information: Vec<String>,
    ) -> Self {
        Self {
            urgency_level,
            recommended_action:
                "Consult a healthcare provider to review your symptoms.".to_string(),
            timeframe: urgency_level.default_timeframe().to_string(),
            reasoning: "The conversation ended before a confident assessment could be made; \
                        a cautious classification was applied."
                .to_string(),
            missing_information,
            warning_signs: Vec::new(),
            disclaimer: DISCLAIMER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Canonical disclaimer attached to every assessment.
pub const DISCLAIMER: &str = "This is an automated triage recommendation, not a medical \
     diagnosis. Always seek professional medical advice for health concerns.";
