//! Result formatter.
//!
//! Normalizes whatever the completion analysis produced into the canonical
//! assessment shape: urgency keyword mapping, timeframe and disclaimer
//! defaults, and source attachment for auditability. The formatter never
//! re-derives urgency from conversation text; the deterministic floor is
//! computed upstream and applied here on top of the normalized level.

use crate::domain::models::{TriageAssessment, UrgencyLevel, DISCLAIMER};
use crate::services::analysis::DraftAssessment;
use crate::services::retrieval::ContextSnippet;
use crate::services::vocabulary;

/// Reply shown when the interview hits the turn ceiling.
pub const TURN_LIMIT_NOTE: &str = "maximum interview length reached before a confident assessment";

pub struct ResultFormatter;

impl ResultFormatter {
    /// Build the final assessment from a model draft.
    pub fn format(
        draft: &DraftAssessment,
        floor: Option<UrgencyLevel>,
        sources: &[ContextSnippet],
    ) -> TriageAssessment {
        let parsed = draft
            .urgency_level
            .as_deref()
            .map_or(UrgencyLevel::Unknown, vocabulary::parse_urgency);
        let urgency_level = Self::apply_floor(parsed, floor);

        let recommended_action = draft
            .recommended_action
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                "Consult a healthcare provider to review your symptoms.".to_string()
            });
        let timeframe = draft
            .timeframe
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| urgency_level.default_timeframe().to_string());
        let reasoning = draft
            .reasoning
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "No reasoning was provided by the assessment.".to_string());

        TriageAssessment {
            urgency_level,
            recommended_action,
            timeframe,
            reasoning,
            missing_information: draft.missing_information.clone(),
            warning_signs: draft.warning_signs.clone(),
            disclaimer: DISCLAIMER.to_string(),
            sources: sources.iter().map(Into::into).collect(),
        }
    }

    /// Build the conservative assessment used when finalization is forced
    /// without a confident completion signal.
    pub fn forced(
        mut missing_information: Vec<String>,
        floor: Option<UrgencyLevel>,
        sources: &[ContextSnippet],
    ) -> TriageAssessment {
        missing_information.push(TURN_LIMIT_NOTE.to_string());

        let urgency_level = Self::apply_floor(UrgencyLevel::SemiUrgent, floor);
        let mut assessment = TriageAssessment::safe_default(urgency_level, missing_information);
        assessment.sources = sources.iter().map(Into::into).collect();
        assessment
    }

    fn apply_floor(level: UrgencyLevel, floor: Option<UrgencyLevel>) -> UrgencyLevel {
        match floor {
            Some(floor) => level.raised_to(floor),
            None => level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snippet(content: &str, source: &str) -> ContextSnippet {
        ContextSnippet {
            content: content.to_string(),
            source: source.to_string(),
            metadata: HashMap::new(),
            truncated: false,
        }
    }

    fn draft(urgency: Option<&str>) -> DraftAssessment {
        DraftAssessment {
            can_complete: true,
            urgency_level: urgency.map(String::from),
            recommended_action: Some("Visit urgent care".to_string()),
            timeframe: None,
            reasoning: Some("Symptoms warrant prompt review".to_string()),
            missing_information: vec![],
            warning_signs: vec!["fainting".to_string()],
        }
    }

    #[test]
    fn test_format_normalizes_urgency_and_defaults() {
        let sources = vec![snippet("Fever guidance", "CDC")];
        let assessment = ResultFormatter::format(&draft(Some("urgent")), None, &sources);

        assert_eq!(assessment.urgency_level, UrgencyLevel::Urgent);
        assert_eq!(assessment.timeframe, UrgencyLevel::Urgent.default_timeframe());
        assert_eq!(assessment.disclaimer, DISCLAIMER);
        assert_eq!(assessment.sources.len(), 1);
        assert_eq!(assessment.sources[0].source, "CDC");
    }

    #[test]
    fn test_floor_never_downgraded() {
        let assessment = ResultFormatter::format(
            &draft(Some("NON_URGENT")),
            Some(UrgencyLevel::Urgent),
            &[],
        );
        assert_eq!(assessment.urgency_level, UrgencyLevel::Urgent);

        // A higher model classification is kept
        let assessment = ResultFormatter::format(
            &draft(Some("EMERGENCY")),
            Some(UrgencyLevel::Urgent),
            &[],
        );
        assert_eq!(assessment.urgency_level, UrgencyLevel::Emergency);
    }

    #[test]
    fn test_unrecognized_urgency_is_unknown() {
        let assessment = ResultFormatter::format(&draft(Some("banana")), None, &[]);
        assert_eq!(assessment.urgency_level, UrgencyLevel::Unknown);

        let assessment = ResultFormatter::format(&draft(None), None, &[]);
        assert_eq!(assessment.urgency_level, UrgencyLevel::Unknown);
    }

    #[test]
    fn test_forced_defaults_to_semi_urgent_with_note() {
        let assessment =
            ResultFormatter::forced(vec!["symptom onset".to_string()], None, &[]);
        assert_eq!(assessment.urgency_level, UrgencyLevel::SemiUrgent);
        assert!(assessment
            .missing_information
            .iter()
            .any(|note| note == TURN_LIMIT_NOTE));
        assert!(assessment
            .missing_information
            .iter()
            .any(|note| note == "symptom onset"));
    }

    #[test]
    fn test_forced_respects_floor() {
        let assessment = ResultFormatter::forced(vec![], Some(UrgencyLevel::Urgent), &[]);
        assert_eq!(assessment.urgency_level, UrgencyLevel::Urgent);
    }
}
