//! Versioned medical vocabulary tables.
//!
//! All keyword-driven behavior in the engine (query expansion, entity
//! recognition, the deterministic urgency floor) reads from these tables and
//! nowhere else, so tests can enumerate exact coverage. Matching is
//! case-insensitive substring matching against the lowercased input; there
//! is no claim of full NLP here.

use crate::domain::models::UrgencyLevel;

/// Bump when any table below changes.
pub const VOCABULARY_VERSION: u32 = 1;

/// Maximum of the patient-facing severity self-rating scale.
pub const SEVERITY_SCALE_MAX: u32 = 10;

/// Aggregate symptom-severity score at which the urgency floor engages.
pub const AGGREGATE_SEVERITY_THRESHOLD: u32 = 15;

/// Lay-term to clinical-term expansions applied to retrieval queries.
/// Expansion is additive; the original text always comes first.
pub const SYNONYMS: &[(&str, &[&str])] = &[
    ("heart attack", &["myocardial infarction"]),
    ("stroke", &["cerebrovascular accident"]),
    ("high blood pressure", &["hypertension"]),
    ("low blood pressure", &["hypotension"]),
    ("flu", &["influenza"]),
    ("shortness of breath", &["dyspnea"]),
    ("throwing up", &["vomiting", "emesis"]),
    ("stomach ache", &["abdominal pain"]),
    ("belly pain", &["abdominal pain"]),
    ("passing out", &["syncope", "loss of consciousness"]),
    ("racing heart", &["palpitations", "tachycardia"]),
    ("pins and needles", &["paresthesia"]),
    ("swelling", &["edema"]),
    ("bruising", &["ecchymosis"]),
    ("fever", &["pyrexia"]),
];

/// Fixed vocabulary for lightweight entity recognition in user text.
pub const ENTITY_TERMS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "headache",
    "fever",
    "nausea",
    "vomiting",
    "dizziness",
    "sweating",
    "palpitations",
    "abdominal pain",
    "rash",
    "seizure",
    "confusion",
    "bleeding",
    "sore throat",
    "cough",
    "fatigue",
    "numbness",
    "weakness",
    "back pain",
    "blurred vision",
];

/// Phrases that indicate a potentially life-threatening presentation.
///
/// Includes the chest-pain and head-injury red-flag sets carried over from
/// the clinical protocol tables.
pub const EMERGENCY_INDICATORS: &[&str] = &[
    "can't breathe",
    "cannot breathe",
    "can not breathe",
    "struggling to breathe",
    "chest pressure",
    "chest tightness",
    "radiating pain",
    "loss of consciousness",
    "lost consciousness",
    "unconscious",
    "unresponsive",
    "severe bleeding",
    "bleeding heavily",
    "coughing up blood",
    "seizure",
    "unequal pupils",
    "slurred speech",
    "face drooping",
    "worst headache of my life",
    "suicidal",
    "overdose",
    "anaphylaxis",
    "throat is closing",
    "turning blue",
];

/// Severity weights for recognized symptoms, used as a secondary escalation
/// signal when several serious symptoms co-occur.
pub const SEVERITY_SCORES: &[(&str, u32)] = &[
    ("chest pain", 10),
    ("seizure", 10),
    ("shortness of breath", 9),
    ("severe bleeding", 9),
    ("confusion", 8),
    ("numbness", 6),
    ("abdominal pain", 5),
    ("palpitations", 5),
    ("dizziness", 4),
    ("vomiting", 4),
    ("fever", 3),
    ("headache", 3),
    ("sore throat", 2),
    ("cough", 2),
];

/// Spellings of a maximum severity self-rating.
const MAX_SEVERITY_PHRASES: &[&str] = &["10 out of 10", "10/10", "ten out of ten"];

/// Keyword tables for normalizing free-text urgency mentions, checked in
/// precedence order by [`parse_urgency`].
pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency",
    "call 911",
    "call emergency services",
    "life-threatening",
    "life threatening",
];

pub const URGENT_KEYWORDS: &[&str] = &["urgent", "within hours", "prompt medical attention"];

pub const SEMI_URGENT_KEYWORDS: &[&str] = &["semi-urgent", "semi_urgent", "same day", "same-day"];

pub const NON_URGENT_KEYWORDS: &[&str] = &["non-urgent", "non_urgent", "not urgent", "routine"];

/// Clinical expansions for lay terms found in `text`, in table order.
pub fn expand_synonyms(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let mut expansions = Vec::new();
    for (term, clinical) in SYNONYMS {
        if lower.contains(term) {
            for expansion in *clinical {
                if !expansions.contains(expansion) {
                    expansions.push(*expansion);
                }
            }
        }
    }
    expansions
}

/// Entity vocabulary terms present in `text`, in table order.
pub fn entity_terms_in(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    ENTITY_TERMS
        .iter()
        .copied()
        .filter(|term| lower.contains(term))
        .collect()
}

/// First emergency indicator phrase present in `text`, if any.
pub fn find_emergency_indicator(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    EMERGENCY_INDICATORS
        .iter()
        .copied()
        .find(|phrase| lower.contains(phrase))
}

/// Whether `text` self-rates severity at the maximum of the scale.
pub fn mentions_max_severity(text: &str) -> bool {
    let lower = text.to_lowercase();
    MAX_SEVERITY_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
}

/// Sum of severity weights for recognized symptoms in `text`.
pub fn aggregate_severity(text: &str) -> u32 {
    let lower = text.to_lowercase();
    SEVERITY_SCORES
        .iter()
        .filter(|(term, _)| lower.contains(term))
        .map(|(_, score)| score)
        .sum()
}

/// Map a free-text urgency mention to the canonical enum.
///
/// Keyword precedence: EMERGENCY > URGENT > SEMI_URGENT > NON_URGENT;
/// UNKNOWN when nothing matches. Negated and qualified forms ("non-urgent",
/// "semi-urgent") are masked before the bare URGENT check so they cannot
/// shadow-match it.
pub fn parse_urgency(text: &str) -> UrgencyLevel {
    let lower = text.to_lowercase();

    if EMERGENCY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return UrgencyLevel::Emergency;
    }

    let masked = lower
        .replace("semi-urgent", " ")
        .replace("semi_urgent", " ")
        .replace("semi urgent", " ")
        .replace("non-urgent", " ")
        .replace("non_urgent", " ")
        .replace("not urgent", " ");
    if URGENT_KEYWORDS.iter().any(|kw| masked.contains(kw)) {
        return UrgencyLevel::Urgent;
    }

    if SEMI_URGENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return UrgencyLevel::SemiUrgent;
    }
    if NON_URGENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return UrgencyLevel::NonUrgent;
    }

    UrgencyLevel::Unknown
}

/// The deterministic urgency floor for a conversation transcript.
///
/// This is the single escalation rule in the engine: when an emergency
/// indicator phrase appears, severity is self-rated at the scale maximum, or
/// the aggregate symptom severity reaches the threshold, the final urgency
/// is never allowed below URGENT, regardless of model output.
pub fn urgency_floor(transcript: &str) -> Option<UrgencyLevel> {
    if let Some(phrase) = find_emergency_indicator(transcript) {
        tracing::debug!("Urgency floor engaged by indicator phrase: {phrase:?}");
        return Some(UrgencyLevel::Urgent);
    }
    if mentions_max_severity(transcript) {
        tracing::debug!("Urgency floor engaged by maximum severity self-rating");
        return Some(UrgencyLevel::Urgent);
    }
    let severity = aggregate_severity(transcript);
    if severity >= AGGREGATE_SEVERITY_THRESHOLD {
        tracing::debug!("Urgency floor engaged by aggregate severity {severity}");
        return Some(UrgencyLevel::Urgent);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_expansion_is_additive_and_deduped() {
        let expansions = expand_synonyms("I think I'm having a heart attack, a HEART ATTACK");
        assert_eq!(expansions, vec!["myocardial infarction"]);

        assert!(expand_synonyms("my knee hurts").is_empty());
    }

    #[test]
    fn test_entity_terms_case_insensitive() {
        let terms = entity_terms_in("Severe Chest Pain and some sweating");
        assert!(terms.contains(&"chest pain"));
        assert!(terms.contains(&"sweating"));
    }

    #[test]
    fn test_emergency_indicator_detection() {
        assert_eq!(
            find_emergency_indicator("help, I CAN'T BREATHE"),
            Some("can't breathe")
        );
        assert!(find_emergency_indicator("mild ankle sprain").is_none());
    }

    #[test]
    fn test_max_severity_phrases() {
        assert!(mentions_max_severity("the pain is 10 out of 10"));
        assert!(mentions_max_severity("pain 10/10 right now"));
        assert!(!mentions_max_severity("pain is 7 out of 10"));
    }

    #[test]
    fn test_aggregate_severity_sums_matches() {
        // chest pain (10) + headache (3) + sore throat (2)
        let score = aggregate_severity("chest pain, headache and a sore throat");
        assert_eq!(score, 15);
    }

    #[test]
    fn test_parse_urgency_precedence() {
        assert_eq!(parse_urgency("EMERGENCY"), UrgencyLevel::Emergency);
        assert_eq!(
            parse_urgency("this is urgent, maybe an emergency"),
            UrgencyLevel::Emergency
        );
        assert_eq!(parse_urgency("urgent"), UrgencyLevel::Urgent);
        assert_eq!(parse_urgency("SEMI_URGENT"), UrgencyLevel::SemiUrgent);
        assert_eq!(parse_urgency("care needed same day"), UrgencyLevel::SemiUrgent);
        assert_eq!(parse_urgency("non-urgent"), UrgencyLevel::NonUrgent);
        assert_eq!(parse_urgency("NON_URGENT"), UrgencyLevel::NonUrgent);
        assert_eq!(parse_urgency("routine checkup"), UrgencyLevel::NonUrgent);
        assert_eq!(parse_urgency("no signal here"), UrgencyLevel::Unknown);
    }

    #[test]
    fn test_parse_urgency_negated_forms_do_not_match_urgent() {
        assert_eq!(parse_urgency("this is not urgent"), UrgencyLevel::NonUrgent);
        assert_eq!(parse_urgency("semi-urgent situation"), UrgencyLevel::SemiUrgent);
    }

    #[test]
    fn test_floor_engages_on_each_signal() {
        assert_eq!(
            urgency_floor("I can't breathe"),
            Some(UrgencyLevel::Urgent)
        );
        assert_eq!(
            urgency_floor("pain is 10/10"),
            Some(UrgencyLevel::Urgent)
        );
        assert_eq!(
            urgency_floor("chest pain, headache and a sore throat"),
            Some(UrgencyLevel::Urgent)
        );
        assert_eq!(urgency_floor("a mild rash on my arm"), None);
    }
}
