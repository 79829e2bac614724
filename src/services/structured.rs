//! Structured-output extraction from model responses.
//!
//! Models are asked to answer with a bare JSON object, but in practice the
//! object arrives wrapped in prose or a fenced code block. This module is
//! the single place that digs the object out; callers get either a parsed
//! value or a `Parse` error with a documented recovery path, never a silent
//! guess.

use crate::domain::errors::{DomainResult, TriageError};

/// Extract a JSON object from a response that might have surrounding text.
///
/// Handles, in order: a bare object, a ```json fenced block, and the first
/// `{`..`}` span of the text. Returns the trimmed input unchanged when no
/// object boundary is found, leaving the parse step to report the failure.
pub fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    // If it already looks like JSON, use it directly
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed.to_string();
    }

    // Strip a fenced code block if present
    if let Some(fence_start) = trimmed.find("```") {
        let after_fence = &trimmed[fence_start + 3..];
        let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
        if let Some(fence_end) = after_fence[body_start..].find("```") {
            let body = after_fence[body_start..body_start + fence_end].trim();
            if body.starts_with('{') {
                return body.to_string();
            }
        }
    }

    // Try to find a JSON object in the response
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return trimmed[start..=end].to_string();
            }
        }
    }

    // Return as-is if no JSON found
    trimmed.to_string()
}

/// Extract and parse a JSON object as a `serde_json::Value`.
pub fn parse_value(response: &str) -> DomainResult<serde_json::Value> {
    let json_str = extract_json(response);
    serde_json::from_str(&json_str).map_err(|e| {
        TriageError::Parse(format!("no well-formed JSON object in response: {e}"))
    })
}

/// Extract and parse a JSON object into a typed value.
pub fn parse_typed<T: serde::de::DeserializeOwned>(response: &str) -> DomainResult<T> {
    let json_str = extract_json(response);
    serde_json::from_str(&json_str)
        .map_err(|e| TriageError::Parse(format!("structured output mismatch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"analysis": "test"}"#;
        assert_eq!(extract_json(input), r#"{"analysis": "test"}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = "```json\n{\"analysis\": \"test\"}\n```";
        assert_eq!(extract_json(input), r#"{"analysis": "test"}"#);
    }

    #[test]
    fn test_extract_json_surrounded_by_text() {
        let input = "Here is my answer:\n{\"key\": \"value\"}\nHope that helps.";
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_whitespace() {
        let input = "  \n {\"key\": \"value\"} \n ";
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_parse_value_failure_is_parse_error() {
        let err = parse_value("I cannot answer that.").unwrap_err();
        assert!(matches!(err, TriageError::Parse(_)));
    }

    #[test]
    fn test_parse_typed() {
        #[derive(serde::Deserialize)]
        struct Shape {
            can_complete: bool,
        }

        let shape: Shape =
            parse_typed("Sure!\n```json\n{\"can_complete\": true}\n```").unwrap();
        assert!(shape.can_complete);
    }
}
