//! Helpers for parsing structured JSON out of free-form LLM output.
//!
//! Models frequently wrap JSON in markdown fences or surround it with prose.
//! Every stage that expects structured output goes through these helpers so
//! the lenient extraction behavior stays consistent.

use serde::de::DeserializeOwned;

/// Deserialize a `T` from raw LLM output, tolerating markdown wrapping.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let json_str = extract_json_object(raw);
    serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in a ```json code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    // Wrapped in a bare code block
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Fall back to the outermost brace pair
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct Probe {
        value: String,
    }

    #[test]
    fn extracts_direct_object() {
        let input = r#"{"value": "x"}"#;
        assert_eq!(extract_json_object(input), input);
    }

    #[test]
    fn extracts_from_json_fence() {
        let input = "Here you go:\n```json\n{\"value\": \"x\"}\n```";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.contains("\"x\""));
    }

    #[test]
    fn extracts_from_bare_fence() {
        let input = "```\n{\"value\": \"y\"}\n```";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
    }

    #[test]
    fn extracts_embedded_object() {
        let input = "My analysis: {\"value\": \"z\"} done.";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.ends_with('}'));
    }

    #[test]
    fn parse_structured_roundtrip() {
        let probe: Probe = parse_structured("noise {\"value\": \"ok\"} noise").unwrap();
        assert_eq!(probe.value, "ok");
    }

    #[test]
    fn parse_structured_rejects_garbage() {
        let result: Result<Probe, _> = parse_structured("no json here at all");
        assert!(result.is_err());
    }
}
