use serde_json::Value;

const FENCE_OPEN: &str = "```json";
const FENCE: &str = "```";

/// What could be recovered from a free-text model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Structured(Value),
    Unstructured(String),
}

/// Tolerant extraction of a JSON payload.
///
/// The last ```` ```json ```` block wins (an unterminated block runs to the end
/// of the text). Without a block, the whole reply is tried if it is a JSON
/// object. Anything else comes back verbatim as `Unstructured`.
pub fn parse_response(raw: &str) -> ParsedResponse {
    if let Some(start) = raw.rfind(FENCE_OPEN) {
        let body = &raw[start + FENCE_OPEN.len()..];
        let body = match body.find(FENCE) {
            Some(end) => &body[..end],
            None => body,
        };
        return match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => ParsedResponse::Structured(value),
            Err(_) => ParsedResponse::Unstructured(raw.to_string()),
        };
    }

    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return ParsedResponse::Structured(value);
        }
    }
    ParsedResponse::Unstructured(raw.to_string())
}

/// Pull `issues` / `mitigations` string lists out of a structured reply.
/// `None` when neither key holds an array.
pub fn extract_findings(value: &Value) -> Option<(Vec<String>, Vec<String>)> {
    let issues = value.get("issues").and_then(Value::as_array);
    let mitigations = value.get("mitigations").and_then(Value::as_array);
    if issues.is_none() && mitigations.is_none() {
        return None;
    }
    Some((strings(issues), strings(mitigations)))
}

fn strings(list: Option<&Vec<Value>>) -> Vec<String> {
    list.map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_fenced_block_wins() {
        let raw = "Example:\n```json\n{\"issues\": [\"old\"]}\n```\nAnswer:\n```json\n{\"issues\": [\"new\"]}\n```";
        assert_eq!(parse_response(raw), ParsedResponse::Structured(json!({"issues": ["new"]})));
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        let raw = "```json\n{\"mitigations\": [\"restart pod\"]}";
        assert_eq!(
            parse_response(raw),
            ParsedResponse::Structured(json!({"mitigations": ["restart pod"]}))
        );
    }

    #[test]
    fn test_bare_object_accepted() {
        let raw = "  {\"issues\": []}  ";
        assert_eq!(parse_response(raw), ParsedResponse::Structured(json!({"issues": []})));
    }

    #[test]
    fn test_malformed_block_is_unstructured() {
        let raw = "```json\n{issues: oops\n```";
        assert_eq!(parse_response(raw), ParsedResponse::Unstructured(raw.to_string()));
    }

    #[test]
    fn test_prose_is_unstructured() {
        let raw = "The deployment looks fine to me.";
        assert_eq!(parse_response(raw), ParsedResponse::Unstructured(raw.to_string()));
        assert_eq!(parse_response("[1, 2]"), ParsedResponse::Unstructured("[1, 2]".into()));
    }

    #[test]
    fn test_extract_ignores_non_strings() {
        let value = json!({"issues": ["a", 3, null, " "], "mitigations": "not a list"});
        let (issues, mitigations) = extract_findings(&value).unwrap();
        assert_eq!(issues, vec!["a"]);
        assert!(mitigations.is_empty());
        assert!(extract_findings(&json!({"message": "hi"})).is_none());
    }
}
