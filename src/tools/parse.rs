use serde_json::Value;

/// Remove a surrounding Markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    // Skip the opening line (```json) and the closing line (```)
    let end = if lines.len() > 1 && lines[lines.len() - 1].trim_start().starts_with("```") {
        lines.len() - 1
    } else {
        lines.len()
    };
    lines.get(1..end).map(|body| body.join("\n")).unwrap_or_default()
}

/// Pull a JSON value out of model output.
///
/// Tries the whole text, then the text without code fences, then the span
/// between the first `{` and the last `}`.
pub fn extract_json(response: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(response.trim()) {
        return Some(value);
    }

    let unfenced = strip_code_fences(response);
    if let Ok(value) = serde_json::from_str(&unfenced) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fenced_block() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  hello  "), "hello");
    }

    #[test]
    fn lone_fence_does_not_panic() {
        assert_eq!(strip_code_fences("```"), "");
        assert_eq!(strip_code_fences("```json\n{}"), "{}");
    }

    #[test]
    fn extracts_plain_json() {
        assert_eq!(extract_json(r#"{"base_valuation": 1}"#), Some(json!({"base_valuation": 1})));
    }

    #[test]
    fn extracts_fenced_json() {
        let text = "```json\n{\"confidence_score\": 80}\n```";
        assert_eq!(extract_json(text), Some(json!({"confidence_score": 80})));
    }

    #[test]
    fn extracts_json_embedded_in_prose() {
        let text = "Here is the estimate: {\"base_valuation\": 450000} as requested.";
        assert_eq!(extract_json(text), Some(json!({"base_valuation": 450000})));
    }

    #[test]
    fn prose_without_json_is_none() {
        assert_eq!(extract_json("no structured data here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }
}
