/// Pull the edit-batch JSON out of generator text.
///
/// Strips a surrounding markdown code fence, then narrows to the outermost
/// `{...}`. Text without braces is returned trimmed so the decoder can
/// report it as malformed.
pub fn extract_batch_json(response: &str) -> &str {
    let text = strip_code_fences(response);
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Strip markdown code fences (```json ... ```) from the response.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }
    let after_open = match text.find('\n') {
        Some(nl) => &text[nl + 1..],
        None => return text,
    };
    match after_open.rfind("```") {
        Some(close) => after_open[..close].trim(),
        None => after_open.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_is_unchanged() {
        let raw = r#"{"changes": []}"#;
        assert_eq!(extract_batch_json(raw), raw);
    }

    #[test]
    fn strips_fenced_block() {
        let raw = "```json\n{\"changes\": []}\n```";
        assert_eq!(extract_batch_json(raw), r#"{"changes": []}"#);
    }

    #[test]
    fn narrows_to_outermost_braces() {
        let raw = "Here is the batch:\n{\"changes\": [{\"kind\": \"ADD_CLASS\"}]}\nDone.";
        assert_eq!(
            extract_batch_json(raw),
            r#"{"changes": [{"kind": "ADD_CLASS"}]}"#
        );
    }

    #[test]
    fn text_without_braces_is_returned_trimmed() {
        assert_eq!(extract_batch_json("  I cannot do that.  "), "I cannot do that.");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        let raw = "```\n{\"changes\": []}";
        assert_eq!(extract_batch_json(raw), r#"{"changes": []}"#);
    }
}
