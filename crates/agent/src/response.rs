use anyhow::Result;
use serde_json::Value;

use crate::prompts::KEY_REASONING;

/// Removes a markdown fence the model may wrap around its JSON even in JSON
/// mode. Only a fence at the very start is recognised.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = if text.starts_with("```json") {
        slice_fence(text, 7)
    } else if text.starts_with("```") {
        slice_fence(text, 3)
    } else {
        return text;
    };
    inner.trim()
}

fn slice_fence(text: &str, open: usize) -> &str {
    let body = &text[open..];
    body.strip_suffix("```").unwrap_or(body)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub code: Option<String>,
    pub reasoning: Option<String>,
}

fn non_empty_str(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Strict decode: the reply must be JSON; `key` holds the produced text.
pub fn decode(text: &str, key: &str) -> Result<Decoded> {
    let v: Value = serde_json::from_str(strip_code_fences(text))?;
    Ok(Decoded {
        code: non_empty_str(&v, key),
        reasoning: non_empty_str(&v, KEY_REASONING),
    })
}

/// Lenient decode for single-purpose flows: non-JSON replies are taken as
/// the answer itself.
pub fn decode_or_raw(text: &str, key: &str) -> Decoded {
    match decode(text, key) {
        Ok(d) if d.code.is_some() => d,
        _ => Decoded {
            code: Some(strip_code_fences(text).to_string()),
            reasoning: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn decode_picks_mode_key() {
        let d = decode(
            r#"{"improvedCode":"<div/>","reasoning":"wrapped it"}"#,
            "improvedCode",
        )
        .unwrap();
        assert_eq!(d.code.as_deref(), Some("<div/>"));
        assert_eq!(d.reasoning.as_deref(), Some("wrapped it"));

        let d = decode(r#"{"improvedCode":"<div/>"}"#, "redesignedCode").unwrap();
        assert_eq!(d.code, None);
    }

    #[test]
    fn decode_rejects_prose() {
        let err = decode("Sure! Here's your code", "improvedCode").unwrap_err();
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }

    #[test]
    fn raw_fallback() {
        let d = decode_or_raw("plain explanation", "explanation");
        assert_eq!(d.code.as_deref(), Some("plain explanation"));
        assert_eq!(d.reasoning, None);
    }
}
