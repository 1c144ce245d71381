//! Turns flow failures into the short messages shown to users.

use coda_common::BackendError;

pub const QUOTA_EXHAUSTED: &str =
    "Your API quota is exhausted or too many requests were sent. Please try again later.";
pub const INVALID_API_KEY: &str =
    "The provided API Key is invalid. Please check your key and try again.";
pub const UNPARSABLE_REPLY: &str =
    "Failed to parse the AI's response. It may have generated an invalid format.";
pub const EMPTY_REPLY: &str = "Failed to generate code. The AI returned an empty response.";
pub const UNKNOWN: &str = "An unknown error occurred.";

pub fn user_message(err: &anyhow::Error) -> String {
    let backend = err
        .chain()
        .find_map(|e| e.downcast_ref::<BackendError>());
    if let Some(BackendError::MissingApiKey) = backend {
        return BackendError::MissingApiKey.to_string();
    }
    if let Some(BackendError::Status { status: 429, .. }) = backend {
        return QUOTA_EXHAUSTED.to_string();
    }

    // Only provider text is searched; other chains may hold user input.
    if let Some(reported) = backend.map(ToString::to_string) {
        if reported.contains("429") || reported.to_lowercase().contains("quota") {
            return QUOTA_EXHAUSTED.to_string();
        }
        if reported.contains("API_KEY_INVALID") {
            return INVALID_API_KEY.to_string();
        }
    }
    if err
        .chain()
        .any(|e| e.downcast_ref::<serde_json::Error>().is_some())
    {
        return UNPARSABLE_REPLY.to_string();
    }

    let top = err.to_string();
    if top.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn backend(e: BackendError) -> anyhow::Error {
        anyhow::Error::new(e).context("generate")
    }

    #[test]
    fn rate_limit_status() {
        let e = backend(BackendError::Status {
            status: 429,
            body: "slow down".into(),
        });
        assert_eq!(user_message(&e), QUOTA_EXHAUSTED);
    }

    #[test]
    fn quota_in_body() {
        let e = backend(BackendError::Status {
            status: 403,
            body: "Quota exceeded for metric".into(),
        });
        assert_eq!(user_message(&e), QUOTA_EXHAUSTED);
    }

    #[test]
    fn invalid_key() {
        let e = backend(BackendError::Status {
            status: 400,
            body: r#"{"error":{"details":[{"reason":"API_KEY_INVALID"}]}}"#.into(),
        });
        assert_eq!(user_message(&e), INVALID_API_KEY);
    }

    #[test]
    fn missing_key() {
        let e = backend(BackendError::MissingApiKey);
        assert!(user_message(&e).starts_with("API Key is missing"));
    }

    #[test]
    fn bad_json() {
        let parse = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let e = anyhow::Error::new(parse).context("decode reply");
        assert_eq!(user_message(&e), UNPARSABLE_REPLY);
    }

    #[test]
    fn user_text_outside_backend_errors_is_not_searched() {
        let e = anyhow!("invalid URL 'https://x.dev/quota/429'").context("fetch page");
        assert_eq!(user_message(&e), "fetch page");
    }

    #[test]
    fn other_errors_pass_through() {
        assert_eq!(user_message(&anyhow!("socket closed")), "socket closed");
        assert_eq!(user_message(&anyhow!("  ")), UNKNOWN);
    }
}
