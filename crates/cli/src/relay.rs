//! One-shot JSON relay for chat bots: a `GenerateRequest` on stdin, a
//! `GenerateOutcome` on stdout.

use anyhow::{Context, Result};
use coda_agent::Agent;
use coda_common::{ChatMessage, GenerateOutcome, GenerateRequest};

pub const PROMPT_MISSING: &str = "Prompt is missing";

/// Fills in the prompt/messages pair the way bots send it: either a bare
/// `prompt`, or `messages` whose first entry is the prompt.
pub fn normalize(mut req: GenerateRequest) -> Option<GenerateRequest> {
    if let Some(first) = req.messages.first() {
        req.prompt = first.content.clone();
    }
    if req.prompt.trim().is_empty() {
        return None;
    }
    if req.messages.is_empty() {
        req.messages = vec![ChatMessage::user(req.prompt.clone())];
    }
    Some(req)
}

pub async fn handle(agent: &Agent, body: &str) -> Result<GenerateOutcome> {
    let req: GenerateRequest = serde_json::from_str(body).context("invalid relay request")?;
    match normalize(req) {
        Some(req) => Ok(agent.generate(&req).await),
        None => Ok(GenerateOutcome::failed(PROMPT_MISSING)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> GenerateRequest {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn prompt_becomes_single_message() {
        let req = normalize(parse(r#"{"prompt":"a navbar","template":"html"}"#)).unwrap();
        assert_eq!(req.messages, vec![ChatMessage::user("a navbar")]);
    }

    #[test]
    fn first_message_wins_over_prompt() {
        let req = normalize(parse(
            r#"{"prompt":"ignored","messages":[{"role":"user","content":"first"},{"role":"assist","content":"second"}]}"#,
        ))
        .unwrap();
        assert_eq!(req.prompt, "first");
        assert_eq!(req.messages.len(), 2);
    }

    #[test]
    fn blank_prompt_is_rejected() {
        assert!(normalize(parse(r#"{"prompt":"   "}"#)).is_none());
        assert!(normalize(parse("{}")).is_none());
    }
}
