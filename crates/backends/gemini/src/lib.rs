// # -----------------------------
// # crates/backends/gemini/src/lib.rs
// # -----------------------------
//! Client for the Generative Language `generateContent` endpoint.

use async_trait::async_trait;
use coda_common::{BackendCfg, BackendError, LlmBackend, Prompt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct Gemini {
    cfg: BackendCfg,
    http: Client,
}

impl Gemini {
    pub fn new(cfg: BackendCfg) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { cfg, http }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.cfg.base_url(), model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReq<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}

#[derive(Deserialize)]
struct RespPart {
    #[serde(default)]
    text: Option<String>,
}

fn build_request<'a>(prompt: &Prompt<'a>) -> GenerateReq<'a> {
    GenerateReq {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: prompt.user }],
        }],
        system_instruction: prompt.system.map(|sys| Content {
            role: None,
            parts: vec![Part { text: sys }],
        }),
        generation_config: prompt.json.then_some(GenerationConfig {
            response_mime_type: "application/json",
        }),
    }
}

/// Joins the text parts of the first candidate.
fn candidate_text(resp: GenerateResp) -> Result<String, BackendError> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(BackendError::EmptyReply);
    }
    Ok(text)
}

#[async_trait]
impl LlmBackend for Gemini {
    async fn generate(&self, prompt: Prompt<'_>) -> Result<String, BackendError> {
        if self.cfg.api_key.trim().is_empty() {
            return Err(BackendError::MissingApiKey);
        }
        let model = prompt.model.unwrap_or(&self.cfg.model);
        let url = self.endpoint(model);
        tracing::debug!(model, %url, json = prompt.json, "generateContent");

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.cfg.api_key.as_str())])
            .json(&build_request(&prompt))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "generateContent failed");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body: GenerateResp = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.without_url().to_string()))?;
        candidate_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_sets_mime_type() {
        let prompt = Prompt {
            user: "make a button",
            json: true,
            ..Default::default()
        };
        let v = serde_json::to_value(build_request(&prompt)).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "make a button");
        assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
        assert!(v.get("systemInstruction").is_none());
    }

    #[test]
    fn system_prompt_becomes_instruction() {
        let prompt = Prompt {
            system: Some("you are terse"),
            user: "hi",
            ..Default::default()
        };
        let v = serde_json::to_value(build_request(&prompt)).unwrap();
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "you are terse");
        assert!(v["systemInstruction"].get("role").is_none());
        assert!(v.get("generationConfig").is_none());
    }

    #[test]
    fn candidate_parts_are_joined() {
        let resp: GenerateResp = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(candidate_text(resp).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn blocked_reply_is_empty() {
        let resp: GenerateResp =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(candidate_text(resp), Err(BackendError::EmptyReply)));
        let resp: GenerateResp = serde_json::from_str("{}").unwrap();
        assert!(matches!(candidate_text(resp), Err(BackendError::EmptyReply)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let cfg = BackendCfg {
            base_url: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        };
        let err = Gemini::new(cfg)
            .generate(Prompt {
                user: "x",
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingApiKey));
    }

    #[test]
    fn endpoint_uses_model_path() {
        let g = Gemini::new(BackendCfg::default());
        assert_eq!(
            g.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
