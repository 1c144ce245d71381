// # -----------------------------
// # crates/backends/openai_like/src/lib.rs
// # -----------------------------
use async_trait::async_trait;
use coda_common::{BackendCfg, BackendError, LlmBackend, Prompt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiLike {
    cfg: BackendCfg,
    http: Client,
}

impl OpenAiLike {
    pub fn new(cfg: BackendCfg) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { cfg, http }
    }
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

fn build_request<'a>(default_model: &'a str, prompt: &Prompt<'a>) -> ChatReq<'a> {
    let mut messages = Vec::with_capacity(2);
    if let Some(sys) = prompt.system {
        messages.push(Msg {
            role: "system",
            content: sys,
        });
    }
    messages.push(Msg {
        role: "user",
        content: prompt.user,
    });
    ChatReq {
        model: prompt.model.unwrap_or(default_model),
        messages,
        stream: false,
        response_format: prompt.json.then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

fn first_choice(resp: ChatResp) -> Result<String, BackendError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|s| !s.trim().is_empty())
        .ok_or(BackendError::EmptyReply)
}

#[async_trait]
impl LlmBackend for OpenAiLike {
    async fn generate(&self, prompt: Prompt<'_>) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.cfg.base_url());
        let req = build_request(&self.cfg.model, &prompt);
        tracing::debug!(model = req.model, %url, json = prompt.json, "chat/completions");

        let mut rb = self.http.post(&url).json(&req);
        if !self.cfg.api_key.is_empty() {
            rb = rb.bearer_auth(&self.cfg.api_key);
        }

        let resp = rb
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body: ChatResp = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        first_choice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_system_and_json_mode() {
        let prompt = Prompt {
            system: Some("be brief"),
            user: "hello",
            model: None,
            json: true,
        };
        let v = serde_json::to_value(build_request("local-model", &prompt)).unwrap();
        assert_eq!(v["model"], "local-model");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "hello");
        assert_eq!(v["response_format"]["type"], "json_object");
    }

    #[test]
    fn request_without_json_mode_omits_format() {
        let prompt = Prompt {
            user: "hi",
            model: Some("override"),
            ..Default::default()
        };
        let v = serde_json::to_value(build_request("m", &prompt)).unwrap();
        assert_eq!(v["model"], "override");
        assert!(v.get("response_format").is_none());
        assert_eq!(v["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let resp: ChatResp = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice(resp), Err(BackendError::EmptyReply)));
        let resp: ChatResp =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"ok"}}]}"#).unwrap();
        assert_eq!(first_choice(resp).unwrap(), "ok");
    }
}
