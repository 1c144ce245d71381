// # -----------------------------
// # crates/agent/src/lib.rs
// # -----------------------------
use anyhow::{anyhow, Context, Result};
use coda_backend_gemini::Gemini;
use coda_backend_openai::OpenAiLike;
use coda_common::{
    BackendKind, ChatMessage, Config, GenerateOutcome, GenerateRequest, LlmBackend, Prompt,
    Template,
};
use coda_patcher::PatchReport;
use std::time::Duration;

pub mod errors;
pub mod prompts;
pub mod response;

pub struct Agent
{
    llm: Box<dyn LlmBackend>,
    http: reqwest::Client,
    reader_base: String,
}

/// Outcome of a model-driven block edit.
#[derive(Debug, Clone)]
pub struct EditResult
{
    /// Raw model reply, kept so callers can show what was attempted.
    pub reply: String,
    pub report: PatchReport,
}

impl Agent
{
    pub fn new(cfg: &Config) -> Self
    {
        let llm: Box<dyn LlmBackend> = match cfg.backend.kind {
            BackendKind::Gemini => Box::new(Gemini::new(cfg.backend.clone())),
            BackendKind::OpenaiLike => Box::new(OpenAiLike::new(cfg.backend.clone())),
        };
        Self::with_backend(llm, cfg)
    }

    /// Uses `llm` for model calls; the reader settings and the request
    /// timeout still come from `cfg`.
    pub fn with_backend(llm: Box<dyn LlmBackend>, cfg: &Config) -> Self
    {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.backend.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            llm,
            http,
            reader_base: cfg.reader.base_url.clone(),
        }
    }

    /// Runs one request end to end. Never fails: problems come back as
    /// `GenerateOutcome::error` with a user-facing message.
    pub async fn generate(&self, req: &GenerateRequest) -> GenerateOutcome
    {
        tracing::info!(template = %req.template, model = ?req.model, "generate");
        match self.try_generate(req).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let detail = format!("{e:#}");
                tracing::warn!(error = %detail, "generation failed");
                GenerateOutcome::failed(errors::user_message(&e))
            }
        }
    }

    async fn try_generate(&self, req: &GenerateRequest) -> Result<GenerateOutcome>
    {
        let user = match req.template {
            Template::UrlRedesign => {
                let html =
                    coda_tools::web::fetch_html(&self.http, &self.reader_base, &req.prompt).await?;
                prompts::redesign_page(&html)
            }
            Template::Redesign => prompts::redesign_html(&req.prompt, None),
            Template::PublicChat => {
                let fallback;
                let history: &[ChatMessage] = if req.messages.is_empty() {
                    fallback = [ChatMessage::user(req.prompt.clone())];
                    &fallback
                } else {
                    &req.messages
                };
                prompts::public_chat(history)
            }
            Template::React | Template::Html => {
                let base = req
                    .existing_code
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| prompts::starter_code(req.template));
                prompts::modify_code(req.template, base, &req.prompt)
            }
        };

        let reply = self
            .llm
            .generate(Prompt {
                system: None,
                user: &user,
                model: req.model.as_deref().filter(|m| !m.trim().is_empty()),
                json: true,
            })
            .await?;
        let decoded = response::decode(&reply, prompts::code_key(req.template))
            .context("decode model reply")?;

        Ok(match decoded.code {
            Some(code) => GenerateOutcome::ok(code, decoded.reasoning),
            None => GenerateOutcome::failed(errors::EMPTY_REPLY),
        })
    }

    async fn ask(&self, user: &str, key: &str) -> Result<response::Decoded>
    {
        let reply = self
            .llm
            .generate(Prompt {
                user,
                json: true,
                ..Default::default()
            })
            .await?;
        Ok(response::decode_or_raw(&reply, key))
    }

    /// Improves `code` according to `description`; returns the new code.
    pub async fn improve(&self, code: &str, description: &str) -> Result<String>
    {
        let d = self
            .ask(&prompts::improve(code, description), prompts::KEY_IMPROVED)
            .await?;
        if let Some(reasoning) = &d.reasoning {
            tracing::info!(%reasoning, "improve");
        }
        d.code.ok_or_else(|| anyhow!(errors::EMPTY_REPLY))
    }

    pub async fn explain(&self, code: &str) -> Result<String>
    {
        let d = self
            .ask(&prompts::explain(code), prompts::KEY_EXPLANATION)
            .await?;
        d.code.ok_or_else(|| anyhow!(errors::EMPTY_REPLY))
    }

    pub async fn redesign_html(&self, html: &str, description: Option<&str>) -> Result<String>
    {
        let d = self
            .ask(&prompts::redesign_html(html, description), prompts::KEY_REDESIGNED)
            .await?;
        d.code.ok_or_else(|| anyhow!(errors::EMPTY_REPLY))
    }

    /// Asks the model for edit blocks against `document` and applies them.
    /// Blocks that do not apply are reported, not fatal.
    pub async fn edit(&self, document: &str, request: &str) -> Result<EditResult>
    {
        let reply = self
            .llm
            .generate(Prompt {
                user: &prompts::edit_blocks(document, request),
                ..Default::default()
            })
            .await?;
        let report = coda_patcher::apply_changes_with_report(document, &reply);
        tracing::info!(
            applied = report.applied(),
            not_found = report.not_found(),
            malformed = report.malformed,
            "edit blocks"
        );
        Ok(EditResult { reply, report })
    }
}
