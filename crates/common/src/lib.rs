// # -----------------------------
// # crates/common/src/lib.rs
// # -----------------------------
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_READER_URL: &str = "https://r.jina.ai";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendCfg,
    pub reader: ReaderCfg,
    pub history: HistoryCfg,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Gemini,
    OpenaiLike,
}

impl BackendKind {
    pub fn default_base_url(self) -> &'static str {
        match self {
            BackendKind::Gemini => DEFAULT_GEMINI_URL,
            BackendKind::OpenaiLike => DEFAULT_OPENAI_URL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendCfg {
    pub kind: BackendKind,
    /// Falls back to the provider's public endpoint when unset.
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for BackendCfg {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

impl BackendCfg {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.kind.default_base_url())
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderCfg {
    pub base_url: String,
}

impl Default for ReaderCfg {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_READER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryCfg {
    pub path: String,
    pub max_messages: usize,
}

impl Default for HistoryCfg {
    fn default() -> Self {
        Self {
            path: ".coda/history.json".to_string(),
            max_messages: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant", alias = "model")]
    Assist,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assist => "assist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assist(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assist,
            content: content.into(),
        }
    }
}

/// Generation mode. Unknown names decode as [`Template::React`] so a relay
/// request with a stray template still gets a starter component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Template {
    #[default]
    React,
    Html,
    Redesign,
    UrlRedesign,
    PublicChat,
}

impl Template {
    pub const ALL: [Template; 5] = [
        Template::React,
        Template::Html,
        Template::Redesign,
        Template::UrlRedesign,
        Template::PublicChat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Template::React => "react",
            Template::Html => "html",
            Template::Redesign => "redesign",
            Template::UrlRedesign => "url_redesign",
            Template::PublicChat => "public_chat",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Template::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Template::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown template '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<Template> for String {
    fn from(t: Template) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub template: Template,
    #[serde(default, alias = "existing_code")]
    pub existing_code: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Reply shape shared by the CLI and the relay. Exactly one of `code` or
/// `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOutcome {
    pub code: Option<String>,
    pub reasoning: Option<String>,
    pub error: Option<String>,
}

impl GenerateOutcome {
    pub fn ok(code: String, reasoning: Option<String>) -> Self {
        Self {
            code: Some(code),
            reasoning,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            code: None,
            reasoning: None,
            error: Some(message.into()),
        }
    }
}

/// One model call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prompt<'a> {
    pub system: Option<&'a str>,
    pub user: &'a str,
    /// Overrides the configured model for this call.
    pub model: Option<&'a str>,
    /// Ask the provider for a JSON-only reply.
    pub json: bool,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("API Key is missing. Please provide your API Key.")]
    MissingApiKey,
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request to backend failed: {0}")]
    Transport(String),
    #[error("could not decode backend reply: {0}")]
    Decode(String),
    #[error("backend reply contained no text")]
    EmptyReply,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, prompt: Prompt<'_>) -> Result<String, BackendError>;
}
