//! Chat-completion client used to turn an instruction into a tool call.

use std::time::Duration;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::LlmSettings;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no LLM client configured")]
    NotConfigured,
    #[error("no API key configured (set llm.api_key or DEEPSEEK_API_KEY)")]
    MissingApiKey,
    #[error("invalid base url '{0}'")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("API returned error status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<http::Error> for LlmError {
    fn from(e: http::Error) -> Self {
        LlmError::Http(e.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Http(e.to_string())
    }
}

/// Anything that can answer a system + user prompt with text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// OpenAI-compatible chat-completion client for the DeepSeek API.
#[derive(Debug, Clone)]
pub struct DeepseekClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl DeepseekClient {
    /// Build from settings, filling unset values from the process
    /// environment.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        Self::from_settings_with(settings, |key| std::env::var(key).ok())
    }

    pub fn from_settings_with<F>(settings: &LlmSettings, env: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let api_key = non_empty(settings.api_key.clone())
            .or_else(|| non_empty(env("DEEPSEEK_API_KEY")))
            .ok_or(LlmError::MissingApiKey)?;
        let base_url = non_empty(settings.base_url.clone())
            .or_else(|| non_empty(env("DEEPSEEK_API_URL")))
            .or_else(|| non_empty(env("DEEPSEEK_BASE_URL")))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_empty(settings.model.clone())
            .or_else(|| non_empty(env("DEEPSEEK_MODEL")))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: chat_endpoint(&base_url)?,
            api_key,
            model,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chat_request(&self, request: &GenerateRequest) -> Result<Request<Vec<u8>>, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        Ok(Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)?)
    }

    async fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, LlmError> {
        let (parts, body) = request.into_parts();
        let mut rb = self.http.request(parts.method, parts.uri.to_string());
        for (name, value) in parts.headers.iter() {
            rb = rb.header(name, value);
        }

        let resp = rb.body(body).send().await?;
        let mut builder = Response::builder().status(resp.status());
        for (name, value) in resp.headers().iter() {
            builder = builder.header(name, value);
        }
        let bytes = resp.bytes().await?.to_vec();
        Ok(builder.body(bytes)?)
    }
}

#[async_trait]
impl LlmClient for DeepseekClient {
    #[tracing::instrument(name = "llm.generate", skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        let http_request = self.chat_request(request)?;
        let response = tokio::time::timeout(self.timeout, self.send(http_request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;
        parse_chat(response)
    }
}

/// `{base}/v1/chat/completions`, adding `/v1` when the base lacks it.
pub fn chat_endpoint(base_url: &str) -> Result<Url, LlmError> {
    let mut base = base_url.trim().trim_end_matches('/').to_string();
    if !base.ends_with("/v1") {
        base.push_str("/v1");
    }
    Url::parse(&format!("{}/chat/completions", base))
        .map_err(|_| LlmError::InvalidUrl(base_url.to_string()))
}

/// Extract the assistant text from a chat-completion response. Falls back to
/// the raw body when no known field is present.
pub fn parse_chat(response: Response<Vec<u8>>) -> Result<String, LlmError> {
    let status = response.status();
    let raw = String::from_utf8_lossy(response.body()).into_owned();
    if !status.is_success() {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: raw,
        });
    }

    let Ok(json) = serde_json::from_str::<Value>(&raw) else {
        return Ok(raw);
    };
    let choice = &json["choices"][0];
    let text = choice["message"]["content"]
        .as_str()
        .or_else(|| choice["delta"]["content"].as_str())
        .or_else(|| choice["text"].as_str());
    Ok(match text {
        Some(text) => text.trim().to_string(),
        None => raw,
    })
}
