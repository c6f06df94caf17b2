//! Google Generative Language (Gemini) REST backend
//!
//! Talks to the public `v1beta` API:
//! - `GET  {base}/v1beta/models` for capability discovery (paged)
//! - `POST {base}/v1beta/{model}:generateContent` for generation
//!
//! Only models advertising `generateContent` are reported as capabilities.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use super::{BackendError, GenerationBackend};
use crate::config::{defaults, BackendConfig};

/// Environment variable holding the API credential
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

// ============================================================================
// Credential
// ============================================================================

/// API credential. Never printed in full.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Read the key from `GOOGLE_API_KEY`.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV_VAR).ok().and_then(Self::new)
    }

    /// First few characters followed by an ellipsis, for startup logs.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}…")
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, BackendError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(BackendError::EmptyResponse(match block_reason {
                Some(reason) => format!("prompt blocked ({reason})"),
                None => "no candidates returned".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(BackendError::EmptyResponse(format!("finish reason {reason}")));
        }
        Ok(text)
    }
}

// ============================================================================
// Backend
// ============================================================================

#[allow(clippy::unwrap_used)]
fn capability_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(models/)?[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

/// Normalize a capability id to the `models/...` resource name.
fn resource_name(capability: &str) -> String {
    let id = capability.trim();
    if id.starts_with("models/") {
        id.to_string()
    } else {
        format!("models/{id}")
    }
}

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl GeminiBackend {
    /// Create a client from backend settings.
    pub fn new(settings: &BackendConfig, api_key: ApiKey) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.discovery_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        })
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(BackendError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn discover_capabilities(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let page_size = defaults::DISCOVERY_PAGE_SIZE.to_string();
        let mut capabilities = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.clone())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let resp = self
                .http
                .get(&url)
                .header("x-goog-api-key", self.api_key.expose())
                .query(&query)
                .send()
                .await?;
            let page: ListModelsResponse = Self::check_status(resp).await?.json().await?;

            capabilities.extend(
                page.models
                    .into_iter()
                    .filter(|m| {
                        m.supported_generation_methods
                            .iter()
                            .any(|method| method == defaults::GENERATE_CONTENT_METHOD)
                    })
                    .map(|m| m.name),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = capabilities.len(), "Discovered generation capabilities");
        Ok(capabilities)
    }

    fn bind(&self, capability: &str) -> Result<(), BackendError> {
        if capability_pattern().is_match(capability.trim()) {
            Ok(())
        } else {
            Err(BackendError::InvalidCapability(capability.to_string()))
        }
    }

    async fn generate(
        &self,
        capability: &str,
        instructions: &str,
        input: &str,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            resource_name(capability)
        );

        let generation_config = if self.temperature.is_some() || self.max_output_tokens.is_some() {
            Some(GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            })
        } else {
            None
        };

        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: instructions }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: input }],
            }],
            generation_config,
        };

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let body: GenerateResponse = Self::check_status(resp).await?.json().await?;
        body.into_text()
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}
