//! OpenAI chat-completion connector.
//!
//! Holds one credential and one HTTP client, and forwards message lists to a
//! fixed model with fixed sampling settings. The response body is returned
//! untouched.

use crate::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Model every request is sent to
pub const MODEL: &str = "gpt-3.5-turbo";

pub const TEMPERATURE: f64 = 0.5;

pub const PRESENCE_PENALTY: f64 = 1.1;

const MISSING_KEY_MESSAGE: &str =
    "OpenAI API key is missing. Set the OPENAI_API_KEY environmental variable.";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
    Tool,
}

/// One role-tagged chat message.
///
/// Fields other than `role` and `content` (`name`, `tool_call_id`, ...) are
/// kept in `extra` and sent back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an extra field such as `name`.
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a, M> {
    model: &'static str,
    messages: &'a [M],
    temperature: f64,
    presence_penalty: f64,
}

/// Connection to an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiConnector {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConnector")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiConnector {
    /// Build from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Build from an explicit key. A missing or blank key fails before any
    /// client is created.
    pub fn from_api_key(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| HarvestError::MissingCredential(MISSING_KEY_MESSAGE.to_string()))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HarvestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!(model = MODEL, "OpenAI API connection established");
        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Point the connector at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `messages` in one request and return the raw response object.
    ///
    /// Each message is serialized as given: [`Message`] values or raw
    /// `serde_json::Value` objects go out without any field being dropped.
    pub async fn get_completions<M: Serialize>(&self, messages: &[M]) -> Result<serde_json::Value> {
        let api_url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: MODEL,
            messages,
            temperature: TEMPERATURE,
            presence_penalty: PRESENCE_PENALTY,
        };

        debug!(messages = messages.len(), model = MODEL, "Sending chat completion request");

        let response = self
            .client
            .post(&api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(HarvestError::Api {
                code: status.as_u16() as i32,
                message: format!("Completion API error: {} - {}", status, error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| HarvestError::Parse(format!("Failed to parse completion response: {}", e)))
    }
}
