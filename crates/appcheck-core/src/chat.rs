//! Minimal OpenAI-compatible chat-completions client.
//!
//! Both the retrieval service and the judge expose
//! `POST <base>/v1/chat/completions`; this client sends a message list and
//! returns the first choice's content.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ServiceError;

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

const USER_AGENT: &str = concat!("appcheck/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client bound to one chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    url: String,
    model: Option<String>,
    temperature: Option<f32>,
}

impl ChatClient {
    pub fn new(
        base_url: &str,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH);
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            url,
            model,
            temperature: None,
        })
    }

    /// Sampling temperature sent with every request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `messages` and return the first choice's content.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.model.as_deref(),
            messages,
            temperature: self.temperature,
        };

        debug!(url = %self.url, messages = messages.len(), "Sending chat completion");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Transport {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let decoded: ChatResponse = response.json().await.map_err(|e| ServiceError::Decode {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Decode {
                url: self.url.clone(),
                message: "response has no message content".to_string(),
            })
    }
}
