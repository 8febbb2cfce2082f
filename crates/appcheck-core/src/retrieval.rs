//! Retrieval-augmented QA service seam.

use async_trait::async_trait;

use crate::chat::{ChatClient, ChatMessage};
use crate::config::Endpoints;
use crate::domain::ServiceError;

/// Answers a natural-language question.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, ServiceError>;
}

/// Retrieval service reached over the chat-completions API.
#[derive(Debug, Clone)]
pub struct RagClient {
    chat: ChatClient,
}

impl RagClient {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    pub fn from_endpoints(endpoints: &Endpoints) -> Result<Self, ServiceError> {
        let chat = ChatClient::new(
            &endpoints.rag_base_url,
            endpoints.rag_model.clone(),
            endpoints.request_timeout(),
        )?;
        Ok(Self::new(chat))
    }
}

#[async_trait]
impl RetrievalService for RagClient {
    async fn ask(&self, question: &str) -> Result<String, ServiceError> {
        let answer = self.chat.complete(&[ChatMessage::user(question)]).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(ServiceError::Decode {
                url: self.chat.url().to_string(),
                message: "empty answer".to_string(),
            });
        }
        Ok(answer.to_string())
    }
}
