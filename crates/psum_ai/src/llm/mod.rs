use psum_core::error::AppError;
use serde::{Deserialize, Serialize};

pub mod openai_chat;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON object text, exactly as the model produced it.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
    AssistantToolCalls(Vec<ToolCallRequest>),
    Tool { call_id: String, content: String },
}

/// A capability the model may request, described by a JSON schema for its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Final(String),
    ToolCalls(Vec<ToolCallRequest>),
}

pub trait Llm: Send + Sync {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatReply, AppError>;

    /// Single-prompt completion without tools.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        match self.chat(model, &[ChatMessage::User(prompt.to_string())], &[])? {
            ChatReply::Final(text) if !text.trim().is_empty() => Ok(text),
            ChatReply::Final(_) => Err(AppError::new("AI_CHAT_FAILED", "Model response was empty")
                .with_retryable(true)),
            ChatReply::ToolCalls(_) => Err(AppError::new(
                "AI_CHAT_FAILED",
                "Model requested tools in a tool-less completion",
            )
            .with_retryable(true)),
        }
    }
}
