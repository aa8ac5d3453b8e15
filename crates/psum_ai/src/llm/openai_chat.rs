use psum_core::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChatMessage, ChatReply, Llm, ToolCallRequest, ToolSpec};
use crate::client::ProviderClient;

#[derive(Debug, Clone)]
pub struct OpenAiLlm {
    client: ProviderClient,
}

impl OpenAiLlm {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl Llm for OpenAiLlm {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatReply, AppError> {
        let req = ChatRequest {
            model,
            messages: messages.iter().map(encode_message).collect(),
            tools: tools.iter().map(encode_tool).collect(),
        };
        let resp: ChatResponse = self.client.post_json("/chat/completions", &req, "AI_CHAT_FAILED")?;
        decode_reply(resp)
    }
}

fn encode_message(m: &ChatMessage) -> Value {
    match m {
        ChatMessage::System(content) => json!({ "role": "system", "content": content }),
        ChatMessage::User(content) => json!({ "role": "user", "content": content }),
        ChatMessage::Assistant(content) => json!({ "role": "assistant", "content": content }),
        ChatMessage::AssistantToolCalls(calls) => json!({
            "role": "assistant",
            "content": Value::Null,
            "tool_calls": calls.iter().map(|c| json!({
                "id": c.id,
                "type": "function",
                "function": { "name": c.name, "arguments": c.arguments },
            })).collect::<Vec<_>>(),
        }),
        ChatMessage::Tool { call_id, content } => json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": content,
        }),
    }
}

fn encode_tool(t: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": t.name,
            "description": t.description,
            "parameters": t.parameters,
        },
    })
}

fn decode_reply(resp: ChatResponse) -> Result<ChatReply, AppError> {
    let Some(choice) = resp.choices.into_iter().next() else {
        return Err(AppError::new("AI_CHAT_FAILED", "Chat response had no choices")
            .with_retryable(true));
    };
    let msg = choice.message;

    if !msg.tool_calls.is_empty() {
        let calls = msg
            .tool_calls
            .into_iter()
            .map(|c| ToolCallRequest {
                id: c.id,
                name: c.function.name,
                arguments: c.function.arguments,
            })
            .collect();
        return Ok(ChatReply::ToolCalls(calls));
    }

    match msg.content {
        Some(text) if !text.trim().is_empty() => Ok(ChatReply::Final(text)),
        _ => Err(AppError::new("AI_CHAT_FAILED", "Chat response was empty").with_retryable(true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tool_calls() {
        let json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "read_document", "arguments": "{\"path\":\"a.pdf\"}" }
                    }]
                }
            }]
        });
        let resp: ChatResponse = serde_json::from_value(json).expect("decode");
        let reply = decode_reply(resp).expect("reply");
        assert_eq!(
            reply,
            ChatReply::ToolCalls(vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "read_document".to_string(),
                arguments: "{\"path\":\"a.pdf\"}".to_string(),
            }])
        );
    }

    #[test]
    fn decodes_final_text() {
        let json = json!({ "choices": [{ "message": { "content": "<h1>Done</h1>" } }] });
        let resp: ChatResponse = serde_json::from_value(json).expect("decode");
        assert_eq!(decode_reply(resp).expect("reply"), ChatReply::Final("<h1>Done</h1>".to_string()));
    }

    #[test]
    fn empty_reply_is_retryable_error() {
        let resp: ChatResponse =
            serde_json::from_value(json!({ "choices": [] })).expect("decode");
        let err = decode_reply(resp).expect_err("should error");
        assert!(err.retryable);
    }

    #[test]
    fn encodes_tool_results_with_call_id() {
        let v = encode_message(&ChatMessage::Tool {
            call_id: "call_9".to_string(),
            content: "ok".to_string(),
        });
        assert_eq!(v["role"], "tool");
        assert_eq!(v["tool_call_id"], "call_9");
    }
}
