#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use psum_ai::embeddings::Embedder;
use psum_ai::llm::{ChatMessage, ChatReply, Llm, ToolCallRequest, ToolSpec};
use psum_core::document::DocumentReader;
use psum_core::error::AppError;

/// Deterministic embedding: counts of 'a', 'b' and 'c'.
pub struct CountEmbedder {
    calls: AtomicUsize,
}

impl CountEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountEmbedder {
    fn embed(&self, _model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = [0f32; 3];
        for ch in input.chars() {
            match ch {
                'a' => v[0] += 1.0,
                'b' => v[1] += 1.0,
                'c' => v[2] += 1.0,
                _ => {}
            }
        }
        Ok(v.to_vec())
    }
}

/// Replays queued replies for tool-enabled chats; tool-less completions (the nested html
/// formatter) always get `format_reply`.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<ChatReply, AppError>>>,
    format_reply: String,
    pub agent_calls: AtomicUsize,
    pub format_calls: AtomicUsize,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    pub format_prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<ChatReply, AppError>>, format_reply: &str) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            format_reply: format_reply.to_string(),
            agent_calls: AtomicUsize::new(0),
            format_calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            format_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn agent_call_count(&self) -> usize {
        self.agent_calls.load(Ordering::SeqCst)
    }

    /// Tool result messages from the most recent agent call.
    pub fn last_tool_results(&self) -> Vec<String> {
        let seen = self.seen.lock().unwrap();
        seen.last()
            .map(|msgs| {
                msgs.iter()
                    .filter_map(|m| match m {
                        ChatMessage::Tool { content, .. } => Some(content.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Llm for ScriptedLlm {
    fn chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatReply, AppError> {
        if tools.is_empty() {
            self.format_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ChatMessage::User(prompt)) = messages.first() {
                self.format_prompts.lock().unwrap().push(prompt.clone());
            }
            return Ok(ChatReply::Final(self.format_reply.clone()));
        }
        self.agent_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::new("AI_CHAT_FAILED", "script exhausted")))
    }
}

pub struct FailingReader {
    pub reads: AtomicUsize,
}

impl FailingReader {
    pub fn new() -> Self {
        Self {
            reads: AtomicUsize::new(0),
        }
    }
}

impl DocumentReader for FailingReader {
    fn read(&self, path: &Path) -> Result<String, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(AppError::new("DOC_READ_FAILED", "Failed to extract text from PDF")
            .with_details(format!("path={}; err=corrupt xref table", path.display())))
    }
}

pub fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Result<ChatReply, AppError> {
    Ok(ChatReply::ToolCalls(calls))
}

pub fn final_answer(text: &str) -> Result<ChatReply, AppError> {
    Ok(ChatReply::Final(text.to_string()))
}

/// Writes a.txt (Good, "clear") and b.txt (Bad, "rambling") plus the manifest; returns its path.
pub fn write_two_entry_corpus(dir: &Path) -> PathBuf {
    fs::write(dir.join("a.txt"), "aaaa alpha apple summary").expect("write a");
    fs::write(dir.join("b.txt"), "bbbb bubbly babbling blob").expect("write b");
    let manifest = dir.join("examples.json");
    fs::write(
        &manifest,
        r#"{
            "Good": [{"formatted_file_path": "a.txt", "comments": ["clear"]}],
            "Bad": [{"formatted_file_path": "b.txt", "comments": ["rambling"]}]
        }"#,
    )
    .expect("write manifest");
    manifest
}

pub fn valid_summary_json() -> String {
    serde_json::json!({
        "title": "Deep Work",
        "tldr": "Focus is a trainable skill.",
        "actionable_takeaways": ["Block two hours each morning"],
        "script": [{
            "title": "Opening",
            "start_timestamp": {"hours": 0, "minutes": 0, "seconds": 0},
            "end_timestamp": {"hours": 0, "minutes": 5, "seconds": 0},
            "text": "Host introduces the topic of focus.",
            "important_points": ["Attention residue slows switching"]
        }],
        "appendix": []
    })
    .to_string()
}

pub const FORMATTED_HTML: &str = "<html><body><h1>🧠 Deep Work</h1><p>Focus is a trainable skill.</p></body></html>";
