use psum_core::error::AppError;
use tracing::{info, warn};

use super::tools::{tool_specs, ToolCall, Toolbox};
use super::transcript::{AgentEvent, AgentTranscript};
use crate::llm::{ChatMessage, ChatReply, Llm, ToolCallRequest};

#[derive(Debug, Clone)]
pub struct AgentRun {
    /// The model's final text answer, unmodified.
    pub output: String,
    pub transcript: AgentTranscript,
    /// Content of the last successful write_output call in this run, exactly as persisted.
    pub written: Option<String>,
}

impl AgentRun {
    pub fn wrote_output(&self) -> bool {
        self.written.is_some()
    }
}

enum AgentState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(String),
    Failed(AppError),
}

/// Drives the model through tool calls until it produces a final answer.
pub struct AgentExecutor<'a> {
    llm: &'a dyn Llm,
    model: &'a str,
    toolbox: &'a Toolbox<'a>,
    max_tool_rounds: u32,
}

impl<'a> AgentExecutor<'a> {
    pub fn new(llm: &'a dyn Llm, model: &'a str, toolbox: &'a Toolbox<'a>, max_tool_rounds: u32) -> Self {
        Self {
            llm,
            model,
            toolbox,
            max_tool_rounds,
        }
    }

    pub fn run(&self, system_prompt: &str, task: &str) -> Result<AgentRun, AppError> {
        let specs = tool_specs();
        let mut messages = vec![
            ChatMessage::System(system_prompt.to_string()),
            ChatMessage::User(task.to_string()),
        ];
        let mut transcript = AgentTranscript::default();
        let mut turns = 0u32;
        let mut tool_rounds = 0u32;
        let mut written: Option<String> = None;
        let mut state = AgentState::AwaitingModel;

        loop {
            state = match state {
                AgentState::AwaitingModel => {
                    turns += 1;
                    transcript.record(AgentEvent::ModelTurn { turn: turns });
                    match self.llm.chat(self.model, &messages, &specs) {
                        Ok(ChatReply::Final(text)) => AgentState::Done(text),
                        Ok(ChatReply::ToolCalls(calls)) if calls.is_empty() => AgentState::Failed(
                            AppError::new("AI_CHAT_FAILED", "Model returned an empty tool call list")
                                .with_retryable(true),
                        ),
                        Ok(ChatReply::ToolCalls(calls)) => {
                            tool_rounds += 1;
                            if tool_rounds > self.max_tool_rounds {
                                AgentState::Failed(
                                    AppError::new(
                                        "AGENT_ROUND_LIMIT",
                                        "Agent exceeded the maximum number of tool-call rounds",
                                    )
                                    .with_details(format!("max_tool_rounds={}", self.max_tool_rounds))
                                    .with_retryable(true),
                                )
                            } else {
                                messages.push(ChatMessage::AssistantToolCalls(calls.clone()));
                                AgentState::ExecutingTools(calls)
                            }
                        }
                        Err(e) => AgentState::Failed(e),
                    }
                }
                AgentState::ExecutingTools(calls) => self.execute_round(
                    calls,
                    &mut messages,
                    &mut transcript,
                    &mut written,
                ),
                AgentState::Done(output) => {
                    transcript.record(AgentEvent::FinalAnswer {
                        chars: output.chars().count(),
                    });
                    info!(turns, tool_rounds, wrote_output = written.is_some(), "agent finished");
                    return Ok(AgentRun {
                        output,
                        transcript,
                        written,
                    });
                }
                AgentState::Failed(err) => {
                    warn!(turns, tool_rounds, code = %err.code, "agent run failed");
                    return Err(err);
                }
            };
        }
    }

    fn execute_round(
        &self,
        calls: Vec<ToolCallRequest>,
        messages: &mut Vec<ChatMessage>,
        transcript: &mut AgentTranscript,
        written: &mut Option<String>,
    ) -> AgentState {
        for call in calls {
            transcript.record(AgentEvent::ToolRequested {
                call_id: call.id.clone(),
                tool: call.name.clone(),
            });

            let outcome = ToolCall::parse(&call.name, &call.arguments).and_then(|tool| {
                let out = self.toolbox.execute(&tool)?;
                Ok((tool, out))
            });

            match outcome {
                Ok((tool, out)) => {
                    if matches!(tool, ToolCall::WriteOutput { .. }) {
                        *written = Some(out.clone());
                    }
                    transcript.record(AgentEvent::ToolSucceeded {
                        call_id: call.id.clone(),
                        tool: call.name.clone(),
                        output_chars: out.chars().count(),
                    });
                    messages.push(ChatMessage::Tool {
                        call_id: call.id,
                        content: out,
                    });
                }
                // The model can fix these itself; report them back as the tool result.
                Err(e) if is_repairable(&e) => {
                    warn!(tool = %call.name, code = %e.code, "tool call rejected");
                    transcript.record(AgentEvent::ToolRejected {
                        call_id: call.id.clone(),
                        tool: call.name.clone(),
                        code: e.code.clone(),
                    });
                    messages.push(ChatMessage::Tool {
                        call_id: call.id,
                        content: repair_message(&e),
                    });
                }
                Err(e) => return AgentState::Failed(e),
            }
        }
        AgentState::AwaitingModel
    }
}

fn is_repairable(e: &AppError) -> bool {
    matches!(
        e.code.as_str(),
        "AGENT_TOOL_INVALID" | "AGENT_TOOL_DENIED" | "AI_SCHEMA_VIOLATION"
    )
}

fn repair_message(e: &AppError) -> String {
    match &e.details {
        Some(d) => format!("ERROR [{}] {}: {}", e.code, e.message, d),
        None => format!("ERROR [{}] {}", e.code, e.message),
    }
}
