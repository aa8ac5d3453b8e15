use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    ModelTurn { turn: u32 },
    ToolRequested { call_id: String, tool: String },
    ToolSucceeded { call_id: String, tool: String, output_chars: usize },
    ToolRejected { call_id: String, tool: String, code: String },
    FinalAnswer { chars: usize },
}

/// What happened during one agent run. Kept for logs and tests; never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentTranscript {
    pub events: Vec<AgentEvent>,
}

impl AgentTranscript {
    pub(crate) fn record(&mut self, event: AgentEvent) {
        debug!(?event, "agent event");
        self.events.push(event);
    }

    pub fn model_turns(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AgentEvent::ModelTurn { .. }))
            .count()
    }

    pub fn tools_succeeded(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::ToolSucceeded { tool, .. } => Some(tool.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::ToolRejected { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .collect()
    }
}
