mod executor;
mod tools;
mod transcript;

pub use executor::{AgentExecutor, AgentRun};
pub use tools::{tool_specs, HtmlFormatter, ToolCall, Toolbox};
pub use transcript::{AgentEvent, AgentTranscript};
