pub mod agent;
pub mod client;
pub mod corpus;
pub mod embeddings;
pub mod guardrails;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod retrieve;
pub mod retry;

pub use pipeline::{Summarizer, SummarizerOptions};
