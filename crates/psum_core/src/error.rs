use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape shared by the core, the AI pipeline and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

/// Coarse grouping of error codes, used for logging and for deciding what a caller may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Collaborator,
    Model,
    Schema,
    Agent,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn category(&self) -> ErrorCategory {
        let code = self.code.as_str();
        if code.starts_with("CONFIG_") || code.starts_with("CORPUS_") {
            ErrorCategory::Configuration
        } else if code.starts_with("DOC_") || code.starts_with("OUTPUT_") {
            ErrorCategory::Collaborator
        } else if code == "AI_SCHEMA_VIOLATION" {
            ErrorCategory::Schema
        } else if code.starts_with("AI_") {
            ErrorCategory::Model
        } else if code.starts_with("AGENT_") {
            ErrorCategory::Agent
        } else {
            ErrorCategory::Validation
        }
    }

    /// Message safe to hand to a remote caller. Never includes `details`.
    pub fn public_message(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "The request was invalid",
            _ => "Internal error while summarizing the document",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
