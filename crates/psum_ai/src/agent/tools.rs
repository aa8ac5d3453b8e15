use std::path::{Component, Path, PathBuf};

use psum_core::document::{write_output, DocumentReader};
use psum_core::domain::SummaryDocument;
use psum_core::error::AppError;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::corpus::ExampleIndex;
use crate::embeddings::Embedder;
use crate::guardrails::{enforce_html, strip_code_fences};
use crate::llm::{Llm, ToolSpec};
use crate::prompts;
use crate::retrieve::retrieve;

pub const READ_DOCUMENT: &str = "read_document";
pub const WRITE_OUTPUT: &str = "write_output";
pub const FORMAT_AS_HTML: &str = "format_as_html";

/// The only capabilities the agent can invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ReadDocument { path: String },
    WriteOutput { content: String, path: String },
    FormatHtml { raw_text: String, style_hint: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadDocumentArgs {
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WriteOutputArgs {
    content: String,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormatHtmlArgs {
    raw_text: String,
    #[serde(default)]
    style_hint: Option<String>,
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ReadDocument { .. } => READ_DOCUMENT,
            ToolCall::WriteOutput { .. } => WRITE_OUTPUT,
            ToolCall::FormatHtml { .. } => FORMAT_AS_HTML,
        }
    }

    /// Decode a model tool request. Unknown tools and malformed arguments are rejected.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, AppError> {
        let args = if arguments.trim().is_empty() { "{}" } else { arguments };
        let invalid = |e: serde_json::Error| {
            AppError::new("AGENT_TOOL_INVALID", "Tool arguments do not match the tool schema")
                .with_details(format!("tool={name}; err={e}"))
        };

        match name {
            READ_DOCUMENT => {
                let a: ReadDocumentArgs = serde_json::from_str(args).map_err(invalid)?;
                Ok(ToolCall::ReadDocument { path: a.path })
            }
            WRITE_OUTPUT => {
                let a: WriteOutputArgs = serde_json::from_str(args).map_err(invalid)?;
                Ok(ToolCall::WriteOutput {
                    content: a.content,
                    path: a.path,
                })
            }
            FORMAT_AS_HTML => {
                let a: FormatHtmlArgs = serde_json::from_str(args).map_err(invalid)?;
                Ok(ToolCall::FormatHtml {
                    raw_text: a.raw_text,
                    style_hint: a.style_hint.filter(|s| !s.trim().is_empty()),
                })
            }
            other => Err(AppError::new("AGENT_TOOL_INVALID", "Unknown tool")
                .with_details(format!("tool={other}"))),
        }
    }
}

pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: READ_DOCUMENT,
            description: "Extract the text of the podcast transcript document. Provide the transcript path.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Path of the transcript document." }
                },
                "required": ["path"],
                "additionalProperties": false
            }),
        },
        ToolSpec {
            name: WRITE_OUTPUT,
            description: "Write the HTML formatted podcast summary to the output file, replacing its contents. Returns the content that was written.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "content": { "type": "string", "description": "The HTML document to write." },
                    "path": { "type": "string", "description": "The output file path." }
                },
                "required": ["content", "path"],
                "additionalProperties": false
            }),
        },
        ToolSpec {
            name: FORMAT_AS_HTML,
            description: "Format a summary (JSON matching the summary schema) into a readable HTML document without changing any facts. Returns the HTML.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "raw_text": { "type": "string", "description": "Summary JSON matching the summary schema." },
                    "style_hint": { "type": "string", "description": "Design the notes should follow, e.g. \"Fun Notes\"." }
                },
                "required": ["raw_text"],
                "additionalProperties": false
            }),
        },
    ]
}

/// Nested model call that restyles a validated summary as HTML, using retrieved examples as
/// style exemplars.
pub struct HtmlFormatter<'a> {
    pub llm: &'a dyn Llm,
    pub model: &'a str,
    pub embedder: &'a dyn Embedder,
    pub index: &'a ExampleIndex,
    pub top_k: u32,
    pub default_style: &'a str,
}

impl HtmlFormatter<'_> {
    pub fn format(&self, raw_text: &str, style_hint: Option<&str>) -> Result<String, AppError> {
        let summary = SummaryDocument::parse_strict(raw_text)?;
        let canonical = serde_json::to_string_pretty(&summary).map_err(|e| {
            AppError::new("AI_FORMAT_FAILED", "Failed to encode summary").with_details(e.to_string())
        })?;

        let hits = retrieve(self.index, self.embedder, &canonical, self.top_k)?;
        let style = style_hint.unwrap_or(self.default_style);
        let prompt = prompts::format_html_prompt(&prompts::examples_block(&hits), &canonical, style);

        let out = self.llm.generate(self.model, &prompt)?;
        let html = strip_code_fences(&out);
        enforce_html(html)?;
        info!(style, sections = summary.script.len(), "summary formatted as html");
        Ok(html.to_string())
    }
}

/// Executes tool calls for a single run, scoped to that run's input and output paths.
pub struct Toolbox<'a> {
    pub reader: &'a dyn DocumentReader,
    pub formatter: HtmlFormatter<'a>,
    pub document_path: &'a Path,
    pub output_path: &'a Path,
}

impl Toolbox<'_> {
    pub fn execute(&self, call: &ToolCall) -> Result<String, AppError> {
        match call {
            ToolCall::ReadDocument { path } => {
                ensure_same_path("transcript", path, self.document_path)?;
                self.reader.read(self.document_path)
            }
            ToolCall::WriteOutput { content, path } => {
                ensure_same_path("output", path, self.output_path)?;
                let html = strip_code_fences(content);
                enforce_html(html)?;
                write_output(self.output_path, html)
            }
            ToolCall::FormatHtml {
                raw_text,
                style_hint,
            } => self.formatter.format(raw_text, style_hint.as_deref()),
        }
    }
}

fn ensure_same_path(role: &str, requested: &str, allowed: &Path) -> Result<(), AppError> {
    if same_path(Path::new(requested.trim()), allowed) {
        return Ok(());
    }
    Err(AppError::new(
        "AGENT_TOOL_DENIED",
        format!("Tool may only access the {role} path for this run"),
    )
    .with_details(format!("requested={requested}; allowed={}", allowed.display())))
}

fn same_path(a: &Path, b: &Path) -> bool {
    if lexical(a) == lexical(b) {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

fn lexical(p: &Path) -> PathBuf {
    p.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
