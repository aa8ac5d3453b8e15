use std::path::Path;
use std::sync::Arc;

use psum_core::config::Config;
use psum_core::corpus::load_manifest;
use psum_core::document::{remove_output, write_output, DocumentReader, FileDocumentReader};
use psum_core::error::AppError;
use tracing::{error, info, info_span, warn};

use crate::agent::{AgentExecutor, HtmlFormatter, Toolbox};
use crate::client::ProviderClient;
use crate::corpus::{ExampleCache, ExampleIndex};
use crate::embeddings::openai_embed::OpenAiEmbedder;
use crate::embeddings::Embedder;
use crate::guardrails::{enforce_html, strip_code_fences};
use crate::llm::openai_chat::OpenAiLlm;
use crate::llm::Llm;
use crate::prompts;
use crate::retrieve::retrieve;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    pub chat_model: String,
    pub top_k: u32,
    pub max_tool_rounds: u32,
    pub style_hint: String,
    pub retry: RetryPolicy,
}

impl SummarizerOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            chat_model: cfg.provider.chat_model.clone(),
            top_k: cfg.corpus.top_k,
            max_tool_rounds: cfg.agent.max_tool_rounds,
            style_hint: cfg.agent.style_hint.clone(),
            retry: RetryPolicy::from_config(&cfg.retry),
        }
    }
}

/// Summarization service. Construct once and share; concurrent calls only share the
/// read-only example index.
pub struct Summarizer {
    options: SummarizerOptions,
    examples: ExampleCache,
    llm: Arc<dyn Llm>,
    embedder: Arc<dyn Embedder>,
    reader: Arc<dyn DocumentReader>,
}

impl Summarizer {
    pub fn new(
        options: SummarizerOptions,
        examples: ExampleCache,
        llm: Arc<dyn Llm>,
        embedder: Arc<dyn Embedder>,
        reader: Arc<dyn DocumentReader>,
    ) -> Self {
        Self {
            options,
            examples,
            llm,
            embedder,
            reader,
        }
    }

    /// Wire the OpenAI-compatible provider, the file reader and the configured corpus.
    pub fn from_config(cfg: &Config) -> Result<Self, AppError> {
        let client = ProviderClient::from_config(&cfg.provider)?;
        Ok(Self::from_client(cfg, client))
    }

    /// Same as [`Summarizer::from_config`], reusing an already constructed provider client.
    pub fn from_client(cfg: &Config, client: ProviderClient) -> Self {
        Self::new(
            SummarizerOptions::from_config(cfg),
            ExampleCache::new(cfg.corpus.manifest_path.clone(), cfg.provider.embedding_model.clone()),
            Arc::new(OpenAiLlm::new(client.clone())),
            Arc::new(OpenAiEmbedder::new(client)),
            Arc::new(FileDocumentReader),
        )
    }

    pub fn examples(&self) -> &ExampleCache {
        &self.examples
    }

    /// Build the example index now with this service's embedder, instead of on first use.
    pub fn warm_examples(&self) -> Result<Arc<ExampleIndex>, AppError> {
        self.examples.get_or_build(self.embedder.as_ref())
    }

    /// Summarize the document at `input`, persist the HTML at `output` and return it.
    ///
    /// The returned string is the content this call persisted at `output`. On failure no output
    /// file is left behind unless one existed before the call.
    pub fn summarize(&self, input: &Path, output: &Path) -> Result<String, AppError> {
        let span = info_span!("summarize", input = %input.display(), output = %output.display());
        let _guard = span.enter();

        if !input.is_file() {
            return Err(AppError::new("DOC_NOT_FOUND", "Input document not found")
                .with_details(format!("path={}", input.display())));
        }
        if !self.examples.is_ready() {
            // A missing or malformed manifest cannot be fixed by retrying.
            load_manifest(self.examples.manifest_path())?;
        }
        let output_existed = output.exists();

        let result = self.options.retry.run(|attempt| {
            let index = self.examples.get_or_build(self.embedder.as_ref())?;
            self.summarize_once(&index, input, output, attempt)
        });

        match result {
            Ok(html) => {
                info!(bytes = html.len(), "summary complete");
                Ok(html)
            }
            Err(e) => {
                if !output_existed {
                    if let Err(rm) = remove_output(output) {
                        warn!(code = %rm.code, "failed to remove output after failure");
                    }
                }
                error!(code = %e.code, category = ?e.category(), "summarization failed");
                Err(e)
            }
        }
    }

    fn summarize_once(
        &self,
        index: &ExampleIndex,
        input: &Path,
        output: &Path,
        attempt: u32,
    ) -> Result<String, AppError> {
        info!(attempt, "summarization attempt");

        let text = self.reader.read(input)?;
        let hits = retrieve(index, self.embedder.as_ref(), &text, self.options.top_k)?;
        info!(examples = ?hits.sources(), "reference examples selected");

        let system = prompts::summarizer_system_prompt(
            &prompts::summary_schema_instructions(),
            &prompts::examples_block(&hits),
        );
        let task = prompts::task_message(input, output);

        let toolbox = Toolbox {
            reader: self.reader.as_ref(),
            formatter: HtmlFormatter {
                llm: self.llm.as_ref(),
                model: &self.options.chat_model,
                embedder: self.embedder.as_ref(),
                index,
                top_k: self.options.top_k,
                default_style: &self.options.style_hint,
            },
            document_path: input,
            output_path: output,
        };
        let executor = AgentExecutor::new(
            self.llm.as_ref(),
            &self.options.chat_model,
            &toolbox,
            self.options.max_tool_rounds,
        );
        let run = executor.run(&system, &task)?;
        let answer = strip_code_fences(&run.output);

        // Other calls may target the same path, so reconcile against what this run wrote
        // rather than whatever the file holds now.
        if let Some(persisted) = run.written {
            if persisted.trim() != answer.trim() {
                warn!(
                    answer_chars = answer.chars().count(),
                    persisted_chars = persisted.chars().count(),
                    "final answer differs from persisted output; returning persisted content"
                );
            }
            return Ok(persisted);
        }

        enforce_html(answer)?;
        warn!("agent did not write the output; persisting its final answer");
        write_output(output, answer)
    }
}
