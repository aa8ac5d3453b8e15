use psum_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{truncate_on_char_boundary, Embedder};
use crate::client::ProviderClient;

// Embedding endpoints cap input tokens; transcripts can be far longer.
const MAX_INPUT_BYTES: usize = 24_000;

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: ProviderClient,
}

impl OpenAiEmbedder {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let input = truncate_on_char_boundary(input, MAX_INPUT_BYTES);
        if input.trim().is_empty() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Cannot embed empty text",
            ));
        }
        let req = EmbeddingsRequest { model, input };
        let resp: EmbeddingsResponse = self.client.post_json("/embeddings", &req, "AI_EMBEDDINGS_FAILED")?;
        first_embedding(resp)
    }
}

fn first_embedding(resp: EmbeddingsResponse) -> Result<Vec<f32>, AppError> {
    let v = resp
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .unwrap_or_default();
    if v.is_empty() {
        return Err(AppError::new(
            "AI_EMBEDDINGS_FAILED",
            "Embeddings response was empty",
        )
        .with_retryable(true));
    }
    Ok(v)
}
