use psum_core::error::AppError;

/// Text -> vector. The same model must be used for the corpus and for queries.
pub trait Embedder: Send + Sync {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod openai_embed;

/// Longest prefix of `input` that is at most `max_bytes` long and ends on a char boundary.
pub(crate) fn truncate_on_char_boundary(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }
    let mut end = max_bytes;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}
