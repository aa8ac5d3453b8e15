use psum_core::domain::LabeledExample;
use psum_core::error::AppError;
use tracing::debug;

use crate::corpus::ExampleIndex;
use crate::embeddings::Embedder;

pub mod similarity;

#[derive(Debug, Clone)]
pub struct RetrievedExample<'a> {
    pub example: &'a LabeledExample,
    /// 1-based position in the result.
    pub rank: u32,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalResult<'a> {
    pub hits: Vec<RetrievedExample<'a>>,
}

impl RetrievalResult<'_> {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn sources(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.example.source.as_str()).collect()
    }
}

/// The `k` examples closest to `query`, best first.
///
/// The query is embedded with the model the index was built with. Equal scores keep corpus
/// insertion order, so a fixed corpus and query always produce the same ranking.
pub fn retrieve<'a>(
    index: &'a ExampleIndex,
    embedder: &dyn Embedder,
    query: &str,
    k: u32,
) -> Result<RetrievalResult<'a>, AppError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query must not be empty"));
    }
    if index.is_empty() || k == 0 {
        return Ok(RetrievalResult::default());
    }

    let qv = embedder.embed(index.model(), q)?;
    if let Some(dims) = index.dims() {
        if qv.len() as u32 != dims {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={dims}; query_dims={}", qv.len())));
        }
    }
    let qnorm = similarity::l2_norm(&qv);

    let mut scored: Vec<(usize, f32)> = index
        .entries()
        .iter()
        .enumerate()
        .map(|(pos, e)| (pos, similarity::cosine_similarity(&qv, &e.vector, qnorm, e.norm)))
        .collect();

    // Stable sort keeps insertion order among ties; NaN compares as equal.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k as usize);

    let hits = scored
        .into_iter()
        .enumerate()
        .map(|(i, (pos, score))| RetrievedExample {
            example: &index.entries()[pos].example,
            rank: i as u32 + 1,
            score,
        })
        .collect::<Vec<_>>();
    debug!(k, returned = hits.len(), "examples retrieved");

    Ok(RetrievalResult { hits })
}
