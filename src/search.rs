//! Retrieval operations over a [`Backend`].
//!
//! Four ways to answer a question: dense vector similarity, lexical
//! full-text match, a hybrid fusion of both, and parent-document retrieval
//! through embedded child chunks.

use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::fusion::{Scored, fuse};
use crate::stores::{Backend, ParentHit, SearchHit};
use crate::types::RagError;

/// Dense vector search: embed the question, return the `top_k` nearest chunks.
pub async fn vector_search<B, E>(
    backend: &B,
    embedder: &E,
    question: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>, RagError>
where
    B: Backend + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let embedding = embedder.embed(question).await?;
    let hits = backend.search_similar(&embedding, top_k).await?;
    debug!(question, hits = hits.len(), "vector search");
    Ok(hits)
}

/// Lexical full-text search over chunk text.
pub async fn text_search<B>(
    backend: &B,
    question: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>, RagError>
where
    B: Backend + ?Sized,
{
    let hits = backend.search_text(question, top_k).await?;
    debug!(question, hits = hits.len(), "text search");
    Ok(hits)
}

/// Hybrid search: vector and full-text retrieval fused into one ranking.
///
/// Both methods run capped at `top_k`; their results are merged by
/// [`fuse`] — per-list max normalization, best normalized score per chunk —
/// and the fused ranking is capped at `top_k` again.
pub async fn hybrid_search<B, E>(
    backend: &B,
    embedder: &E,
    question: &str,
    top_k: usize,
) -> Result<Vec<SearchHit>, RagError>
where
    B: Backend + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let embedding = embedder.embed(question).await?;
    let dense = backend.search_similar(&embedding, top_k).await?;
    let lexical = backend.search_text(question, top_k).await?;
    debug!(
        question,
        dense = dense.len(),
        lexical = lexical.len(),
        "hybrid search"
    );

    let fused = fuse(to_scored(dense), to_scored(lexical), top_k, |item| item.0)?;
    Ok(fused
        .into_iter()
        .map(|scored| SearchHit {
            index: scored.item.0,
            text: scored.item.1,
            score: scored.score,
        })
        .collect())
}

/// Parent-document retrieval: match child chunks by vector similarity and
/// return their parent sections, each scored by its best-matching child.
pub async fn parent_document_search<B, E>(
    backend: &B,
    embedder: &E,
    question: &str,
    top_k: usize,
) -> Result<Vec<ParentHit>, RagError>
where
    B: Backend + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let embedding = embedder.embed(question).await?;
    let hits = backend.search_parents(&embedding, top_k).await?;
    debug!(question, hits = hits.len(), "parent document search");
    Ok(hits)
}

fn to_scored(hits: Vec<SearchHit>) -> Vec<Scored<(usize, String)>> {
    hits.into_iter()
        .map(|hit| Scored::new((hit.index, hit.text), hit.score))
        .collect()
}
