//! Storage backends for chunks, sections, and their embeddings.
//!
//! The [`Backend`] trait abstracts the store so orchestration code (ingestion
//! and search) never depends on a specific database. Two shapes of data live
//! behind it:
//!
//! * **Flat chunks** — position-indexed chunks of a single text, the unit of
//!   vector and full-text search. Re-ingesting a text overwrites by position.
//! * **Parent/child documents** — titled sections stored as parents, each
//!   with embedded child chunks; retrieval matches children and returns
//!   parents.
//!
//! # Supported backends
//!
//! - [`sqlite::SqliteRagStore`] — SQLite with `sqlite-vec` KNN and FTS5
//!   full-text indexes.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use sqlite::SqliteRagStore;

/// A flat chunk keyed by its position in the source text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Zero-based position of the chunk in its source.
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A stored section: the parent of its embedded chunk children.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParentRecord {
    /// Storage key, `{document_id}-{position}`.
    pub id: String,
    pub document_id: String,
    /// Lowercased section title; not necessarily unique.
    pub section_id: String,
    pub position: usize,
    pub text: String,
}

/// An embedded chunk of a parent section.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChildRecord {
    /// Storage key, `{parent_id}-{position}`.
    pub id: String,
    pub parent_id: String,
    pub position: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// One flat-chunk retrieval result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// One parent-document retrieval result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParentHit {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Unified interface for chunk and document storage.
///
/// Similarity scores are cosine similarity (`1 - distance`); full-text scores
/// are relevance with higher-is-better. Both are positive for real matches,
/// which is what the hybrid fuser's max-normalization assumes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Inserts or replaces flat chunks by position.
    async fn upsert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError>;

    /// KNN over flat-chunk embeddings, best first, at most `top_k` results.
    async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, RagError>;

    /// Full-text match over flat-chunk text, best first, at most `top_k`.
    async fn search_text(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, RagError>;

    /// Stores one parent section with its children, atomically.
    async fn insert_document(
        &self,
        parent: ParentRecord,
        children: Vec<ChildRecord>,
    ) -> Result<(), RagError>;

    /// KNN over child embeddings, collapsed to parents; each parent keeps its
    /// best child score.
    async fn search_parents(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ParentHit>, RagError>;

    /// Total number of flat chunks in the store.
    async fn count_chunks(&self) -> Result<usize, RagError>;
}
