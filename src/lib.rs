//! ```text
//! Raw document ──► chunking::SectionSplitter ──► Sections
//!                              │
//! Sections / text ──► chunking::chunk_text ──► ordered chunks
//!                              │
//! Chunks ──► embeddings::EmbeddingProvider ──► vectors
//!                              │
//! Chunks + vectors ──► ingestion ──► stores::SqliteRagStore
//!                                         │
//! Question ──► search::{vector, text, hybrid, parent} ──► ranked hits
//!                              │
//!                    fusion::fuse (hybrid merge)
//! ```
//!
//! `ragweld` provides the moving parts of a local retrieval-augmented
//! generation pipeline: overlapping text chunking, title-based section
//! splitting, an embedding capability contract, a SQLite-backed store with
//! vector and full-text indexes, and hybrid score fusion over both.

pub mod chunking;
pub mod embeddings;
pub mod fusion;
pub mod ingestion;
pub mod search;
pub mod stores;
pub mod types;

pub use chunking::{ChunkStrategy, ChunkingParams, Section, SectionSplitter, chunk_text};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use fusion::{Scored, fuse};
pub use ingestion::{IngestReport, ingest_document, ingest_text};
pub use search::{hybrid_search, parent_document_search, text_search, vector_search};
pub use stores::{Backend, ChunkRecord, ParentHit, SearchHit, SqliteRagStore};
pub use types::RagError;
