//! Ingestion pipelines: turning raw text into stored, embedded chunks.
//!
//! Two shapes of ingestion mirror the two storage shapes:
//!
//! * [`ingest_text`] — chunk a single text and upsert the chunks flat, keyed
//!   by position. The unit of vector, full-text, and hybrid search.
//! * [`ingest_document`] — split a document into titled sections, store each
//!   section as a parent with its embedded child chunks. The unit of
//!   parent-document retrieval.

use tracing::info;

use crate::chunking::{ChunkingParams, SectionSplitter, chunk_text};
use crate::embeddings::EmbeddingProvider;
use crate::stores::{Backend, ChildRecord, ChunkRecord, ParentRecord};
use crate::types::RagError;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Sections stored as parents (zero for flat ingestion).
    pub sections: usize,
    /// Chunks stored, across all sections for document ingestion.
    pub chunks: usize,
}

/// Chunks `text` and stores the chunks flat with positional indexes.
///
/// Re-ingesting a text with the same parameters overwrites the previous
/// chunks position by position.
pub async fn ingest_text<B, E>(
    backend: &B,
    embedder: &E,
    text: &str,
    params: &ChunkingParams,
) -> Result<IngestReport, RagError>
where
    B: Backend + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let chunks = chunk_text(text, params)?;
    if chunks.is_empty() {
        return Ok(IngestReport::default());
    }

    let embeddings = embedder.embed_batch(&chunks).await?;
    ensure_aligned(chunks.len(), embeddings.len())?;

    let records: Vec<ChunkRecord> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (text, embedding))| ChunkRecord {
            index,
            text,
            embedding,
        })
        .collect();
    let stored = records.len();
    backend.upsert_chunks(records).await?;

    info!(chunks = stored, embedder = embedder.name(), "ingested text");
    Ok(IngestReport {
        sections: 0,
        chunks: stored,
    })
}

/// Splits `text` into sections and stores each as a parent with embedded
/// child chunks.
///
/// Parent keys are `{document_id}-{position}` and child keys append the
/// child's position, so colliding section titles stay distinct.
pub async fn ingest_document<B, E>(
    backend: &B,
    embedder: &E,
    document_id: &str,
    text: &str,
    splitter: &SectionSplitter,
    params: &ChunkingParams,
) -> Result<IngestReport, RagError>
where
    B: Backend + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let mut report = IngestReport::default();

    for section in splitter.split(text) {
        let child_chunks = chunk_text(&section.text, params)?;
        if child_chunks.is_empty() {
            continue;
        }
        let embeddings = embedder.embed_batch(&child_chunks).await?;
        ensure_aligned(child_chunks.len(), embeddings.len())?;

        let parent_id = format!("{document_id}-{}", section.position);
        let children: Vec<ChildRecord> = child_chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (text, embedding))| ChildRecord {
                id: format!("{parent_id}-{position}"),
                parent_id: parent_id.clone(),
                position,
                text,
                embedding,
            })
            .collect();
        let parent = ParentRecord {
            id: parent_id.clone(),
            document_id: document_id.to_string(),
            section_id: section.id,
            position: section.position,
            text: section.text,
        };

        report.sections += 1;
        report.chunks += children.len();
        info!(
            parent = %parent_id,
            chunks = children.len(),
            "ingested section"
        );
        backend.insert_document(parent, children).await?;
    }

    Ok(report)
}

fn ensure_aligned(chunks: usize, embeddings: usize) -> Result<(), RagError> {
    if chunks != embeddings {
        return Err(RagError::Embedding(format!(
            "embedded {embeddings} of {chunks} chunks; positional indexing requires all of them"
        )));
    }
    Ok(())
}
