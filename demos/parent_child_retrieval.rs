//! Section splitting, parent/child storage, and parent-document retrieval.
//!
//! Mirrors the coarser retrieval loop: split a document at chapter titles,
//! store each section as a parent with embedded child chunks, then retrieve
//! whole sections by matching their children.
//!
//! ```bash
//! cargo run --example parent_child_retrieval
//! ```

use ragweld::chunking::{ChunkingParams, SectionSplitter};
use ragweld::embeddings::{EmbeddingProvider, MockEmbeddingProvider};
use ragweld::ingestion::ingest_document;
use ragweld::search::parent_document_search;
use ragweld::stores::SqliteRagStore;
use ragweld::types::RagError;

const DOCUMENT: &str = "\
CHAPTER 1. Loomings.
Call me Ishmael. Some years ago, never mind how long precisely, having little
or no money in my purse, and nothing particular to interest me on shore, I
thought I would sail about a little and see the watery part of the world. The
captain paced the quarter-deck while the crew weighed anchor in the grey dawn.

CHAPTER 2. The Carpet-Bag.
I stuffed a shirt or two into my old carpet-bag, tucked it under my arm, and
started for Cape Horn and the Pacific. Quitting the good city of old Manhatto,
I duly arrived in New Bedford on a Saturday night in December, much to my
surprise and no small disappointment.

Epilogue
The drama's done. Why then here does any one step forth? Because one did
survive the wreck. The captain's chart still marks the spot where the whale
went down.
";

#[tokio::main]
async fn main() -> Result<(), RagError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let db_path = std::env::temp_dir().join("ragweld_parent_demo.sqlite");
    let _ = std::fs::remove_file(&db_path);

    let embedder = MockEmbeddingProvider::new();
    let store = SqliteRagStore::open(&db_path, embedder.dimensions()).await?;
    store.create_graph_vector_index().await?;

    let params = ChunkingParams {
        chunk_size: 120,
        overlap: 16,
        ..Default::default()
    };
    let report = ingest_document(
        &store,
        &embedder,
        "moby_dick",
        DOCUMENT,
        &SectionSplitter::chapter_titles(),
        &params,
    )
    .await?;
    println!(
        "ingested {} sections ({} child chunks)\n",
        report.sections, report.chunks
    );

    let hits = parent_document_search(&store, &embedder, "captain", 4).await?;
    for hit in &hits {
        println!("text: \n{}", hit.text);
        println!("score: {}", hit.score);
        println!("======");
    }

    Ok(())
}
