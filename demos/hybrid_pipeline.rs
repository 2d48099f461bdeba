//! Flat ingestion and the three flat-chunk search methods.
//!
//! Mirrors the minimal RAG loop: create indexes, chunk and embed a text,
//! store it, then answer the same question with full-text, vector, and
//! hybrid search.
//!
//! ```bash
//! cargo run --example hybrid_pipeline
//! ```

use ragweld::chunking::ChunkingParams;
use ragweld::embeddings::{EmbeddingProvider, MockEmbeddingProvider};
use ragweld::ingestion::ingest_text;
use ragweld::search::{hybrid_search, text_search, vector_search};
use ragweld::stores::{SearchHit, SqliteRagStore};
use ragweld::types::RagError;

const SAMPLE_TEXT: &str = "\
According to all known laws of aviation, there is no way a bee should be able \
to fly. Its wings are too small to get its fat little body off the ground. \
The bee, of course, flies anyway, because bees don't care what humans think \
is impossible. Yellow and black, yellow and black, a blur of motion over the \
flower beds. Every morning the hive wakes to the same routine: inspect the \
frames, fan the brood, and chart the day's nectar routes across the meadow. \
Scouts return with coordinates danced in figure eights, and the foragers \
depart in waves, each one certain of its errand. By afternoon the meadow hums \
like a struck wire, and by dusk the colony weighs measurably more than it did \
at dawn. Nobody files a flight plan. Nobody asks permission of the laws of \
aviation. The work is the argument, and the honey is the proof.";

const QUESTION: &str = "according to all";
const TOP_K: usize = 2;

fn print_hits(label: &str, hits: &[SearchHit]) {
    println!("--- {label} ---");
    for hit in hits {
        println!("text: \n{}", hit.text);
        println!("score: {}", hit.score);
        println!("index: {}", hit.index);
        println!("======");
    }
}

#[tokio::main]
async fn main() -> Result<(), RagError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let db_path = std::env::temp_dir().join("ragweld_hybrid_demo.sqlite");
    let _ = std::fs::remove_file(&db_path);

    let embedder = MockEmbeddingProvider::new();
    let store = SqliteRagStore::open(&db_path, embedder.dimensions()).await?;
    store.create_vector_index().await?;
    store.create_text_index().await?;

    let params = ChunkingParams {
        chunk_size: 160,
        overlap: 24,
        ..Default::default()
    };
    let report = ingest_text(&store, &embedder, SAMPLE_TEXT, &params).await?;
    println!(
        "ingested {} chunks into {}\n",
        report.chunks,
        db_path.display()
    );

    let lexical = text_search(&store, QUESTION, TOP_K).await?;
    print_hits("full-text search", &lexical);

    let dense = vector_search(&store, &embedder, QUESTION, TOP_K).await?;
    print_hits("vector search", &dense);

    let fused = hybrid_search(&store, &embedder, QUESTION, TOP_K).await?;
    print_hits("hybrid search", &fused);

    Ok(())
}
