//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by ragweld operations.
///
/// All failures are local and synchronous; no variant implies a retry.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunking parameters that cannot guarantee forward progress.
    ///
    /// Raised when `chunk_size` is zero or `overlap >= chunk_size`; the
    /// whitespace-aligned splitter would otherwise never terminate.
    #[error(
        "invalid chunk parameters: chunk_size={chunk_size}, overlap={overlap} \
         (require chunk_size > 0 and overlap < chunk_size)"
    )]
    InvalidChunkParameters { chunk_size: usize, overlap: usize },

    /// A non-empty result list whose scores cannot be max-normalized.
    #[error("degenerate score set: {0}")]
    DegenerateScoreSet(String),

    /// A section title pattern that failed to compile.
    #[error("invalid section title pattern: {0}")]
    InvalidTitlePattern(String),

    /// Embedding provider failure (transport, malformed or short response).
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}
