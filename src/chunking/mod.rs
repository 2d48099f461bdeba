//! Text chunking strategies for embedding and indexing.
//!
//! A chunk is a bounded, overlapping substring of a source document, emitted
//! in document order. Two strategies are provided:
//!
//! * [`ChunkStrategy::WhitespaceAligned`] — boundaries snap to whitespace so
//!   no word is ever split; chunk lengths vary around the target size.
//! * [`ChunkStrategy::FixedSize`] — the cursor advances by exactly
//!   `chunk_size` characters; chunks may split mid-word but their length is
//!   bounded by `chunk_size + 2 * overlap`.
//!
//! All offsets are character offsets. Slicing happens on the underlying byte
//! positions of those characters, so multi-byte UTF-8 input is never split
//! inside a code point.

mod sections;

pub use sections::{Section, SectionSplitter};

use crate::types::RagError;

/// How chunk boundaries are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Snap both boundaries to the nearest whitespace.
    #[default]
    WhitespaceAligned,
    /// Advance by exactly `chunk_size` characters per chunk.
    FixedSize,
}

/// Parameters controlling [`chunk_text`].
///
/// `overlap` must be strictly less than `chunk_size` and `chunk_size` must be
/// positive; [`chunk_text`] rejects anything else with
/// [`RagError::InvalidChunkParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters of context carried over from the previous chunk.
    pub overlap: usize,
    /// Boundary selection strategy.
    pub strategy: ChunkStrategy,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap: 64,
            strategy: ChunkStrategy::WhitespaceAligned,
        }
    }
}

impl ChunkingParams {
    /// Validated constructor.
    pub fn new(
        chunk_size: usize,
        overlap: usize,
        strategy: ChunkStrategy,
    ) -> Result<Self, RagError> {
        let params = Self {
            chunk_size,
            overlap,
            strategy,
        };
        params.validate()?;
        Ok(params)
    }

    pub(crate) fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(RagError::InvalidChunkParameters {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Splits `text` into an ordered sequence of overlapping chunks.
///
/// Order reflects document position and must be preserved by callers that
/// index chunks positionally. Empty input yields an empty sequence; chunks
/// that trim to empty are not emitted.
///
/// # Examples
///
/// ```
/// use ragweld::chunking::{ChunkStrategy, ChunkingParams, chunk_text};
///
/// let params = ChunkingParams::new(10, 3, ChunkStrategy::WhitespaceAligned).unwrap();
/// let chunks = chunk_text("one two three four five six seven", &params).unwrap();
/// assert_eq!(
///     chunks,
///     vec!["one two three", "three four five six", "six seven"],
/// );
/// ```
pub fn chunk_text(text: &str, params: &ChunkingParams) -> Result<Vec<String>, RagError> {
    params.validate()?;
    let chunks = match params.strategy {
        ChunkStrategy::WhitespaceAligned => {
            split_whitespace_aligned(text, params.chunk_size, params.overlap)
        }
        ChunkStrategy::FixedSize => split_fixed_size(text, params.chunk_size, params.overlap),
    };
    Ok(chunks)
}

/// Byte offset of the character at `position`, or the text length past the end.
fn byte_at(chars: &[(usize, char)], text: &str, position: usize) -> usize {
    chars.get(position).map_or(text.len(), |&(byte, _)| byte)
}

fn split_whitespace_aligned(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut cursor = 0usize;

    while cursor < total {
        // Walk back from the overlap point to the nearest whitespace; the
        // chunk starts there, or at the very beginning if none is found.
        let mut left = 0usize;
        let mut probe = cursor as isize - overlap as isize;
        while probe >= 0 {
            if chars[probe as usize].1.is_whitespace() {
                left = probe as usize;
                break;
            }
            probe -= 1;
        }

        // The first whitespace at or past the target length ends the chunk.
        let mut right = total;
        let mut forward = cursor + chunk_size;
        while forward < total {
            if chars[forward].1.is_whitespace() {
                right = forward;
                break;
            }
            forward += 1;
        }

        let piece = text[byte_at(&chars, text, left)..byte_at(&chars, text, right)].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        cursor = right + 1;
    }

    chunks
}

fn split_fixed_size(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut cursor = 0usize;

    while cursor < total {
        // Window is [max(0, cursor - overlap + 1), cursor + chunk_size + overlap).
        let start = (cursor + 1).saturating_sub(overlap);
        let end = (cursor + chunk_size + overlap).min(total);

        let piece = text[byte_at(&chars, text, start)..byte_at(&chars, text, end)].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        cursor += chunk_size;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(chunk_size: usize, overlap: usize, strategy: ChunkStrategy) -> ChunkingParams {
        ChunkingParams::new(chunk_size, overlap, strategy).unwrap()
    }

    #[test]
    fn whitespace_split_matches_expected_windows() {
        let text = "one two three four five six seven";
        let chunks =
            chunk_text(text, &params(10, 3, ChunkStrategy::WhitespaceAligned)).unwrap();
        assert_eq!(
            chunks,
            vec!["one two three", "three four five six", "six seven"]
        );
    }

    #[test]
    fn whitespace_split_never_breaks_words() {
        let words: Vec<String> = (0..120).map(|i| format!("word{i:03}")).collect();
        let text = words.join(" ");
        let chunks =
            chunk_text(&text, &params(40, 10, ChunkStrategy::WhitespaceAligned)).unwrap();
        assert!(!chunks.is_empty());

        for chunk in &chunks {
            let start = text.find(chunk.as_str()).expect("chunk is a substring");
            let end = start + chunk.len();
            if start > 0 {
                assert!(
                    text[..start].ends_with(char::is_whitespace),
                    "chunk starts mid-word: {chunk:?}"
                );
            }
            if end < text.len() {
                assert!(
                    text[end..].starts_with(char::is_whitespace),
                    "chunk ends mid-word: {chunk:?}"
                );
            }
        }
    }

    #[test]
    fn whitespace_split_covers_every_word() {
        let words: Vec<String> = (0..80).map(|i| format!("tok{i:02}")).collect();
        let text = words.join(" ");
        let chunks =
            chunk_text(&text, &params(25, 5, ChunkStrategy::WhitespaceAligned)).unwrap();
        let joined = chunks.join(" ");
        for word in &words {
            assert!(joined.contains(word.as_str()), "missing word {word}");
        }
    }

    #[test]
    fn fixed_size_split_matches_expected_windows() {
        let text = "abcdefghijklmnopqrst";
        let chunks = chunk_text(text, &params(5, 2, ChunkStrategy::FixedSize)).unwrap();
        assert_eq!(chunks, vec!["abcdefg", "efghijkl", "jklmnopq", "opqrst"]);
    }

    #[test]
    fn fixed_size_split_bounds_length_and_count() {
        let text: String = "0123456789".repeat(10);
        let chunk_size = 10;
        let overlap = 3;
        let chunks = chunk_text(&text, &params(chunk_size, overlap, ChunkStrategy::FixedSize))
            .unwrap();
        assert_eq!(chunks.len(), text.len().div_ceil(chunk_size));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= chunk_size + 2 * overlap);
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        for strategy in [ChunkStrategy::WhitespaceAligned, ChunkStrategy::FixedSize] {
            let chunks = chunk_text("", &params(16, 4, strategy)).unwrap();
            assert!(chunks.is_empty());
        }
    }

    #[test]
    fn whitespace_only_input_yields_no_chunks() {
        let chunks =
            chunk_text("   \n\t  ", &params(4, 1, ChunkStrategy::WhitespaceAligned)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn degenerate_parameters_are_rejected() {
        for (chunk_size, overlap) in [(0, 0), (8, 8), (8, 12)] {
            for strategy in [ChunkStrategy::WhitespaceAligned, ChunkStrategy::FixedSize] {
                let err = chunk_text(
                    "some text",
                    &ChunkingParams {
                        chunk_size,
                        overlap,
                        strategy,
                    },
                )
                .unwrap_err();
                assert!(matches!(
                    err,
                    RagError::InvalidChunkParameters { .. }
                ));
            }
        }
    }

    #[test]
    fn multibyte_text_is_never_split_inside_a_code_point() {
        let text = "düsenjäger überflügelt ökonomie ".repeat(8);
        for strategy in [ChunkStrategy::WhitespaceAligned, ChunkStrategy::FixedSize] {
            let chunks = chunk_text(&text, &params(12, 4, strategy)).unwrap();
            assert!(!chunks.is_empty());
            for chunk in &chunks {
                // Constructing the String already proves boundary validity;
                // exercise the content as well.
                assert!(!chunk.is_empty());
            }
        }
    }

    #[test]
    fn default_params_use_whitespace_alignment() {
        let params = ChunkingParams::default();
        assert_eq!(params.chunk_size, 512);
        assert_eq!(params.overlap, 64);
        assert_eq!(params.strategy, ChunkStrategy::WhitespaceAligned);
        assert!(params.validate().is_ok());
    }
}
