//! Title-based section splitting for long documents.

use regex::Regex;

use crate::types::RagError;

/// Pattern for chapter-style headings occupying whole lines: `CHAPTER <n>.
/// <sentence>` (which may wrap across lines), or bare `Prologue` / `Epilogue`
/// markers.
const CHAPTER_TITLE_PATTERN: &str =
    r"(?m)^(?:CHAPTER\s+\d+\.\s+(?s:.+?)[.!?]|Epilogue|Prologue)$";

/// A titled span of a document.
///
/// `id` is the lowercased, trimmed title and is not guaranteed unique across a
/// document; `position` is the zero-based order of the section and is what
/// storage keys use to disambiguate. `text` is the original title with the
/// span that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub position: usize,
    pub text: String,
}

/// Splits documents into [`Section`]s at title-line matches.
#[derive(Debug, Clone)]
pub struct SectionSplitter {
    pattern: Regex,
}

impl Default for SectionSplitter {
    fn default() -> Self {
        Self::chapter_titles()
    }
}

impl SectionSplitter {
    /// Splitter for the built-in chapter heading pattern.
    pub fn chapter_titles() -> Self {
        Self {
            // The pattern is a compile-time constant; failure here is a bug.
            pattern: Regex::new(CHAPTER_TITLE_PATTERN)
                .expect("built-in chapter title pattern compiles"),
        }
    }

    /// Splitter for a caller-supplied title pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self, RagError> {
        let pattern =
            Regex::new(pattern).map_err(|err| RagError::InvalidTitlePattern(err.to_string()))?;
        Ok(Self { pattern })
    }

    /// Partitions `text` into ordered sections.
    ///
    /// Each matched title owns the span up to the next title (or end of text),
    /// with the title prefixed onto the span. Text before the first title
    /// belongs to no section; sections whose text trims to empty are
    /// discarded.
    pub fn split(&self, text: &str) -> Vec<Section> {
        let matches: Vec<regex::Match<'_>> = self.pattern.find_iter(text).collect();
        let mut sections = Vec::with_capacity(matches.len());

        for (position, title) in matches.iter().enumerate() {
            let body_end = matches
                .get(position + 1)
                .map_or(text.len(), |next| next.start());
            let title_text = title.as_str().trim();
            let section_text = format!("{title_text}{}", &text[title.end()..body_end]);
            if section_text.trim().is_empty() {
                continue;
            }
            sections.push(Section {
                id: title_text.to_lowercase(),
                position,
                text: section_text,
            });
        }

        sections
    }
}
