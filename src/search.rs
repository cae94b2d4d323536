use crate::error::{Result, SnippetError};
use crate::models::{Snippet, SnippetLanguage};
use std::str::FromStr;

/// Language half of a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LanguageFilter {
    #[default]
    All,
    Only(SnippetLanguage),
}

impl LanguageFilter {
    pub fn matches(&self, snippet: &Snippet) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(language) => snippet.language == *language,
        }
    }
}

impl FromStr for LanguageFilter {
    type Err = SnippetError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(LanguageFilter::All)
        } else {
            s.parse().map(LanguageFilter::Only)
        }
    }
}

/// Which field a text query hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchField {
    Title,
    Tags,
    /// 1-based line number and the trimmed line
    Code { line: usize, text: String },
    Description,
}

/// Free-text search AND language filter over a snippet snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetQuery {
    needle: String,
    pub language: LanguageFilter,
}

impl SnippetQuery {
    pub fn new(text: impl AsRef<str>, language: LanguageFilter) -> Self {
        Self {
            needle: text.as_ref().to_lowercase(),
            language,
        }
    }

    pub fn matches(&self, snippet: &Snippet) -> bool {
        self.matches_text(snippet) && self.language.matches(snippet)
    }

    fn matches_text(&self, snippet: &Snippet) -> bool {
        if self.needle.is_empty() {
            return true;
        }

        self.contains(&snippet.title)
            || self.contains(&snippet.tags)
            || self.contains(&snippet.code)
            || snippet
                .description
                .as_deref()
                .is_some_and(|desc| self.contains(desc))
    }

    /// The first field the text part of the query hits, checked in the same
    /// order as [`SnippetQuery::matches`]. `None` for an empty query.
    pub fn locate(&self, snippet: &Snippet) -> Option<MatchField> {
        if self.needle.is_empty() {
            return None;
        }

        if self.contains(&snippet.title) {
            return Some(MatchField::Title);
        }
        if self.contains(&snippet.tags) {
            return Some(MatchField::Tags);
        }
        if self.contains(&snippet.code) {
            // A needle spanning a newline hits the code but no single line
            let (line, text) = snippet
                .code
                .lines()
                .enumerate()
                .find(|(_, line)| self.contains(line))
                .map(|(i, line)| (i + 1, line.trim().to_string()))
                .unwrap_or((1, String::new()));
            return Some(MatchField::Code { line, text });
        }
        if snippet
            .description
            .as_deref()
            .is_some_and(|desc| self.contains(desc))
        {
            return Some(MatchField::Description);
        }
        None
    }

    fn contains(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }
}

/// Returns the snippets matching `query`, in input order
pub fn filter_snippets<'a>(snippets: &'a [Snippet], query: &SnippetQuery) -> Vec<&'a Snippet> {
    snippets.iter().filter(|s| query.matches(s)).collect()
}
