use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Result, SnippetError};

/// Opaque snippet identifier.
///
/// Fresh ids are UUID v4 strings. Stored collections written by older builds
/// carry numeric ids (millisecond timestamps), which are accepted on read and
/// kept as text from then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawSnippetId")]
pub struct SnippetId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnippetId {
    Number(serde_json::Number),
    Text(String),
}

impl From<RawSnippetId> for SnippetId {
    fn from(raw: RawSnippetId) -> Self {
        match raw {
            RawSnippetId::Number(n) => SnippetId(n.to_string()),
            RawSnippetId::Text(s) => SnippetId(s),
        }
    }
}

impl SnippetId {
    pub fn generate() -> Self {
        SnippetId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SnippetId {
    fn from(value: &str) -> Self {
        SnippetId(value.to_string())
    }
}

impl From<String> for SnippetId {
    fn from(value: String) -> Self {
        SnippetId(value)
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SnippetLanguage {
    #[default]
    JavaScript,
    Python,
    Java,
    Cpp,
    Sql,
    Html,
    Css,
    TypeScript,
    Go,
    Rust,
}

impl SnippetLanguage {
    /// Every supported language, in picker order. The first entry is the
    /// default for a new draft.
    pub const ALL: [SnippetLanguage; 10] = [
        SnippetLanguage::JavaScript,
        SnippetLanguage::Python,
        SnippetLanguage::Java,
        SnippetLanguage::Cpp,
        SnippetLanguage::Sql,
        SnippetLanguage::Html,
        SnippetLanguage::Css,
        SnippetLanguage::TypeScript,
        SnippetLanguage::Go,
        SnippetLanguage::Rust,
    ];

    /// The token used in storage and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetLanguage::JavaScript => "javascript",
            SnippetLanguage::Python => "python",
            SnippetLanguage::Java => "java",
            SnippetLanguage::Cpp => "cpp",
            SnippetLanguage::Sql => "sql",
            SnippetLanguage::Html => "html",
            SnippetLanguage::Css => "css",
            SnippetLanguage::TypeScript => "typescript",
            SnippetLanguage::Go => "go",
            SnippetLanguage::Rust => "rust",
        }
    }

    /// Get file extension for the language
    pub fn file_extension(&self) -> &'static str {
        match self {
            SnippetLanguage::JavaScript => "js",
            SnippetLanguage::Python => "py",
            SnippetLanguage::Java => "java",
            SnippetLanguage::Cpp => "cpp",
            SnippetLanguage::Sql => "sql",
            SnippetLanguage::Html => "html",
            SnippetLanguage::Css => "css",
            SnippetLanguage::TypeScript => "ts",
            SnippetLanguage::Go => "go",
            SnippetLanguage::Rust => "rs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SnippetLanguage::JavaScript => "JavaScript",
            SnippetLanguage::Python => "Python",
            SnippetLanguage::Java => "Java",
            SnippetLanguage::Cpp => "C++",
            SnippetLanguage::Sql => "SQL",
            SnippetLanguage::Html => "HTML",
            SnippetLanguage::Css => "CSS",
            SnippetLanguage::TypeScript => "TypeScript",
            SnippetLanguage::Go => "Go",
            SnippetLanguage::Rust => "Rust",
        }
    }
}

impl fmt::Display for SnippetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnippetLanguage {
    type Err = SnippetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" => Ok(SnippetLanguage::JavaScript),
            "python" | "py" => Ok(SnippetLanguage::Python),
            "java" => Ok(SnippetLanguage::Java),
            "cpp" | "c++" | "cc" | "cxx" => Ok(SnippetLanguage::Cpp),
            "sql" => Ok(SnippetLanguage::Sql),
            "html" | "htm" => Ok(SnippetLanguage::Html),
            "css" => Ok(SnippetLanguage::Css),
            "typescript" | "ts" => Ok(SnippetLanguage::TypeScript),
            "go" | "golang" => Ok(SnippetLanguage::Go),
            "rust" | "rs" => Ok(SnippetLanguage::Rust),
            other => Err(SnippetError::UnknownLanguage(other.to_string())),
        }
    }
}

/// A stored snippet. Field names follow the on-disk document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: SnippetId,
    pub title: String,
    pub code: String,
    pub language: SnippetLanguage,
    /// Raw comma-separated labels, see [`Snippet::tag_list`]
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    pub(crate) fn from_draft(id: SnippetId, draft: SnippetDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            code: draft.code,
            language: draft.language,
            tags: draft.tags,
            description: draft.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full-record replace; `id` and `created_at` survive.
    pub(crate) fn apply(&mut self, draft: SnippetDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.code = draft.code;
        self.language = draft.language;
        self.tags = draft.tags;
        self.description = draft.description;
        self.updated_at = now;
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    pub fn line_count(&self) -> usize {
        self.code.lines().count()
    }

    pub fn file_extension(&self) -> &'static str {
        self.language.file_extension()
    }

    /// Whether the record satisfies the invariants the repository enforces
    pub fn is_well_formed(&self) -> bool {
        !is_blank(&self.title) && !is_blank(&self.code) && self.created_at <= self.updated_at
    }
}

/// The user-editable fields of a snippet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetDraft {
    pub title: String,
    pub code: String,
    pub language: SnippetLanguage,
    pub tags: String,
    pub description: Option<String>,
}

impl SnippetDraft {
    pub fn new(
        title: impl Into<String>,
        code: impl Into<String>,
        language: SnippetLanguage,
    ) -> Self {
        Self {
            title: title.into(),
            code: code.into(),
            language,
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Loads a snippet's current values for editing
    pub fn from_snippet(snippet: &Snippet) -> Self {
        Self {
            title: snippet.title.clone(),
            code: snippet.code.clone(),
            language: snippet.language,
            tags: snippet.tags.clone(),
            description: snippet.description.clone(),
        }
    }

    /// Name of the first required field that is blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if is_blank(&self.title) {
            Some("title")
        } else if is_blank(&self.code) {
            Some("code")
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.missing_field() {
            Some(field) => Err(SnippetError::Validation(field)),
            None => Ok(()),
        }
    }
}

/// Splits raw tag text into trimmed, non-empty labels, first occurrence wins
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_trims_and_dedups() {
        assert_eq!(
            parse_tags(" algorithm, sort,,algorithm ,  "),
            vec!["algorithm".to_string(), "sort".to_string()]
        );
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_draft_validation_rejects_whitespace() {
        let draft = SnippetDraft::new("  ", "print(1)", SnippetLanguage::Python);
        assert_eq!(draft.missing_field(), Some("title"));

        let draft = SnippetDraft::new("Hello", "\n\t", SnippetLanguage::Python);
        assert!(matches!(draft.validate(), Err(SnippetError::Validation("code"))));

        let draft = SnippetDraft::new("Hello", "print(1)", SnippetLanguage::Python);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_default_language_is_first_listed() {
        assert_eq!(SnippetDraft::default().language, SnippetLanguage::ALL[0]);
        assert_eq!(SnippetLanguage::default(), SnippetLanguage::JavaScript);
    }

    #[test]
    fn test_language_parsing_accepts_aliases() {
        assert_eq!("C++".parse::<SnippetLanguage>().unwrap(), SnippetLanguage::Cpp);
        assert_eq!("ts".parse::<SnippetLanguage>().unwrap(), SnippetLanguage::TypeScript);
        assert_eq!("Rust".parse::<SnippetLanguage>().unwrap(), SnippetLanguage::Rust);
        assert!("cobol".parse::<SnippetLanguage>().is_err());
    }

    #[test]
    fn test_language_tokens_match_storage_format() {
        for language in SnippetLanguage::ALL {
            let json = serde_json::to_string(&language).unwrap();
            assert_eq!(json, format!("\"{}\"", language.as_str()));
        }
    }

    #[test]
    fn test_numeric_and_string_ids_deserialize() {
        let numeric: SnippetId = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(numeric.as_str(), "1700000000000");

        let text: SnippetId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(text, SnippetId::from("abc-123"));

        let negative: SnippetId = serde_json::from_str("-42").unwrap();
        assert_eq!(negative.as_str(), "-42");

        let fractional: SnippetId = serde_json::from_str("1700000000000.5").unwrap();
        assert_eq!(fractional.as_str(), "1700000000000.5");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(SnippetId::generate(), SnippetId::generate());
    }

    #[test]
    fn test_snippet_reads_record_without_description() {
        let json = r#"{
            "id": 1700000000000,
            "title": "Binary Search",
            "code": "def search(): pass",
            "language": "python",
            "tags": "algorithm,search",
            "createdAt": "2024-01-15T10:30:00.000Z",
            "updatedAt": "2024-01-15T10:30:00.000Z"
        }"#;

        let snippet: Snippet = serde_json::from_str(json).unwrap();
        assert_eq!(snippet.description, None);
        assert_eq!(snippet.tag_list(), vec!["algorithm", "search"]);
        assert_eq!(snippet.file_extension(), "py");
        assert_eq!(snippet.line_count(), 1);
        assert!(snippet.is_well_formed());
    }

    #[test]
    fn test_line_count_ignores_trailing_newline() {
        let mut snippet = Snippet::from_draft(
            SnippetId::from("lines"),
            SnippetDraft::new("Lines", "a\nb\nc\n", SnippetLanguage::Go),
            Utc::now(),
        );
        assert_eq!(snippet.line_count(), 3);

        snippet.code = "single".to_string();
        assert_eq!(snippet.line_count(), 1);
    }
}
