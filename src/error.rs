use thiserror::Error;

use crate::models::SnippetId;

pub type Result<T> = std::result::Result<T, SnippetError>;

/// Errors surfaced by the snippet core
#[derive(Debug, Error)]
pub enum SnippetError {
    /// Title or code missing on create/update
    #[error("please fill in title and code fields (missing: {0})")]
    Validation(&'static str),

    #[error("snippet not found: {id}")]
    NotFound { id: SnippetId },

    /// The durable blob exists but could not be decoded
    #[error("failed to read snippet storage: {0}")]
    PersistenceRead(String),

    #[error("failed to write snippet storage: {0}")]
    PersistenceWrite(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SnippetError {
    pub fn not_found(id: &SnippetId) -> Self {
        SnippetError::NotFound { id: id.clone() }
    }

    /// True for the errors a caller is expected to act on synchronously
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SnippetError::Validation(_) | SnippetError::NotFound { .. }
        )
    }
}
