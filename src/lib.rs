//! snipvault - local code snippet store
//!
//! Keeps a personal collection of short code snippets in a single JSON slot
//! on disk. The [`SnippetRepository`] owns the collection and persists the
//! whole of it after every change, [`search`] derives the visible subset, and
//! [`EditSession`] turns "new"/"edit" form intents into repository calls.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod search;
pub mod session;

pub use clipboard::{Clipboard, CopyIndicator, SystemClipboard, copy_snippet};
pub use config::Config;
pub use error::{Result, SnippetError};
pub use models::{
    MemoryStorage, PersistenceAdapter, Snippet, SnippetDraft, SnippetId, SnippetLanguage,
    StorageManager,
};
pub use repository::{MergeSummary, SnippetRepository};
pub use search::{LanguageFilter, MatchField, SnippetQuery, filter_snippets};
pub use session::{BlockReason, ComposeMode, EditSession, SessionState, SubmitOutcome};
