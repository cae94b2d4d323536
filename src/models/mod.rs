pub mod export;
pub mod snippet;
pub mod storage;

pub use export::{ExportData, ExportFormat, export_snippets, import_snippets};
pub use snippet::{Snippet, SnippetDraft, SnippetId, SnippetLanguage, parse_tags};
pub use storage::{MemoryStorage, PersistenceAdapter, StorageManager};
