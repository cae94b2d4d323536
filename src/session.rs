//! Form controller between "new"/"edit" intents and the repository.

use crate::error::Result;
use crate::models::{PersistenceAdapter, Snippet, SnippetDraft, SnippetId};
use crate::repository::SnippetRepository;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeMode {
    New,
    Edit(SnippetId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Composing(ComposeMode),
}

/// Why a submit did not reach the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NotComposing,
    /// Names the blank field, title before code
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Snippet),
    Updated(Snippet),
    Blocked(BlockReason),
}

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    state: SessionState,
    draft: SnippetDraft,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_composing(&self) -> bool {
        matches!(self.state, SessionState::Composing(_))
    }

    pub fn draft(&self) -> &SnippetDraft {
        &self.draft
    }

    /// Field edits go through here while composing
    pub fn draft_mut(&mut self) -> &mut SnippetDraft {
        &mut self.draft
    }

    /// Opens an empty form. Any draft in progress is discarded.
    pub fn start_new(&mut self) {
        self.state = SessionState::Composing(ComposeMode::New);
        self.draft = SnippetDraft::default();
    }

    /// Opens the form on `snippet`'s current values
    pub fn start_edit(&mut self, snippet: &Snippet) {
        self.state = SessionState::Composing(ComposeMode::Edit(snippet.id.clone()));
        self.draft = SnippetDraft::from_snippet(snippet);
    }

    /// The "add" button: closes an open form, otherwise opens a new one
    pub fn toggle_new(&mut self) {
        if self.is_composing() {
            self.cancel();
        } else {
            self.start_new();
        }
    }

    pub fn cancel(&mut self) {
        debug!(state = ?self.state, "edit session cancelled");
        self.reset();
    }

    /// Guard applied before any repository call
    pub fn block_reason(&self) -> Option<BlockReason> {
        if !self.is_composing() {
            return Some(BlockReason::NotComposing);
        }
        self.draft.missing_field().map(BlockReason::MissingField)
    }

    /// Sends the draft to the repository.
    ///
    /// A blocked submit leaves everything untouched. A repository error is
    /// returned with the session still composing.
    pub fn submit<S: PersistenceAdapter>(
        &mut self,
        repo: &mut SnippetRepository<S>,
    ) -> Result<SubmitOutcome> {
        if let Some(reason) = self.block_reason() {
            debug!(?reason, "submit blocked");
            return Ok(SubmitOutcome::Blocked(reason));
        }

        let mut draft = self.draft.clone();
        if draft.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            draft.description = None;
        }

        let outcome = match &self.state {
            SessionState::Composing(ComposeMode::New) => SubmitOutcome::Created(repo.create(draft)?),
            SessionState::Composing(ComposeMode::Edit(id)) => {
                SubmitOutcome::Updated(repo.update(id, draft)?)
            }
            SessionState::Idle => SubmitOutcome::Blocked(BlockReason::NotComposing),
        };

        self.reset();
        Ok(outcome)
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.draft = SnippetDraft::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnippetError;
    use crate::models::{MemoryStorage, SnippetLanguage};

    fn repo() -> (MemoryStorage, SnippetRepository<MemoryStorage>) {
        let storage = MemoryStorage::new();
        (storage.clone(), SnippetRepository::load(storage))
    }

    #[test]
    fn test_start_new_resets_draft_to_defaults() {
        let mut session = EditSession::new();
        session.draft_mut().title = "leftover".to_string();

        session.start_new();

        assert_eq!(session.state(), &SessionState::Composing(ComposeMode::New));
        assert_eq!(session.draft(), &SnippetDraft::default());
        assert_eq!(session.draft().language, SnippetLanguage::JavaScript);
    }

    #[test]
    fn test_submit_guard_blocks_missing_code() {
        let (storage, mut repo) = repo();
        let mut session = EditSession::new();
        session.start_new();
        session.draft_mut().title = "No code".to_string();

        let outcome = session.submit(&mut repo).unwrap();

        assert_eq!(outcome, SubmitOutcome::Blocked(BlockReason::MissingField("code")));
        assert!(session.is_composing());
        assert_eq!(session.draft().title, "No code");
        assert!(repo.is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_submit_while_idle_is_blocked() {
        let (_, mut repo) = repo();
        let mut session = EditSession::new();

        assert_eq!(
            session.submit(&mut repo).unwrap(),
            SubmitOutcome::Blocked(BlockReason::NotComposing)
        );
    }

    #[test]
    fn test_new_submit_creates_and_returns_to_idle() {
        let (_, mut repo) = repo();
        let mut session = EditSession::new();
        session.start_new();
        {
            let draft = session.draft_mut();
            draft.title = "Hello".to_string();
            draft.code = "console.log('hi')".to_string();
            draft.description = Some("   ".to_string());
        }

        let outcome = session.submit(&mut repo).unwrap();

        let snippet = match outcome {
            SubmitOutcome::Created(snippet) => snippet,
            other => panic!("expected a created snippet, got {other:?}"),
        };
        assert_eq!(snippet.description, None);
        assert_eq!(repo.list(), std::slice::from_ref(&snippet));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.draft(), &SnippetDraft::default());
    }

    #[test]
    fn test_edit_submit_updates_existing() {
        let (_, mut repo) = repo();
        let original = repo
            .create(SnippetDraft::new("Old", "x = 1", SnippetLanguage::Python))
            .unwrap();

        let mut session = EditSession::new();
        session.start_edit(&original);
        assert_eq!(session.draft().title, "Old");
        session.draft_mut().title = "New".to_string();

        let outcome = session.submit(&mut repo).unwrap();

        let updated = match outcome {
            SubmitOutcome::Updated(snippet) => snippet,
            other => panic!("expected an updated snippet, got {other:?}"),
        };
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(repo.list()[0].title, "New");
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_cancel_edit_leaves_repository_untouched() {
        let (storage, mut repo) = repo();
        let original = repo
            .create(SnippetDraft::new("Keep", "x = 1", SnippetLanguage::Python))
            .unwrap();

        let mut session = EditSession::new();
        session.start_edit(&original);
        session.draft_mut().code = "x = 2".to_string();
        session.cancel();

        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(repo.list()[0], original);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn test_edit_of_deleted_snippet_keeps_composing() {
        let (_, mut repo) = repo();
        let original = repo
            .create(SnippetDraft::new("Gone", "x = 1", SnippetLanguage::Python))
            .unwrap();

        let mut session = EditSession::new();
        session.start_edit(&original);
        repo.delete(&original.id).unwrap();

        let err = session.submit(&mut repo).unwrap_err();
        assert!(matches!(err, SnippetError::NotFound { .. }));
        assert!(session.is_composing());
    }

    #[test]
    fn test_toggle_new_mirrors_add_button() {
        let mut session = EditSession::new();

        session.toggle_new();
        assert_eq!(session.state(), &SessionState::Composing(ComposeMode::New));

        session.toggle_new();
        assert_eq!(session.state(), &SessionState::Idle);
    }
}
