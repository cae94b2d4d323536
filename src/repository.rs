//! The canonical in-memory snippet collection.
//!
//! Every mutation re-serializes the whole collection through the
//! [`PersistenceAdapter`]. A failed write is logged and remembered, but the
//! in-memory state stays authoritative and the mutation still succeeds.

use crate::error::{Result, SnippetError};
use crate::models::{PersistenceAdapter, Snippet, SnippetDraft, SnippetId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Counts reported by [`SnippetRepository::merge`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct SnippetRepository<S: PersistenceAdapter> {
    store: S,
    /// Newest-created first
    snippets: Vec<Snippet>,
    last_issued: Option<DateTime<Utc>>,
    last_write_error: Option<String>,
}

impl<S: PersistenceAdapter> SnippetRepository<S> {
    /// Hydrates from `store`. Unreadable storage yields an empty collection.
    pub fn load(store: S) -> Self {
        let stored = match store.read_all() {
            Ok(Some(snippets)) => snippets,
            Ok(None) => {
                debug!("no stored snippets, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "could not load stored snippets, starting empty");
                Vec::new()
            }
        };

        let snippets = sanitize(stored);
        let last_issued = snippets.iter().map(|s| s.updated_at).max();
        debug!(count = snippets.len(), "snippet repository loaded");

        Self {
            store,
            snippets,
            last_issued,
            last_write_error: None,
        }
    }

    pub fn list(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn get(&self, id: &SnippetId) -> Option<&Snippet> {
        self.snippets.iter().find(|s| &s.id == id)
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// The failure message of the most recent write, until a write succeeds
    pub fn last_write_error(&self) -> Option<&str> {
        self.last_write_error.as_deref()
    }

    pub fn create(&mut self, draft: SnippetDraft) -> Result<Snippet> {
        draft.validate()?;

        let id = self.fresh_id();
        let now = self.now();
        let snippet = Snippet::from_draft(id, draft, now);

        self.snippets.insert(0, snippet.clone());
        self.persist();

        info!(id = %snippet.id, language = %snippet.language, "snippet created");
        Ok(snippet)
    }

    pub fn update(&mut self, id: &SnippetId, draft: SnippetDraft) -> Result<Snippet> {
        let index = self.position(id)?;
        draft.validate()?;

        let now = self.now();
        let snippet = &mut self.snippets[index];
        snippet.apply(draft, now);
        let updated = snippet.clone();

        self.persist();

        info!(id = %updated.id, "snippet updated");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &SnippetId) -> Result<()> {
        let index = self.position(id)?;
        self.snippets.remove(index);
        self.persist();

        info!(id = %id, "snippet deleted");
        Ok(())
    }

    /// Folds imported snippets into the collection.
    ///
    /// Unknown ids are added, known ids are replaced only with `overwrite`,
    /// and the result is re-ordered newest-created first. Malformed records and
    /// repeated ids within `incoming` are skipped.
    pub fn merge(&mut self, incoming: Vec<Snippet>, overwrite: bool) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let mut added = Vec::new();
        let mut seen = HashSet::new();

        for snippet in incoming {
            if !snippet.is_well_formed() || !seen.insert(snippet.id.clone()) {
                summary.skipped += 1;
                continue;
            }

            match self.snippets.iter().position(|s| s.id == snippet.id) {
                Some(index) if overwrite => {
                    self.snippets[index] = snippet;
                    summary.replaced += 1;
                }
                Some(_) => summary.skipped += 1,
                None => added.push(snippet),
            }
        }

        summary.added = added.len();
        self.snippets.append(&mut added);
        self.snippets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(latest) = self.snippets.iter().map(|s| s.updated_at).max() {
            self.last_issued = self.last_issued.max(Some(latest));
        }

        if summary.added + summary.replaced > 0 {
            self.persist();
        }

        info!(
            added = summary.added,
            replaced = summary.replaced,
            skipped = summary.skipped,
            "snippets merged"
        );
        summary
    }

    fn position(&self, id: &SnippetId) -> Result<usize> {
        self.snippets
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| SnippetError::not_found(id))
    }

    fn fresh_id(&self) -> SnippetId {
        loop {
            let id = SnippetId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Wall-clock time, never earlier than a timestamp this repository
    /// already handed out
    fn now(&mut self) -> DateTime<Utc> {
        let wall = Utc::now();
        let now = match self.last_issued {
            Some(last) if last > wall => last,
            _ => wall,
        };
        self.last_issued = Some(now);
        now
    }

    fn persist(&mut self) {
        match self.store.write_all(&self.snippets) {
            Ok(()) => self.last_write_error = None,
            Err(e) => {
                error!(
                    error = %e,
                    count = self.snippets.len(),
                    "failed to persist snippets, keeping in-memory state"
                );
                self.last_write_error = Some(e.to_string());
            }
        }
    }
}

/// Drops records that break the write-boundary rules and re-keys repeated ids.
/// Older builds derived ids from the clock, so two snippets saved within the
/// same millisecond share one.
fn sanitize(stored: Vec<Snippet>) -> Vec<Snippet> {
    let mut seen = HashSet::new();
    let mut snippets = Vec::with_capacity(stored.len());

    for mut snippet in stored {
        if !snippet.is_well_formed() {
            warn!(id = %snippet.id, "skipping malformed stored snippet");
            continue;
        }
        if !seen.insert(snippet.id.clone()) {
            let fresh = SnippetId::generate();
            warn!(old = %snippet.id, new = %fresh, "re-keying snippet with duplicate id");
            snippet.id = fresh.clone();
            seen.insert(fresh);
        }
        snippets.push(snippet);
    }

    snippets
}
