//! Clipboard access and the "copied" feedback indicator.

use crate::error::{Result, SnippetError};
use crate::models::{Snippet, SnippetId};
use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Asynchronous clipboard write capability
pub trait Clipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Platform clipboard driven through the usual command-line helpers
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip", &[]),
];

impl SystemClipboard {
    async fn pipe_into(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                // kill() also reaps the child
                let _ = child.kill().await;
                return Err(e);
            }
        }

        Ok(child.wait().await?.success())
    }
}

impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        for (program, args) in CLIPBOARD_TOOLS {
            match Self::pipe_into(program, args, text).await {
                Ok(true) => {
                    debug!(tool = program, "copied to clipboard");
                    return Ok(());
                }
                Ok(false) => debug!(tool = program, "clipboard tool exited with failure"),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => debug!(tool = program, error = %e, "clipboard tool failed"),
            }
        }

        Err(SnippetError::Clipboard(
            "no working clipboard tool found (tried wl-copy, xclip, xsel, pbcopy, clip)"
                .to_string(),
        ))
    }
}

#[derive(Debug, Default)]
struct IndicatorState {
    active: Option<SnippetId>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Single-slot "copied!" marker that reverts on its own.
///
/// Starting it again supersedes the running timer. Must be started from
/// within a tokio runtime.
#[derive(Debug, Clone)]
pub struct CopyIndicator {
    duration: Duration,
    state: Arc<Mutex<IndicatorState>>,
}

impl Default for CopyIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_COPY_FEEDBACK)
    }
}

impl CopyIndicator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: Arc::new(Mutex::new(IndicatorState::default())),
        }
    }

    pub fn start(&self, id: SnippetId) {
        let mut state = self.lock();
        state.generation += 1;
        state.active = Some(id);
        if let Some(previous) = state.timer.take() {
            previous.abort();
        }

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let duration = self.duration;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut state = shared.lock().unwrap_or_else(|p| p.into_inner());
            if state.generation == generation {
                state.active = None;
                state.timer = None;
            }
        }));
    }

    /// The snippet currently shown as copied
    pub fn current(&self) -> Option<SnippetId> {
        self.lock().active.clone()
    }

    pub fn is_active(&self, id: &SnippetId) -> bool {
        self.lock().active.as_ref() == Some(id)
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.active = None;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndicatorState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Copies a snippet's code and lights the indicator on success.
///
/// A failed copy is logged and the indicator stays as it was.
pub async fn copy_snippet<C: Clipboard>(
    clipboard: &C,
    indicator: &CopyIndicator,
    snippet: &Snippet,
) -> Result<()> {
    match clipboard.write_text(&snippet.code).await {
        Ok(()) => {
            indicator.start(snippet.id.clone());
            Ok(())
        }
        Err(e) => {
            warn!(id = %snippet.id, error = %e, "failed to copy snippet");
            Err(e)
        }
    }
}
