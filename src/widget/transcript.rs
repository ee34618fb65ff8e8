//! Transcript views.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError, RwLock};

use super::{Message, TranscriptView};

/// Render text as plain, non-interpreted content.
///
/// Control characters other than newline and tab are dropped, so the text
/// cannot carry terminal escape sequences.
#[must_use]
pub fn plain_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

/// In-memory transcript.
///
/// Keeps every appended block in order and tracks the scroll position as the
/// index of the block currently scrolled into view.
#[derive(Debug, Default)]
pub struct MemoryTranscript {
    messages: RwLock<Vec<Message>>,
    scroll: Mutex<Option<usize>>,
}

impl MemoryTranscript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all blocks in display order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the block scrolled into view, if any.
    #[must_use]
    pub fn scroll_position(&self) -> Option<usize> {
        *self.scroll.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TranscriptView for MemoryTranscript {
    fn append(&self, message: Message) {
        self.messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    fn scroll_to_latest(&self) {
        let newest = self.len().checked_sub(1);
        *self.scroll.lock().unwrap_or_else(PoisonError::into_inner) = newest;
    }
}

/// Transcript written to a terminal (or any writer), one block per line.
///
/// Each block is printed as `[origin] text`. Scrolling to the newest block
/// means flushing the writer.
pub struct ConsoleTranscript<W = io::Stdout> {
    out: Mutex<W>,
}

impl<W> std::fmt::Debug for ConsoleTranscript<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleTranscript").finish_non_exhaustive()
    }
}

impl ConsoleTranscript {
    /// Transcript on standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleTranscript<W> {
    /// Transcript on an arbitrary writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> TranscriptView for ConsoleTranscript<W> {
    fn append(&self, message: Message) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "[{}] {}", message.origin, plain_text(&message.text)) {
            tracing::warn!(name: "transcript.write.failed", error = %e, "Failed to write transcript block");
        }
    }

    fn scroll_to_latest(&self) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.flush() {
            tracing::warn!(name: "transcript.flush.failed", error = %e, "Failed to flush transcript");
        }
    }
}
