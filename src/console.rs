//! Terminal front end for the chat widget.
//!
//! Each line read from the input becomes the widget's input value and is
//! committed with `Enter`, exactly as typing into the page would. Replies are
//! printed as they arrive, in whatever order the backend resolves them.

use std::sync::Arc;

use futures::future::join_all;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::widget::{
    COMMIT_KEY, ChatTransport, ChatWidget, ConsoleTranscript, LineInput, TranscriptView,
    WidgetEvent,
};

/// Drive `widget` from `lines` until end of input, then wait for every
/// outstanding reply.
///
/// Returns the number of messages actually submitted.
pub async fn run<R, V, T>(
    lines: R,
    widget: &ChatWidget<V, LineInput, T>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    V: TranscriptView + 'static,
    T: ChatTransport + 'static,
{
    let mut lines = lines.lines();
    let mut pending = Vec::new();

    while let Some(line) = lines.next_line().await? {
        widget.input().set_value(line);
        if let Some(handle) = widget.handle_event(&WidgetEvent::key(COMMIT_KEY)) {
            pending.push(handle);
        }
    }

    let submitted = pending.len();
    for result in join_all(pending).await {
        if let Err(e) = result {
            tracing::error!(name: "console.task.failed", error = %e, "Reply task failed");
        }
    }
    Ok(submitted)
}

/// Convenience constructor for a stdin/stdout session against `transport`.
pub fn stdout_widget<T: ChatTransport + 'static>(
    transport: T,
) -> ChatWidget<ConsoleTranscript, LineInput, T> {
    ChatWidget::new(
        Arc::new(ConsoleTranscript::stdout()),
        Arc::new(LineInput::new()),
        Arc::new(transport),
    )
}
