//! Output-quiescence aggregation.
//!
//! The debugger never says "done"; the only usable completion signals
//! are a recognizable prompt shape in the accumulated text, or silence.
//! This module waits on the collector channel with an arrival deadline:
//! every consumed chunk pushes the deadline out by the full timeout, so
//! a long-running command that keeps printing is never cut off. Only
//! `timeout` seconds of *silence* (or a prompt match) ends the wait.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant};
use tracing::debug;

use super::prompt;

/// Drain the chunk channel until the debugger looks idle or no new
/// output has arrived for `timeout`.
///
/// On a prompt match, one short `prompt_grace` wait catches trailing
/// output from the same burst, immediately available chunks are drained
/// non-blocking, and the accumulated text is returned early: callers
/// should not wait out a five-second window when the debugger is
/// visibly idle. There is no overall wall-clock cap.
///
/// A closed channel (collector ended) does not shortcut the timing
/// contract: the remaining silence window is waited out, then whatever
/// accumulated is returned. The result is trimmed of trailing
/// whitespace and may be empty.
pub async fn collect(
    rx: &mut UnboundedReceiver<String>,
    timeout: Duration,
    prompt_grace: Duration,
) -> String {
    let mut accumulated = String::new();
    let mut deadline = Instant::now() + timeout;

    loop {
        match time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(chunk)) => {
                accumulated.push_str(&chunk);
                deadline = Instant::now() + timeout;

                if prompt::looks_idle(&accumulated) {
                    time::sleep(prompt_grace).await;
                    drain_ready(rx, &mut accumulated);
                    debug!(bytes = accumulated.len(), "prompt detected, early return");
                    break;
                }
            }
            Ok(None) => {
                // Collector ended; nothing more will ever arrive. Honor
                // the remaining silence window before returning so the
                // caller-observable timing is independent of collector
                // lifetime.
                time::sleep_until(deadline).await;
                break;
            }
            Err(_elapsed) => {
                debug!(bytes = accumulated.len(), "silence window elapsed");
                break;
            }
        }
    }

    accumulated.trim_end().to_owned()
}

/// Pull every immediately available chunk without blocking.
pub fn drain_ready(rx: &mut UnboundedReceiver<String>, accumulated: &mut String) {
    while let Ok(chunk) = rx.try_recv() {
        accumulated.push_str(&chunk);
    }
}

/// Discard everything currently buffered in the channel.
///
/// Called before a new command is written so the returned text reflects
/// only output produced after that command, not leftovers from an
/// earlier exchange.
pub fn discard_pending(rx: &mut UnboundedReceiver<String>) {
    while rx.try_recv().is_ok() {}
}
