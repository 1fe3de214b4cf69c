//! Background output collector.
//!
//! One collector task per active session drains the child's stdout and
//! stderr into a single ordered chunk channel, merging the two streams
//! the way the debugger's terminal user would see them. Chunks are
//! pushed exactly as delivered by the OS — possibly partial lines.
//!
//! The loop blocks only on the next read and ends when the
//! cancellation token fires, the stream hits EOF, or a read fails.
//! Errors are swallowed: the peer closing its pipes is the normal
//! outcome of a `quit` command, not a fault to report.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Read buffer size per stream.
const CHUNK_SIZE: usize = 4096;

/// Spawn the collector task for a freshly launched child.
///
/// Both pipes are serviced concurrently inside the one task; each
/// successful read is forwarded on `tx` immediately. Send failures are
/// ignored: the receiver disappearing means the session is already
/// being torn down.
#[must_use]
pub fn spawn(
    stdout: ChildStdout,
    stderr: ChildStderr,
    tx: UnboundedSender<String>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::join!(
            drain(stdout, tx.clone(), cancel.clone()),
            drain(stderr, tx, cancel),
        );
        debug!("output collector finished");
    })
}

/// Forward chunks from one stream until EOF, read failure, or
/// cancellation.
async fn drain<R>(mut reader: R, tx: UnboundedSender<String>, cancel: CancellationToken)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            read = reader.read(&mut buf) => match read {
                // EOF, peer closed its end.
                Ok(0) => break,
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                    if tx.send(chunk).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(%err, "output read failed, stopping collector");
                    break;
                }
            }
        }
    }
}
