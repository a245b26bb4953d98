//! Continuous tailing of a growing log file.
//!
//! [`tail_file`] spawns one background task that owns the file handle and
//! the byte offset, and hands complete lines to the returned [`TailStream`]
//! one at a time. The watched path may not exist yet, may be truncated, or
//! may be replaced wholesale; the task recovers from all of these by
//! reopening the file after a fixed backoff and never surfaces an error
//! through the line sequence.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Delay before retrying a failed open and between end-of-file reopen
/// cycles. Retries are unbounded; the task runs until cancelled.
const BACKOFF: Duration = Duration::from_secs(1);

/// Starts tailing `path` and returns the stream of raw lines.
///
/// Lines are delivered strictly in the order they were written, with no
/// duplication and no loss while the consumer keeps pace. A missing or
/// unreadable file shows up only as a gap in output while the task retries.
/// The stream closes when `cancel` is triggered or the stream is dropped.
pub fn tail_file<P: AsRef<Path>>(path: P, cancel: CancellationToken) -> TailStream {
    let path = path.as_ref().to_path_buf();

    // Capacity 1: each handoff is a rendezvous, so a slow consumer throttles
    // the read rate instead of lines piling up.
    let (tx, rx) = mpsc::channel(1);

    let task_handle = tokio::spawn(tail_task(path, tx, cancel.clone()));

    TailStream {
        receiver: rx,
        cancel,
        _task_handle: task_handle,
    }
}

/// Ordered, unbounded sequence of raw lines from one watched file.
pub struct TailStream {
    receiver: mpsc::Receiver<String>,
    cancel: CancellationToken,
    _task_handle: JoinHandle<()>,
}

impl TailStream {
    /// Requests cooperative shutdown of the tailing task.
    ///
    /// The task stops at its next checkpoint and closes the file handle;
    /// the stream then ends after any already-handed-off line is consumed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TailStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for TailStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Background task: owns the offset, loops open → seek → read → backoff.
async fn tail_task(path: PathBuf, tx: mpsc::Sender<String>, cancel: CancellationToken) {
    let mut offset: u64 = 0;

    while !cancel.is_cancelled() {
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(_) => {
                // Missing, locked, or otherwise unreadable; try again later.
                if !backoff(&cancel).await {
                    return;
                }
                continue;
            }
        };

        offset = match read_to_eof(file, offset, &tx, &cancel).await {
            Some(next_offset) => next_offset,
            None => return,
        };

        // Reopening after the backoff is what picks up rotation and
        // deletion-then-recreation of the watched file.
        if !backoff(&cancel).await {
            return;
        }
    }
}

/// Reads complete lines from `offset` to end-of-file, handing each one to
/// `tx`. The offset only advances past a line once its handoff succeeded,
/// so nothing already delivered is re-read and nothing pending is skipped.
///
/// Returns the new offset, or `None` if cancellation was observed.
async fn read_to_eof(
    mut file: File,
    offset: u64,
    tx: &mpsc::Sender<String>,
    cancel: &CancellationToken,
) -> Option<u64> {
    let mut offset = match file.metadata().await {
        Ok(metadata) => resume_offset(metadata.len(), offset),
        Err(_) => offset,
    };

    if file.seek(SeekFrom::Start(offset)).await.is_err() {
        offset = 0;
        if file.seek(SeekFrom::Start(offset)).await.is_err() {
            return Some(offset);
        }
    }

    let mut reader = BufReader::new(file);

    loop {
        let mut buf = String::new();
        let consumed = match reader.read_line(&mut buf).await {
            Ok(0) => return Some(offset),
            Ok(n) => n,
            // Unreadable content at the current position; keep the offset
            // and let the caller retry after the backoff.
            Err(_) => return Some(offset),
        };

        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }

        // Cancellation wins over a ready handoff, so nothing read after the
        // signal is ever delivered.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            sent = tx.send(buf) => {
                if sent.is_err() {
                    // Receiver dropped; equivalent to cancellation.
                    return None;
                }
                offset += consumed as u64;
            }
        }
    }
}

/// A file shorter than the stored offset was truncated or replaced; reading
/// resumes from the start in that case.
fn resume_offset(file_len: u64, offset: u64) -> u64 {
    if file_len < offset { 0 } else { offset }
}

/// Sleeps one backoff interval. Returns `false` if cancellation was
/// observed instead.
async fn backoff(cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = time::sleep(BACKOFF) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TempLogFile;
    use tokio_stream::StreamExt;

    async fn next_line(stream: &mut TailStream) -> String {
        tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for a line")
            .expect("stream closed unexpectedly")
    }

    #[test]
    fn test_resume_offset() {
        assert_eq!(resume_offset(200, 100), 100); // File grew
        assert_eq!(resume_offset(100, 100), 100); // No change
        assert_eq!(resume_offset(50, 100), 0); // Truncated or replaced
        assert_eq!(resume_offset(0, 0), 0); // Empty file
    }

    #[tokio::test]
    async fn test_delivers_existing_lines_in_order() {
        let log = TempLogFile::new().unwrap();
        log.append_line("alpha").unwrap();
        log.append_line("beta").unwrap();

        let mut stream = tail_file(log.path(), CancellationToken::new());

        assert_eq!(next_line(&mut stream).await, "alpha");
        assert_eq!(next_line(&mut stream).await, "beta");
    }

    #[tokio::test]
    async fn test_cancellation_closes_stream_promptly() {
        let log = TempLogFile::new().unwrap();
        log.append_line("only line").unwrap();

        let cancel = CancellationToken::new();
        let mut stream = tail_file(log.path(), cancel.clone());

        assert_eq!(next_line(&mut stream).await, "only line");

        cancel.cancel();

        let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("stream should close promptly after cancellation");
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_external_token_and_stream_cancel_are_equivalent() {
        let log = TempLogFile::new().unwrap();

        let stream = tail_file(log.path(), CancellationToken::new());
        stream.cancel();

        let mut stream = stream;
        let end = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("stream should close promptly after cancellation");
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn test_backoff_reports_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!backoff(&cancel).await);
    }

    #[tokio::test]
    async fn test_slow_consumer_does_not_lose_lines() {
        let log = TempLogFile::new().unwrap();
        for i in 0..20 {
            log.append_line(&format!("line {i}")).unwrap();
        }

        let mut stream = tail_file(log.path(), CancellationToken::new());

        for i in 0..20 {
            // Consumer pauses between handoffs; the tailer must wait, not skip.
            time::sleep(Duration::from_millis(5)).await;
            assert_eq!(next_line(&mut stream).await, format!("line {i}"));
        }
    }
}
