//! Per-producer ingestion readers.
//!
//! One reader task per producer output stream. Each loops over lines,
//! forwards diagnostics to operator logs, parses records, and pushes them
//! onto the bounded merge queue (blocking when it is full - backpressure is
//! intentional). A bad line never terminates the reader; only end-of-stream
//! or a closed queue does.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::record::{excerpt, ProducerLine, Record};

/// Maximum characters of a malformed line quoted in the log.
const EXCERPT_LEN: usize = 50;

/// Consume one producer output stream line by line until EOF.
///
/// Runs as an independent task so a blocking read here never stalls the
/// sibling readers or the broadcast loop. The merge queue is left open on
/// exit - other readers may still be feeding it.
pub async fn run_reader<R>(name: String, stream: R, record_tx: mpsc::Sender<Record>)
where
    R: AsyncRead + Unpin,
{
    log::info!("[daemon] Reading output from {name}");
    let mut lines = BufReader::new(stream).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match ProducerLine::parse(&line) {
                ProducerLine::Empty => {}
                ProducerLine::Diagnostic(text) => {
                    log::info!("[daemon] {name}: {text}");
                }
                ProducerLine::Record(record) => {
                    if record_tx.send(record).await.is_err() {
                        log::info!("[daemon] {name}: merge queue closed, stopping reader");
                        return;
                    }
                }
                ProducerLine::Malformed(e) => {
                    log::warn!(
                        "[daemon] {name} invalid record: {} ({e})",
                        excerpt(&line, EXCERPT_LEN)
                    );
                }
            },
            Ok(None) => {
                log::info!("[daemon] {name} ended");
                return;
            }
            Err(e) => {
                log::warn!("[daemon] {name} read error: {e}");
                return;
            }
        }
    }
}
