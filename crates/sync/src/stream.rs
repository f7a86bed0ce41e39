use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};

use crate::error::{ErrorKind, Result};
use crate::report::SyncReport;
use crate::synchronizer::Synchronizer;

/// Progress events emitted by [`Synchronizer::sync_all`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once, with the number of series.
/// 2. One event per series, in completion order:
///    [`Synced`](Self::Synced) when every chapter made it,
///    [`Incomplete`](Self::Incomplete) when some chapters failed and will be
///    retried next run, or an `Err` item when the series aborted.
/// 3. [`Complete`](Self::Complete) exactly once.
#[derive(Debug)]
pub enum SyncEvent {
    Started(usize),
    Synced { address: String, report: SyncReport },
    /// See [`SyncReport::into_result`].
    Incomplete { address: String, report: SyncReport },
    Complete,
}

impl Synchronizer {
    /// Stream [`SyncEvent`]s while synchronizing every address, up to
    /// `series_concurrency` series at a time. Additional series are started
    /// in request order as running ones finish.
    ///
    /// A failing series does not stop the others.
    pub fn sync_all(&self, addresses: Vec<String>) -> impl Stream<Item = Result<SyncEvent>> + '_ {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(SyncEvent::Started(addresses.len()));

            let mut queue: Vec<_> = addresses.into_iter().map(|address| self.sync_address(address)).collect();
            let mut processing = FuturesUnordered::new();
            processing.extend(queue.drain(..self.series_concurrency.min(queue.len())));
            while let Some(result) = processing.next().await {
                yield result;
                // Pop-n-push, but FIFO instead of LIFO.
                if !queue.is_empty() {
                    processing.push(queue.remove(0));
                }
            }

            yield Ok(SyncEvent::Complete);
        })
    }

    async fn sync_address(&self, address: String) -> Result<SyncEvent> {
        let report = self.sync(&address).await.or_raise(|| ErrorKind::Series(address.clone()))?;
        Ok(match report.is_complete() {
            true => SyncEvent::Synced { address, report },
            false => SyncEvent::Incomplete { address, report },
        })
    }
}
