//! Copies one accepted part into its storage destination.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use niramaya_storage::{StorageSink, WriteDestination};
use tokio_util::sync::CancellationToken;

use super::types::IngestOutcome;

pub struct PartIngestor {
    storage: Arc<dyn StorageSink>,
    destination: Box<dyn WriteDestination>,
    abort: CancellationToken,
}

impl PartIngestor {
    pub fn new(
        storage: Arc<dyn StorageSink>,
        destination: Box<dyn WriteDestination>,
        abort: CancellationToken,
    ) -> Self {
        Self {
            storage,
            destination,
            abort,
        }
    }

    /// Drive `source` into the destination until it ends, fails or the request aborts.
    ///
    /// On any outcome other than `Completed` the destination is deleted before this
    /// returns.
    pub async fn run<S>(self, mut source: S) -> IngestOutcome
    where
        S: Stream<Item = Result<Bytes, String>> + Unpin + Send,
    {
        let PartIngestor {
            storage,
            mut destination,
            abort,
        } = self;
        let location = destination.location().to_string();
        let started = Instant::now();

        let copied = tokio::select! {
            biased;
            _ = abort.cancelled() => Err(IngestOutcome::SourceError("upload aborted".to_string())),
            result = copy(&mut destination, &mut source) => result,
        };

        let outcome = match copied {
            Ok(()) if abort.is_cancelled() => {
                drop(destination);
                IngestOutcome::SourceError("upload aborted".to_string())
            }
            Ok(()) => match destination.finalize().await {
                Ok(bytes) => {
                    tracing::info!(
                        location = %location,
                        bytes,
                        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                        "Part stored"
                    );
                    return IngestOutcome::Completed { bytes };
                }
                Err(e) => IngestOutcome::WriteError(e),
            },
            Err(outcome) => {
                drop(destination);
                outcome
            }
        };

        match &outcome {
            IngestOutcome::WriteError(e) => {
                tracing::error!(error = %e, location = %location, "Failed to write part")
            }
            IngestOutcome::SourceError(reason) => {
                tracing::warn!(reason = %reason, location = %location, "Part stream ended early")
            }
            IngestOutcome::Completed { .. } => {}
        }

        if let Err(e) = storage.delete(&location).await {
            tracing::error!(error = %e, location = %location, "Failed to remove partial file");
        }

        outcome
    }
}

async fn copy<S>(
    destination: &mut Box<dyn WriteDestination>,
    source: &mut S,
) -> Result<(), IngestOutcome>
where
    S: Stream<Item = Result<Bytes, String>> + Unpin,
{
    while let Some(item) = source.next().await {
        let chunk = item.map_err(IngestOutcome::SourceError)?;
        destination
            .write(&chunk)
            .await
            .map_err(IngestOutcome::WriteError)?;
    }
    Ok(())
}
