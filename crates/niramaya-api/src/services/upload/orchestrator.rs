//! All-or-nothing upload orchestration
//!
//! One orchestrator run handles one request:
//!
//! - **Receiving**: parts are read in order. Each file part is validated and, if
//!   accepted, gets a destination and a [`PartIngestor`] task immediately. The part's
//!   bytes are forwarded to that task over a bounded channel while parsing continues.
//! - **Draining**: the closing boundary was seen; writes may still be in flight.
//! - **Settling**: every started task is joined.
//! - **Responding**: the outcome is decided once through [`UploadSession::conclude`],
//!   which rolls back every accepted file on failure.
//!
//! Limit breaches and parser faults skip straight to Responding. Tasks still running
//! at that point are detached; they see the abort signal and delete their own files.

use std::sync::Arc;

use axum::body::Body;
use axum::http::HeaderMap;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;
use niramaya_core::{sanitize_filename, NameTokenSource, TypePolicy};
use niramaya_storage::StorageSink;
use tokio::task::JoinSet;

use super::ingestor::PartIngestor;
use super::parser::{MultipartParser, ParserFault, PartDescriptor};
use super::registry::{SessionGuard, UploadSession};
use super::types::{AcceptedFile, IngestOutcome, UploadFailure, UploadLimits, UploadOutcome};
use crate::state::UploadState;

/// Chunks buffered between the parser and one ingestor
const INGEST_BUFFER: usize = 8;

/// Media type checked for parts that declare none
const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default)]
struct PartTally {
    file_parts: usize,
    rejected: usize,
}

pub struct UploadOrchestrator {
    storage: Arc<dyn StorageSink>,
    policy: TypePolicy,
    limits: UploadLimits,
    names: Arc<dyn NameTokenSource>,
}

impl UploadOrchestrator {
    pub fn new(state: &UploadState) -> Self {
        Self {
            storage: state.storage.clone(),
            policy: state.policy.clone(),
            limits: state.limits,
            names: state.names.clone(),
        }
    }

    /// Run the whole pipeline for one request body and return the decided outcome.
    ///
    /// Storage is provisioned before the body is touched. When this returns with a
    /// failed outcome, none of the request's files remain in storage.
    pub async fn run(&self, headers: &HeaderMap, body: Body) -> UploadOutcome {
        if let Err(e) = self.storage.provision().await {
            tracing::error!(error = %e, "Failed to provision upload storage");
            return UploadOutcome::failed(UploadFailure::Provisioning(e.to_string()));
        }

        let parser =
            match MultipartParser::from_request(headers, body, self.limits.max_part_size_bytes) {
                Ok(parser) => parser,
                Err(fault) => {
                    tracing::warn!(error = %fault, "Request body is not a usable multipart stream");
                    return UploadOutcome::failed(fault.into());
                }
            };

        let session = UploadSession::new(self.storage.clone());
        let _guard = SessionGuard::new(session.clone());
        self.process(&session, parser).await
    }

    async fn process(
        &self,
        session: &Arc<UploadSession>,
        mut parser: MultipartParser,
    ) -> UploadOutcome {
        let mut tasks = JoinSet::new();
        let mut tally = PartTally::default();

        loop {
            let received = match parser.next_part().await {
                Ok(Some(part)) => self.receive_part(session, &mut tasks, &mut tally, part).await,
                Ok(None) => break,
                Err(fault) => Err(fault),
            };
            if let Err(fault) = received {
                return self.short_circuit(session, tasks, &tally, fault).await;
            }
        }

        tracing::debug!(
            file_parts = tally.file_parts,
            in_flight = tasks.len(),
            "Multipart stream drained"
        );

        let (failed_writes, unexpected) = join_ingestors(session, &mut tasks).await;
        let failed_count = tally.rejected + failed_writes;

        let error_detail = match unexpected {
            Some(detail) => Some(UploadFailure::Unexpected(detail)),
            None if session.has_error() => Some(UploadFailure::Rejected(format!(
                "{} of {} file parts failed",
                failed_count, tally.file_parts
            ))),
            None => None,
        };

        let outcome = UploadOutcome {
            accepted_count: session.accepted_count().await,
            failed_count,
            limit_breached: false,
            error_detail,
        };
        session.conclude(outcome).await
    }

    /// Handle one part. An `Err` is fatal for the whole request.
    async fn receive_part(
        &self,
        session: &Arc<UploadSession>,
        tasks: &mut JoinSet<IngestOutcome>,
        tally: &mut PartTally,
        part: PartDescriptor,
    ) -> Result<(), ParserFault> {
        let Some(raw_filename) = part.filename().map(str::to_string) else {
            tracing::debug!(field = %part.field_name, "Skipping part without filename");
            return part.discard().await;
        };

        tally.file_parts += 1;
        if tally.file_parts > self.limits.max_parts {
            return Err(ParserFault::LimitBreached(format!(
                "more than {} file parts",
                self.limits.max_parts
            )));
        }

        let name = sanitize_filename(&raw_filename);
        let media_type = part
            .declared_media_type
            .as_deref()
            .unwrap_or(DEFAULT_MEDIA_TYPE);

        if let Err(e) = self.policy.check(&name.extension, media_type) {
            tracing::info!(
                field = %part.field_name,
                filename = %format!("{}{}", name.base, name.extension),
                error = %e,
                "Rejected part"
            );
            session.flag_error();
            tally.rejected += 1;
            return part.discard().await;
        }

        let generated_name = name.unique_name(&self.names.next_token());
        let destination = match self.storage.create_destination(&generated_name).await {
            Ok(destination) => destination,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    generated_name = %generated_name,
                    "Failed to open destination"
                );
                session.flag_error();
                tally.rejected += 1;
                return part.discard().await;
            }
        };

        let location = destination.location().to_string();
        session
            .register(AcceptedFile {
                field_name: part.field_name.clone(),
                generated_name: generated_name.clone(),
                location: location.clone(),
            })
            .await;

        tracing::debug!(
            field = %part.field_name,
            generated_name = %generated_name,
            "Accepted part"
        );

        let (tx, rx) = mpsc::channel(INGEST_BUFFER);
        let ingestor = PartIngestor::new(self.storage.clone(), destination, session.abort_signal());
        let task_session = Arc::clone(session);
        tasks.spawn(async move {
            let outcome = ingestor.run(rx).await;
            task_session.settle(&location).await;
            outcome
        });

        forward(part, tx).await
    }

    async fn short_circuit(
        &self,
        session: &Arc<UploadSession>,
        mut tasks: JoinSet<IngestOutcome>,
        tally: &PartTally,
        fault: ParserFault,
    ) -> UploadOutcome {
        session.flag_error();
        let failure = UploadFailure::from(fault);
        tracing::warn!(failure = ?failure, in_flight = tasks.len(), "Upload stopped early");

        let outcome = UploadOutcome {
            accepted_count: session.accepted_count().await,
            failed_count: tally.rejected,
            limit_breached: matches!(failure, UploadFailure::LimitExceeded(_)),
            error_detail: Some(failure),
        };
        let decided = session.conclude(outcome).await;
        tasks.detach_all();
        decided
    }
}

/// Pump a part's bytes into its ingestor. A parser fault is passed on to the
/// ingestor before being returned.
async fn forward(
    mut part: PartDescriptor,
    mut tx: mpsc::Sender<Result<Bytes, String>>,
) -> Result<(), ParserFault> {
    loop {
        match part.next_chunk().await {
            Ok(Some(chunk)) => {
                if tx.send(Ok(chunk)).await.is_err() {
                    // ingestor gave up; its outcome carries the reason
                    return part.discard().await;
                }
            }
            Ok(None) => return Ok(()),
            Err(fault) => {
                let _ = tx.send(Err(fault.to_string())).await;
                return Err(fault);
            }
        }
    }
}

/// Wait for every ingestor. Returns the number of failed parts and the first task
/// that ended without an outcome.
async fn join_ingestors(
    session: &UploadSession,
    tasks: &mut JoinSet<IngestOutcome>,
) -> (usize, Option<String>) {
    let mut failed = 0;
    let mut unexpected = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) if outcome.is_completed() => {}
            Ok(_) => {
                failed += 1;
                session.flag_error();
            }
            Err(e) => {
                tracing::error!(error = %e, "Part task ended without an outcome");
                failed += 1;
                session.flag_error();
                unexpected.get_or_insert_with(|| e.to_string());
            }
        }
    }

    (failed, unexpected)
}
