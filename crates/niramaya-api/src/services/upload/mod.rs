//! Streaming multipart upload pipeline
//!
//! parse → validate → ingest concurrently → settle → decide → roll back on failure

pub mod ingestor;
pub mod orchestrator;
pub mod parser;
pub mod registry;
pub mod types;

pub use ingestor::PartIngestor;
pub use orchestrator::UploadOrchestrator;
pub use parser::{MultipartParser, ParserFault, PartDescriptor};
pub use registry::{SessionGuard, UploadSession};
pub use types::{AcceptedFile, IngestOutcome, UploadFailure, UploadLimits, UploadOutcome};
