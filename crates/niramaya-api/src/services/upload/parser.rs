//! Incremental multipart parsing
//!
//! Wraps `multer` so the orchestrator sees a sequential stream of [`PartDescriptor`]s
//! and two kinds of fault: limit breaches and everything else.

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, HeaderMap};
use bytes::Bytes;
use futures::Stream;
use multer::{Constraints, Field, Multipart, SizeLimit};

/// Fatal parser events. Either one ends the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParserFault {
    #[error("Limit breached: {0}")]
    LimitBreached(String),

    #[error("Malformed multipart stream: {0}")]
    Malformed(String),
}

impl From<multer::Error> for ParserFault {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
                ParserFault::LimitBreached(err.to_string())
            }
            other => ParserFault::Malformed(other.to_string()),
        }
    }
}

/// One part of the multipart body. Its bytes can be read exactly once.
pub struct PartDescriptor {
    pub field_name: String,
    pub raw_filename: Option<String>,
    pub declared_media_type: Option<String>,
    body: Field<'static>,
}

impl PartDescriptor {
    /// Client filename, treating an empty one as absent
    pub fn filename(&self) -> Option<&str> {
        self.raw_filename.as_deref().filter(|name| !name.is_empty())
    }

    /// Next chunk of the part's body, `None` once the part is exhausted
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, ParserFault> {
        Ok(self.body.chunk().await?)
    }

    /// Read the rest of the part and throw it away. Size limits still apply.
    pub async fn discard(mut self) -> Result<(), ParserFault> {
        while self.next_chunk().await?.is_some() {}
        Ok(())
    }
}

pub struct MultipartParser {
    inner: Multipart<'static>,
}

impl MultipartParser {
    /// Build a parser for an HTTP request body.
    ///
    /// A missing `Content-Type`, a non-multipart type or a missing boundary is
    /// reported as [`ParserFault::Malformed`].
    pub fn from_request(
        headers: &HeaderMap,
        body: Body,
        max_part_size_bytes: u64,
    ) -> Result<Self, ParserFault> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ParserFault::Malformed("missing Content-Type header".to_string()))?;

        Self::from_stream(content_type, body.into_data_stream(), max_part_size_bytes)
    }

    pub fn from_stream<S, O, E>(
        content_type: &str,
        stream: S,
        max_part_size_bytes: u64,
    ) -> Result<Self, ParserFault>
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    {
        let boundary = multer::parse_boundary(content_type)?;
        let constraints =
            Constraints::new().size_limit(SizeLimit::new().per_field(max_part_size_bytes));

        Ok(Self {
            inner: Multipart::with_constraints(stream, boundary, constraints),
        })
    }

    /// Next part, `None` at the closing boundary.
    ///
    /// The previous descriptor must have been dropped or fully read.
    pub async fn next_part(&mut self) -> Result<Option<PartDescriptor>, ParserFault> {
        let Some(field) = self.inner.next_field().await? else {
            return Ok(None);
        };

        Ok(Some(PartDescriptor {
            field_name: field.name().unwrap_or_default().to_string(),
            raw_filename: field.file_name().map(str::to_string),
            declared_media_type: field.content_type().map(|mime| mime.to_string()),
            body: field,
        }))
    }
}
