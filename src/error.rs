//! Faults raised by the response machinery itself.
//!
//! Business errors handed to the entry points never show up here: they are
//! routed through the filter pipeline and become envelope content. The types
//! below describe what went wrong while *delivering* that content.
//!
//! Every wrapping variant carries a stable prefix so callers can match on the
//! rendered text as well as on the variant.

use crate::BoxError;
use std::io;
use thiserror::Error;

/// Result alias for dispatch operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Faults raised while assembling, encoding or writing a response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RenderError {
    /// The call was canceled before anything was written.
    ///
    /// This is a complete signal on its own and is never wrapped.
    #[error("request canceled")]
    Canceled,

    /// No sink was passed and the configuration has no default writer.
    #[error("no writer configured")]
    NoWriter,

    /// No encoder is registered for the requested content type.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The envelope could not be encoded.
    ///
    /// When this is returned from a dispatch call, a minimal fallback envelope
    /// has already been written to the sink.
    #[error("encode failed: {0}")]
    Encode(#[source] EncodeError),

    /// The protocol handler refused the status line or headers.
    #[error("header apply failed: {0}")]
    Headers(#[source] BoxError),

    /// The sink failed while writing or flushing.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// A streaming producer returned an error other than end-of-data.
    #[error("producer failed: {0}")]
    Producer(#[source] BoxError),
}

impl RenderError {
    /// True when the client still received a fallback envelope.
    #[inline]
    pub const fn wrote_fallback(&self) -> bool {
        matches!(self, Self::Encode(_))
    }

    /// True for faults raised before any byte reached the sink.
    #[inline]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::NoWriter | Self::UnsupportedFormat(_))
    }
}

/// Encoder-level failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodeError {
    /// The serialization backend rejected the value.
    #[error("{content_type}: {source}")]
    Backend {
        content_type: &'static str,
        #[source]
        source: BoxError,
    },

    /// The value has a shape this format cannot represent.
    #[error("{content_type}: cannot represent {what}")]
    Unsupported {
        content_type: &'static str,
        what: &'static str,
    },
}

impl EncodeError {
    /// Wrap a backend error for the given content type.
    pub fn backend(content_type: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Backend {
            content_type,
            source: source.into(),
        }
    }

    #[inline]
    pub const fn unsupported(content_type: &'static str, what: &'static str) -> Self {
        Self::Unsupported { content_type, what }
    }
}

/// Request-body decoding failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// There was no body to decode.
    #[error("parse failed: empty body")]
    EmptyBody,

    /// No parser is registered for the content type.
    #[error("parse failed: unsupported content type '{0}'")]
    UnsupportedContentType(String),

    /// The parser for this content type cannot decode into the requested target.
    #[error("parse failed: {content_type} cannot decode into {target}")]
    InvalidTarget {
        content_type: String,
        target: &'static str,
    },

    /// The body did not decode.
    #[error("parse failed: {0}")]
    Decode(#[source] EncodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn prefixes_are_stable() {
        let err = RenderError::Write(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(err.to_string(), "write failed: pipe closed");

        let err = RenderError::Encode(EncodeError::unsupported("text/plain", "nested data"));
        assert_eq!(
            err.to_string(),
            "encode failed: text/plain: cannot represent nested data"
        );
        assert!(err.wrote_fallback());
    }

    #[test]
    fn canceled_is_bare() {
        let err = RenderError::Canceled;
        assert_eq!(err.to_string(), "request canceled");
        assert!(err.source().is_none());
    }

    #[test]
    fn encode_source_is_reachable() {
        let inner = EncodeError::backend("application/json", "key must be a string");
        let err = RenderError::Encode(inner);
        let source = err.source().map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("application/json: key must be a string")
        );
    }

    #[test]
    fn configuration_faults() {
        assert!(RenderError::NoWriter.is_configuration());
        assert!(RenderError::UnsupportedFormat("a/b".into()).is_configuration());
        assert!(!RenderError::Canceled.is_configuration());
    }
}
