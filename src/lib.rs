//! # Palisade Response
//!
//! Response envelopes for services that must decide, per call, which errors a
//! client may see.
//!
//! ## Design Philosophy
//!
//! 1. **Every response has the same shape**: one [`Envelope`] per call, in
//!    whatever content type the caller negotiated
//! 2. **Errors are classified, not dumped**: a [`FilterSet`] decides which
//!    errors are hidden, which are masked and which change severity
//! 3. **Fatal responses are never silent**: they are always written and always
//!    logged with the caller location and the original error text
//! 4. **A response with nothing to say is not written**: normal errors that
//!    were all filtered away produce no output
//! 5. **Encoding failures still produce a response**: a minimal fallback
//!    envelope replaces the one that could not be encoded
//!
//! ## Error Routing
//!
//! | Classification | Client sees        | Fatal log sees  | Severity input |
//! |----------------|--------------------|-----------------|----------------|
//! | skip           | nothing            | nothing         | no             |
//! | redact         | `[REDACTED]`       | original text   | yes            |
//! | pass           | `Display` text     | original text   | yes            |
//!
//! Severity markers ([`chain::force_fatal`], [`chain::force_normal`]) live in
//! the error chain and win over the entry point's own severity.
//!
//! ## Quick Start
//!
//! ```rust
//! use palisade_response::{BoxError, FilterSet, Renderer};
//! use palisade_response::sink::ResponseSink;
//!
//! #[derive(Debug)]
//! struct Unauthorized;
//! impl std::fmt::Display for Unauthorized {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("token expired for user 42")
//!     }
//! }
//! impl std::error::Error for Unauthorized {}
//!
//! let renderer = Renderer::default()
//!     .map_filters(|f: FilterSet| f.with_redact(|e| e.is::<Unauthorized>()));
//!
//! let mut sink = ResponseSink::new();
//! renderer
//!     .respond(&mut sink)
//!     .error("Request rejected", [BoxError::from(Unauthorized), BoxError::from("quota exceeded")])
//!     .unwrap();
//!
//! let body = std::str::from_utf8(sink.body()).unwrap();
//! assert!(body.contains(r#""errors":["[REDACTED]","quota exceeded"]"#));
//! assert!(!body.contains("user 42"));
//! ```
//!
//! ## Templated Messages
//!
//! ```rust
//! use palisade_response::{args, BoxError, Renderer};
//! use palisade_response::sink::ResponseSink;
//!
//! let renderer = Renderer::default();
//! let mut sink = ResponseSink::new();
//! let err: BoxError = "disk full".into();
//! renderer
//!     .respond(&mut sink)
//!     .errorf("upload %s failed after %d tries: %v", args!["report.pdf", 3, err])
//!     .unwrap();
//!
//! let body = std::str::from_utf8(sink.body()).unwrap();
//! assert!(body.contains("upload report.pdf failed after 3 tries: disk full"));
//! ```

#![warn(clippy::all)]

pub mod body;
pub mod chain;
pub mod convenience;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod format;
pub mod hooks;
pub mod logging;
pub mod pool;
pub mod renderer;
pub mod ring_buffer;
pub mod router;
pub mod settings;
pub mod sink;

/// Owned, thread-safe error used throughout the crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use body::BodyParser;
pub use chain::{Sentinel, Severity, force_fatal, force_normal, wrap};
pub use convenience::sanitize;
pub use encoding::{Encoder, EncoderRegistry};
pub use envelope::{Action, Envelope, Meta, Payload, Status, SystemMeta};
pub use error::{EncodeError, ParseError, RenderError, Result};
pub use filter::{Classification, FilterSet, REDACTED_MARKER};
pub use format::{Arg, format_message};
pub use hooks::{DispatchEvent, Hooks};
pub use logging::{CallerInfo, FatalLogRecord, FatalLogger, TracingLogger};
pub use renderer::{Outcome, Renderer, Responder};
pub use ring_buffer::{FatalEntry, RingBufferLogger};
pub use router::{DEFAULT_ERROR_MESSAGE, DEFAULT_FATAL_MESSAGE, DEFAULT_WARNING_MESSAGE};
pub use settings::{Preset, Settings, SystemSettings};
pub use sink::{HttpProtocol, ProtocolHandler, ResponseSink, Sink, StreamProtocol};
