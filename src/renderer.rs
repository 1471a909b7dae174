//! Renderer configuration and per-call responders.
//!
//! A [`Renderer`] is an immutable configuration value. Every `with_*` method
//! consumes it and returns a new one, so a base renderer can be cloned and
//! specialized per request without locking. The only state shared between
//! copies is the callback registry and the buffer pool.
//!
//! A call goes through [`Renderer::respond`] (explicit sink) or
//! [`Renderer::respond_default`] (configured sink), optionally decorates the
//! envelope, and finishes with one entry point:
//!
//! | Entry point                | Status    | Default code |
//! |----------------------------|-----------|--------------|
//! | `ok` / `success`           | `ok`      | 200          |
//! | `pending`                  | `pending` | 202          |
//! | `warning` / `warningf`     | `warning` | 200          |
//! | `error` / `errorf`         | `error`   | 400          |
//! | `fatal` / `fatalf`         | `fatal`   | 500          |
//! | `send`                     | envelope  | by status    |
//! | `stream`                   | chunks    | 200          |
//!
//! # Dispatch Order
//!
//! 1. cancellation poll
//! 2. error routing and suppression
//! 3. fatal log record
//! 4. encoder lookup and marshal (fallback envelope on failure)
//! 5. status and headers through the protocol handler
//! 6. one write, one flush
//! 7. success or error callbacks
//!
//! # Example
//!
//! ```rust
//! use palisade_response::{BoxError, Renderer, Settings};
//! use palisade_response::sink::ResponseSink;
//!
//! let renderer = Renderer::new(Settings::default());
//! let mut sink = ResponseSink::new();
//! renderer
//!     .respond(&mut sink)
//!     .error("Validation failed", [BoxError::from("bad input")])
//!     .unwrap();
//!
//! assert_eq!(sink.status().as_u16(), 400);
//! assert_eq!(
//!     std::str::from_utf8(sink.body()).unwrap(),
//!     r#"{"status":"error","message":"Validation failed","errors":["bad input"]}"#
//! );
//! ```

use crate::BoxError;
use crate::chain::Severity;
use crate::encoding::{Document, Encoder, EncoderRegistry, normalize_content_type};
use crate::envelope::{Action, Envelope, Payload, Status, SystemMeta};
use crate::error::{RenderError, Result};
use crate::filter::FilterSet;
use crate::format::{Arg, format_message, take_errors};
use crate::hooks::{DispatchEvent, Hooks};
use crate::logging::{CallerInfo, FatalLogRecord, FatalLogger, TracingLogger};
use crate::pool::BufferPool;
use crate::router::{self, Routed};
use crate::settings::{Preset, Settings};
use crate::sink::{HttpProtocol, ProtocolHandler, ResponseHead, Sink};
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Message placed in the fallback envelope of a success-side response.
pub const ENCODE_FAILED_MESSAGE: &str = "response could not be encoded";

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// A writer shared by every call that uses the configured default sink.
pub type SharedSink = Arc<Mutex<dyn Sink + Send>>;

/// What a dispatch call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// One envelope was written.
    Written {
        status: Status,
        code: StatusCode,
        bytes: usize,
    },
    /// A stream ran to end-of-data.
    Streamed { chunks: usize, bytes: usize },
    /// Every error was filtered and nothing was left to say.
    Suppressed,
}

impl Outcome {
    pub const fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Immutable response configuration.
#[derive(Clone)]
pub struct Renderer {
    settings: Arc<Settings>,
    filters: FilterSet,
    encoders: EncoderRegistry,
    logger: Arc<dyn FatalLogger>,
    default_sink: Option<SharedSink>,
    protocol: Arc<dyn ProtocolHandler>,
    format: String,
    headers: HeaderMap,
    preset_status: Option<StatusCode>,
    request_id: Option<String>,
    show_errors: bool,
    cancellation: Option<CancellationToken>,
    started: Instant,
    hooks: Hooks,
    pool: BufferPool,
}

impl Renderer {
    pub fn new(settings: Settings) -> Self {
        Self {
            format: normalize_content_type(&settings.default_format),
            show_errors: settings.show_errors,
            settings: Arc::new(settings),
            filters: FilterSet::default(),
            encoders: EncoderRegistry::default(),
            logger: Arc::new(TracingLogger),
            default_sink: None,
            protocol: Arc::new(HttpProtocol),
            headers: HeaderMap::new(),
            preset_status: None,
            request_id: None,
            cancellation: None,
            started: Instant::now(),
            hooks: Hooks::new(),
            pool: BufferPool::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Derive a new filter set from the current one.
    pub fn map_filters(mut self, f: impl FnOnce(FilterSet) -> FilterSet) -> Self {
        self.filters = f(self.filters);
        self
    }

    pub fn with_logger(mut self, logger: impl FatalLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn with_default_sink(mut self, sink: impl Sink + Send + 'static) -> Self {
        self.default_sink = Some(Arc::new(Mutex::new(sink)));
        self
    }

    pub fn with_shared_sink(mut self, sink: SharedSink) -> Self {
        self.default_sink = Some(sink);
        self
    }

    pub fn with_protocol(mut self, protocol: impl ProtocolHandler + 'static) -> Self {
        self.protocol = Arc::new(protocol);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoders = self.encoders.with_encoder(encoder);
        self
    }

    pub fn with_format(mut self, content_type: &str) -> Self {
        self.format = normalize_content_type(content_type);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_show_errors(mut self, show: bool) -> Self {
        self.show_errors = show;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Measure `meta.system.duration` from `started` instead of construction time.
    pub fn with_started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Apply a named preset from the settings.
    ///
    /// Unknown names leave the renderer unchanged. Header entries that are not
    /// valid HTTP are skipped.
    pub fn with_preset(mut self, name: &str) -> Self {
        let settings = Arc::clone(&self.settings);
        let Some(preset) = settings.presets.get(name) else {
            warn!(preset = name, "unknown preset");
            return self;
        };
        self.apply_preset(name, preset);
        self
    }

    fn apply_preset(&mut self, name: &str, preset: &Preset) {
        for (key, value) in &preset.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(key), Ok(value)) => {
                    self.headers.insert(key, value);
                }
                _ => warn!(preset = name, header = %key, "invalid preset header skipped"),
            }
        }
        if let Some(format) = &preset.format {
            self.format = normalize_content_type(format);
        }
        if let Some(code) = preset.status.and_then(|c| StatusCode::from_u16(c).ok()) {
            self.preset_status = Some(code);
        }
    }

    /// Start a call that writes to `sink`.
    pub fn respond<'r>(&'r self, sink: &'r mut dyn Sink) -> Responder<'r> {
        Responder::new(self, SinkSlot::Borrowed(sink))
    }

    /// Start a call that writes to the configured default sink.
    pub fn respond_default(&self) -> Result<Responder<'_>> {
        let sink = self.default_sink.clone().ok_or(RenderError::NoWriter)?;
        Ok(Responder::new(self, SinkSlot::Shared(sink)))
    }

    fn check_canceled(&self) -> Result<()> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(RenderError::Canceled),
            _ => Ok(()),
        }
    }

    fn elapsed(&self) -> String {
        format!("{:.3}ms", self.started.elapsed().as_secs_f64() * 1e3)
    }

    fn system_meta(&self) -> SystemMeta {
        SystemMeta {
            app: self.settings.app_name.clone(),
            version: self.settings.system.version.clone(),
            build: self.settings.system.build.clone(),
            duration: self.elapsed(),
        }
    }

    fn build_head(&self, code: StatusCode, content_type: &str) -> ResponseHead {
        let mut head = ResponseHead::new(code);
        head.headers.extend(self.headers.clone());
        if let Ok(value) = HeaderValue::from_str(content_type) {
            head.headers.insert(CONTENT_TYPE, value);
        }
        if self.settings.system_headers {
            self.insert_system_headers(&mut head.headers);
        }
        if let Some(value) = self
            .request_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            head.headers.insert(REQUEST_ID, value);
        }
        head
    }

    fn insert_system_headers(&self, headers: &mut HeaderMap) {
        let app = self.settings.app_name.as_str();
        let system = &self.settings.system;
        let fields = [
            ("duration", self.elapsed()),
            ("timestamp", chrono::Utc::now().to_rfc3339()),
            ("app", app.to_owned()),
            ("server", system.server.clone()),
            ("version", system.version.clone()),
            ("build", system.build.clone()),
            ("play", system.play.to_string()),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                continue;
            }
            let name = format!("x-{}-{field}", app.to_ascii_lowercase());
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => debug!(header = %name, "system header skipped"),
            }
        }
    }

    fn log_fatal(&self, caller: CallerInfo, routed: &Routed) {
        let mut record = FatalLogRecord::new(caller, routed.message.clone(), routed.primary_log_text())
            .with_auxiliary(routed.auxiliary_log_texts());
        record.filtered = routed.filtered;
        record.fatal_bucket = routed.fatal_bucket;
        record.request_id = self.request_id.clone();
        self.logger.log_fatal(&record);
    }

    fn event(&self, status: Status, code: StatusCode, content_type: &str, bytes: usize) -> DispatchEvent {
        DispatchEvent {
            status,
            code,
            content_type: content_type.to_owned(),
            bytes_written: bytes,
            error: None,
            request_id: self.request_id.clone(),
            streamed: false,
        }
    }

    fn fail(&self, mut event: DispatchEvent, err: RenderError) -> RenderError {
        event.error = Some(err.to_string());
        self.hooks.fire_error(&event);
        err
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("app", &self.settings.app_name)
            .field("format", &self.format)
            .field("filters", &self.filters)
            .field("show_errors", &self.show_errors)
            .field("request_id", &self.request_id)
            .field("has_default_sink", &self.default_sink.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Responder
// ============================================================================

enum SinkSlot<'r> {
    Borrowed(&'r mut dyn Sink),
    Shared(SharedSink),
}

fn lock_shared(sink: &SharedSink) -> MutexGuard<'_, dyn Sink + Send + 'static> {
    match sink.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Which entry point routed the errors.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Entry {
    Warning,
    Error,
    Fatal,
}

impl Entry {
    const fn severity(self) -> Severity {
        match self {
            Self::Fatal => Severity::Fatal,
            Self::Warning | Self::Error => Severity::Normal,
        }
    }

    const fn default_message(self) -> &'static str {
        match self {
            Self::Warning => router::DEFAULT_WARNING_MESSAGE,
            Self::Error => router::DEFAULT_ERROR_MESSAGE,
            Self::Fatal => router::DEFAULT_FATAL_MESSAGE,
        }
    }

    const fn status(self, severity: Severity) -> Status {
        match (self, severity) {
            (_, Severity::Fatal) => Status::Fatal,
            (Self::Warning, Severity::Normal) => Status::Warning,
            (_, Severity::Normal) => Status::Error,
        }
    }
}

/// One call: optional decoration, then exactly one entry point.
pub struct Responder<'r> {
    renderer: &'r Renderer,
    sink: SinkSlot<'r>,
    format: Option<String>,
    code: Option<StatusCode>,
    title: Option<String>,
    tags: Vec<String>,
    info: Option<Payload>,
    data: Option<Payload>,
    meta: Vec<(String, Value)>,
    actions: Vec<Action>,
}

impl<'r> Responder<'r> {
    fn new(renderer: &'r Renderer, sink: SinkSlot<'r>) -> Self {
        Self {
            renderer,
            sink,
            format: None,
            code: None,
            title: None,
            tags: Vec::new(),
            info: None,
            data: None,
            meta: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn info(mut self, info: impl Into<Payload>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Override the HTTP status code.
    ///
    /// A fatal response only accepts a server-error override.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Use a different content type for this call.
    pub fn format(mut self, content_type: &str) -> Self {
        self.format = Some(normalize_content_type(content_type));
        self
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// `ok` envelope, 200.
    pub fn ok(self, message: impl Into<String>) -> Result<Outcome> {
        self.renderer.check_canceled()?;
        let env = Envelope::new(Status::Ok).with_message(message);
        self.dispatch(env)
    }

    /// Alias of [`Responder::ok`].
    pub fn success(self, message: impl Into<String>) -> Result<Outcome> {
        self.ok(message)
    }

    /// `pending` envelope, 202.
    pub fn pending(self, message: impl Into<String>) -> Result<Outcome> {
        self.renderer.check_canceled()?;
        let env = Envelope::new(Status::Pending).with_message(message);
        self.dispatch(env)
    }

    /// Dispatch a caller-built envelope.
    ///
    /// Decoration set on this responder fills members the envelope left empty.
    pub fn send(self, envelope: Envelope) -> Result<Outcome> {
        self.renderer.check_canceled()?;
        self.dispatch(envelope)
    }

    /// Warning with errors routed through the filters.
    #[track_caller]
    pub fn warning<I>(self, message: impl Into<String>, errors: I) -> Result<Outcome>
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxError>>,
    {
        let caller = Location::caller();
        self.routed(Entry::Warning, message.into(), collect(errors), caller)
    }

    /// Error response with errors routed through the filters.
    #[track_caller]
    pub fn error<I>(self, message: impl Into<String>, errors: I) -> Result<Outcome>
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxError>>,
    {
        let caller = Location::caller();
        self.routed(Entry::Error, message.into(), collect(errors), caller)
    }

    /// Fatal response; always written and always logged.
    #[track_caller]
    pub fn fatal<I>(self, message: impl Into<String>, errors: I) -> Result<Outcome>
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxError>>,
    {
        let caller = Location::caller();
        self.routed(Entry::Fatal, message.into(), collect(errors), caller)
    }

    /// Warning with a message built from a template.
    #[track_caller]
    pub fn warningf(self, template: &str, args: Vec<Arg>) -> Result<Outcome> {
        let caller = Location::caller();
        self.templated(Entry::Warning, template, args, caller)
    }

    /// Error with a message built from a template.
    ///
    /// Error arguments both fill their verb and join the error list.
    #[track_caller]
    pub fn errorf(self, template: &str, args: Vec<Arg>) -> Result<Outcome> {
        let caller = Location::caller();
        self.templated(Entry::Error, template, args, caller)
    }

    /// Fatal with a message built from a template.
    #[track_caller]
    pub fn fatalf(self, template: &str, args: Vec<Arg>) -> Result<Outcome> {
        let caller = Location::caller();
        self.templated(Entry::Fatal, template, args, caller)
    }

    /// Write chunks from `producer` until it returns `Ok(None)`.
    ///
    /// Status and headers are applied once. Each chunk is encoded and written
    /// on its own and the sink is flushed after each one. A producer error
    /// stops the stream.
    pub fn stream<F>(mut self, mut producer: F) -> Result<Outcome>
    where
        F: FnMut() -> std::result::Result<Option<Payload>, BoxError>,
    {
        let renderer = self.renderer;
        renderer.check_canceled()?;
        let content_type = self.content_type();
        let encoder = renderer
            .encoders
            .get(&content_type)
            .cloned()
            .ok_or_else(|| RenderError::UnsupportedFormat(content_type.clone()))?;
        let code = self.code.or(renderer.preset_status).unwrap_or(StatusCode::OK);
        let mut event = renderer.event(Status::Ok, code, &content_type, 0);
        event.streamed = true;

        let head = renderer.build_head(code, &content_type);
        if let Err(err) = self.with_sink(|sink| renderer.protocol.apply_headers(sink, &head)) {
            return Err(renderer.fail(event, RenderError::Headers(err)));
        }

        let mut chunks = 0usize;
        let mut buf = renderer.pool.acquire();
        loop {
            let chunk = match producer() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => return Err(renderer.fail(event, RenderError::Producer(err))),
            };
            buf.clear();
            if let Err(err) = encoder.marshal(&Document::Chunk(&chunk), &mut buf) {
                return Err(renderer.fail(event, RenderError::Encode(err)));
            }
            let written = self.with_sink(|sink| {
                sink.write_all(&buf)?;
                sink.flush()
            });
            if let Err(err) = written {
                return Err(renderer.fail(event, RenderError::Write(err)));
            }
            chunks += 1;
            event.bytes_written += buf.len();
        }

        debug!(chunks, bytes = event.bytes_written, "stream complete");
        renderer.hooks.fire_success(&event);
        Ok(Outcome::Streamed {
            chunks,
            bytes: event.bytes_written,
        })
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn templated(
        self,
        entry: Entry,
        template: &str,
        args: Vec<Arg>,
        caller: &'static Location<'static>,
    ) -> Result<Outcome> {
        let message = format_message(template, &args, &self.renderer.filters);
        self.routed(entry, message, take_errors(args), caller)
    }

    fn routed(
        self,
        entry: Entry,
        message: String,
        errors: Vec<Option<BoxError>>,
        caller: &'static Location<'static>,
    ) -> Result<Outcome> {
        let renderer = self.renderer;
        renderer.check_canceled()?;

        let routed = router::route(
            entry.severity(),
            message,
            entry.default_message(),
            errors,
            &renderer.filters,
        );
        if routed.suppressed {
            return Ok(Outcome::Suppressed);
        }
        if routed.severity.is_fatal() {
            renderer.log_fatal(CallerInfo::resolve(caller), &routed);
        }

        let status = entry.status(routed.severity);
        let mut env = Envelope::new(status).with_message(routed.message);
        if renderer.show_errors {
            env.errors = routed.shown;
        }
        self.dispatch(env)
    }

    fn content_type(&self) -> String {
        self.format
            .clone()
            .unwrap_or_else(|| self.renderer.format.clone())
    }

    fn with_sink<T>(&mut self, f: impl FnOnce(&mut dyn Sink) -> T) -> T {
        match &mut self.sink {
            SinkSlot::Borrowed(sink) => f(&mut **sink),
            SinkSlot::Shared(shared) => {
                let mut guard = lock_shared(shared);
                f(&mut *guard)
            }
        }
    }

    fn decorate(&mut self, env: &mut Envelope) {
        if env.title.is_none() {
            env.title = self.title.take();
        }
        if env.info.is_none() {
            env.info = self.info.take();
        }
        if env.data.is_none() {
            env.data = self.data.take();
        }
        env.tags.append(&mut self.tags);
        env.actions.append(&mut self.actions);
        env.meta.extra.extend(self.meta.drain(..));
        if env.meta.request_id.is_none() {
            env.meta.request_id = self.renderer.request_id.clone();
        }
        if self.renderer.settings.system_headers && env.meta.system.is_none() {
            env.meta.system = Some(self.renderer.system_meta());
        }
    }

    fn status_code(&self, status: Status) -> StatusCode {
        match status {
            Status::Fatal => self
                .code
                .filter(StatusCode::is_server_error)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => self
                .code
                .or(self.renderer.preset_status)
                .unwrap_or_else(|| status.default_code()),
        }
    }

    fn dispatch(mut self, mut env: Envelope) -> Result<Outcome> {
        let renderer = self.renderer;
        let content_type = self.content_type();
        let encoder = renderer
            .encoders
            .get(&content_type)
            .cloned()
            .ok_or_else(|| RenderError::UnsupportedFormat(content_type.clone()))?;

        self.decorate(&mut env);
        let mut code = self.status_code(env.status);
        let mut status = env.status;

        let mut buf = renderer.pool.acquire();
        let encode_failure = match encoder.marshal(&Document::Envelope(&env), &mut buf) {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, content_type = %content_type, "encode failed, writing fallback envelope");
                let message = match status {
                    Status::Ok | Status::Pending | Status::Warning => {
                        status = Status::Error;
                        ENCODE_FAILED_MESSAGE
                    }
                    Status::Error | Status::Fatal => env.message.as_str(),
                };
                if code.is_success() {
                    code = StatusCode::INTERNAL_SERVER_ERROR;
                }
                buf.clear();
                buf.extend_from_slice(&encoder.marshal_fallback(status, message));
                Some(err)
            }
        };

        let mut event = renderer.event(status, code, &content_type, 0);
        let head = renderer.build_head(code, &content_type);
        if let Err(err) = self.with_sink(|sink| renderer.protocol.apply_headers(sink, &head)) {
            return Err(renderer.fail(event, RenderError::Headers(err)));
        }
        let written = self.with_sink(|sink| {
            sink.write_all(&buf)?;
            sink.flush()
        });
        if let Err(err) = written {
            return Err(renderer.fail(event, RenderError::Write(err)));
        }

        event.bytes_written = buf.len();
        if let Some(err) = encode_failure {
            return Err(renderer.fail(event, RenderError::Encode(err)));
        }
        debug!(status = %status, code = code.as_u16(), bytes = buf.len(), "response written");
        renderer.hooks.fire_success(&event);
        Ok(Outcome::Written {
            status,
            code,
            bytes: buf.len(),
        })
    }
}

fn collect<I>(errors: I) -> Vec<Option<BoxError>>
where
    I: IntoIterator,
    I::Item: Into<Option<BoxError>>,
{
    errors.into_iter().map(Into::into).collect()
}
