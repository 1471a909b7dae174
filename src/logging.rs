//! Fatal-path log records.
//!
//! Every fatal response produces exactly one [`FatalLogRecord`], handed to the
//! configured [`FatalLogger`] before anything is written to the sink.
//!
//! # Record Shape
//!
//! - caller file, line and function
//! - the response message
//! - one primary error and `error_1..` auxiliary errors
//! - filtered count, fatal bucket size and request id
//!
//! Error text in the record is the **original** text, including for errors the
//! client only saw as redacted. Skipped errors never appear.
//!
//! # Memory Hygiene
//!
//! Owned text is zeroized when the record drops. Loggers that need to keep
//! data copy what they need (see [`crate::ring_buffer`]).

use crate::convenience::sanitize;
use smallvec::SmallVec;
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use zeroize::Zeroize;

/// Maximum length for any individual field in formatted output
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Function name used when symbols cannot be resolved.
pub const UNKNOWN_FUNCTION: &str = "unknown";

/// Frame prefixes that belong to this library or the runtime.
const INTERNAL_FRAME_PREFIXES: &[&str] = &[
    "palisade_response::",
    "<palisade_response::",
    "std::",
    "<std::",
    "core::",
    "<core::",
    "alloc::",
    "<alloc::",
    "__rust",
    "_start",
    "__libc",
];

// ============================================================================
// Caller Resolution
// ============================================================================

/// Where a fatal call came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub file: &'static str,
    pub line: u32,
    pub function: Cow<'static, str>,
}

impl CallerInfo {
    /// Resolve the calling function for a `#[track_caller]` location.
    ///
    /// File and line come from the location. The function name comes from a
    /// captured backtrace: the frame reported at the same file and line if
    /// there is one, else the first frame outside this library and the
    /// standard library.
    pub fn resolve(location: &'static Location<'static>) -> Self {
        let trace = Backtrace::force_capture().to_string();
        let frames = parse_backtrace(&trace);
        let function = pick_function(&frames, location.file(), location.line())
            .map_or(Cow::Borrowed(UNKNOWN_FUNCTION), Cow::Owned);
        Self {
            file: location.file(),
            line: location.line(),
            function,
        }
    }

    /// Caller info without backtrace lookup.
    pub const fn at(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            function: Cow::Borrowed(UNKNOWN_FUNCTION),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Frame {
    symbol: String,
    file: Option<String>,
    line: Option<u32>,
}

/// Parse the `Display` form of a std backtrace.
///
/// Frames look like `  4: crate::module::func` optionally followed by
/// `             at ./src/file.rs:10:5`.
fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let mut parts = location.rsplitn(3, ':');
                let _column = parts.next();
                let line_no = parts.next().and_then(|n| n.parse().ok());
                let file = parts.next().map(str::to_owned);
                frame.line = line_no;
                frame.file = file;
            }
            continue;
        }
        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
            frames.push(Frame {
                symbol: strip_hash(symbol).to_owned(),
                ..Frame::default()
            });
        }
    }
    frames
}

/// Drop the `::h0123456789abcdef` disambiguator.
fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::h") {
        Some((head, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
            head
        }
        _ => symbol,
    }
}

fn is_internal(symbol: &str) -> bool {
    INTERNAL_FRAME_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

fn pick_function(frames: &[Frame], file: &str, line: u32) -> Option<String> {
    let exact = frames.iter().find(|frame| {
        frame.line == Some(line)
            && frame
                .file
                .as_deref()
                .is_some_and(|f| f.ends_with(file) || file.ends_with(f.trim_start_matches("./")))
    });
    exact
        .or_else(|| frames.iter().find(|frame| !is_internal(&frame.symbol)))
        .map(|frame| frame.symbol.clone())
}

// ============================================================================
// Record
// ============================================================================

/// Structured record of one fatal response.
#[derive(Debug)]
pub struct FatalLogRecord {
    pub caller: CallerInfo,
    pub message: String,
    pub primary: String,
    pub auxiliary: SmallVec<[(Cow<'static, str>, String); 4]>,
    pub filtered: usize,
    pub fatal_bucket: usize,
    pub request_id: Option<String>,
}

impl FatalLogRecord {
    pub fn new(caller: CallerInfo, message: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            caller,
            message: message.into(),
            primary: primary.into(),
            auxiliary: SmallVec::new(),
            filtered: 0,
            fatal_bucket: 0,
            request_id: None,
        }
    }

    /// Append auxiliary errors as `error_1`, `error_2`, ...
    pub fn with_auxiliary(mut self, errors: impl IntoIterator<Item = String>) -> Self {
        for err in errors {
            let key = Cow::Owned(format!("error_{}", self.auxiliary.len() + 1));
            self.auxiliary.push((key, err));
        }
        self
    }

    /// Write the record without intermediate allocation of the whole line.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[fatal] {}:{} fn={} message='{}' error='{}'",
            self.caller.file,
            self.caller.line,
            self.caller.function,
            truncate_with_indicator(&self.message),
            truncate_with_indicator(&self.primary)
        )?;
        for (key, value) in &self.auxiliary {
            write!(f, " {}='{}'", key, truncate_with_indicator(value))?;
        }
        if self.filtered > 0 {
            write!(f, " filtered={}", self.filtered)?;
        }
        if let Some(id) = &self.request_id {
            write!(f, " request_id='{}'", truncate_with_indicator(id))?;
        }
        Ok(())
    }

    /// Full-detail formatting for trusted environments.
    ///
    /// Only available with the `trusted_debug` feature in debug builds.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = String::new();
        let _ = self.write_to(&mut output);
        output.push_str(&format!(" fatal_bucket={}", self.fatal_bucket));
        output
    }
}

impl fmt::Display for FatalLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

impl Drop for FatalLogRecord {
    fn drop(&mut self) {
        self.message.zeroize();
        self.primary.zeroize();
        for (_, value) in self.auxiliary.iter_mut() {
            value.zeroize();
        }
        if let Some(id) = self.request_id.as_mut() {
            id.zeroize();
        }
    }
}

/// Truncate a field for display, keeping UTF-8 boundaries.
pub(crate) fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }
    let mut idx = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }
    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}

// ============================================================================
// Loggers
// ============================================================================

/// Sink for fatal records.
pub trait FatalLogger: Send + Sync {
    fn log_fatal(&self, record: &FatalLogRecord);
}

/// Emits each record as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl FatalLogger for TracingLogger {
    fn log_fatal(&self, record: &FatalLogRecord) {
        let auxiliary = record
            .auxiliary
            .iter()
            .map(|(key, value)| format!("{key}={}", sanitize(value)))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::error!(
            caller.file = record.caller.file,
            caller.line = record.caller.line,
            caller.function = %record.caller.function,
            response_message = %sanitize(&record.message),
            error = %sanitize(&record.primary),
            auxiliary = %auxiliary,
            filtered = record.filtered,
            fatal_bucket = record.fatal_bucket,
            request_id = record.request_id.as_deref().unwrap_or(""),
            "fatal response"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:9
   1: palisade_response::logging::CallerInfo::resolve::h0123456789abcdef
             at ./src/logging.rs:70:21
   2: palisade_response::renderer::Responder::fatal
             at ./src/renderer.rs:200:9
   3: shop::handlers::checkout::h89abcdef01234567
             at ./src/handlers.rs:42:5
   4: shop::main
             at ./src/main.rs:10:5";

    #[test]
    fn parses_frames() {
        let frames = parse_backtrace(TRACE);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[3].symbol, "shop::handlers::checkout");
        assert_eq!(frames[3].file.as_deref(), Some("./src/handlers.rs"));
        assert_eq!(frames[3].line, Some(42));
    }

    #[test]
    fn exact_location_wins() {
        let frames = parse_backtrace(TRACE);
        let found = pick_function(&frames, "src/main.rs", 10);
        assert_eq!(found.as_deref(), Some("shop::main"));
    }

    #[test]
    fn falls_back_to_first_external_frame() {
        let frames = parse_backtrace(TRACE);
        let found = pick_function(&frames, "src/elsewhere.rs", 1);
        assert_eq!(found.as_deref(), Some("shop::handlers::checkout"));
    }

    #[test]
    fn empty_trace_is_unknown() {
        assert_eq!(pick_function(&parse_backtrace(""), "x.rs", 1), None);
    }

    #[test]
    fn resolve_keeps_location() {
        let location = Location::caller();
        let caller = CallerInfo::resolve(location);
        assert_eq!(caller.file, location.file());
        assert_eq!(caller.line, location.line());
        assert!(!caller.function.is_empty());
    }

    #[test]
    fn record_formats_auxiliary_keys() {
        let record = FatalLogRecord::new(
            CallerInfo::at(Location::caller()),
            "payment failed",
            "gateway timeout",
        )
        .with_auxiliary(["retry exhausted".to_owned(), "card hidden".to_owned()]);

        let line = record.to_string();
        assert!(line.contains("error='gateway timeout'"));
        assert!(line.contains("error_1='retry exhausted'"));
        assert!(line.contains("error_2='card hidden'"));
        assert!(!line.contains("filtered="));
    }

    #[test]
    fn long_fields_truncated() {
        let record = FatalLogRecord::new(CallerInfo::at(Location::caller()), "m", "x".repeat(5000));
        let line = record.to_string();
        assert!(line.contains(TRUNCATION_INDICATOR));
        assert!(line.len() < 2 * MAX_FIELD_OUTPUT_LEN);
    }

    #[test]
    fn truncate_utf8_boundary() {
        let s = "й".repeat(MAX_FIELD_OUTPUT_LEN);
        let truncated = truncate_with_indicator(&s);
        assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn short_fields_borrowed() {
        assert!(matches!(truncate_with_indicator("short"), Cow::Borrowed(_)));
    }
}
