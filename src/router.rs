//! Error routing: classification, severity merge and suppression.
//!
//! [`route`] is the single place where a list of business errors turns into
//! what the client sees and what the fatal log records. It never touches a
//! sink; the renderer takes a [`Routed`] value and dispatches it.
//!
//! # Steps
//!
//! 1. Absent entries are dropped without counting as filtered.
//! 2. Each error runs through the Convert list, then Skip, then Redact.
//!    Skipped errors only bump the filtered count.
//! 3. Each survivor lands in a severity bucket: a forced marker decides,
//!    otherwise the entry point's severity does. Skipped errors never
//!    escalate.
//! 4. The response is fatal if the entry point was fatal or anything landed
//!    in the fatal bucket.
//! 5. A normal response with nothing left to say is suppressed.

use crate::BoxError;
use crate::chain::{self, Severity};
use crate::filter::{Classification, FilterSet, REDACTED_MARKER};
use tracing::debug;

/// Message used when an error call has none of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "an error occurred";

/// Message used when a fatal call has none of its own.
pub const DEFAULT_FATAL_MESSAGE: &str = "internal server error";

/// Message used when a warning call has none of its own.
pub const DEFAULT_WARNING_MESSAGE: &str = "completed with warnings";

/// Outcome of routing one call's errors.
#[derive(Debug)]
pub struct Routed {
    /// Merged severity.
    pub severity: Severity,
    /// Client message, with the entry point default applied.
    pub message: String,
    /// Display text of every surviving error, in input order.
    pub shown: Vec<String>,
    /// At least one survivor was redacted.
    pub had_redacted: bool,
    /// Errors dropped by the Skip list.
    pub filtered: usize,
    /// Survivors that escalate to fatal.
    pub fatal_bucket: usize,
    /// Survivors that stay normal.
    pub normal_bucket: usize,
    /// Survivors with their original text, for the fatal log.
    pub log_errors: Vec<BoxError>,
    /// Nothing should be written.
    pub suppressed: bool,
}

impl Routed {
    /// Primary error for the fatal log record.
    ///
    /// Falls back to a synthesized error naming the filtered count when
    /// nothing survived.
    pub fn primary_log_text(&self) -> String {
        match self.log_errors.first() {
            Some(err) => err.to_string(),
            None => format!("{} ({} errors filtered)", self.message, self.filtered),
        }
    }

    /// Auxiliary errors for the fatal log record.
    pub fn auxiliary_log_texts(&self) -> impl Iterator<Item = String> + '_ {
        self.log_errors.iter().skip(1).map(ToString::to_string)
    }
}

/// Classify `errors` against `filters` and merge severity.
///
/// `default_message` replaces an empty `message` in the envelope and also
/// counts as "nothing to say" for suppression.
pub fn route(
    initial: Severity,
    message: String,
    default_message: &str,
    errors: Vec<Option<BoxError>>,
    filters: &FilterSet,
) -> Routed {
    let mut shown = Vec::with_capacity(errors.len());
    let mut log_errors = Vec::with_capacity(errors.len());
    let mut had_redacted = false;
    let mut filtered = 0usize;
    let mut fatal_bucket = 0usize;
    let mut normal_bucket = 0usize;

    for err in errors.into_iter().flatten() {
        let err = filters.apply_convert(err);
        let text = match filters.classify(Some(&*err)) {
            Classification::Skip => {
                debug!(error = %err, "error skipped by filter");
                filtered += 1;
                continue;
            }
            Classification::Redact => {
                had_redacted = true;
                REDACTED_MARKER.to_owned()
            }
            Classification::ConvertSeverity(_) | Classification::Pass => err.to_string(),
        };

        match chain::forced_severity(&*err).unwrap_or(initial) {
            Severity::Fatal => fatal_bucket += 1,
            Severity::Normal => normal_bucket += 1,
        }
        shown.push(text);
        log_errors.push(err);
    }

    let severity = if initial.is_fatal() || fatal_bucket > 0 {
        Severity::Fatal
    } else {
        Severity::Normal
    };

    let nothing_to_say = message.is_empty()
        || message == default_message
        || message == DEFAULT_ERROR_MESSAGE;
    let suppressed = !severity.is_fatal()
        && shown.is_empty()
        && !had_redacted
        && filtered > 0
        && nothing_to_say;

    let message = if message.is_empty() {
        match severity {
            Severity::Fatal if !initial.is_fatal() => DEFAULT_FATAL_MESSAGE.to_owned(),
            _ => default_message.to_owned(),
        }
    } else {
        message
    };

    if suppressed {
        debug!(filtered, "response suppressed: every error was filtered");
    }

    Routed {
        severity,
        message,
        shown,
        had_redacted,
        filtered,
        fatal_bucket,
        normal_bucket,
        log_errors,
        suppressed,
    }
}
