//! Skip / Redact / Convert filter lists.
//!
//! A [`FilterSet`] decides what happens to each business error before it
//! reaches a response body or a log line:
//!
//! - **Skip**: the error disappears from the client view entirely
//! - **Redact**: the error stays, but its text is replaced by [`REDACTED_MARKER`]
//! - **Convert**: the error is rewritten, typically to attach a severity
//!   override with [`chain::force_fatal`] or [`chain::force_normal`]
//!
//! # Ordering
//!
//! Lists are evaluated in registration order. The first matching Skip or Redact
//! predicate wins; every Convert transform runs, each seeing the previous
//! output. Skip always beats Redact.
//!
//! # Immutability
//!
//! Every mutator consumes `self` and returns a new set. Predicates are shared
//! behind `Arc`, but the lists themselves are never shared between two sets,
//! so a base set can be specialized per request without any locking.
//!
//! # Example
//!
//! ```rust
//! use palisade_response::{FilterSet, chain::{self, Sentinel}};
//!
//! let filters = FilterSet::default()
//!     .with_redact(|err| err.to_string().contains("password"));
//!
//! assert!(filters.is_skipped(Some(&*chain::wrap("lookup", Sentinel::NoRows))));
//! assert!(filters.is_redacted(&*Box::<dyn std::error::Error + Send + Sync>::from("bad password")));
//! ```

use crate::BoxError;
use crate::chain::{self, Sentinel, Severity};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Text shown in place of a redacted error.
pub const REDACTED_MARKER: &str = "[REDACTED]";

/// Predicate over a borrowed error chain.
pub type Predicate = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Owned rewrite of an error.
pub type Transform = Arc<dyn Fn(BoxError) -> BoxError + Send + Sync>;

/// Per-error outcome of evaluating a filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Excluded from the response and the client message.
    Skip,
    /// Included with masked text.
    Redact,
    /// Included as-is, but carries a severity override.
    ConvertSeverity(Severity),
    /// Included as-is.
    Pass,
}

impl Classification {
    #[inline]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Skip)
    }
}

/// Ordered Skip, Redact and Convert lists.
#[derive(Clone)]
pub struct FilterSet {
    skip: Vec<Predicate>,
    redact: Vec<Predicate>,
    convert: Vec<Transform>,
}

impl FilterSet {
    /// A set with no filters at all.
    pub fn empty() -> Self {
        Self {
            skip: Vec::new(),
            redact: Vec::new(),
            convert: Vec::new(),
        }
    }

    /// A set seeded with the given lists.
    ///
    /// Use this to replace the defaults wholesale; [`FilterSet::default`] is
    /// `FilterSet::new(default_skip(), default_redact(), Vec::new())`.
    pub fn new(skip: Vec<Predicate>, redact: Vec<Predicate>, convert: Vec<Transform>) -> Self {
        Self {
            skip,
            redact,
            convert,
        }
    }

    /// Append a Skip predicate.
    pub fn with_skip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.skip.push(Arc::new(predicate));
        self
    }

    /// Append a Redact predicate.
    pub fn with_redact<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.redact.push(Arc::new(predicate));
        self
    }

    /// Append a Convert transform.
    pub fn with_convert<F>(mut self, transform: F) -> Self
    where
        F: Fn(BoxError) -> BoxError + Send + Sync + 'static,
    {
        self.convert.push(Arc::new(transform));
        self
    }

    /// Skip any error whose chain contains `target`.
    pub fn skip_matching<T>(self, target: T) -> Self
    where
        T: Error + PartialEq + Send + Sync + 'static,
    {
        self.with_skip(move |err| chain::is(err, &target))
    }

    /// Redact any error whose chain contains `target`.
    pub fn redact_matching<T>(self, target: T) -> Self
    where
        T: Error + PartialEq + Send + Sync + 'static,
    {
        self.with_redact(move |err| chain::is(err, &target))
    }

    /// Drop every Skip predicate.
    pub fn clear_skip(mut self) -> Self {
        self.skip.clear();
        self
    }

    /// Drop every Redact predicate.
    pub fn clear_redact(mut self) -> Self {
        self.redact.clear();
        self
    }

    /// Drop every Convert transform.
    pub fn clear_convert(mut self) -> Self {
        self.convert.clear();
        self
    }

    /// True if `err` is absent or matches a Skip predicate.
    pub fn is_skipped(&self, err: Option<&(dyn Error + 'static)>) -> bool {
        match err {
            None => true,
            Some(err) => self.skip.iter().any(|p| p(err)),
        }
    }

    /// True if `err` matches a Redact predicate.
    ///
    /// This does not consult the Skip list; use [`FilterSet::classify`] when
    /// precedence matters.
    pub fn is_redacted(&self, err: &(dyn Error + 'static)) -> bool {
        self.redact.iter().any(|p| p(err))
    }

    /// Run every Convert transform in order.
    pub fn apply_convert(&self, err: BoxError) -> BoxError {
        self.convert.iter().fold(err, |err, transform| transform(err))
    }

    /// Classify an already-converted error.
    pub fn classify(&self, err: Option<&(dyn Error + 'static)>) -> Classification {
        let Some(err) = err else {
            return Classification::Skip;
        };
        if self.is_skipped(Some(err)) {
            Classification::Skip
        } else if self.is_redacted(err) {
            Classification::Redact
        } else if let Some(severity) = chain::forced_severity(err) {
            Classification::ConvertSeverity(severity)
        } else {
            Classification::Pass
        }
    }

    /// Text a visible error contributes to client-facing output.
    ///
    /// `None` for skipped errors.
    pub fn display_text(&self, err: Option<&(dyn Error + 'static)>) -> Option<String> {
        match self.classify(err) {
            Classification::Skip => None,
            Classification::Redact => Some(REDACTED_MARKER.to_owned()),
            Classification::ConvertSeverity(_) | Classification::Pass => {
                err.map(ToString::to_string)
            }
        }
    }

    #[inline]
    pub fn skip_len(&self) -> usize {
        self.skip.len()
    }

    #[inline]
    pub fn redact_len(&self) -> usize {
        self.redact.len()
    }

    #[inline]
    pub fn convert_len(&self) -> usize {
        self.convert.len()
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::new(default_skip(), default_redact(), Vec::new())
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSet")
            .field("skip", &self.skip.len())
            .field("redact", &self.redact.len())
            .field("convert", &self.convert.len())
            .finish()
    }
}

/// Default Skip list: [`Sentinel::NoRows`] and [`Sentinel::Skip`].
pub fn default_skip() -> Vec<Predicate> {
    vec![sentinel(Sentinel::NoRows), sentinel(Sentinel::Skip)]
}

/// Default Redact list: [`Sentinel::Hidden`].
pub fn default_redact() -> Vec<Predicate> {
    vec![sentinel(Sentinel::Hidden)]
}

/// Chain-aware predicate for one sentinel.
pub fn sentinel(target: Sentinel) -> Predicate {
    Arc::new(move |err: &(dyn Error + 'static)| chain::is(err, &target))
}
