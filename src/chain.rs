//! Error chain primitives used by the filter pipeline.
//!
//! Business errors are plain `Box<dyn Error + Send + Sync>` values. Nothing in
//! this crate asks callers to adopt a custom error type; instead, identity is
//! established by walking the `source()` chain and downcasting each link.
//!
//! # Building Blocks
//!
//! - [`Sentinel`]: well-known marker errors the default filters recognize
//! - [`wrap`]: attach context while keeping the wrapped error reachable
//! - [`force_fatal`] / [`force_normal`]: tag an error with a severity override
//! - [`is`] / [`find`]: chain-aware matching
//!
//! # Example
//!
//! ```rust
//! use palisade_response::chain::{self, Sentinel};
//!
//! let err = chain::wrap("loading profile", Sentinel::NoRows);
//! assert!(chain::is(&*err, &Sentinel::NoRows));
//! assert_eq!(err.to_string(), "loading profile: no rows in result set");
//! ```

use crate::BoxError;
use std::error::Error;
use std::fmt;

// ============================================================================
// Chain Walking
// ============================================================================

/// Iterate over `err` and every error reachable through `source()`.
pub fn iter<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

/// True if any link of the chain is a `T` equal to `target`.
pub fn is<T>(err: &(dyn Error + 'static), target: &T) -> bool
where
    T: Error + PartialEq + 'static,
{
    iter(err).any(|e| e.downcast_ref::<T>() == Some(target))
}

/// First link of the chain that is a `T`, outermost first.
pub fn find<'a, T>(err: &'a (dyn Error + 'static)) -> Option<&'a T>
where
    T: Error + 'static,
{
    iter(err).find_map(|e| e.downcast_ref::<T>())
}

// ============================================================================
// Sentinels
// ============================================================================

/// Marker errors recognized by the default filter set.
///
/// - `NoRows`: a lookup found nothing; data-layer adapters map their own
///   "not found" signal onto this so the response layer can skip it
/// - `Skip`: the caller wants the error gone from the client view
/// - `Hidden`: the caller wants the error shown, but masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    NoRows,
    Skip,
    Hidden,
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoRows => "no rows in result set",
            Self::Skip => "skipped error",
            Self::Hidden => "hidden error",
        })
    }
}

impl Error for Sentinel {}

// ============================================================================
// Wrapping
// ============================================================================

/// Context wrapper: displays as `"{context}: {source}"`.
#[derive(Debug)]
pub struct Wrapped {
    context: String,
    source: BoxError,
}

impl Wrapped {
    #[inline]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[inline]
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl Error for Wrapped {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

/// Attach context to an error.
pub fn wrap(context: impl Into<String>, err: impl Into<BoxError>) -> BoxError {
    Box::new(Wrapped {
        context: context.into(),
        source: err.into(),
    })
}

// ============================================================================
// Severity
// ============================================================================

/// Response severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Normal,
    Fatal,
}

impl Severity {
    #[inline]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Fatal)
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity override attached to an error.
///
/// Transparent for display: the text is the wrapped error's text. The
/// outermost marker in a chain decides.
#[derive(Debug)]
pub struct Forced {
    severity: Severity,
    source: BoxError,
}

impl Forced {
    #[inline]
    pub const fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for Forced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl Error for Forced {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

/// Mark an error so that any response carrying it is fatal.
pub fn force_fatal(err: impl Into<BoxError>) -> BoxError {
    Box::new(Forced {
        severity: Severity::Fatal,
        source: err.into(),
    })
}

/// Mark an error so that it never escalates a response on its own.
pub fn force_normal(err: impl Into<BoxError>) -> BoxError {
    Box::new(Forced {
        severity: Severity::Normal,
        source: err.into(),
    })
}

/// Severity override carried by the chain, if any.
#[inline]
pub fn forced_severity(err: &(dyn Error + 'static)) -> Option<Severity> {
    find::<Forced>(err).map(Forced::severity)
}
