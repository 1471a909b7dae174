//! Convenience macros for formatter arguments and log-safe text.
//!
//! # Usage
//!
//! ```rust
//! use palisade_response::{args, wrap_err};
//! use palisade_response::chain::Sentinel;
//! use palisade_response::format::Arg;
//!
//! let order = 1042;
//! let args = args!["checkout", order, Arg::error(Sentinel::NoRows)];
//! assert_eq!(args.len(), 3);
//!
//! let err = wrap_err!(Sentinel::Hidden, "token for order {}", order);
//! assert_eq!(err.to_string(), "token for order 1042: hidden error");
//! ```
//!
//! ## Sanitization
//!
//! Text that ends up in a log line passes through [`sanitize`]: control
//! characters become `?`, ANSI escape sequences are dropped and the result is
//! bounded to [`MAX_SANITIZED_LEN`] bytes on a character boundary.

/// Maximum byte length of sanitized log text.
pub const MAX_SANITIZED_LEN: usize = 256;

const TRUNCATION_SUFFIX: &str = "...[TRUNCATED]";

/// Neutralize control characters and bound the length of `input`.
///
/// Input that contains nothing printable becomes `"[INVALID_INPUT]"`.
///
/// ```rust
/// # use palisade_response::convenience::sanitize;
/// assert_eq!(sanitize("line\nbreak"), "line?break");
/// assert!(sanitize(&"A".repeat(300)).ends_with("...[TRUNCATED]"));
/// ```
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(MAX_SANITIZED_LEN.min(input.len()));
    let mut truncated = false;
    let mut saw_printable = false;
    let mut in_escape = false;

    for c in input.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        let replacement = if c == '\u{1b}' {
            in_escape = true;
            '?'
        } else if c.is_control() {
            '?'
        } else {
            saw_printable = true;
            c
        };
        if out.len() + replacement.len_utf8() > MAX_SANITIZED_LEN {
            truncated = true;
            break;
        }
        out.push(replacement);
    }

    if !saw_printable {
        return String::from("[INVALID_INPUT]");
    }
    if truncated {
        let mut keep = MAX_SANITIZED_LEN.saturating_sub(TRUNCATION_SUFFIX.len());
        while keep > 0 && !out.is_char_boundary(keep) {
            keep -= 1;
        }
        out.truncate(keep);
        out.push_str(TRUNCATION_SUFFIX);
    }
    out
}

/// Sanitize any `Display` value for a log line.
#[macro_export]
macro_rules! sanitized {
    ($expr:expr) => {
        $crate::convenience::sanitize(&$expr.to_string())
    };
}

/// Build a `Vec<format::Arg>` from heterogeneous values.
///
/// Each element goes through `Arg::from`, so literals, numbers, strings,
/// boxed errors and ready-made `Arg` values can be mixed freely.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::format::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::format::Arg::from($value)),+]
    };
}

/// Wrap an error with formatted context, keeping the original reachable.
#[macro_export]
macro_rules! wrap_err {
    ($err:expr, $ctx:literal) => {
        $crate::chain::wrap($ctx, $err)
    };
    ($err:expr, $fmt:literal, $($arg:expr),+ $(,)?) => {
        $crate::chain::wrap(::std::format!($fmt, $($arg),+), $err)
    };
}
