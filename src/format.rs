//! Filter-aware message formatting.
//!
//! Templates use printf-style verbs (`%v`, `%s`, `%d`, `%q`, `%x`, `%f`, `%t`,
//! `%c`, `%T`, plus `%w`) with optional flags, width and precision. Each verb
//! consumes one argument, left to right.
//!
//! # Error Arguments
//!
//! Errors are looked up in the active [`FilterSet`] at format time:
//!
//! | Classification | Output for the slot          |
//! |----------------|------------------------------|
//! | Skip / absent  | nothing (empty substitution) |
//! | Redact         | [`REDACTED_MARKER`]          |
//! | otherwise      | the error's display text     |
//!
//! Convert transforms are **not** applied here: conversion only decides where
//! an error is routed, never what it looks like.
//!
//! # Edge Rules
//!
//! - `%w` is treated as `%v`; chain linkage means nothing in a flat string
//! - verbs without an argument render `%!v(MISSING)` (with the actual verb)
//! - arguments without a verb are ignored
//! - `%%` renders a single `%`
//! - a trailing lone `%` renders `%!(NOVERB)`
//! - a verb that does not fit its argument renders `%!d(string=abc)` style
//!
//! The output is a pure function of (template, arguments, filter set).
//!
//! # Example
//!
//! ```rust
//! use palisade_response::{FilterSet, args, format::format_message};
//! use palisade_response::chain::Sentinel;
//! use palisade_response::format::Arg;
//!
//! let filters = FilterSet::default();
//! let args = args!["first", Arg::error(Sentinel::Skip), "third"];
//! let msg = format_message("problems: %v, %v, %v", &args, &filters);
//! assert_eq!(msg, "problems: first, , third");
//! ```

use crate::BoxError;
use crate::filter::{Classification, FilterSet, REDACTED_MARKER};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Marker written for a verb with no argument left.
pub const MISSING: &str = "MISSING";

// ============================================================================
// Arguments
// ============================================================================

/// One formatter argument.
pub enum Arg {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Char(char),
    /// A business error; `None` stands for an absent error.
    Error(Option<BoxError>),
}

impl Arg {
    /// Wrap anything convertible into a boxed error.
    pub fn error(err: impl Into<BoxError>) -> Self {
        Self::Error(Some(err.into()))
    }

    /// Capture a value through its `Display` implementation.
    pub fn display(value: impl fmt::Display) -> Self {
        Self::Str(value.to_string())
    }

    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float64",
            Self::Bool(_) => "bool",
            Self::Char(_) => "int32",
            Self::Error(_) => "error",
        }
    }

    fn plain(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Uint(u) => u.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Char(c) => c.to_string(),
            // Error text only reaches output after classification.
            Self::Error(_) => REDACTED_MARKER.to_owned(),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(Some(err)) => write!(f, "Error({err})"),
            Self::Error(None) => f.write_str("Error(<nil>)"),
            other => write!(f, "{}({})", other.type_name(), other.plain()),
        }
    }
}

macro_rules! arg_from {
    ($variant:ident: $($ty:ty),+ => $conv:ty) => {
        $(
            impl From<$ty> for Arg {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(<$conv>::from(value))
                }
            }
        )+
    };
}

arg_from!(Int: i8, i16, i32, i64 => i64);
arg_from!(Uint: u8, u16, u32, u64 => u64);
arg_from!(Float: f32, f64 => f64);

impl From<isize> for Arg {
    fn from(value: isize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Self::Uint(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Arg {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<BoxError> for Arg {
    fn from(value: BoxError) -> Self {
        Self::Error(Some(value))
    }
}

impl From<Option<BoxError>> for Arg {
    fn from(value: Option<BoxError>) -> Self {
        Self::Error(value)
    }
}

/// Move every error argument out, in order, leaving the values behind.
pub fn take_errors(args: Vec<Arg>) -> Vec<Option<BoxError>> {
    args.into_iter()
        .filter_map(|arg| match arg {
            Arg::Error(err) => Some(err),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Verb Parsing
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct Directive {
    minus: bool,
    plus: bool,
    sharp: bool,
    space: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
    verb: char,
}

enum Token {
    Percent,
    NoVerb,
    Verb(Directive),
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        let digit = usize::try_from(d).unwrap_or(0);
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
    }
    value
}

/// Parse what follows a `%`.
fn parse_verb(chars: &mut Peekable<Chars<'_>>) -> Token {
    let mut directive = Directive::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => directive.minus = true,
            '+' => directive.plus = true,
            '#' => directive.sharp = true,
            ' ' => directive.space = true,
            '0' => directive.zero = true,
            _ => break,
        }
        chars.next();
    }
    directive.width = parse_number(chars);
    if chars.peek() == Some(&'.') {
        chars.next();
        directive.precision = Some(parse_number(chars).unwrap_or(0));
    }
    match chars.next() {
        None => Token::NoVerb,
        Some('%') if directive.width.is_none() && directive.precision.is_none() => Token::Percent,
        Some('w') => {
            directive.verb = 'v';
            Token::Verb(directive)
        }
        Some(verb) => {
            directive.verb = verb;
            Token::Verb(directive)
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Rebuild a display string from a template and arguments.
pub fn format_message(template: &str, args: &[Arg], filters: &FilterSet) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match parse_verb(&mut chars) {
            Token::Percent => out.push('%'),
            Token::NoVerb => out.push_str("%!(NOVERB)"),
            Token::Verb(directive) => match remaining.next() {
                None => {
                    out.push_str("%!");
                    out.push(directive.verb);
                    out.push('(');
                    out.push_str(MISSING);
                    out.push(')');
                }
                Some(arg) => {
                    if let Some(text) = render(arg, &directive, filters) {
                        out.push_str(&text);
                    }
                }
            },
        }
    }
    out
}

/// Render one argument; `None` means the slot contributes nothing.
fn render(arg: &Arg, directive: &Directive, filters: &FilterSet) -> Option<String> {
    let text = match arg {
        Arg::Error(err) => {
            let err = err.as_deref().map(|e| e as &(dyn std::error::Error + 'static));
            match filters.classify(err) {
                Classification::Skip => return None,
                Classification::Redact => REDACTED_MARKER.to_owned(),
                Classification::ConvertSeverity(_) | Classification::Pass => {
                    let shown = err.map(ToString::to_string).unwrap_or_default();
                    render_text(&shown, directive, arg.type_name())
                }
            }
        }
        Arg::Str(s) => match directive.verb {
            'x' | 'X' => hex_bytes(s.as_bytes(), directive.verb == 'X'),
            _ => render_text(s, directive, arg.type_name()),
        },
        Arg::Int(i) => render_signed(*i, directive, arg),
        Arg::Uint(u) => render_unsigned(*u, directive, arg),
        Arg::Float(v) => render_float(*v, directive, arg),
        Arg::Bool(b) => match directive.verb {
            'v' | 't' => b.to_string(),
            _ => bad_verb(directive.verb, arg.type_name(), &arg.plain()),
        },
        Arg::Char(c) => match directive.verb {
            'v' | 'c' => c.to_string(),
            'q' => format!("{c:?}"),
            'd' => u32::from(*c).to_string(),
            _ => bad_verb(directive.verb, arg.type_name(), &arg.plain()),
        },
    };
    if directive.verb == 'T' {
        return Some(pad(arg.type_name().to_owned(), directive, false));
    }
    let numeric = matches!(arg, Arg::Int(_) | Arg::Uint(_) | Arg::Float(_));
    Some(pad(text, directive, numeric))
}

fn render_text(s: &str, directive: &Directive, type_name: &str) -> String {
    let clipped: String = match directive.precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_owned(),
    };
    match directive.verb {
        'v' | 's' | 'T' => clipped,
        'q' => format!("{clipped:?}"),
        _ => bad_verb(directive.verb, type_name, s),
    }
}

fn render_signed(i: i64, directive: &Directive, arg: &Arg) -> String {
    match directive.verb {
        'v' | 'd' => with_sign(i.to_string(), i >= 0, directive),
        'x' | 'X' => {
            let digits = hex_u64(i.unsigned_abs(), directive.verb == 'X', directive.sharp);
            if i < 0 { format!("-{digits}") } else { with_sign(digits, true, directive) }
        }
        'c' => char_of(u64::try_from(i).unwrap_or(u64::MAX)),
        'q' => format!("{:?}", char_of_raw(u64::try_from(i).unwrap_or(u64::MAX))),
        _ => bad_verb(directive.verb, arg.type_name(), &arg.plain()),
    }
}

fn render_unsigned(u: u64, directive: &Directive, arg: &Arg) -> String {
    match directive.verb {
        'v' | 'd' => with_sign(u.to_string(), true, directive),
        'x' | 'X' => hex_u64(u, directive.verb == 'X', directive.sharp),
        'c' => char_of(u),
        'q' => format!("{:?}", char_of_raw(u)),
        _ => bad_verb(directive.verb, arg.type_name(), &arg.plain()),
    }
}

fn render_float(v: f64, directive: &Directive, arg: &Arg) -> String {
    let body = match directive.verb {
        'v' | 'g' | 'G' => match directive.precision {
            Some(p) => format!("{v:.p$}"),
            None => v.to_string(),
        },
        'f' | 'F' => format!("{v:.*}", directive.precision.unwrap_or(6)),
        'e' | 'E' => exponent(v, directive.precision.unwrap_or(6), directive.verb == 'E'),
        _ => return bad_verb(directive.verb, arg.type_name(), &arg.plain()),
    };
    with_sign(body, v.is_sign_positive(), directive)
}

/// `1.500000e+00` style, two-digit exponent minimum.
fn exponent(v: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{v:.precision$e}");
    let Some((mantissa, exp)) = raw.split_once('e') else {
        return raw;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{mantissa}{e}{sign}{:02}", exp.unsigned_abs())
}

fn with_sign(body: String, non_negative: bool, directive: &Directive) -> String {
    if non_negative && directive.plus {
        format!("+{body}")
    } else if non_negative && directive.space {
        format!(" {body}")
    } else {
        body
    }
}

fn hex_u64(u: u64, upper: bool, sharp: bool) -> String {
    let digits = if upper { format!("{u:X}") } else { format!("{u:x}") };
    if sharp {
        format!("{}{digits}", if upper { "0X" } else { "0x" })
    } else {
        digits
    }
}

fn hex_bytes(bytes: &[u8], upper: bool) -> String {
    bytes
        .iter()
        .map(|b| if upper { format!("{b:02X}") } else { format!("{b:02x}") })
        .collect()
}

fn char_of_raw(u: u64) -> char {
    u32::try_from(u)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn char_of(u: u64) -> String {
    char_of_raw(u).to_string()
}

fn bad_verb(verb: char, type_name: &str, value: &str) -> String {
    format!("%!{verb}({type_name}={value})")
}

fn pad(text: String, directive: &Directive, numeric: bool) -> String {
    let Some(width) = directive.width else {
        return text;
    };
    let len = text.chars().count();
    if len >= width {
        return text;
    }
    let fill = width - len;
    if directive.minus {
        format!("{text}{}", " ".repeat(fill))
    } else if directive.zero && numeric {
        let (sign, digits) = match text.chars().next() {
            Some(c @ ('-' | '+' | ' ')) => (c.to_string(), &text[1..]),
            _ => (String::new(), text.as_str()),
        };
        format!("{sign}{}{digits}", "0".repeat(fill))
    } else {
        format!("{}{text}", " ".repeat(fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::chain::{Sentinel, force_fatal, wrap};

    fn fmt(template: &str, args: &[Arg]) -> String {
        format_message(template, args, &FilterSet::default())
    }

    #[test]
    fn plain_values() {
        assert_eq!(fmt("%s has %d items", &args!["cart", 3]), "cart has 3 items");
        assert_eq!(fmt("%v|%v|%v", &args![true, 2.5, 'x']), "true|2.5|x");
    }

    #[test]
    fn skipped_slot_is_empty() {
        let out = fmt(
            "problems: %v, %v, %v",
            &args!["first", Arg::error(Sentinel::Skip), "third"],
        );
        assert_eq!(out, "problems: first, , third");
    }

    #[test]
    fn absent_error_is_empty() {
        let out = fmt("[%v]", &[Arg::Error(None)]);
        assert_eq!(out, "[]");
    }

    #[test]
    fn redacted_slot_is_marker() {
        let out = fmt("auth: %v", &[Arg::error(wrap("token", Sentinel::Hidden))]);
        assert_eq!(out, "auth: [REDACTED]");
    }

    #[test]
    fn missing_argument_marker() {
        assert_eq!(fmt("%v and %d", &args!["one"]), "one and %!d(MISSING)");
    }

    #[test]
    fn extra_arguments_ignored() {
        assert_eq!(fmt("only %v", &args![1, 2, 3]), "only 1");
    }

    #[test]
    fn wrap_verb_becomes_value() {
        let out = fmt("failed: %w", &[Arg::error("timeout")]);
        assert_eq!(out, "failed: timeout");
    }

    #[test]
    fn literal_percent() {
        assert_eq!(fmt("100%% sure", &[]), "100% sure");
        assert_eq!(fmt("%d%%", &args![50]), "50%");
    }

    #[test]
    fn trailing_percent() {
        assert_eq!(fmt("oops %", &[]), "oops %!(NOVERB)");
    }

    #[test]
    fn convert_does_not_change_text() {
        let filters = FilterSet::default().with_convert(|e| force_fatal(e));
        let out = format_message("x=%v", &[Arg::error("plain")], &filters);
        assert_eq!(out, "x=plain");
    }

    #[test]
    fn width_precision_and_flags() {
        assert_eq!(fmt("[%5d]", &args![42]), "[   42]");
        assert_eq!(fmt("[%-5d]", &args![42]), "[42   ]");
        assert_eq!(fmt("[%05d]", &args![-42]), "[-0042]");
        assert_eq!(fmt("[%+d]", &args![7]), "[+7]");
        assert_eq!(fmt("[%.2f]", &args![3.14159]), "[3.14]");
        assert_eq!(fmt("[%.3s]", &args!["abcdef"]), "[abc]");
        assert_eq!(fmt("[%e]", &args![1500.0]), "[1.500000e+03]");
    }

    #[test]
    fn hex_and_quote() {
        assert_eq!(fmt("%x %X %#x", &args![255, 255, 255]), "ff FF 0xff");
        assert_eq!(fmt("%x", &args![-255]), "-ff");
        assert_eq!(fmt("%x", &args!["hi"]), "6869");
        assert_eq!(fmt("%q", &args!["a\"b"]), "\"a\\\"b\"");
    }

    #[test]
    fn bad_verb_marker() {
        assert_eq!(fmt("%d", &args!["abc"]), "%!d(string=abc)");
        assert_eq!(fmt("%t", &args![1]), "%!t(int=1)");
    }

    #[test]
    fn redacted_error_masked_under_every_verb() {
        for verb in ['v', 's', 'd', 'x', 'X', 'q', 'c', 't', 'f', 'e', 'g'] {
            let template = format!("auth: %{verb}");
            let out = fmt(&template, &[Arg::error(wrap("password=hunter2", Sentinel::Hidden))]);
            assert!(!out.contains("hunter2"), "%{verb} leaked: {out}");
            assert_eq!(out, format!("auth: {REDACTED_MARKER}"));
        }
    }

    #[test]
    fn visible_error_under_numeric_verb() {
        assert_eq!(fmt("%d", &[Arg::error("disk full")]), "%!d(error=disk full)");
    }

    #[test]
    fn type_verb() {
        assert_eq!(fmt("%T %T", &args!["s", 1.0]), "string float64");
    }

    #[test]
    fn take_errors_preserves_order() {
        let args = args!["a", Arg::error("e1"), 3, Arg::Error(None), Arg::error("e2")];
        let errors = take_errors(args);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].as_ref().map(ToString::to_string).as_deref(), Some("e1"));
        assert!(errors[1].is_none());
        assert_eq!(errors[2].as_ref().map(ToString::to_string).as_deref(), Some("e2"));
    }
}
