//! Request body decoding.
//!
//! The parser picks an encoder by content type (parameters such as
//! `; charset=utf-8` are ignored) and decodes into one of the closed
//! [`Target`] shapes.
//!
//! ```rust
//! use palisade_response::body::BodyParser;
//! use palisade_response::encoding::{Decoded, Target};
//!
//! let parser = BodyParser::default();
//! let decoded = parser
//!     .parse("application/x-www-form-urlencoded; charset=utf-8", Some(b"q=rust"), Target::Map)
//!     .unwrap();
//! let Decoded::Map(map) = decoded else { unreachable!() };
//! assert_eq!(map["q"], "rust");
//! ```

use crate::encoding::{EncoderRegistry, normalize_content_type};
use crate::error::ParseError;
use http::header::CONTENT_TYPE;

pub use crate::encoding::{Decoded, Target};

/// Content-type driven body decoder.
#[derive(Debug, Clone, Default)]
pub struct BodyParser {
    registry: EncoderRegistry,
}

impl BodyParser {
    pub fn new(registry: EncoderRegistry) -> Self {
        Self { registry }
    }

    /// Decode `body` as `content_type` into `target`.
    pub fn parse(
        &self,
        content_type: &str,
        body: Option<&[u8]>,
        target: Target,
    ) -> Result<Decoded, ParseError> {
        let body = body.filter(|b| !b.is_empty()).ok_or(ParseError::EmptyBody)?;
        let normalized = normalize_content_type(content_type);
        let encoder = self
            .registry
            .get(&normalized)
            .ok_or_else(|| ParseError::UnsupportedContentType(normalized.clone()))?;
        if !encoder.supports(target) {
            return Err(ParseError::InvalidTarget {
                content_type: normalized,
                target: target.as_str(),
            });
        }
        encoder.unmarshal(body, target).map_err(ParseError::Decode)
    }

    /// Decode an `http::Request` body using its `Content-Type` header.
    ///
    /// A missing header is treated as `application/octet-stream`.
    pub fn parse_request<B>(&self, request: &http::Request<B>, target: Target) -> Result<Decoded, ParseError>
    where
        B: AsRef<[u8]>,
    {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(crate::encoding::OCTET_STREAM);
        self.parse(content_type, Some(request.body().as_ref()), target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_charset() {
        let parser = BodyParser::default();
        let decoded = parser
            .parse("application/json;charset=UTF-8", Some(br#"{"a":1}"#), Target::Value)
            .unwrap();
        assert_eq!(decoded, Decoded::Value(json!({"a": 1})));
    }

    #[test]
    fn absent_and_empty_bodies() {
        let parser = BodyParser::default();
        assert!(matches!(
            parser.parse("application/json", None, Target::Value),
            Err(ParseError::EmptyBody)
        ));
        assert!(matches!(
            parser.parse("application/json", Some(b""), Target::Value),
            Err(ParseError::EmptyBody)
        ));
    }

    #[test]
    fn unsupported_content_type() {
        let err = BodyParser::default()
            .parse("application/yaml", Some(b"a: 1"), Target::Value)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse failed: unsupported content type 'application/yaml'"
        );
    }

    #[test]
    fn invalid_target() {
        let err = BodyParser::default()
            .parse("text/plain", Some(b"hello"), Target::Map)
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidTarget { target: "string map", .. }));
    }

    #[test]
    fn decode_failure_is_wrapped() {
        let err = BodyParser::default()
            .parse("application/json", Some(b"{nope"), Target::Value)
            .unwrap_err();
        assert!(err.to_string().starts_with("parse failed: application/json: "));
    }

    #[test]
    fn from_http_request() {
        let request = http::Request::builder()
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(b"name=ada&lang=rust".to_vec())
            .unwrap();
        let decoded = BodyParser::default().parse_request(&request, Target::Map).unwrap();
        let Decoded::Map(map) = decoded else { panic!("expected map") };
        assert_eq!(map.get("lang").map(String::as_str), Some("rust"));
    }

    #[test]
    fn request_without_content_type_is_bytes() {
        let request = http::Request::new(vec![1u8, 2, 3]);
        let decoded = BodyParser::default().parse_request(&request, Target::Bytes).unwrap();
        assert_eq!(decoded, Decoded::Bytes(vec![1, 2, 3]));
    }
}
