//! Format encoders and the content-type registry.
//!
//! Each [`Encoder`] can:
//!
//! - marshal a whole envelope or a single stream chunk
//! - produce an infallible minimal envelope for the encode-failure path
//! - unmarshal a request body into one of the closed [`Target`] shapes
//!
//! [`EncoderRegistry::default`] registers JSON, XML, MessagePack, plain text,
//! URL-encoded forms, server-sent events, octet-stream and common image
//! types (raw byte passthrough).

use crate::BoxError;
use crate::envelope::{Envelope, Payload, Status};
use crate::error::EncodeError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

pub const JSON: &str = "application/json";
pub const XML: &str = "application/xml";
pub const MSGPACK: &str = "application/msgpack";
pub const TEXT: &str = "text/plain";
pub const FORM: &str = "application/x-www-form-urlencoded";
pub const EVENT_STREAM: &str = "text/event-stream";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// `error` member of every fallback envelope.
pub const FALLBACK_ERROR: &str = "encode failed";

const IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Strip parameters and lowercase a content type.
///
/// ```rust
/// # use palisade_response::encoding::normalize_content_type;
/// assert_eq!(normalize_content_type("Application/JSON; charset=utf-8"), "application/json");
/// ```
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

// ============================================================================
// Documents and Targets
// ============================================================================

/// What is being marshaled.
#[derive(Debug, Clone, Copy)]
pub enum Document<'a> {
    Envelope(&'a Envelope),
    Chunk(&'a Payload),
}

/// Shapes a body can be decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Text,
    Bytes,
    Map,
    Value,
}

impl Target {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Map => "string map",
            Self::Value => "structured value",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Text(String),
    Bytes(Vec<u8>),
    Map(BTreeMap<String, String>),
    Value(Value),
}

// ============================================================================
// Encoder Contract
// ============================================================================

/// One wire format.
pub trait Encoder: Send + Sync {
    fn content_type(&self) -> &'static str;

    /// Append the encoded document to `out`.
    ///
    /// On error `out` may hold partial output; callers discard it.
    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError>;

    /// Minimal envelope carrying only status and message. Never fails.
    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8>;

    /// Decode `body` into `target`.
    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError>;

    /// Whether `unmarshal` accepts `target`.
    fn supports(&self, target: Target) -> bool {
        let _ = target;
        true
    }
}

fn utf8(content_type: &'static str, body: &[u8]) -> Result<String, EncodeError> {
    String::from_utf8(body.to_vec()).map_err(|e| EncodeError::backend(content_type, e))
}

/// Text, Bytes, or `None` for the structured targets.
fn decode_raw(content_type: &'static str, body: &[u8], target: Target) -> Option<Result<Decoded, EncodeError>> {
    match target {
        Target::Text => Some(utf8(content_type, body).map(Decoded::Text)),
        Target::Bytes => Some(Ok(Decoded::Bytes(body.to_vec()))),
        Target::Map | Target::Value => None,
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_map(content_type: &'static str, value: Value) -> Result<Decoded, EncodeError> {
    match value {
        Value::Object(map) => Ok(Decoded::Map(
            map.into_iter().map(|(k, v)| (k, stringify(v))).collect(),
        )),
        _ => Err(EncodeError::unsupported(content_type, "a non-object body as a map")),
    }
}

fn serialize_doc<S, E>(doc: &Document<'_>, serialize: S) -> Result<(), E>
where
    S: FnOnce(&dyn ErasedDoc) -> Result<(), E>,
{
    match doc {
        Document::Envelope(env) => serialize(*env),
        Document::Chunk(payload) => serialize(*payload),
    }
}

/// Minimal envelope written when the full one cannot be encoded.
#[derive(Serialize)]
struct Fallback<'a> {
    status: Status,
    error: &'static str,
    message: &'a str,
}

impl<'a> Fallback<'a> {
    const fn new(status: Status, message: &'a str) -> Self {
        Self {
            status,
            error: FALLBACK_ERROR,
            message,
        }
    }
}

/// Object-safe bridge so one closure can serialize either document kind.
trait ErasedDoc {
    fn to_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()>;
    fn to_msgpack(&self, out: &mut Vec<u8>) -> Result<(), rmp_serde::encode::Error>;
    fn to_xml(&self, root: &str) -> Result<String, BoxError>;
}

impl<T: Serialize> ErasedDoc for T {
    fn to_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        serde_json::to_writer(out, self)
    }

    fn to_msgpack(&self, out: &mut Vec<u8>) -> Result<(), rmp_serde::encode::Error> {
        rmp_serde::encode::write_named(out, self)
    }

    fn to_xml(&self, root: &str) -> Result<String, BoxError> {
        quick_xml::se::to_string_with_root(root, self).map_err(Into::into)
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn content_type(&self) -> &'static str {
        JSON
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        serialize_doc(doc, |d| d.to_json(out)).map_err(|e| EncodeError::backend(JSON, e))
    }

    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8> {
        serde_json::to_vec(&Fallback::new(status, message)).unwrap_or_default()
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        if let Some(raw) = decode_raw(JSON, body, target) {
            return raw;
        }
        let value: Value = serde_json::from_slice(body).map_err(|e| EncodeError::backend(JSON, e))?;
        match target {
            Target::Map => value_to_map(JSON, value),
            _ => Ok(Decoded::Value(value)),
        }
    }
}

// ============================================================================
// XML
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlEncoder;

impl Encoder for XmlEncoder {
    fn content_type(&self) -> &'static str {
        XML
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let root = match doc {
            Document::Envelope(_) => "response",
            Document::Chunk(_) => "chunk",
        };
        let mut rendered = String::new();
        serialize_doc(doc, |d| {
            rendered = d.to_xml(root)?;
            Ok(())
        })
        .map_err(|e: BoxError| EncodeError::backend(XML, e))?;
        out.extend_from_slice(rendered.as_bytes());
        Ok(())
    }

    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8> {
        format!(
            "<response><status>{}</status><error>{FALLBACK_ERROR}</error><message>{}</message></response>",
            status.as_str(),
            quick_xml::escape::escape(message)
        )
        .into_bytes()
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        if let Some(raw) = decode_raw(XML, body, target) {
            return raw;
        }
        let text = utf8(XML, body)?;
        match target {
            Target::Map => quick_xml::de::from_str::<BTreeMap<String, String>>(&text)
                .map(Decoded::Map)
                .map_err(|e| EncodeError::backend(XML, e)),
            _ => Err(EncodeError::unsupported(XML, "a structured value target")),
        }
    }

    fn supports(&self, target: Target) -> bool {
        target != Target::Value
    }
}

// ============================================================================
// MessagePack
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackEncoder;

impl Encoder for MsgPackEncoder {
    fn content_type(&self) -> &'static str {
        MSGPACK
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        serialize_doc(doc, |d| d.to_msgpack(out)).map_err(|e| EncodeError::backend(MSGPACK, e))
    }

    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8> {
        rmp_serde::to_vec_named(&Fallback::new(status, message)).unwrap_or_default()
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        match target {
            Target::Bytes => Ok(Decoded::Bytes(body.to_vec())),
            Target::Text => rmp_serde::from_slice::<String>(body)
                .map(Decoded::Text)
                .map_err(|e| EncodeError::backend(MSGPACK, e)),
            Target::Map | Target::Value => {
                let value: Value =
                    rmp_serde::from_slice(body).map_err(|e| EncodeError::backend(MSGPACK, e))?;
                if target == Target::Map {
                    value_to_map(MSGPACK, value)
                } else {
                    Ok(Decoded::Value(value))
                }
            }
        }
    }
}

// ============================================================================
// Plain Text
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoder;

impl TextEncoder {
    fn payload_text(payload: &Payload) -> Result<String, EncodeError> {
        match payload {
            Payload::Text(text) => Ok(text.clone()),
            Payload::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            other => other
                .to_value()
                .map(stringify)
                .map_err(|e| EncodeError::backend(TEXT, e)),
        }
    }
}

impl Encoder for TextEncoder {
    fn content_type(&self) -> &'static str {
        TEXT
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let text = match doc {
            Document::Chunk(payload) => Self::payload_text(payload)?,
            Document::Envelope(env) => {
                let mut lines = Vec::with_capacity(env.errors.len() + 2);
                lines.push(if env.message.is_empty() {
                    env.status.as_str().to_owned()
                } else {
                    env.message.clone()
                });
                if let Some(data) = &env.data {
                    lines.push(Self::payload_text(data)?);
                }
                lines.extend(env.errors.iter().map(|err| format!("- {err}")));
                lines.join("\n")
            }
        };
        out.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8> {
        format!("{status}: {message}\n- {FALLBACK_ERROR}").into_bytes()
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        decode_raw(TEXT, body, target)
            .unwrap_or_else(|| Err(EncodeError::unsupported(TEXT, "a structured target")))
    }

    fn supports(&self, target: Target) -> bool {
        matches!(target, Target::Text | Target::Bytes)
    }
}

// ============================================================================
// URL-encoded Form
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct FormEncoder;

impl FormEncoder {
    fn flatten(prefix: &str, payload: &Payload, pairs: &mut Vec<(String, String)>) -> Result<(), EncodeError> {
        let value = payload.to_value().map_err(|e| EncodeError::backend(FORM, e))?;
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    if value.is_object() || value.is_array() {
                        return Err(EncodeError::unsupported(FORM, "nested data"));
                    }
                    pairs.push((format!("{prefix}.{key}"), stringify(value)));
                }
            }
            Value::Array(_) => return Err(EncodeError::unsupported(FORM, "list data")),
            scalar => pairs.push((prefix.to_owned(), stringify(scalar))),
        }
        Ok(())
    }
}

impl Encoder for FormEncoder {
    fn content_type(&self) -> &'static str {
        FORM
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        match doc {
            Document::Chunk(payload) => Self::flatten("data", payload, &mut pairs)?,
            Document::Envelope(env) => {
                pairs.push(("status".into(), env.status.as_str().into()));
                if let Some(title) = &env.title {
                    pairs.push(("title".into(), title.clone()));
                }
                if !env.message.is_empty() {
                    pairs.push(("message".into(), env.message.clone()));
                }
                pairs.extend(env.tags.iter().map(|t| ("tags".to_owned(), t.clone())));
                if let Some(data) = &env.data {
                    Self::flatten("data", data, &mut pairs)?;
                }
                pairs.extend(env.errors.iter().map(|e| ("errors".to_owned(), e.clone())));
            }
        }
        let encoded = serde_urlencoded::to_string(&pairs).map_err(|e| EncodeError::backend(FORM, e))?;
        out.extend_from_slice(encoded.as_bytes());
        Ok(())
    }

    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8> {
        serde_urlencoded::to_string([
            ("status", status.as_str()),
            ("error", FALLBACK_ERROR),
            ("message", message),
        ])
            .unwrap_or_default()
            .into_bytes()
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        if let Some(raw) = decode_raw(FORM, body, target) {
            return raw;
        }
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_bytes(body).map_err(|e| EncodeError::backend(FORM, e))?;
        let map: BTreeMap<String, String> = pairs.into_iter().collect();
        Ok(match target {
            Target::Map => Decoded::Map(map),
            _ => Decoded::Value(Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
            )),
        })
    }
}

// ============================================================================
// Server-Sent Events
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SseEncoder;

impl Encoder for SseEncoder {
    fn content_type(&self) -> &'static str {
        EVENT_STREAM
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let mut json = Vec::new();
        serialize_doc(doc, |d| d.to_json(&mut json)).map_err(|e| EncodeError::backend(EVENT_STREAM, e))?;
        if let Document::Envelope(env) = doc {
            out.extend_from_slice(b"event: ");
            out.extend_from_slice(env.status.as_str().as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(b"data: ");
        out.extend_from_slice(&json);
        out.extend_from_slice(b"\n\n");
        Ok(())
    }

    fn marshal_fallback(&self, status: Status, message: &str) -> Vec<u8> {
        let json = JsonEncoder.marshal_fallback(status, message);
        let mut out = format!("event: {status}\ndata: ").into_bytes();
        out.extend_from_slice(&json);
        out.extend_from_slice(b"\n\n");
        out
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        if let Some(raw) = decode_raw(EVENT_STREAM, body, target) {
            return raw;
        }
        let text = utf8(EVENT_STREAM, body)?;
        let data = text
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join("\n");
        let value: Value =
            serde_json::from_str(&data).map_err(|e| EncodeError::backend(EVENT_STREAM, e))?;
        match target {
            Target::Map => value_to_map(EVENT_STREAM, value),
            _ => Ok(Decoded::Value(value)),
        }
    }
}

// ============================================================================
// Binary Passthrough
// ============================================================================

/// Writes byte payloads unchanged under a fixed content type.
#[derive(Debug, Clone, Copy)]
pub struct BinaryEncoder {
    content_type: &'static str,
}

impl BinaryEncoder {
    pub const fn new(content_type: &'static str) -> Self {
        Self { content_type }
    }
}

impl Encoder for BinaryEncoder {
    fn content_type(&self) -> &'static str {
        self.content_type
    }

    fn marshal(&self, doc: &Document<'_>, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let payload = match doc {
            Document::Chunk(payload) => Some(*payload),
            Document::Envelope(env) => env.data.as_ref(),
        };
        let bytes = payload
            .and_then(Payload::as_bytes)
            .ok_or(EncodeError::unsupported(self.content_type, "non-binary data"))?;
        out.extend_from_slice(bytes);
        Ok(())
    }

    fn marshal_fallback(&self, _status: Status, message: &str) -> Vec<u8> {
        format!("{FALLBACK_ERROR}: {message}").into_bytes()
    }

    fn unmarshal(&self, body: &[u8], target: Target) -> Result<Decoded, EncodeError> {
        decode_raw(self.content_type, body, target)
            .unwrap_or_else(|| Err(EncodeError::unsupported(self.content_type, "a structured target")))
    }

    fn supports(&self, target: Target) -> bool {
        matches!(target, Target::Text | Target::Bytes)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Encoders keyed by normalized content type.
#[derive(Clone)]
pub struct EncoderRegistry {
    encoders: HashMap<String, Arc<dyn Encoder>>,
}

impl EncoderRegistry {
    pub fn empty() -> Self {
        Self {
            encoders: HashMap::new(),
        }
    }

    /// Register `encoder` under its own content type.
    pub fn with_encoder(self, encoder: Arc<dyn Encoder>) -> Self {
        let content_type = encoder.content_type();
        self.with_encoder_for(content_type, encoder)
    }

    /// Register `encoder` under an explicit content type.
    pub fn with_encoder_for(mut self, content_type: &str, encoder: Arc<dyn Encoder>) -> Self {
        self.encoders.insert(normalize_content_type(content_type), encoder);
        self
    }

    pub fn get(&self, content_type: &str) -> Option<&Arc<dyn Encoder>> {
        self.encoders.get(&normalize_content_type(content_type))
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.get(content_type).is_some()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        let registry = Self::empty()
            .with_encoder(Arc::new(JsonEncoder))
            .with_encoder(Arc::new(XmlEncoder))
            .with_encoder_for("text/xml", Arc::new(XmlEncoder))
            .with_encoder(Arc::new(MsgPackEncoder))
            .with_encoder_for("application/x-msgpack", Arc::new(MsgPackEncoder))
            .with_encoder(Arc::new(TextEncoder))
            .with_encoder(Arc::new(FormEncoder))
            .with_encoder(Arc::new(SseEncoder))
            .with_encoder(Arc::new(BinaryEncoder::new(OCTET_STREAM)));
        IMAGE_TYPES.iter().fold(registry, |registry, ct| {
            registry.with_encoder(Arc::new(BinaryEncoder::new(*ct)))
        })
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.encoders.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("EncoderRegistry").field("content_types", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn encode(encoder: &dyn Encoder, env: &Envelope) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        encoder.marshal(&Document::Envelope(env), &mut out)?;
        Ok(out)
    }

    fn sample() -> Envelope {
        Envelope::new(Status::Error)
            .with_message("Validation failed")
            .with_errors(vec!["bad input".into()])
    }

    #[test]
    fn registry_defaults() {
        let registry = EncoderRegistry::default();
        for ct in [JSON, XML, MSGPACK, TEXT, FORM, EVENT_STREAM, OCTET_STREAM, "image/png"] {
            assert!(registry.contains(ct), "missing {ct}");
        }
        assert!(registry.contains("application/json; charset=utf-8"));
        assert!(!registry.contains("application/yaml"));
    }

    #[test]
    fn registry_copies_are_independent() {
        let base = EncoderRegistry::empty();
        let extended = base.clone().with_encoder(Arc::new(JsonEncoder));
        assert!(base.is_empty());
        assert_eq!(extended.len(), 1);
    }

    #[test]
    fn json_envelope() {
        let bytes = encode(&JsonEncoder, &sample()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "Validation failed", "errors": ["bad input"]}));
    }

    #[test]
    fn json_rejects_non_string_keys() {
        let mut data = HashMap::new();
        data.insert(vec![1u8], 1);
        let env = Envelope::new(Status::Ok).with_data(Payload::new(data));
        let err = encode(&JsonEncoder, &env).unwrap_err();
        assert!(err.to_string().starts_with("application/json: "));
    }

    #[test]
    fn fallbacks_are_well_formed() {
        let json: Value = serde_json::from_slice(&JsonEncoder.marshal_fallback(Status::Fatal, "a \"quote\"")).unwrap();
        assert_eq!(json["status"], "fatal");
        assert_eq!(json["error"], FALLBACK_ERROR);
        assert_eq!(json["message"], "a \"quote\"");

        let xml = String::from_utf8(XmlEncoder.marshal_fallback(Status::Error, "<b>&")).unwrap();
        assert_eq!(
            xml,
            "<response><status>error</status><error>encode failed</error><message>&lt;b&gt;&amp;</message></response>"
        );

        let packed = MsgPackEncoder.marshal_fallback(Status::Fatal, "down");
        let value: Value = rmp_serde::from_slice(&packed).unwrap();
        assert_eq!(value["status"], "fatal");
        assert_eq!(value["error"], FALLBACK_ERROR);
        assert_eq!(value["message"], "down");

        assert_eq!(
            TextEncoder.marshal_fallback(Status::Error, "x"),
            b"error: x\n- encode failed".to_vec()
        );
        assert_eq!(
            FormEncoder.marshal_fallback(Status::Error, "a b"),
            b"status=error&error=encode+failed&message=a+b".to_vec()
        );
        assert_eq!(
            BinaryEncoder::new(OCTET_STREAM).marshal_fallback(Status::Error, "x"),
            b"encode failed: x".to_vec()
        );

        let sse = String::from_utf8(SseEncoder.marshal_fallback(Status::Error, "x")).unwrap();
        assert!(sse.contains(r#""error":"encode failed""#));
    }

    #[test]
    fn xml_envelope_has_root() {
        let text = String::from_utf8(encode(&XmlEncoder, &sample()).unwrap()).unwrap();
        assert!(text.starts_with("<response>"));
        assert!(text.contains("<status>error</status>"));
        assert!(text.contains("<errors>bad input</errors>"));
    }

    #[test]
    fn msgpack_round_trip() {
        let bytes = encode(&MsgPackEncoder, &sample()).unwrap();
        let env: Envelope = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(env.status, Status::Error);
        assert_eq!(env.message, "Validation failed");
        assert_eq!(env.errors, vec!["bad input".to_owned()]);
    }

    #[test]
    fn text_lists_errors() {
        let text = encode(&TextEncoder, &sample()).unwrap();
        assert_eq!(text, b"Validation failed\n- bad input".to_vec());
    }

    #[test]
    fn form_flattens_data() {
        let env = Envelope::new(Status::Ok).with_data(json!({"id": 3, "name": "x"}));
        let text = String::from_utf8(encode(&FormEncoder, &env).unwrap()).unwrap();
        assert_eq!(text, "status=ok&data.id=3&data.name=x");
    }

    #[test]
    fn form_rejects_nested_data() {
        let env = Envelope::new(Status::Ok).with_data(json!({"a": {"b": 1}}));
        let err = encode(&FormEncoder, &env).unwrap_err();
        assert_eq!(err.to_string(), "application/x-www-form-urlencoded: cannot represent nested data");
    }

    #[test]
    fn sse_frames() {
        let env = Envelope::new(Status::Pending).with_message("queued");
        let text = String::from_utf8(encode(&SseEncoder, &env).unwrap()).unwrap();
        assert_eq!(text, "event: pending\ndata: {\"status\":\"pending\",\"message\":\"queued\"}\n\n");

        let chunk = Payload::from(json!({"n": 1}));
        let mut out = Vec::new();
        SseEncoder.marshal(&Document::Chunk(&chunk), &mut out).unwrap();
        assert_eq!(out, b"data: {\"n\":1}\n\n".to_vec());
    }

    #[test]
    fn binary_passthrough() {
        let png = BinaryEncoder::new("image/png");
        let env = Envelope::new(Status::Ok).with_data(vec![0x89u8, b'P', b'N', b'G']);
        assert_eq!(encode(&png, &env).unwrap(), vec![0x89, b'P', b'N', b'G']);

        let structured = Envelope::new(Status::Ok).with_data(json!({"a": 1}));
        assert!(encode(&png, &structured).is_err());
    }

    #[test]
    fn unmarshal_targets() {
        let body = br#"{"name":"ada","age":36}"#;
        let map = JsonEncoder.unmarshal(body, Target::Map).unwrap();
        let Decoded::Map(map) = map else { panic!("expected map") };
        assert_eq!(map.get("age").map(String::as_str), Some("36"));

        let form = FormEncoder.unmarshal(b"a=1&b=two", Target::Value).unwrap();
        assert_eq!(form, Decoded::Value(json!({"a": "1", "b": "two"})));

        assert!(!TextEncoder.supports(Target::Map));
        assert_eq!(
            TextEncoder.unmarshal(b"hi", Target::Text).unwrap(),
            Decoded::Text("hi".into())
        );
    }

    #[test]
    fn sse_unmarshal_joins_data_lines() {
        let body = b"event: ok\ndata: {\"a\":\ndata: 1}\n\n";
        let decoded = SseEncoder.unmarshal(body, Target::Value).unwrap();
        assert_eq!(decoded, Decoded::Value(json!({"a": 1})));
    }
}
