//! Response envelope: the normalized shape every dispatch writes.
//!
//! ```json
//! {
//!   "status": "error",
//!   "title": "Checkout",
//!   "message": "payment declined",
//!   "tags": ["billing"],
//!   "info": {...},
//!   "data": {...},
//!   "meta": {"system": {"app": "shop", "version": "1.4.0", "duration": "1.2ms"}},
//!   "errors": ["card expired"],
//!   "actions": [{"name": "retry", "method": "POST", "href": "/checkout"}]
//! }
//! ```
//!
//! Empty and absent members are omitted on the wire.

use http::StatusCode;
use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Status
// ============================================================================

/// Envelope status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Ok,
    Pending,
    Warning,
    Error,
    Fatal,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Pending => "pending",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// HTTP status used when the call does not override it.
    pub const fn default_code(self) -> StatusCode {
        match self {
            Self::Ok | Self::Warning => StatusCode::OK,
            Self::Pending => StatusCode::ACCEPTED,
            Self::Error => StatusCode::BAD_REQUEST,
            Self::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payload
// ============================================================================

type Producer = dyn Fn() -> Result<Value, serde_json::Error> + Send + Sync;

/// A serializable `info` or `data` member.
///
/// Typed values are kept as-is and only serialized when the envelope is
/// encoded, so a value that cannot be represented surfaces as an encode
/// failure at dispatch time rather than at construction.
#[derive(Clone)]
pub enum Payload {
    /// A ready-made JSON-like value.
    Value(Value),
    /// A typed value serialized on demand.
    Deferred(Arc<Producer>),
    /// Raw bytes, for binary formats.
    Bytes(Vec<u8>),
    /// Plain text.
    Text(String),
}

impl Payload {
    /// Capture a typed value.
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::Deferred(Arc::new(move || serde_json::to_value(&value)))
    }

    /// Resolve into a structured value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Deferred(produce) => produce(),
            Self::Bytes(bytes) => Ok(Value::from(bytes.clone())),
            Self::Text(text) => Ok(Value::from(text.as_str())),
        }
    }

    /// Raw bytes for passthrough formats, if this payload has any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Text(text) => Some(text.as_bytes()),
            Self::Value(Value::String(text)) => Some(text.as_bytes()),
            _ => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Deferred(produce) => produce()
                .map_err(S::Error::custom)?
                .serialize(serializer),
            Self::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Value)
    }
}

// ============================================================================
// Meta
// ============================================================================

/// Process-level metadata attached under `meta.system`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMeta {
    pub app: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub duration: String,
}

/// Envelope metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Meta {
    pub fn is_empty(&self) -> bool {
        self.system.is_none() && self.request_id.is_none() && self.extra.is_empty()
    }
}

// ============================================================================
// Actions
// ============================================================================

/// A follow-up the client may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub method: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        method: impl Into<String>,
        href: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            href: href.into(),
            title: None,
            description: None,
            content_type: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// The normalized response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Envelope {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<Payload>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn empty_members_are_omitted() {
        let env = Envelope::new(Status::Ok);
        assert_eq!(serde_json::to_value(&env).ok(), Some(json!({"status": "ok"})));
    }

    #[test]
    fn full_shape() {
        let mut env = Envelope::new(Status::Error)
            .with_title("Checkout")
            .with_message("payment declined")
            .with_errors(vec!["card expired".into()])
            .with_data(json!({"order": 7}));
        env.meta.system = Some(SystemMeta {
            app: "shop".into(),
            version: "1.4.0".into(),
            ..SystemMeta::default()
        });
        env.meta.extra.insert("region".into(), json!("eu"));
        env.actions.push(Action::new("retry", "POST", "/checkout"));

        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["errors"], json!(["card expired"]));
        assert_eq!(value["meta"]["system"]["app"], "shop");
        assert_eq!(value["meta"]["region"], "eu");
        assert!(value["meta"]["system"].get("build").is_none());
        assert_eq!(value["actions"][0]["href"], "/checkout");
        assert_eq!(value["data"]["order"], 7);
    }

    #[test]
    fn deferred_payload_fails_at_encode() {
        let mut bad = HashMap::new();
        bad.insert(vec![1u8, 2], 3);
        let env = Envelope::new(Status::Ok).with_data(Payload::new(bad));
        let err = serde_json::to_vec(&env).unwrap_err();
        assert!(err.to_string().contains("key must be a string"));
    }

    #[test]
    fn default_codes() {
        assert_eq!(Status::Ok.default_code(), StatusCode::OK);
        assert_eq!(Status::Pending.default_code(), StatusCode::ACCEPTED);
        assert_eq!(Status::Warning.default_code(), StatusCode::OK);
        assert_eq!(Status::Error.default_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Status::Fatal.default_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn deserializes_back() {
        let text = r#"{"status":"warning","message":"slow","errors":["a"],"meta":{"request_id":"r1","k":1}}"#;
        let env: Envelope = serde_json::from_str(text).unwrap();
        assert_eq!(env.status, Status::Warning);
        assert_eq!(env.errors, vec!["a".to_owned()]);
        assert_eq!(env.meta.request_id.as_deref(), Some("r1"));
        assert_eq!(env.meta.extra.get("k"), Some(&json!(1)));
    }
}
