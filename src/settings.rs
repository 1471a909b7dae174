//! Renderer settings.
//!
//! Every type derives Serde traits so settings can be loaded from any
//! self-describing format. Missing fields fall back to their defaults.
//!
//! ```rust
//! use palisade_response::Settings;
//!
//! let settings: Settings = serde_json::from_str(r#"{
//!     "app_name": "shop",
//!     "system_headers": true,
//!     "presets": {"nocache": {"headers": {"Cache-Control": "no-store"}}}
//! }"#).unwrap();
//! assert_eq!(settings.default_format, "application/json");
//! assert!(settings.presets.contains_key("nocache"));
//! ```

use crate::encoding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Application name; also the `X-<AppName>-*` header prefix.
    pub app_name: String,

    /// Content type used when a call does not pick one.
    pub default_format: String,

    /// Emit `X-<AppName>-*` headers and `meta.system`.
    pub system_headers: bool,

    /// Place surviving error texts into the envelope.
    pub show_errors: bool,

    /// Process metadata.
    pub system: SystemSettings,

    /// Named header bundles.
    pub presets: BTreeMap<String, Preset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "app".to_string(),
            default_format: encoding::JSON.to_string(),
            system_headers: false,
            show_errors: true,
            system: SystemSettings::default(),
            presets: BTreeMap::new(),
        }
    }
}

/// Process metadata reported in headers and `meta.system`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemSettings {
    pub version: String,
    pub build: String,
    pub server: String,
    /// Sandbox / demo deployment flag.
    pub play: bool,
}

/// A named bundle of headers, optionally pinning a format and status code.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Preset {
    pub headers: BTreeMap<String, String>,
    pub format: Option<String>,
    pub status: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.app_name, "app");
        assert_eq!(settings.default_format, encoding::JSON);
        assert!(settings.show_errors);
        assert!(!settings.system_headers);
    }

    #[test]
    fn preset_fields() {
        let settings: Settings = serde_json::from_str(
            r#"{"presets": {"legacy": {"format": "application/xml", "status": 203}}}"#,
        )
        .unwrap();
        let preset = &settings.presets["legacy"];
        assert_eq!(preset.format.as_deref(), Some("application/xml"));
        assert_eq!(preset.status, Some(203));
        assert!(preset.headers.is_empty());
    }
}
