//! Domain types shared by discovery, enrichment, caching and playback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::vendor::Vendor;

/// What to play and where. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Absolute AVTransport control URL.
    pub control_url: String,
    /// Absolute URL of the media the renderer should fetch.
    pub media_url: String,
}

/// A renderer found through SSDP whose descriptor has been fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedTv {
    /// Host from the descriptor LOCATION.
    pub ip: String,
    /// Port from the descriptor LOCATION (80 when absent).
    pub port: u16,
    pub vendor: Vendor,
    /// Absolute AVTransport control URL, empty if the service is missing.
    pub control_url: String,
    /// Absolute AVTransport SCPD URL, empty if not advertised.
    pub av_transport_scpd_url: String,
    /// Absolute ConnectionManager control URL, empty if not advertised.
    pub conn_mgr_control_url: String,
    pub udn: String,
    /// Descriptor LOCATION this entry was built from.
    pub location: String,
}

/// Human-facing identity from a device descriptor. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub friendly_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub udn: String,
    #[serde(default, rename = "presentation", skip_serializing_if = "String::is_empty")]
    pub presentation_url: String,
}

impl Identity {
    /// True if no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.friendly_name.is_empty()
            && self.manufacturer.is_empty()
            && self.model_name.is_empty()
            && self.model_number.is_empty()
            && self.udn.is_empty()
            && self.presentation_url.is_empty()
    }

    /// `(key, value)` pairs for display, skipping empty fields.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("friendly_name", self.friendly_name.as_str()),
            ("manufacturer", self.manufacturer.as_str()),
            ("model_name", self.model_name.as_str()),
            ("model_number", self.model_number.as_str()),
            ("udn", self.udn.as_str()),
            ("presentation", self.presentation_url.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

/// What a renderer's AVTransport and ConnectionManager can do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Action name → validated flag. Advertised-only actions are `false`.
    pub actions: BTreeMap<String, bool>,
    /// MIME type → DLNA profile strings, in the renderer's order.
    pub media: BTreeMap<String, Vec<String>>,
}

impl Capabilities {
    /// Action names that answered a live call, sorted.
    #[must_use]
    pub fn validated_actions(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|(_, ok)| **ok)
            .map(|(name, _)| name.clone())
            .collect()
    }
}
