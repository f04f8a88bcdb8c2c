//! On-disk cache records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upnp::{Identity, Vendor};

/// One AVTransport control URL of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub control_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub conn_mgr_url: String,
    /// Validated actions only; every value is `true`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub media: BTreeMap<String, Vec<String>>,
    pub seen_at: DateTime<Utc>,
}

impl Endpoint {
    /// An endpoint is playable once at least one action validated live.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.actions.values().any(|ok| *ok)
    }

    /// Validated action names, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter(|(_, ok)| **ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Everything cached about one device IP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// Keyed by control URL.
    #[serde(default)]
    pub endpoints: BTreeMap<String, Endpoint>,
}

impl CachedDevice {
    /// The endpoint used for playback: the lowest control URL among
    /// playable endpoints.
    #[must_use]
    pub fn primary_endpoint(&self) -> Option<&Endpoint> {
        // BTreeMap iterates in ascending key order
        self.endpoints.values().find(|ep| ep.is_playable())
    }
}

/// One observation of a device, merged into the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub vendor: Option<Vendor>,
    pub identity: Option<Identity>,
    pub control_url: String,
    pub conn_mgr_url: String,
    /// Names of actions that validated live.
    pub validated_actions: Vec<String>,
    pub media: BTreeMap<String, Vec<String>>,
}

/// A device chosen from the cache for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDevice {
    pub ip: String,
    pub vendor: Vendor,
    pub control_url: String,
    pub conn_mgr_url: String,
    pub identity: Option<Identity>,
}

/// Summary row of `cache list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRow {
    pub index: usize,
    pub ip: String,
    pub vendor: Option<Vendor>,
    pub friendly_name: Option<String>,
    /// Primary endpoint URLs, None when the device has no playable endpoint.
    pub control_url: Option<String>,
    pub conn_mgr_url: Option<String>,
}
