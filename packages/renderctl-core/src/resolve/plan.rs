//! Values produced by resolution.

use std::fmt;

use crate::cache::DeviceUpdate;
use crate::upnp::{Capabilities, DetectedTv, Identity, Target, Vendor};

/// Where a playback target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Built from configured ip/port/path.
    Manual,
    /// Picked by cache index.
    CacheIndex,
    /// Found by SSDP discovery.
    Ssdp,
    /// Cached endpoint for the configured IP.
    Cache,
    /// Direct AVTransport probe.
    Probe,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Manual => "Manual",
            Stage::CacheIndex => "CacheIndex",
            Stage::Ssdp => "TrySSDP",
            Stage::Cache => "TryCache",
            Stage::Probe => "TryProbe",
        })
    }
}

/// A resolved playback target and what is known about the renderer behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub target: Target,
    pub vendor: Vendor,
    /// ConnectionManager control URL, empty when unknown.
    pub conn_mgr_url: String,
    pub stage: Stage,
    pub identity: Option<Identity>,
}

/// A discovered renderer after capability and identity enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedDevice {
    pub tv: DetectedTv,
    pub capabilities: Capabilities,
    pub identity: Option<Identity>,
}

impl EnrichedDevice {
    /// True once at least one AVTransport action answered live.
    pub fn is_playable(&self) -> bool {
        !self.tv.control_url.is_empty() && self.capabilities.actions.values().any(|ok| *ok)
    }

    /// Friendly name if known, else the IP.
    pub fn display_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.friendly_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.tv.ip)
    }

    /// The cache observation for this device.
    pub fn to_update(&self) -> DeviceUpdate {
        DeviceUpdate {
            vendor: Some(self.tv.vendor),
            identity: self.identity.clone(),
            control_url: self.tv.control_url.clone(),
            conn_mgr_url: self.tv.conn_mgr_control_url.clone(),
            validated_actions: self.capabilities.validated_actions(),
            media: self.capabilities.media.clone(),
        }
    }
}
