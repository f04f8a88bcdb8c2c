//! UPnP service definitions.
//!
//! Single source of truth for the service URNs and SOAPAction values used by
//! probing, enrichment and playback. Control URLs are never fixed here: they
//! come from device descriptors, the cache, or the direct probe.

/// UPnP services a media renderer exposes that we talk to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum UpnpService {
    /// Audio/Video transport control (set URI, play, stop, transport info).
    AVTransport,
    /// Connection management (protocol info / supported media).
    ConnectionManager,
    /// Volume and mute control. Only used as an SSDP search target.
    RenderingControl,
}

impl UpnpService {
    /// Returns the UPnP service URN for SOAP requests.
    #[must_use]
    pub fn urn(&self) -> &'static str {
        match self {
            Self::AVTransport => "urn:schemas-upnp-org:service:AVTransport:1",
            Self::ConnectionManager => "urn:schemas-upnp-org:service:ConnectionManager:1",
            Self::RenderingControl => "urn:schemas-upnp-org:service:RenderingControl:1",
        }
    }

    /// Returns the quoted SOAPAction header value for `action`.
    ///
    /// Renderers compare this literally, quotes included.
    #[must_use]
    pub fn soap_action(&self, action: &str) -> String {
        format!("\"{}#{}\"", self.urn(), action)
    }

    /// Substring identifying this service in a descriptor's `serviceType`.
    #[must_use]
    pub fn service_type_marker(&self) -> &'static str {
        match self {
            Self::AVTransport => "service:AVTransport",
            Self::ConnectionManager => "service:ConnectionManager",
            Self::RenderingControl => "service:RenderingControl",
        }
    }
}
