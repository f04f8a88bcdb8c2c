//! Shared types for renderer discovery.

use std::fmt;

use thiserror::Error;

use crate::upnp::soap::SoapError;

/// How an SSDP message reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsdpSource {
    /// Unsolicited NOTIFY on the multicast group.
    Notify,
    /// Unicast reply to one of our M-SEARCH queries.
    Search,
}

impl fmt::Display for SsdpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notify => write!(f, "SSDP NOTIFY"),
            Self::Search => write!(f, "SSDP M-SEARCH"),
        }
    }
}

/// Headers of one SSDP message. Missing headers are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsdpEntry {
    pub location: String,
    pub server: String,
    pub usn: String,
    /// `NT` for NOTIFY, `ST` for search replies.
    pub target: String,
    /// `ssdp:alive` / `ssdp:byebye` for NOTIFY, empty for search replies.
    pub nts: String,
}

/// Errors that can occur during discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The configured local IP is not an IPv4 address.
    #[error("invalid local IP: {0:?}")]
    InvalidLocalIp(String),

    /// No usable interface owns the configured local IP.
    #[error("no multicast interface found for local IP {0}")]
    InterfaceNotFound(String),

    /// Failed to create or bind the UDP socket.
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// Failed to join the SSDP multicast group.
    #[error("failed to join SSDP multicast group on {ip}: {source}")]
    JoinMulticast {
        ip: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to send an M-SEARCH.
    #[error("failed to send SSDP search: {0}")]
    SendSearch(#[source] std::io::Error),

    /// The device descriptor could not be fetched.
    #[error("failed to fetch device descriptor {location}: {source}")]
    DescriptorFetch {
        location: String,
        #[source]
        source: SoapError,
    },

    /// The device descriptor was fetched but is not usable.
    #[error("malformed device descriptor {location}: {reason}")]
    MalformedDescriptor { location: String, reason: String },
}

/// Convenient Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Interface name prefixes to skip when matching the local IP.
///
/// Loopback plus common virtual/container interfaces that never carry
/// SSDP traffic from real TVs.
const SKIPPED_INTERFACE_PREFIXES: &[&str] = &[
    "lo", "docker", "veth", "br-", "virbr", "vmnet", "vboxnet", "utun", "tun", "tap",
];

/// Returns true if the interface should not be used for SSDP.
pub fn is_skipped_interface(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    SKIPPED_INTERFACE_PREFIXES
        .iter()
        .any(|prefix| name_lower.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_loopback_and_virtual_interfaces() {
        assert!(is_skipped_interface("lo"));
        assert!(is_skipped_interface("lo0"));
        assert!(is_skipped_interface("docker0"));
        assert!(is_skipped_interface("vethab12"));
        assert!(!is_skipped_interface("eth0"));
        assert!(!is_skipped_interface("wlan0"));
        assert!(!is_skipped_interface("en0"));
    }
}
