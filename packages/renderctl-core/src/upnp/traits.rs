//! Trait abstractions for renderer operations.
//!
//! The resolver and playback sequence depend on these rather than on the
//! network, so tests can substitute in-memory implementations.

use std::time::Duration;

use async_trait::async_trait;

use super::discovery::DiscoveryResult;
use super::soap::SoapResult;
use super::types::DetectedTv;

/// AVTransport commands issued during playback.
#[async_trait]
pub trait AvTransportControl: Send + Sync {
    /// Stops the current transport.
    async fn stop(&self, control_url: &str) -> SoapResult<()>;

    /// Loads `uri` with optional DIDL-Lite `metadata` (raw XML, may be empty).
    async fn set_av_transport_uri(
        &self,
        control_url: &str,
        uri: &str,
        metadata: &str,
    ) -> SoapResult<()>;

    /// Starts playback at normal speed.
    async fn play(&self, control_url: &str) -> SoapResult<()>;
}

/// Source of renderers on the local network.
#[async_trait]
pub trait RendererDiscovery: Send + Sync {
    /// Listens for announcements (falling back to an active search) and
    /// returns every TV whose descriptor could be fetched.
    ///
    /// # Arguments
    /// * `local_ip` - Address of the interface to listen on
    /// * `timeout` - Passive listen window
    async fn discover_tvs(&self, local_ip: &str, timeout: Duration)
        -> DiscoveryResult<Vec<DetectedTv>>;
}
